use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use convosearch_shared::DateFilter;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::session::SessionMode;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "convosearch",
    version,
    about = "ConvoSearch: filtered search and Q&A against a ConvoSearch API"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file (defaults to $CONVOSEARCH_CONFIG, then the user config dir).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Override a config key, e.g. `--set search_limit=20`.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    #[arg(long = "base-url", env = "CONVOSEARCH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Print HTML fragments instead of terminal text.
    #[arg(long = "html", global = true)]
    pub html: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the categories the service knows about.
    Categories,
    /// Search the knowledge base.
    Search(SearchArgs),
    /// Ask a question.
    Ask(AskArgs),
    /// Classify a customer message and get a suggested reply.
    Triage {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Open a support ticket with the classification and reply.
        #[arg(long)]
        ticket: bool,
    },
    /// Open or list support tickets.
    #[command(subcommand)]
    Tickets(TicketsCommand),
    /// Check that the service is up.
    Health,
    /// Interactive session with live filter controls.
    Chat(ChatArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketsCommand {
    /// Show the most recent tickets.
    List,
    /// Open a ticket by hand.
    Create {
        #[arg(long, default_value = "escalate")]
        classification: String,

        #[arg(long, default_value = "")]
        reply: String,

        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, value_parser = parse_date_filter)]
    pub date: Option<DateFilter>,

    /// Start of a custom range (YYYY-MM-DD); needs `--date custom`.
    #[arg(long, value_parser = parse_iso_date, requires = "end")]
    pub start: Option<String>,

    #[arg(long, value_parser = parse_iso_date, requires = "start")]
    pub end: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    #[arg(long)]
    pub collection: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    #[arg(long, value_enum, default_value_t = SessionMode::Chat)]
    pub mode: SessionMode,

    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn parse_date_filter(s: &str) -> Result<DateFilter, String> {
    s.parse::<DateFilter>().map_err(|e| e.to_string())
}

pub fn parse_iso_date(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("expected YYYY-MM-DD, got `{s}`: {e}"))
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_with_custom_range() {
        let cli = GlobalCli::try_parse_from([
            "convosearch",
            "search",
            "refund",
            "policy",
            "--date",
            "custom",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
        ])
        .unwrap();

        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.query.join(" "), "refund policy");
        assert_eq!(args.filters.date, Some(DateFilter::Custom));
        assert_eq!(args.filters.start.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn start_requires_end() {
        assert!(
            GlobalCli::try_parse_from(["convosearch", "search", "x", "--start", "2024-01-01"])
                .is_err()
        );
    }

    #[test]
    fn rejects_bad_dates_and_tokens() {
        assert!(parse_iso_date("2024-13-01").is_err());
        assert_eq!(parse_iso_date(" 2024-02-29 ").unwrap(), "2024-02-29");
        assert!(parse_date_filter("yesterday").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = GlobalCli::try_parse_from([
            "convosearch",
            "ask",
            "hello",
            "--html",
            "--set",
            "collection=tickets",
            "-vv",
        ])
        .unwrap();
        assert!(cli.html);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides[0].key, "collection");
    }

    #[test]
    fn triage_can_open_a_ticket() {
        let cli = GlobalCli::try_parse_from([
            "convosearch",
            "triage",
            "--ticket",
            "order",
            "never",
            "arrived",
        ])
        .unwrap();
        let Command::Triage { message, ticket } = cli.command else {
            panic!("expected triage command");
        };
        assert!(ticket);
        assert_eq!(message.join(" "), "order never arrived");
    }

    #[test]
    fn tickets_subcommands() {
        let cli = GlobalCli::try_parse_from(["convosearch", "tickets", "list"]).unwrap();
        assert!(matches!(cli.command, Command::Tickets(TicketsCommand::List)));

        let cli = GlobalCli::try_parse_from([
            "convosearch",
            "tickets",
            "create",
            "--reply",
            "We are on it.",
            "refund",
            "missing",
        ])
        .unwrap();
        let Command::Tickets(TicketsCommand::Create {
            classification,
            reply,
            message,
        }) = cli.command
        else {
            panic!("expected tickets create");
        };
        assert_eq!(classification, "escalate");
        assert_eq!(reply, "We are on it.");
        assert_eq!(message, ["refund", "missing"]);
    }
}
