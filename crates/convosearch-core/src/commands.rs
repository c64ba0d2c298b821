use std::io::{self, Write};

use anyhow::{Context, bail};
use convosearch_shared::{DateFilter, TicketCreateRequest, TriageRequest};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::{
    AskArgs, ChatArgs, Command, FilterArgs, SearchArgs, TicketsCommand, parse_date_filter,
    parse_iso_date,
};
use crate::client::SearchBackend;
use crate::config::Config;
use crate::render::Renderer;
use crate::session::{Session, SessionMode, View};

const CHAT_HELP: &str = "\
commands:
  :category NAME   set the category filter (`all` to reset)
  :date TOKEN      all | today | week | month | custom
  :start DATE      custom range start (YYYY-MM-DD)
  :end DATE        custom range end (YYYY-MM-DD)
  :clear           reset all filters
  :filters         show the current filters
  :categories      list categories
  :help            this text
  :quit            leave
anything else is sent as a question (or a search with --mode search)";

#[tracing::instrument(skip_all)]
pub async fn dispatch<B: SearchBackend>(
    backend: B,
    cfg: &Config,
    renderer: &Renderer,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Categories => categories(backend, cfg, renderer).await,
        Command::Search(args) => search(backend, cfg, renderer, args).await,
        Command::Ask(args) => ask(backend, cfg, renderer, args).await,
        Command::Triage { message, ticket } => {
            triage(&backend, renderer, &message.join(" "), ticket).await
        }
        Command::Tickets(command) => tickets(&backend, renderer, command).await,
        Command::Health => health(&backend, renderer).await,
        Command::Chat(args) => chat(backend, cfg, renderer, args).await,
    }
}

async fn categories<B: SearchBackend>(
    backend: B,
    cfg: &Config,
    renderer: &Renderer,
) -> anyhow::Result<()> {
    let mut session = Session::new(backend, SessionMode::Search, cfg);
    let categories = session.load_categories().await;
    renderer.print_categories(io::stdout().lock(), categories)
}

async fn search<B: SearchBackend>(
    backend: B,
    cfg: &Config,
    renderer: &Renderer,
    args: SearchArgs,
) -> anyhow::Result<()> {
    let mut cfg = cfg.clone();
    if args.limit.is_some() {
        cfg.search_limit = args.limit;
    }
    let mut session = Session::new(backend, SessionMode::Search, &cfg);
    apply_filter_args(&mut session, &args.filters).await?;
    let view = session.submit(&args.query.join(" ")).await;
    finish_one_shot(renderer, view)
}

async fn ask<B: SearchBackend>(
    backend: B,
    cfg: &Config,
    renderer: &Renderer,
    args: AskArgs,
) -> anyhow::Result<()> {
    let mut cfg = cfg.clone();
    if args.collection.is_some() {
        cfg.collection = args.collection;
    }
    let mut session = Session::new(backend, SessionMode::Chat, &cfg);
    apply_filter_args(&mut session, &args.filters).await?;
    let view = session.submit(&args.question.join(" ")).await;
    finish_one_shot(renderer, view)
}

async fn triage<B: SearchBackend>(
    backend: &B,
    renderer: &Renderer,
    message: &str,
    open_ticket: bool,
) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        bail!("triage message is empty");
    }
    let request = TriageRequest {
        message: message.to_string(),
    };
    let response = match backend.triage(&request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "triage error");
            bail!("triage failed: {}", err.user_message())
        }
    };
    renderer.print_triage(io::stdout().lock(), &response)?;

    if open_ticket {
        let request = TicketCreateRequest::from_triage(message, &response);
        create_ticket(backend, renderer, &request).await?;
    }
    Ok(())
}

async fn tickets<B: SearchBackend>(
    backend: &B,
    renderer: &Renderer,
    command: TicketsCommand,
) -> anyhow::Result<()> {
    match command {
        TicketsCommand::List => match backend.list_tickets().await {
            Ok(list) => renderer.print_tickets(io::stdout().lock(), &list.tickets),
            Err(err) => bail!("listing tickets failed: {}", err.user_message()),
        },
        TicketsCommand::Create {
            classification,
            reply,
            message,
        } => {
            let request = TicketCreateRequest {
                customer_message: message.join(" "),
                classification,
                suggested_reply: reply,
            };
            create_ticket(backend, renderer, &request).await
        }
    }
}

async fn create_ticket<B: SearchBackend>(
    backend: &B,
    renderer: &Renderer,
    request: &TicketCreateRequest,
) -> anyhow::Result<()> {
    if request.customer_message.trim().is_empty() {
        bail!("ticket message is empty");
    }
    match backend.create_ticket(request).await {
        Ok(created) => {
            info!(ticket_id = %created.ticket_id, "ticket created");
            renderer.print_ticket_created(io::stdout().lock(), &created)
        }
        Err(err) => {
            warn!(error = %err, "ticket creation error");
            bail!("ticket creation failed: {}", err.user_message())
        }
    }
}

async fn health<B: SearchBackend>(backend: &B, renderer: &Renderer) -> anyhow::Result<()> {
    match backend.health().await {
        Ok(response) => renderer.print_health(io::stdout().lock(), &response),
        Err(err) => bail!("health check failed: {}", err.user_message()),
    }
}

/// Sets filters from flags before anything was typed, so none of these
/// changes dispatches.
async fn apply_filter_args<B: SearchBackend>(
    session: &mut Session<B>,
    filters: &FilterArgs,
) -> anyhow::Result<()> {
    if let Some(category) = filters.category.as_deref() {
        let _ = session.set_category(category).await;
    }

    let date = filters.date.unwrap_or(DateFilter::All);
    match (&filters.start, &filters.end) {
        (Some(start), Some(end)) => {
            if filters.date.is_some_and(|date| !date.is_custom()) {
                bail!("--start/--end need --date custom");
            }
            let _ = session.set_date(DateFilter::Custom).await;
            let _ = session.set_start_date(start).await;
            let _ = session.set_end_date(end).await;
        }
        _ if date.is_custom() => bail!("--date custom needs --start and --end"),
        _ => {
            let _ = session.set_date(date).await;
        }
    }
    debug!(filters = ?session.filters(), "filters from flags");
    Ok(())
}

fn finish_one_shot(renderer: &Renderer, view: Option<View>) -> anyhow::Result<()> {
    let Some(view) = view else {
        bail!("nothing to send: input is empty");
    };
    renderer.print_view(io::stdout().lock(), &view)?;
    if view.is_failure() {
        bail!("request failed");
    }
    Ok(())
}

#[tracing::instrument(skip_all)]
async fn chat<B: SearchBackend>(
    backend: B,
    cfg: &Config,
    renderer: &Renderer,
    args: ChatArgs,
) -> anyhow::Result<()> {
    let mut session = Session::new(backend, args.mode, cfg);
    session.load_categories().await;
    apply_filter_args(&mut session, &args.filters).await?;
    info!(mode = ?args.mode, "interactive session started");

    eprintln!("{CHAT_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await.context("failed reading stdin")? else {
            break;
        };
        match run_chat_line(&mut session, renderer, line.trim()).await? {
            LineOutcome::Continue => {}
            LineOutcome::Quit => break,
        }
    }

    info!(entries = session.chat_log().len(), "interactive session ended");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Quit,
}

/// Handles one line of interactive input.
pub async fn run_chat_line<B: SearchBackend>(
    session: &mut Session<B>,
    renderer: &Renderer,
    line: &str,
) -> anyhow::Result<LineOutcome> {
    let mut out = io::stdout();
    if line.is_empty() {
        return Ok(LineOutcome::Continue);
    }
    let view = match line.strip_prefix(':') {
        None => session.submit(line).await,
        Some(command) => {
            let (name, arg) = command
                .split_once(char::is_whitespace)
                .map(|(name, arg)| (name, arg.trim()))
                .unwrap_or((command, ""));
            match name {
                "q" | "quit" | "exit" => return Ok(LineOutcome::Quit),
                "h" | "help" => {
                    writeln!(out, "{CHAT_HELP}")?;
                    None
                }
                "filters" => {
                    renderer.print_filters(&mut out, session.controller())?;
                    None
                }
                "categories" => {
                    renderer.print_categories(&mut out, session.categories())?;
                    None
                }
                "category" => session.set_category(arg).await,
                "date" => match parse_date_filter(arg) {
                    Ok(date) => session.set_date(date).await,
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        None
                    }
                },
                "start" | "end" => {
                    let value = if arg.is_empty() {
                        Ok(String::new())
                    } else {
                        parse_iso_date(arg)
                    };
                    match value {
                        Ok(value) if name == "start" => session.set_start_date(&value).await,
                        Ok(value) => session.set_end_date(&value).await,
                        Err(err) => {
                            writeln!(out, "{err}")?;
                            None
                        }
                    }
                }
                "clear" => session.clear_filters().await,
                other => {
                    writeln!(out, "unknown command `:{other}` (try :help)")?;
                    None
                }
            }
        }
    };

    if let Some(view) = view {
        renderer.print_view(&mut out, &view)?;
    }
    Ok(LineOutcome::Continue)
}

fn prompt() -> anyhow::Result<()> {
    let mut err = io::stderr().lock();
    write!(err, "> ")?;
    err.flush()?;
    Ok(())
}
