use std::io::{self, IsTerminal, Write};

use convosearch_shared::format::{
    confidence_percent, echoed_filter_labels, filtered_by, results_count_label,
};
use convosearch_shared::{
    ChatBody, ChatEntry, FilterController, HealthResponse, SearchResults, Ticket,
    TicketCreateResponse, TriageResponse,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::{Config, OutputFormat};
use crate::html;
use crate::session::View;

const CONTENT_WIDTH: usize = 72;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    format: OutputFormat,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.color,
            format: cfg.output,
        }
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn print_view<W: Write>(&self, mut out: W, view: &View) -> anyhow::Result<()> {
        match (self.format, view) {
            (OutputFormat::Html, View::Results(results)) => {
                writeln!(out, "{}", html::search_results(results))?
            }
            (OutputFormat::Html, View::SearchError(message)) => {
                writeln!(out, "{}", html::search_error(message))?
            }
            (OutputFormat::Html, View::Exchange { question, reply }) => {
                writeln!(out, "{}", html::chat_entry(question))?;
                writeln!(out, "{}", html::chat_entry(reply))?;
            }
            (OutputFormat::Text, View::Results(results)) => self.write_results(&mut out, results)?,
            (OutputFormat::Text, View::SearchError(message)) => {
                writeln!(out, "{}", self.paint(&format!("error: {message}"), "31"))?
            }
            (OutputFormat::Text, View::Exchange { reply, .. }) => {
                self.write_chat_reply(&mut out, reply)?
            }
        }
        Ok(())
    }

    pub fn print_categories<W: Write>(&self, mut out: W, categories: &[String]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Html => {
                writeln!(out, r#"<option value="all">All Categories</option>"#)?;
                for category in categories {
                    let escaped = html::html_escape(category);
                    writeln!(out, r#"<option value="{escaped}">{escaped}</option>"#)?;
                }
            }
            OutputFormat::Text => {
                writeln!(out, "all")?;
                for category in categories {
                    writeln!(out, "{category}")?;
                }
            }
        }
        Ok(())
    }

    pub fn print_triage<W: Write>(&self, mut out: W, triage: &TriageResponse) -> anyhow::Result<()> {
        let classification = match triage.classification.as_str() {
            "escalate" => self.paint(&triage.classification, "31"),
            "tier1" => self.paint(&triage.classification, "33"),
            _ => self.paint(&triage.classification, "32"),
        };
        writeln!(out, "classification  {classification}")?;
        writeln!(out, "confidence      {}", confidence_percent(triage.confidence))?;
        writeln!(out, "suggested reply {}", triage.suggested_reply)?;
        if !triage.sources.is_empty() {
            writeln!(out, "sources         {}", triage.sources.join(", "))?;
        }
        Ok(())
    }

    pub fn print_ticket_created<W: Write>(
        &self,
        mut out: W,
        created: &TicketCreateResponse,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "ticket {} {}",
            self.paint(&created.ticket_id, "33"),
            created.status
        )?;
        Ok(())
    }

    pub fn print_tickets<W: Write>(&self, mut out: W, tickets: &[Ticket]) -> anyhow::Result<()> {
        if tickets.is_empty() {
            writeln!(out, "no tickets")?;
            return Ok(());
        }

        let headers = vec![
            "Ticket".to_string(),
            "Status".to_string(),
            "Class".to_string(),
            "Created".to_string(),
            "Message".to_string(),
        ];
        let rows = tickets
            .iter()
            .map(|ticket| {
                vec![
                    self.paint(&ticket.ticket_id, "33"),
                    ticket.status.clone(),
                    ticket.classification.clone(),
                    ticket.created_at.clone().unwrap_or_else(|| "-".to_string()),
                    truncate_to_width(&single_line(&ticket.customer_message), CONTENT_WIDTH),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_health<W: Write>(&self, mut out: W, health: &HealthResponse) -> anyhow::Result<()> {
        let status = if health.status == "healthy" {
            self.paint(&health.status, "32")
        } else {
            self.paint(&health.status, "31")
        };
        if health.service.is_empty() {
            writeln!(out, "{status}")?;
        } else {
            writeln!(out, "{} {status}", health.service)?;
        }
        Ok(())
    }

    /// One-line summary of the controller, used by the interactive `:filters`.
    pub fn print_filters<W: Write>(&self, mut out: W, controller: &FilterController) -> anyhow::Result<()> {
        let state = controller.state();
        write!(out, "category={} date={}", state.category(), state.date())?;
        if controller.custom_range_visible() {
            write!(
                out,
                " start={} end={}",
                display_or_dash(controller.start_input()),
                display_or_dash(controller.end_input())
            )?;
        }
        if state.has_active_filters() {
            write!(out, " {}", self.paint("[filters active]", "36"))?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_results<W: Write>(&self, out: &mut W, results: &SearchResults) -> anyhow::Result<()> {
        write!(out, "{}", results_count_label(results.hits.len()))?;
        let labels = echoed_filter_labels(results.filters.category(), results.filters.date());
        if !labels.is_empty() {
            write!(out, " {}", self.paint(&filtered_by(&labels), "36"))?;
        }
        writeln!(out)?;

        if results.hits.is_empty() {
            return Ok(());
        }
        writeln!(out)?;

        let headers = vec![
            "#".to_string(),
            "Source".to_string(),
            "Confidence".to_string(),
            "Content".to_string(),
        ];
        let rows = results
            .hits
            .iter()
            .enumerate()
            .map(|(idx, hit)| {
                vec![
                    self.paint(&(idx + 1).to_string(), "33"),
                    hit.source.clone(),
                    hit.confidence.map(confidence_percent).unwrap_or_default(),
                    truncate_to_width(&single_line(&hit.content), CONTENT_WIDTH),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    fn write_chat_reply<W: Write>(&self, out: &mut W, reply: &ChatEntry) -> anyhow::Result<()> {
        match &reply.body {
            ChatBody::Question(text) => writeln!(out, "{} {text}", self.paint("you>", "34"))?,
            ChatBody::Error(message) => {
                writeln!(out, "{} {}", self.paint("bot>", "35"), self.paint(message, "31"))?
            }
            ChatBody::Answer(answer) => {
                writeln!(out, "{} {}", self.paint("bot>", "35"), answer.answer)?;
                if !answer.sources.is_empty() {
                    writeln!(out, "     sources: {}", answer.sources.join(", "))?;
                }
                writeln!(out, "     confidence: {}", confidence_percent(answer.confidence))?;
                let labels = answer.filters.labels();
                if !labels.is_empty() {
                    writeln!(out, "     {}", self.paint(&filtered_by(&labels), "36"))?;
                }
            }
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || self.format == OutputFormat::Html || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_to_width(text: &str, max: usize) -> String {
    if UnicodeWidthStr::width(text) <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use convosearch_shared::{EchoedFilters, SearchHit};

    use super::*;

    fn renderer(format: OutputFormat) -> Renderer {
        Renderer {
            color: false,
            format,
        }
    }

    fn results() -> SearchResults {
        SearchResults {
            hits: vec![SearchHit {
                content: "Refunds are issued\nwithin 5 business days".to_string(),
                source: "refund_policy.md".to_string(),
                confidence: Some(0.873),
            }],
            filters: EchoedFilters {
                category: Some("finance".to_string()),
                date: None,
            },
        }
    }

    #[test]
    fn text_results_table() {
        let mut out = Vec::new();
        renderer(OutputFormat::Text)
            .print_view(&mut out, &View::Results(results()))
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("1 result found (Filtered by: Category: finance)\n"));
        assert!(text.contains("refund_policy.md"));
        assert!(text.contains("87.3%"));
        assert!(text.contains("Refunds are issued within 5 business days"));
    }

    #[test]
    fn html_results_are_fragments() {
        let mut out = Vec::new();
        renderer(OutputFormat::Html)
            .print_view(&mut out, &View::Results(results()))
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(r#"<div class="results-info">"#));
    }

    #[test]
    fn categories_start_with_all() {
        let mut out = Vec::new();
        renderer(OutputFormat::Html)
            .print_categories(&mut out, &["a&b".to_string()])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "<option value=\"all\">All Categories</option>\n<option value=\"a&amp;b\">a&amp;b</option>\n"
        );
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
    }

    #[test]
    fn tickets_table_lists_newest_first() {
        let tickets = vec![
            Ticket {
                ticket_id: "TKT-20240102-090000".to_string(),
                customer_message: "Charged twice\nfor one order".to_string(),
                classification: "escalate".to_string(),
                suggested_reply: String::new(),
                status: "open".to_string(),
                created_at: Some("2024-01-02T09:00:00".to_string()),
            },
            Ticket {
                ticket_id: "TKT-20240101-080000".to_string(),
                customer_message: "Where is my parcel?".to_string(),
                classification: "tier1".to_string(),
                suggested_reply: String::new(),
                status: "open".to_string(),
                created_at: None,
            },
        ];

        let mut out = Vec::new();
        renderer(OutputFormat::Text)
            .print_tickets(&mut out, &tickets)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("Ticket"));
        assert!(lines[2].contains("Charged twice for one order"));
        assert!(lines[3].starts_with("TKT-20240101-080000"));
        assert!(lines[3].contains(" - "));
    }

    #[test]
    fn empty_ticket_list() {
        let mut out = Vec::new();
        renderer(OutputFormat::Text).print_tickets(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "no tickets\n");
    }
}
