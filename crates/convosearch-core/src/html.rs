//! HTML fragments for the results container and the chat box.
//!
//! Every piece of user or server text goes through [`html_escape`] before it
//! is interpolated.

use convosearch_shared::format::{
    confidence_percent, echoed_filter_labels, filtered_by, results_count_label,
};
use convosearch_shared::{BotAnswer, ChatBody, ChatEntry, EchoedFilters, SearchHit, SearchResults};

const CLEAR_FILTERS_BUTTON: &str =
    r#"<button type="button" class="clear-filters-btn" data-action="clear-filters">Clear Filters</button>"#;

pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Full contents of `#resultsContainer` for a successful search.
pub fn search_results(results: &SearchResults) -> String {
    let mut html = results_info(results.hits.len(), &results.filters);
    if results.hits.is_empty() {
        html.push_str(r#"<div class="no-results">No results found.</div>"#);
    } else {
        html.push_str(r#"<div class="results-list">"#);
        for hit in &results.hits {
            html.push_str(&result_item(hit));
        }
        html.push_str("</div>");
    }
    html
}

/// Count line, plus the filter indicator and clear control when the echoed
/// filters are not both `all`.
pub fn results_info(count: usize, filters: &EchoedFilters) -> String {
    let mut html = format!(
        r#"<div class="results-info"><span class="results-count">{}</span>"#,
        html_escape(&results_count_label(count))
    );

    let labels = echoed_filter_labels(filters.category(), filters.date());
    if !labels.is_empty() {
        html.push_str(&format!(
            r#"<span class="filter-indicator">{}</span>"#,
            html_escape(&filtered_by(&labels))
        ));
        html.push_str(CLEAR_FILTERS_BUTTON);
    }

    html.push_str("</div>");
    html
}

pub fn result_item(hit: &SearchHit) -> String {
    let confidence = hit
        .confidence
        .map(|value| {
            format!(
                r#"<span class="result-confidence">{}</span>"#,
                html_escape(&confidence_percent(value))
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="result-item"><div class="result-content">{}</div><div class="result-meta"><span class="result-source">{}</span>{}</div></div>"#,
        html_escape(&hit.content),
        html_escape(&hit.source),
        confidence
    )
}

pub fn search_error(message: &str) -> String {
    format!(r#"<div class="error-message">{}</div>"#, html_escape(message))
}

pub fn user_message(text: &str) -> String {
    format!(r#"<div class="message user-message">{}</div>"#, html_escape(text))
}

pub fn bot_message(answer: &BotAnswer) -> String {
    let mut html = format!(
        r#"<div class="message bot-message"><div class="answer">{}</div>"#,
        html_escape(&answer.answer)
    );

    if !answer.sources.is_empty() {
        html.push_str(r#"<div class="sources"><strong>Sources:</strong><ul>"#);
        for source in &answer.sources {
            html.push_str(&format!("<li>{}</li>", html_escape(source)));
        }
        html.push_str("</ul></div>");
    }

    html.push_str(&format!(
        r#"<div class="confidence">Confidence: {}</div>"#,
        html_escape(&confidence_percent(answer.confidence))
    ));
    html.push_str(&filter_summary(&answer.filters.labels()));
    html.push_str("</div>");
    html
}

pub fn bot_error(message: &str) -> String {
    format!(r#"<div class="message bot-message error">{}</div>"#, html_escape(message))
}

/// Active-filter block shown under chat answers; empty when no filter is set.
pub fn filter_summary(labels: &[String]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    format!(
        r#"<div class="filter-summary"><strong>Active Filters:</strong> {}{}</div>"#,
        html_escape(&labels.join(", ")),
        CLEAR_FILTERS_BUTTON
    )
}

pub fn chat_entry(entry: &ChatEntry) -> String {
    match &entry.body {
        ChatBody::Question(text) => user_message(text),
        ChatBody::Answer(answer) => bot_message(answer),
        ChatBody::Error(message) => bot_error(message),
    }
}
