//! Text pieces both renderers (HTML strings and the Yew views) agree on.

use crate::ALL;

/// `0.873` -> `"87.3%"`. Ties round away from zero.
pub fn confidence_percent(confidence: f64) -> String {
    let percent = confidence * 100.0;
    format!("{:.1}%", (percent * 10.0).round() / 10.0)
}

pub fn results_count_label(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} result{plural} found")
}

/// Labels for server-echoed filter values; `all` is left out.
pub fn echoed_filter_labels(category: &str, date: &str) -> Vec<String> {
    let mut labels = Vec::new();
    if category != ALL {
        labels.push(format!("Category: {category}"));
    }
    if date != ALL {
        labels.push(format!("Date: {date}"));
    }
    labels
}

pub fn filtered_by(labels: &[String]) -> String {
    format!("(Filtered by: {})", labels.join(", "))
}
