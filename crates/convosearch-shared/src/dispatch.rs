use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Why a dispatch produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Network failure or a body that is not JSON.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered but reported a failure, or left out a field.
    #[error("{0}")]
    Application(String),
}

impl DispatchError {
    /// Text shown inline in the results or chat area.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Transport(_) => "Network error occurred".to_string(),
            DispatchError::Application(message) => message.clone(),
        }
    }
}

/// Identifies one request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchTicket(u64);

impl DispatchTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Generation counter deciding whether a response is still wanted.
///
/// Every dispatch calls [`DispatchTracker::begin`]; a response may only be
/// rendered while [`DispatchTracker::is_current`] holds for its ticket.
#[derive(Debug, Default)]
pub struct DispatchTracker {
    latest: u64,
}

impl DispatchTracker {
    pub fn begin(&mut self) -> DispatchTicket {
        self.latest += 1;
        DispatchTicket(self.latest)
    }

    pub fn is_current(&self, ticket: DispatchTicket) -> bool {
        ticket.0 == self.latest
    }
}

pub const CATEGORIES_FAILED: &str = "Failed to load categories";
pub const SEARCH_FAILED: &str = "Search failed";
pub const QUESTION_FAILED: &str = "Question failed";
pub const TRIAGE_FAILED: &str = "Triage failed";
pub const TICKET_FAILED: &str = "Ticket creation failed";
pub const TICKETS_FAILED: &str = "Failed to fetch tickets";
pub const HEALTH_FAILED: &str = "Health check failed";

/// Decodes a response body. Non-JSON is a transport failure; JSON of the
/// wrong shape is an application failure reported as `fallback`.
pub fn decode_body<T: DeserializeOwned>(body: &str, fallback: &str) -> Result<T, DispatchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| DispatchError::Transport(format!("response is not JSON: {e}")))?;
    serde_json::from_value(value).map_err(|e| {
        debug!(error = %e, "response has the wrong shape");
        DispatchError::Application(fallback.to_string())
    })
}

/// Turns a non-2xx response into a failure. A non-JSON body is a transport
/// failure; otherwise the server's `detail`/`error` text wins over
/// `fallback`.
pub fn status_failure(status: u16, body: &str, fallback: &str) -> DispatchError {
    if body.trim().is_empty() {
        return DispatchError::Application(fallback.to_string());
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return DispatchError::Transport(format!("HTTP {status} with a non-JSON body"));
    };
    let message = ["detail", "error"]
        .iter()
        .filter_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .find(|message| !message.trim().is_empty())
        .map_or_else(|| fallback.to_string(), str::to_string);
    DispatchError::Application(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryResponse;

    #[test]
    fn only_latest_ticket_is_current() {
        let mut tracker = DispatchTracker::default();

        let first = tracker.begin();
        assert!(tracker.is_current(first));

        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn non_json_is_transport_failure() {
        let err = decode_body::<QueryResponse>("<html>502 Bad Gateway</html>", QUESTION_FAILED)
            .unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
        assert_eq!(err.user_message(), "Network error occurred");
    }

    #[test]
    fn missing_field_reports_the_fallback() {
        let err = decode_body::<QueryResponse>(r#"{"answer":"hi"}"#, QUESTION_FAILED).unwrap_err();
        assert_eq!(err, DispatchError::Application("Question failed".to_string()));
    }

    #[test]
    fn status_failure_prefers_detail_then_error() {
        assert_eq!(
            status_failure(500, r#"{"detail":"Query failed: boom"}"#, QUESTION_FAILED),
            DispatchError::Application("Query failed: boom".to_string())
        );
        assert_eq!(
            status_failure(400, r#"{"error":"bad filter"}"#, SEARCH_FAILED),
            DispatchError::Application("bad filter".to_string())
        );
    }

    #[test]
    fn status_failure_falls_back_per_endpoint() {
        assert_eq!(status_failure(500, "", QUESTION_FAILED).user_message(), "Question failed");
        assert_eq!(status_failure(500, "{}", SEARCH_FAILED).user_message(), "Search failed");
        assert_eq!(
            status_failure(500, r#"{"detail":"  "}"#, TRIAGE_FAILED).user_message(),
            "Triage failed"
        );
        assert_eq!(
            status_failure(422, r#"{"detail":[{"loc":["body","message"]}]}"#, TRIAGE_FAILED)
                .user_message(),
            "Triage failed"
        );
    }

    #[test]
    fn status_failure_with_html_body_is_a_network_error() {
        let err = status_failure(502, "<html>502 Bad Gateway</html>", SEARCH_FAILED);
        assert!(matches!(err, DispatchError::Transport(_)));
        assert_eq!(err.user_message(), "Network error occurred");
    }
}
