pub mod chat;
pub mod controller;
pub mod dispatch;
pub mod filters;
pub mod format;

use serde::{
  Deserialize,
  Serialize
};

pub use crate::chat::{
  BotAnswer,
  ChatBody,
  ChatEntry,
  ChatLog
};
pub use crate::controller::{
  DatePhase,
  FilterController,
  FilterOutcome
};
pub use crate::dispatch::{
  DispatchError,
  DispatchTicket,
  DispatchTracker
};
pub use crate::filters::{
  ALL,
  DateFilter,
  FilterState
};

pub const CATEGORIES_PATH: &str =
  "/api/categories";
pub const SEARCH_PATH: &str =
  "/api/search";
pub const QUERY_PATH: &str =
  "/api/query";
pub const TRIAGE_PATH: &str =
  "/api/triage";
pub const TICKETS_PATH: &str =
  "/api/tickets";
pub const HEALTH_PATH: &str = "/health";

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct SearchRequest {
  pub query:           String,
  pub category_filter: String,
  pub date_filter:     String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub start_date:      Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub end_date:        Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub limit:           Option<u32>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct QueryRequest {
  pub question:        String,
  pub category_filter: String,
  pub date_filter:     String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub start_date:      Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub end_date:        Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub collection:      Option<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TriageRequest {
  pub message: String
}

/// Opens a support ticket, usually for a
/// message triage marked `escalate`.
#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TicketCreateRequest {
  pub customer_message: String,
  pub classification:   String,
  pub suggested_reply:  String
}

impl TicketCreateRequest {
  pub fn from_triage(
    message: &str,
    triage: &TriageResponse
  ) -> Self {
    Self {
      customer_message: message
        .to_string(),
      classification:   triage
        .classification
        .clone(),
      suggested_reply:  triage
        .suggested_reply
        .clone()
    }
  }
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct CategoriesResponse {
  #[serde(default)]
  pub success:    bool,
  #[serde(default)]
  pub categories: Vec<String>,
  pub error:      Option<String>
}

impl CategoriesResponse {
  pub fn into_result(
    self
  ) -> Result<Vec<String>, DispatchError>
  {
    if self.success {
      Ok(self.categories)
    } else {
      Err(DispatchError::Application(
        self.error.unwrap_or_else(|| {
          dispatch::CATEGORIES_FAILED
            .to_string()
        })
      ))
    }
  }
}

/// Filter values as echoed back by the
/// search endpoint. The server sends
/// `null` for filters it was not given.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct EchoedFilters {
  pub category: Option<String>,
  pub date:     Option<String>
}

impl EchoedFilters {
  pub fn category(&self) -> &str {
    self
      .category
      .as_deref()
      .unwrap_or(ALL)
  }

  pub fn date(&self) -> &str {
    self.date.as_deref().unwrap_or(ALL)
  }

  pub fn is_active(&self) -> bool {
    self.category() != ALL
      || self.date() != ALL
  }
}

fn unknown_source() -> String {
  "unknown".to_string()
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct SearchHit {
  #[serde(default)]
  pub content:    String,
  #[serde(default = "unknown_source")]
  pub source:     String,
  #[serde(default)]
  pub confidence: Option<f64>
}

#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct SearchResponse {
  #[serde(default)]
  pub success: bool,
  #[serde(default)]
  pub results: Vec<SearchHit>,
  pub filters: Option<EchoedFilters>,
  pub query:   Option<String>,
  pub error:   Option<String>
}

/// A successful search, ready to render.
#[derive(
  Debug, Clone, PartialEq, Default,
)]
pub struct SearchResults {
  pub hits:    Vec<SearchHit>,
  pub filters: EchoedFilters
}

impl SearchResponse {
  pub fn into_result(
    self
  ) -> Result<SearchResults, DispatchError>
  {
    if !self.success {
      return Err(
        DispatchError::Application(
          self.error.unwrap_or_else(
            || {
              dispatch::SEARCH_FAILED
                .to_string()
            }
          )
        )
      );
    }

    Ok(SearchResults {
      hits:    self.results,
      filters: self
        .filters
        .unwrap_or_default()
    })
  }
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct QueryResponse {
  pub answer:     String,
  #[serde(default)]
  pub sources:    Vec<String>,
  pub confidence: f64
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
)]
pub struct TriageResponse {
  pub classification:  String,
  pub confidence:      f64,
  #[serde(default)]
  pub suggested_reply: String,
  #[serde(default)]
  pub sources:         Vec<String>
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct HealthResponse {
  pub status:  String,
  #[serde(default)]
  pub service: String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TicketCreateResponse {
  pub ticket_id: String,
  pub status:    String
}

#[derive(
  Debug,
  Clone,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct Ticket {
  pub ticket_id:        String,
  #[serde(default)]
  pub customer_message: String,
  #[serde(default)]
  pub classification:   String,
  #[serde(default)]
  pub suggested_reply:  String,
  #[serde(default)]
  pub status:           String,
  #[serde(default)]
  pub created_at:       Option<String>
}

/// Most recent tickets, newest first.
#[derive(
  Debug,
  Clone,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
)]
pub struct TicketList {
  #[serde(default)]
  pub tickets: Vec<Ticket>
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn search_response_failure_uses_server_error()
  {
    let resp: SearchResponse =
      serde_json::from_str(
        r#"{"success":false,"error":"index offline","results":[]}"#
      )
      .unwrap();

    assert_eq!(
      resp.into_result().unwrap_err(),
      DispatchError::Application(
        "index offline".to_string()
      )
    );
  }

  #[test]
  fn search_response_failure_without_message()
  {
    let resp: SearchResponse =
      serde_json::from_str(
        r#"{"success":false}"#
      )
      .unwrap();

    assert_eq!(
      resp.into_result().unwrap_err(),
      DispatchError::Application(
        "Search failed".to_string()
      )
    );
  }

  #[test]
  fn null_echoed_filters_read_as_all() {
    let resp: SearchResponse =
      serde_json::from_str(
        r#"{"success":true,"results":[{"content":"x"}],"filters":{"category":null,"date":"week"}}"#
      )
      .unwrap();

    let results =
      resp.into_result().unwrap();
    assert_eq!(
      results.filters.category(),
      "all"
    );
    assert_eq!(
      results.filters.date(),
      "week"
    );
    assert!(results.filters.is_active());
    assert_eq!(
      results.hits[0].source,
      "unknown"
    );
    assert_eq!(
      results.hits[0].confidence,
      None
    );
  }

  #[test]
  fn categories_failure_is_application_error()
  {
    let resp: CategoriesResponse =
      serde_json::from_str(
        r#"{"success":false,"categories":[],"error":"db down"}"#
      )
      .unwrap();

    assert_eq!(
      resp.into_result().unwrap_err(),
      DispatchError::Application(
        "db down".to_string()
      )
    );
  }

  #[test]
  fn ticket_request_copies_the_triage()
  {
    let triage = TriageResponse {
      classification:  "escalate"
        .to_string(),
      confidence:      0.91,
      suggested_reply: "Sorry, a human \
                        will follow up."
        .to_string(),
      sources:         vec![
        "escalate_category".to_string(),
      ]
    };

    let body = serde_json::to_value(
      TicketCreateRequest::from_triage(
        "my order never arrived",
        &triage
      )
    )
    .unwrap();
    assert_eq!(
      body,
      serde_json::json!({
        "customer_message": "my order never arrived",
        "classification": "escalate",
        "suggested_reply": "Sorry, a human will follow up."
      })
    );
  }

  #[test]
  fn ticket_list_tolerates_null_dates()
  {
    let list: TicketList =
      serde_json::from_str(
        r#"{"tickets":[{"ticket_id":"TKT-20240101-120000","status":"open","created_at":null}]}"#
      )
      .unwrap();

    assert_eq!(list.tickets.len(), 1);
    assert_eq!(
      list.tickets[0].created_at,
      None
    );
    assert_eq!(
      list.tickets[0].classification,
      ""
    );
  }
}
