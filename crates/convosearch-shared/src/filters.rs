use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{QueryRequest, SearchRequest};

/// Value every filter control starts at.
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    #[default]
    All,
    Today,
    Week,
    Month,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown date filter `{0}` (expected one of: all, today, week, month, custom)")]
pub struct UnknownDateFilter(pub String);

impl DateFilter {
    pub const OPTIONS: [DateFilter; 5] = [
        DateFilter::All,
        DateFilter::Today,
        DateFilter::Week,
        DateFilter::Month,
        DateFilter::Custom,
    ];

    pub fn as_key(self) -> &'static str {
        match self {
            DateFilter::All => "all",
            DateFilter::Today => "today",
            DateFilter::Week => "week",
            DateFilter::Month => "month",
            DateFilter::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DateFilter::All => "All Time",
            DateFilter::Today => "Today",
            DateFilter::Week => "Past Week",
            DateFilter::Month => "Past Month",
            DateFilter::Custom => "Custom Range",
        }
    }

    pub fn is_custom(self) -> bool {
        self == DateFilter::Custom
    }
}

impl FromStr for DateFilter {
    type Err = UnknownDateFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        DateFilter::OPTIONS
            .into_iter()
            .find(|option| option.as_key() == key)
            .ok_or_else(|| UnknownDateFilter(s.to_string()))
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Current category/date selections.
///
/// Only [`crate::FilterController`] mutates this, which keeps the custom
/// range present exactly when the date filter is `custom` and both ends are
/// filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub(crate) category: String,
    pub(crate) date: DateFilter,
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: ALL.to_string(),
            date: DateFilter::All,
            start_date: None,
            end_date: None,
        }
    }
}

impl FilterState {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> DateFilter {
        self.date
    }

    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    pub fn is_default(&self) -> bool {
        *self == FilterState::default()
    }

    pub fn has_active_filters(&self) -> bool {
        self.category != ALL || self.date != DateFilter::All || self.start_date.is_some()
    }

    /// The stored range, but only while the date filter is `custom`.
    pub fn custom_range(&self) -> Option<(&str, &str)> {
        if !self.date.is_custom() {
            return None;
        }
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Human readable labels for the non-default filters, e.g.
    /// `["Category: finance", "Date: 2024-01-01 to 2024-01-31"]`.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.category != ALL {
            labels.push(format!("Category: {}", self.category));
        }
        match (self.date, self.custom_range()) {
            (DateFilter::All, _) => {}
            (_, Some((start, end))) => labels.push(format!("Date: {start} to {end}")),
            (date, None) => labels.push(format!("Date: {date}")),
        }
        labels
    }

    /// Builds the `/api/search` body, or nothing when the query is blank.
    pub fn search_request(&self, query: &str, limit: Option<u32>) -> Option<SearchRequest> {
        if query.trim().is_empty() {
            return None;
        }
        let (start_date, end_date) = self.range_fields();
        Some(SearchRequest {
            query: query.to_string(),
            category_filter: self.category.clone(),
            date_filter: self.date.as_key().to_string(),
            start_date,
            end_date,
            limit,
        })
    }

    /// Builds the `/api/query` body, or nothing when the question is blank.
    pub fn question_request(
        &self,
        question: &str,
        collection: Option<&str>,
    ) -> Option<QueryRequest> {
        if question.trim().is_empty() {
            return None;
        }
        let (start_date, end_date) = self.range_fields();
        Some(QueryRequest {
            question: question.to_string(),
            category_filter: self.category.clone(),
            date_filter: self.date.as_key().to_string(),
            start_date,
            end_date,
            collection: collection.map(str::to_string),
        })
    }

    fn range_fields(&self) -> (Option<String>, Option<String>) {
        match self.custom_range() {
            Some((start, end)) => (Some(start.to_string()), Some(end.to_string())),
            None => (None, None),
        }
    }
}
