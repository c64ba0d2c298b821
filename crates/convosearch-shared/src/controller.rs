use tracing::debug;

use crate::filters::{ALL, DateFilter, FilterState};

/// Where the date filter currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePhase {
    Preset,
    CustomPending,
    CustomReady,
}

/// What the caller should do after a control changed.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Run the current query/question again if there is one.
    Requery,
    Wait,
}

impl FilterOutcome {
    pub fn requery(self) -> bool {
        self == FilterOutcome::Requery
    }
}

/// Owns the [`FilterState`] plus the view-side bits the state machine needs:
/// the raw contents of both date inputs and whether they are shown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterController {
    state: FilterState,
    start_input: String,
    end_input: String,
    custom_visible: bool,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn start_input(&self) -> &str {
        &self.start_input
    }

    pub fn end_input(&self) -> &str {
        &self.end_input
    }

    pub fn custom_range_visible(&self) -> bool {
        self.custom_visible
    }

    pub fn phase(&self) -> DatePhase {
        if !self.state.date.is_custom() {
            DatePhase::Preset
        } else if self.state.custom_range().is_some() {
            DatePhase::CustomReady
        } else {
            DatePhase::CustomPending
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn set_category(&mut self, value: &str) -> FilterOutcome {
        let value = value.trim();
        self.state.category = if value.is_empty() {
            ALL.to_string()
        } else {
            value.to_string()
        };
        debug!(category = %self.state.category, "category filter changed");
        FilterOutcome::Requery
    }

    #[tracing::instrument(skip(self))]
    pub fn set_date(&mut self, date: DateFilter) -> FilterOutcome {
        let was_custom = self.state.date.is_custom();
        self.state.date = date;

        if date.is_custom() {
            self.custom_visible = true;
            if !was_custom {
                self.start_input.clear();
                self.end_input.clear();
                self.state.start_date = None;
                self.state.end_date = None;
            }
            debug!(phase = ?self.phase(), "custom date range selected");
            return FilterOutcome::Wait;
        }

        self.custom_visible = false;
        self.start_input.clear();
        self.end_input.clear();
        self.state.start_date = None;
        self.state.end_date = None;
        debug!(date = %date, "preset date filter selected");
        FilterOutcome::Requery
    }

    pub fn set_start_input(&mut self, value: &str) -> FilterOutcome {
        self.start_input = value.trim().to_string();
        self.sync_custom_range()
    }

    pub fn set_end_input(&mut self, value: &str) -> FilterOutcome {
        self.end_input = value.trim().to_string();
        self.sync_custom_range()
    }

    /// Back to `{all, all, -, -}` with the date inputs hidden and emptied.
    #[tracing::instrument(skip(self))]
    pub fn clear(&mut self) -> FilterOutcome {
        *self = Self::default();
        debug!("filters cleared");
        FilterOutcome::Requery
    }

    fn sync_custom_range(&mut self) -> FilterOutcome {
        let complete = self.state.date.is_custom()
            && !self.start_input.is_empty()
            && !self.end_input.is_empty();

        if complete {
            self.state.start_date = Some(self.start_input.clone());
            self.state.end_date = Some(self.end_input.clone());
            debug!(
                start = %self.start_input,
                end = %self.end_input,
                "custom date range complete"
            );
            FilterOutcome::Requery
        } else {
            self.state.start_date = None;
            self.state.end_date = None;
            FilterOutcome::Wait
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_change_requeries() {
        let mut controller = FilterController::new();
        assert!(controller.set_category("finance").requery());
        assert_eq!(controller.state().category(), "finance");

        assert!(controller.set_category("").requery());
        assert_eq!(controller.state().category(), "all");
    }

    #[test]
    fn date_state_machine() {
        let mut controller = FilterController::new();
        assert_eq!(controller.phase(), DatePhase::Preset);

        assert!(!controller.set_date(DateFilter::Custom).requery());
        assert_eq!(controller.phase(), DatePhase::CustomPending);
        assert!(controller.custom_range_visible());

        assert!(!controller.set_start_input("2024-01-01").requery());
        assert_eq!(controller.phase(), DatePhase::CustomPending);
        assert_eq!(controller.state().start_date(), None);

        assert!(controller.set_end_input("2024-01-31").requery());
        assert_eq!(controller.phase(), DatePhase::CustomReady);
        assert_eq!(
            controller.state().custom_range(),
            Some(("2024-01-01", "2024-01-31"))
        );

        assert!(controller.set_date(DateFilter::Week).requery());
        assert_eq!(controller.phase(), DatePhase::Preset);
        assert!(!controller.custom_range_visible());
        assert_eq!(controller.state().start_date(), None);
        assert_eq!(controller.state().end_date(), None);
    }

    #[test]
    fn emptying_one_end_drops_the_range() {
        let mut controller = FilterController::new();
        let _ = controller.set_date(DateFilter::Custom);
        let _ = controller.set_start_input("2024-01-01");
        let _ = controller.set_end_input("2024-01-31");

        assert!(!controller.set_start_input("").requery());
        assert_eq!(controller.phase(), DatePhase::CustomPending);
        assert_eq!(controller.state().start_date(), None);
        assert_eq!(controller.state().end_date(), None);
    }

    #[test]
    fn date_inputs_ignored_outside_custom() {
        let mut controller = FilterController::new();
        assert!(!controller.set_start_input("2024-01-01").requery());
        assert!(!controller.set_end_input("2024-01-31").requery());
        assert_eq!(controller.state().custom_range(), None);
        assert_eq!(controller.state().start_date(), None);
    }

    #[test]
    fn reselecting_custom_keeps_inputs() {
        let mut controller = FilterController::new();
        let _ = controller.set_date(DateFilter::Custom);
        let _ = controller.set_start_input("2024-01-01");
        let _ = controller.set_end_input("2024-01-31");

        assert!(!controller.set_date(DateFilter::Custom).requery());
        assert_eq!(controller.phase(), DatePhase::CustomReady);
    }

    #[test]
    fn clear_restores_defaults() {
        let mut controller = FilterController::new();
        let _ = controller.set_category("billing");
        let _ = controller.set_date(DateFilter::Custom);
        let _ = controller.set_start_input("2024-01-01");
        let _ = controller.set_end_input("2024-01-31");
        assert!(controller.state().has_active_filters());

        assert!(controller.clear().requery());
        assert!(controller.state().is_default());
        assert!(!controller.state().has_active_filters());
        assert!(!controller.custom_range_visible());
        assert_eq!(controller.start_input(), "");
        assert_eq!(controller.end_input(), "");
    }
}
