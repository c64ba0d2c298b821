use convosearch_shared::{
  DateFilter,
  FilterController,
  FilterOutcome,
  FilterState
};
use yew::{
  Callback,
  UseStateHandle,
  hook,
  use_effect_with,
  use_state
};

use crate::api;

/// One change coming from the filter
/// controls.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterEvent {
  Category(String),
  Date(String),
  Start(String),
  End(String),
  Clear
}

pub fn apply_filter_event(
  controller: &mut FilterController,
  event: FilterEvent
) -> FilterOutcome {
  match event {
    | FilterEvent::Category(value) => {
      controller.set_category(&value)
    }
    | FilterEvent::Date(value) => {
      match value.parse::<DateFilter>() {
        | Ok(date) => {
          controller.set_date(date)
        }
        | Err(err) => {
          tracing::warn!(
            error = %err,
            "ignoring date filter value"
          );
          FilterOutcome::Wait
        }
      }
    }
    | FilterEvent::Start(value) => {
      controller.set_start_input(&value)
    }
    | FilterEvent::End(value) => {
      controller.set_end_input(&value)
    }
    | FilterEvent::Clear => {
      controller.clear()
    }
  }
}

#[derive(Clone)]
pub struct FilterControls {
  pub controller: UseStateHandle<
    FilterController
  >,
  pub on_change:  Callback<FilterEvent>
}

/// Holds the page's filter controller.
/// `requery` receives the new filters
/// whenever a change calls for the
/// current input to be sent again.
#[hook]
pub fn use_filter_controls(
  requery: Callback<FilterState>
) -> FilterControls {
  let controller =
    use_state(FilterController::new);

  let on_change = {
    let controller = controller.clone();
    Callback::from(
      move |event: FilterEvent| {
        let mut next =
          (*controller).clone();
        let outcome = apply_filter_event(
          &mut next, event
        );
        let state =
          next.state().clone();
        controller.set(next);
        if outcome.requery() {
          requery.emit(state);
        }
      }
    )
  };

  FilterControls {
    controller,
    on_change
  }
}

/// Loads the category list once on
/// mount. On failure the list stays
/// empty and only "all" is offered.
#[hook]
pub fn use_categories()
-> UseStateHandle<Vec<String>> {
  let categories =
    use_state(Vec::<String>::new);

  {
    let categories = categories.clone();
    use_effect_with((), move |_| {
      wasm_bindgen_futures::spawn_local(
        async move {
          match api::fetch_categories()
            .await
          {
            | Ok(list) => {
              tracing::info!(
                count = list.len(),
                "loaded categories"
              );
              categories.set(list);
            }
            | Err(err) => {
              tracing::error!(
                error = %err,
                "error loading categories"
              );
            }
          }
        }
      );
      || ()
    });
  }

  categories
}
