use convosearch_shared::{
  DispatchTracker,
  FilterState,
  SearchResults
};
use yew::{
  Callback,
  Html,
  TargetCast,
  function_component,
  html,
  use_mut_ref,
  use_state
};

use super::filters::{
  FilterEvent,
  use_categories,
  use_filter_controls
};
use crate::api;
use crate::components::{
  FilterBar,
  ResultsPanel
};

#[derive(Clone, Debug, PartialEq)]
pub enum SearchView {
  Idle,
  Results(SearchResults),
  Error(String)
}

#[function_component(SearchPage)]
pub fn search_page() -> Html {
  let categories = use_categories();
  let query = use_state(String::new);
  let view =
    use_state(|| SearchView::Idle);
  let loading = use_state(|| false);
  let tracker =
    use_mut_ref(DispatchTracker::default);

  let run_search = {
    let view = view.clone();
    let loading = loading.clone();
    let tracker = tracker.clone();
    Callback::from(
      move |(text, filters): (
        String,
        FilterState
      )| {
        let Some(request) = filters
          .search_request(&text, None)
        else {
          return;
        };

        let ticket =
          tracker.borrow_mut().begin();
        loading.set(true);

        let view = view.clone();
        let loading = loading.clone();
        let tracker = tracker.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            let result =
              api::search(&request).await;
            if !tracker
              .borrow()
              .is_current(ticket)
            {
              tracing::debug!(
                generation =
                  ticket.generation(),
                "discarding superseded \
                 search response"
              );
              return;
            }

            loading.set(false);
            match result {
              | Ok(results) => {
                view.set(
                  SearchView::Results(
                    results
                  )
                );
              }
              | Err(err) => {
                tracing::warn!(
                  error = %err,
                  "search error"
                );
                view.set(
                  SearchView::Error(
                    err.user_message()
                  )
                );
              }
            }
          }
        );
      }
    )
  };

  let controls = {
    let query = query.clone();
    let run_search = run_search.clone();
    use_filter_controls(Callback::from(
      move |filters: FilterState| {
        run_search.emit((
          (*query).clone(),
          filters
        ));
      }
    ))
  };

  let on_input = {
    let query = query.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let input: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        query.set(input.value());
      }
    )
  };

  let on_submit = {
    let query = query.clone();
    let controller =
      controls.controller.clone();
    let run_search = run_search.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        run_search.emit((
          (*query).clone(),
          controller.state().clone()
        ));
      }
    )
  };

  let on_clear = {
    let on_change =
      controls.on_change.clone();
    Callback::from(move |_: ()| {
      on_change.emit(FilterEvent::Clear)
    })
  };

  html! {
      <div class="search-page">
          <form class="search-form" onsubmit={on_submit}>
              <input
                  id="searchInput"
                  type="search"
                  placeholder="Search the knowledge base"
                  value={(*query).clone()}
                  oninput={on_input}
              />
              <button type="submit" class="btn">{ "Search" }</button>
          </form>
          <FilterBar
              controller={(*controls.controller).clone()}
              categories={(*categories).clone()}
              on_change={controls.on_change.clone()}
          />
          {
              if *loading {
                  html! { <div class="loading">{ "Searching..." }</div> }
              } else {
                  html! {}
              }
          }
          <div id="resultsContainer">
              {
                  match &*view {
                      SearchView::Idle => html! {},
                      SearchView::Results(results) => html! {
                          <ResultsPanel results={results.clone()} on_clear={on_clear.clone()} />
                      },
                      SearchView::Error(message) => html! {
                          <div class="error-message">{ message.clone() }</div>
                      },
                  }
              }
          </div>
      </div>
  }
}
