use convosearch_shared::{
  DispatchTracker,
  Ticket,
  TicketCreateRequest,
  TriageRequest,
  TriageResponse
};
use yew::{
  Callback,
  Html,
  TargetCast,
  UseStateHandle,
  function_component,
  html,
  use_effect_with,
  use_mut_ref,
  use_state
};

use crate::api;
use crate::components::{
  TicketTable,
  TriageCard
};

/// The message a triage was run for,
/// kept so a ticket can quote it.
#[derive(Clone, Debug, PartialEq)]
pub enum TriageView {
  Idle,
  Done {
    message: String,
    triage:  TriageResponse
  },
  Error(String)
}

#[derive(Clone, Debug, PartialEq)]
pub enum TicketNotice {
  None,
  Created(String),
  Error(String)
}

fn reload_tickets(
  tickets: UseStateHandle<Vec<Ticket>>
) {
  wasm_bindgen_futures::spawn_local(
    async move {
      match api::list_tickets().await {
        | Ok(list) => {
          tracing::debug!(
            count = list.tickets.len(),
            "loaded tickets"
          );
          tickets.set(list.tickets);
        }
        | Err(err) => {
          tracing::warn!(
            error = %err,
            "error loading tickets"
          );
        }
      }
    }
  );
}

#[function_component(TriagePage)]
pub fn triage_page() -> Html {
  let message = use_state(String::new);
  let view =
    use_state(|| TriageView::Idle);
  let notice =
    use_state(|| TicketNotice::None);
  let tickets =
    use_state(Vec::<Ticket>::new);
  let loading = use_state(|| false);
  let tracker =
    use_mut_ref(DispatchTracker::default);

  {
    let tickets = tickets.clone();
    use_effect_with((), move |_| {
      reload_tickets(tickets);
      || ()
    });
  }

  let on_input = {
    let message = message.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let area: web_sys::HtmlTextAreaElement =
          e.target_unchecked_into();
        message.set(area.value());
      }
    )
  };

  let on_submit = {
    let message = message.clone();
    let view = view.clone();
    let notice = notice.clone();
    let loading = loading.clone();
    let tracker = tracker.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        let text =
          message.trim().to_string();
        if text.is_empty() {
          return;
        }

        let ticket =
          tracker.borrow_mut().begin();
        loading.set(true);
        notice.set(TicketNotice::None);

        let view = view.clone();
        let loading = loading.clone();
        let tracker = tracker.clone();
        wasm_bindgen_futures::spawn_local(
          async move {
            let request = TriageRequest {
              message: text.clone()
            };
            let result =
              api::triage(&request).await;
            if !tracker
              .borrow()
              .is_current(ticket)
            {
              tracing::debug!(
                generation =
                  ticket.generation(),
                "discarding superseded \
                 triage response"
              );
              return;
            }

            loading.set(false);
            match result {
              | Ok(triage) => {
                view.set(TriageView::Done {
                  message: text,
                  triage
                });
              }
              | Err(err) => {
                tracing::warn!(
                  error = %err,
                  "triage error"
                );
                view.set(
                  TriageView::Error(
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

  let on_create_ticket = {
    let view = view.clone();
    let notice = notice.clone();
    let tickets = tickets.clone();
    Callback::from(move |_: ()| {
      let TriageView::Done {
        message,
        triage
      } = &*view
      else {
        return;
      };

      let request =
        TicketCreateRequest::from_triage(
          message, triage
        );
      let notice = notice.clone();
      let tickets = tickets.clone();
      wasm_bindgen_futures::spawn_local(
        async move {
          match api::create_ticket(&request)
            .await
          {
            | Ok(created) => {
              tracing::info!(
                ticket_id = %created.ticket_id,
                "ticket created"
              );
              notice.set(
                TicketNotice::Created(
                  created.ticket_id
                )
              );
              reload_tickets(tickets);
            }
            | Err(err) => {
              tracing::warn!(
                error = %err,
                "ticket creation error"
              );
              notice.set(
                TicketNotice::Error(
                  err.user_message()
                )
              );
            }
          }
        }
      );
    })
  };

  html! {
      <div class="triage-page">
          <form class="triage-form" onsubmit={on_submit}>
              <textarea
                  id="messageInput"
                  rows="5"
                  placeholder="Paste a customer message"
                  value={(*message).clone()}
                  oninput={on_input}
              />
              <button type="submit" class="btn">{ "Triage" }</button>
          </form>
          {
              if *loading {
                  html! { <div class="loading">{ "Classifying..." }</div> }
              } else {
                  html! {}
              }
          }
          <div id="triageResult">
              {
                  match &*view {
                      TriageView::Idle => html! {},
                      TriageView::Done { triage, .. } => html! {
                          <TriageCard
                              triage={triage.clone()}
                              on_create_ticket={on_create_ticket.clone()}
                          />
                      },
                      TriageView::Error(message) => html! {
                          <div class="error-message">{ message.clone() }</div>
                      },
                  }
              }
              {
                  match &*notice {
                      TicketNotice::None => html! {},
                      TicketNotice::Created(id) => html! {
                          <div class="ticket-notice">{ format!("Ticket {id} created") }</div>
                      },
                      TicketNotice::Error(message) => html! {
                          <div class="error-message">{ message.clone() }</div>
                      },
                  }
              }
          </div>
          <TicketTable tickets={(*tickets).clone()} />
      </div>
  }
}
