use std::rc::Rc;

use convosearch_shared::{
  BotAnswer,
  ChatEntry,
  ChatLog,
  FilterState
};
use yew::{
  Callback,
  Html,
  Reducible,
  TargetCast,
  function_component,
  html,
  use_effect_with,
  use_node_ref,
  use_reducer,
  use_state
};

use super::filters::{
  use_categories,
  use_filter_controls
};
use crate::api;
use crate::components::{
  ChatMessage,
  FilterBar
};

/// Conversation shown on the chat page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatHistory(ChatLog);

pub enum ChatAction {
  Push(ChatEntry)
}

impl Reducible for ChatHistory {
  type Action = ChatAction;

  fn reduce(
    self: Rc<Self>,
    action: Self::Action
  ) -> Rc<Self> {
    let mut log = self.0.clone();
    match action {
      | ChatAction::Push(entry) => {
        log.push(entry)
      }
    }
    Rc::new(Self(log))
  }
}

#[function_component(ChatPage)]
pub fn chat_page() -> Html {
  let categories = use_categories();
  let history =
    use_reducer(ChatHistory::default);
  let input = use_state(String::new);
  let last_question =
    use_state(String::new);
  let chat_box = use_node_ref();

  let ask = {
    let history = history.clone();
    Callback::from(
      move |(text, filters): (
        String,
        FilterState
      )| {
        let Some(request) = filters
          .question_request(&text, None)
        else {
          return;
        };

        let question =
          ChatEntry::question(text.trim());
        let question_id = question.id;
        history.dispatch(ChatAction::Push(
          question
        ));

        let dispatcher =
          history.dispatcher();
        wasm_bindgen_futures::spawn_local(
          async move {
            let reply =
              match api::ask(&request).await
              {
                | Ok(response) => {
                  ChatEntry::answer(
                    question_id,
                    BotAnswer::new(
                      response, filters
                    )
                  )
                }
                | Err(err) => {
                  tracing::warn!(
                    error = %err,
                    "question failed"
                  );
                  ChatEntry::error(
                    question_id,
                    err.user_message()
                  )
                }
              };
            dispatcher
              .dispatch(ChatAction::Push(reply));
          }
        );
      }
    )
  };

  let controls = {
    let last_question =
      last_question.clone();
    let ask = ask.clone();
    use_filter_controls(Callback::from(
      move |filters: FilterState| {
        ask.emit((
          (*last_question).clone(),
          filters
        ));
      }
    ))
  };

  {
    let chat_box = chat_box.clone();
    use_effect_with(
      history.0.len(),
      move |_| {
        if let Some(element) =
          chat_box.cast::<web_sys::Element>()
        {
          element.set_scroll_top(
            element.scroll_height()
          );
        }
        || ()
      }
    );
  }

  let on_input = {
    let input = input.clone();
    Callback::from(
      move |e: web_sys::InputEvent| {
        let field: web_sys::HtmlInputElement =
          e.target_unchecked_into();
        input.set(field.value());
      }
    )
  };

  let on_submit = {
    let input = input.clone();
    let last_question =
      last_question.clone();
    let controller =
      controls.controller.clone();
    let ask = ask.clone();
    Callback::from(
      move |e: web_sys::SubmitEvent| {
        e.prevent_default();
        let text = (*input).clone();
        if text.trim().is_empty() {
          return;
        }
        last_question.set(text.clone());
        input.set(String::new());
        ask.emit((
          text,
          controller.state().clone()
        ));
      }
    )
  };

  let thinking =
    history.0.pending_count() > 0;

  html! {
      <div class="chat-page">
          <FilterBar
              controller={(*controls.controller).clone()}
              categories={(*categories).clone()}
              on_change={controls.on_change.clone()}
          />
          <div id="chatBox" class="chat-box" ref={chat_box}>
              {
                  for history.0.entries().iter().map(|entry| html! {
                      <ChatMessage
                          key={entry.id.to_string()}
                          entry={entry.clone()}
                          on_filter={controls.on_change.clone()}
                      />
                  })
              }
              {
                  if thinking {
                      html! { <div class="message bot-message thinking">{ "Thinking..." }</div> }
                  } else {
                      html! {}
                  }
              }
          </div>
          <form class="chat-form" onsubmit={on_submit}>
              <input
                  id="questionInput"
                  type="text"
                  placeholder="Ask a question"
                  value={(*input).clone()}
                  oninput={on_input}
              />
              <button type="submit" class="btn">{ "Send" }</button>
          </form>
      </div>
  }
}

#[cfg(test)]
mod tests {
  use convosearch_shared::{
    ChatBody,
    QueryResponse
  };

  use super::*;

  fn reduce(
    history: Rc<ChatHistory>,
    entry: ChatEntry
  ) -> Rc<ChatHistory> {
    history.reduce(ChatAction::Push(entry))
  }

  #[test]
  fn replies_are_appended_after_their_question()
  {
    let question =
      ChatEntry::question("refunds?");
    let id = question.id;
    let history = reduce(
      Rc::new(ChatHistory::default()),
      question
    );
    assert_eq!(history.0.pending_count(), 1);

    let answer = ChatEntry::answer(
      id,
      BotAnswer::new(
        QueryResponse {
          answer:     "Five days."
            .to_string(),
          sources:    Vec::new(),
          confidence: 0.5
        },
        FilterState::default()
      )
    );
    let history = reduce(history, answer);

    assert_eq!(history.0.len(), 2);
    assert_eq!(history.0.pending_count(), 0);
    assert!(matches!(
      history.0.last().map(|e| &e.body),
      Some(ChatBody::Answer(_))
    ));
  }
}
