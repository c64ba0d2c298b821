use convosearch_shared::{
    BotAnswer, ChatBody, ChatEntry, ChatLog, DateFilter, DispatchError, DispatchTicket,
    DispatchTracker, FilterController, FilterOutcome, FilterState, QueryRequest, QueryResponse,
    SearchRequest, SearchResults,
};
use tracing::{debug, error, info, warn};

use crate::client::SearchBackend;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SessionMode {
    /// Each line is a search; results replace the previous ones.
    Search,
    /// Each line is a question; answers are appended to the history.
    Chat,
}

/// Something a dispatch produced for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Results(SearchResults),
    SearchError(String),
    /// A question and the reply it received.
    Exchange { question: ChatEntry, reply: ChatEntry },
}

impl View {
    pub fn is_failure(&self) -> bool {
        match self {
            View::Results(_) => false,
            View::SearchError(_) => true,
            View::Exchange { reply, .. } => matches!(reply.body, ChatBody::Error(_)),
        }
    }
}

/// Owns everything the page kept in globals: filter controller, last input,
/// dispatch generations and the chat history.
pub struct Session<B> {
    backend: B,
    mode: SessionMode,
    controller: FilterController,
    tracker: DispatchTracker,
    chat: ChatLog,
    categories: Vec<String>,
    last_input: String,
    search_limit: Option<u32>,
    collection: Option<String>,
}

impl<B: SearchBackend> Session<B> {
    pub fn new(backend: B, mode: SessionMode, cfg: &Config) -> Self {
        Self {
            backend,
            mode,
            controller: FilterController::new(),
            tracker: DispatchTracker::default(),
            chat: ChatLog::default(),
            categories: Vec::new(),
            last_input: String::new(),
            search_limit: cfg.search_limit,
            collection: cfg.collection.clone(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn filters(&self) -> &FilterState {
        self.controller.state()
    }

    pub fn controller(&self) -> &FilterController {
        &self.controller
    }

    pub fn chat_log(&self) -> &ChatLog {
        &self.chat
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Fetches the category list once. Failure leaves only `all` usable.
    #[tracing::instrument(skip(self))]
    pub async fn load_categories(&mut self) -> &[String] {
        match self.backend.categories().await {
            Ok(categories) => {
                info!(count = categories.len(), "loaded categories");
                self.categories = categories;
            }
            Err(err) => {
                error!(error = %err, "error loading categories");
                self.categories.clear();
            }
        }
        &self.categories
    }

    /// Records `text` as the current input and dispatches it.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&mut self, text: &str) -> Option<View> {
        self.last_input = text.to_string();
        self.requery().await
    }

    pub async fn set_category(&mut self, value: &str) -> Option<View> {
        if !self.categories.is_empty()
            && value != convosearch_shared::ALL
            && !self.categories.iter().any(|c| c == value)
        {
            warn!(category = %value, "category is not in the loaded list");
        }
        let outcome = self.controller.set_category(value);
        self.after_change(outcome).await
    }

    pub async fn set_date(&mut self, date: DateFilter) -> Option<View> {
        let outcome = self.controller.set_date(date);
        self.after_change(outcome).await
    }

    pub async fn set_start_date(&mut self, value: &str) -> Option<View> {
        let outcome = self.controller.set_start_input(value);
        self.after_change(outcome).await
    }

    pub async fn set_end_date(&mut self, value: &str) -> Option<View> {
        let outcome = self.controller.set_end_input(value);
        self.after_change(outcome).await
    }

    /// Resets every filter, then re-runs the last input if there is one.
    pub async fn clear_filters(&mut self) -> Option<View> {
        let outcome = self.controller.clear();
        self.after_change(outcome).await
    }

    /// Runs the last input again under the current filters. Blank input
    /// dispatches nothing.
    pub async fn requery(&mut self) -> Option<View> {
        match self.mode {
            SessionMode::Search => {
                let (ticket, request) = self.begin_search()?;
                let result = self.backend.search(&request).await;
                self.finish_search(ticket, result)
            }
            SessionMode::Chat => {
                let request = self.question_request()?;
                let question = ChatEntry::question(request.question.clone());
                self.chat.push(question.clone());
                let result = self.backend.ask(&request).await;
                Some(self.finish_question(question, result))
            }
        }
    }

    /// Takes a ticket and builds the search body for the current input.
    pub fn begin_search(&mut self) -> Option<(DispatchTicket, SearchRequest)> {
        let request = self
            .controller
            .state()
            .search_request(&self.last_input, self.search_limit)?;
        let ticket = self.tracker.begin();
        debug!(generation = ticket.generation(), "search dispatched");
        Some((ticket, request))
    }

    /// Turns a search result into a view, unless a newer search has been
    /// dispatched since `ticket` was taken.
    pub fn finish_search(
        &mut self,
        ticket: DispatchTicket,
        result: Result<SearchResults, DispatchError>,
    ) -> Option<View> {
        if !self.tracker.is_current(ticket) {
            debug!(
                generation = ticket.generation(),
                "discarding superseded search response"
            );
            return None;
        }

        match result {
            Ok(results) => Some(View::Results(results)),
            Err(err) => {
                warn!(error = %err, "search error");
                Some(View::SearchError(err.user_message()))
            }
        }
    }

    fn question_request(&self) -> Option<QueryRequest> {
        self.controller
            .state()
            .question_request(&self.last_input, self.collection.as_deref())
    }

    fn finish_question(
        &mut self,
        question: ChatEntry,
        result: Result<QueryResponse, DispatchError>,
    ) -> View {
        let reply = match result {
            Ok(response) => ChatEntry::answer(
                question.id,
                BotAnswer::new(response, self.controller.state().clone()),
            ),
            Err(err) => {
                warn!(error = %err, "question error");
                ChatEntry::error(question.id, err.user_message())
            }
        };
        self.chat.push(reply.clone());
        View::Exchange { question, reply }
    }

    async fn after_change(&mut self, outcome: FilterOutcome) -> Option<View> {
        if outcome.requery() {
            self.requery().await
        } else {
            None
        }
    }
}
