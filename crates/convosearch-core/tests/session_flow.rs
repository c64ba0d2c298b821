use std::cell::RefCell;

use convosearch_core::client::SearchBackend;
use convosearch_core::commands::{LineOutcome, run_chat_line};
use convosearch_core::config::Config;
use convosearch_core::render::Renderer;
use convosearch_core::session::{Session, SessionMode, View};
use convosearch_shared::{
    ChatBody, DateFilter, DispatchError, EchoedFilters, HealthResponse, QueryRequest,
    QueryResponse, SearchHit, SearchRequest, SearchResults, TicketCreateRequest,
    TicketCreateResponse, TicketList, TriageRequest, TriageResponse,
};

struct FakeBackend {
    categories: Result<Vec<String>, DispatchError>,
    search_result: Result<SearchResults, DispatchError>,
    answer: Result<QueryResponse, DispatchError>,
    searches: RefCell<Vec<SearchRequest>>,
    questions: RefCell<Vec<QueryRequest>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            categories: Ok(vec!["finance".to_string(), "shipping".to_string()]),
            search_result: Ok(SearchResults {
                hits: vec![SearchHit {
                    content: "Refunds take five days".to_string(),
                    source: "refund_policy.md".to_string(),
                    confidence: Some(0.8),
                }],
                filters: EchoedFilters::default(),
            }),
            answer: Ok(QueryResponse {
                answer: "Within five business days.".to_string(),
                sources: vec!["refund_policy.md".to_string()],
                confidence: 0.873,
            }),
            searches: RefCell::new(Vec::new()),
            questions: RefCell::new(Vec::new()),
        }
    }

    fn search_count(&self) -> usize {
        self.searches.borrow().len()
    }

    fn last_search(&self) -> SearchRequest {
        self.searches.borrow().last().cloned().expect("a search was sent")
    }
}

impl SearchBackend for FakeBackend {
    async fn categories(&self) -> Result<Vec<String>, DispatchError> {
        self.categories.clone()
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResults, DispatchError> {
        self.searches.borrow_mut().push(request.clone());
        self.search_result.clone()
    }

    async fn ask(&self, request: &QueryRequest) -> Result<QueryResponse, DispatchError> {
        self.questions.borrow_mut().push(request.clone());
        self.answer.clone()
    }

    async fn triage(&self, _request: &TriageRequest) -> Result<TriageResponse, DispatchError> {
        Err(DispatchError::Application("not used".to_string()))
    }

    async fn create_ticket(
        &self,
        _request: &TicketCreateRequest,
    ) -> Result<TicketCreateResponse, DispatchError> {
        Err(DispatchError::Application("not used".to_string()))
    }

    async fn list_tickets(&self) -> Result<TicketList, DispatchError> {
        Err(DispatchError::Application("not used".to_string()))
    }

    async fn health(&self) -> Result<HealthResponse, DispatchError> {
        Err(DispatchError::Application("not used".to_string()))
    }
}

fn search_session() -> Session<FakeBackend> {
    Session::new(FakeBackend::new(), SessionMode::Search, &Config::default())
}

#[tokio::test]
async fn blank_input_never_dispatches() {
    let mut session = search_session();

    assert!(session.submit("").await.is_none());
    assert!(session.submit("   ").await.is_none());
    assert!(session.set_category("finance").await.is_none());
    assert!(session.clear_filters().await.is_none());

    assert_eq!(session.backend().search_count(), 0);
}

#[tokio::test]
async fn category_change_reruns_current_query() {
    let mut session = search_session();
    let view = session.submit("refunds").await;
    assert!(matches!(view, Some(View::Results(_))));

    let view = session.set_category("finance").await;
    assert!(matches!(view, Some(View::Results(_))));

    let body = serde_json::to_value(session.backend().last_search()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "query": "refunds",
            "category_filter": "finance",
            "date_filter": "all"
        })
    );
    assert_eq!(session.backend().search_count(), 2);
}

#[tokio::test]
async fn custom_range_waits_for_both_dates() {
    let mut session = search_session();
    session.submit("refunds").await;
    assert_eq!(session.backend().search_count(), 1);

    assert!(session.set_date(DateFilter::Custom).await.is_none());
    assert!(session.set_start_date("2024-01-01").await.is_none());
    assert_eq!(session.backend().search_count(), 1);

    assert!(session.set_end_date("2024-01-31").await.is_some());
    assert_eq!(session.backend().search_count(), 2);

    let last = session.backend().last_search();
    assert_eq!(last.date_filter, "custom");
    assert_eq!(last.start_date.as_deref(), Some("2024-01-01"));
    assert_eq!(last.end_date.as_deref(), Some("2024-01-31"));

    assert!(session.set_date(DateFilter::Week).await.is_some());
    let last = session.backend().last_search();
    assert_eq!(last.date_filter, "week");
    assert_eq!(last.start_date, None);
    assert_eq!(last.end_date, None);
    assert_eq!(session.filters().start_date(), None);
}

#[tokio::test]
async fn clear_filters_reruns_with_defaults() {
    let mut session = search_session();
    session.set_category("shipping").await;
    session.set_date(DateFilter::Month).await;
    session.submit("late parcel").await;
    assert!(session.filters().has_active_filters());

    assert!(session.clear_filters().await.is_some());
    assert!(session.filters().is_default());
    assert!(!session.controller().custom_range_visible());

    let last = session.backend().last_search();
    assert_eq!(last.category_filter, "all");
    assert_eq!(last.date_filter, "all");
}

#[tokio::test]
async fn superseded_search_is_discarded() {
    let mut session = search_session();
    session.submit("refunds").await;

    let (stale, _) = session.begin_search().expect("input is set");
    let (fresh, _) = session.begin_search().expect("input is set");

    let fresh_view = session.finish_search(fresh, Ok(SearchResults::default()));
    let stale_view = session.finish_search(
        stale,
        Err(DispatchError::Transport("connection reset".to_string())),
    );

    assert_eq!(fresh_view, Some(View::Results(SearchResults::default())));
    assert_eq!(stale_view, None);
}

#[tokio::test]
async fn search_failures_become_inline_messages() {
    let mut backend = FakeBackend::new();
    backend.search_result = Err(DispatchError::Transport("connection refused".to_string()));
    let mut session = Session::new(backend, SessionMode::Search, &Config::default());

    let view = session.submit("refunds").await.expect("dispatched");
    assert_eq!(view, View::SearchError("Network error occurred".to_string()));
    assert!(view.is_failure());
}

#[tokio::test]
async fn chat_appends_question_and_answer() {
    let mut cfg = Config::default();
    cfg.collection = Some("faq".to_string());
    let mut session = Session::new(FakeBackend::new(), SessionMode::Chat, &cfg);
    session.set_category("finance").await;

    let Some(View::Exchange { question, reply }) = session.submit("how long do refunds take?").await
    else {
        panic!("expected a chat exchange");
    };

    assert_eq!(reply.reply_to, Some(question.id));
    let ChatBody::Answer(answer) = &reply.body else {
        panic!("expected an answer");
    };
    assert_eq!(answer.filters.category(), "finance");
    assert_eq!(
        convosearch_shared::format::confidence_percent(answer.confidence),
        "87.3%"
    );

    let sent = session.backend().questions.borrow()[0].clone();
    assert_eq!(sent.collection.as_deref(), Some("faq"));
    assert_eq!(sent.category_filter, "finance");

    session.set_date(DateFilter::Today).await;
    assert_eq!(session.chat_log().len(), 4);
    assert_eq!(session.chat_log().pending_count(), 0);
}

#[tokio::test]
async fn chat_failure_is_appended_not_raised() {
    let mut backend = FakeBackend::new();
    backend.answer = Err(DispatchError::Application("Query failed: model offline".to_string()));
    let mut session = Session::new(backend, SessionMode::Chat, &Config::default());

    let view = session.submit("hello?").await.expect("dispatched");
    assert!(view.is_failure());
    assert_eq!(
        session.chat_log().last().map(|entry| entry.body.clone()),
        Some(ChatBody::Error("Query failed: model offline".to_string()))
    );
}

#[tokio::test]
async fn category_load_failure_is_not_fatal() {
    let mut backend = FakeBackend::new();
    backend.categories = Err(DispatchError::Transport("dns".to_string()));
    let mut session = Session::new(backend, SessionMode::Search, &Config::default());

    assert!(session.load_categories().await.is_empty());
    assert!(session.submit("refunds").await.is_some());
}

#[tokio::test]
async fn categories_keep_server_order() {
    let mut session = search_session();
    assert_eq!(
        session.load_categories().await,
        ["finance".to_string(), "shipping".to_string()]
    );
}

#[tokio::test]
async fn interactive_lines_drive_the_controller() {
    let mut cfg = Config::default();
    cfg.color = false;
    let renderer = Renderer::new(&cfg);
    let mut session = search_session();

    for line in ["refunds", ":date custom", ":start 2024-01-01"] {
        let outcome = run_chat_line(&mut session, &renderer, line).await.unwrap();
        assert_eq!(outcome, LineOutcome::Continue);
    }
    assert_eq!(session.backend().search_count(), 1);

    run_chat_line(&mut session, &renderer, ":end 2024-01-31").await.unwrap();
    assert_eq!(session.backend().search_count(), 2);

    run_chat_line(&mut session, &renderer, ":start not-a-date").await.unwrap();
    assert_eq!(session.backend().search_count(), 2);

    let outcome = run_chat_line(&mut session, &renderer, ":quit").await.unwrap();
    assert_eq!(outcome, LineOutcome::Quit);
}
