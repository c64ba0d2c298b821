use convosearch_shared::dispatch::{
    CATEGORIES_FAILED, QUESTION_FAILED, SEARCH_FAILED, TICKET_FAILED, TICKETS_FAILED,
    TRIAGE_FAILED, decode_body, status_failure,
};
use convosearch_shared::{
    CATEGORIES_PATH, CategoriesResponse, DispatchError, QUERY_PATH, QueryRequest, QueryResponse,
    SEARCH_PATH, SearchRequest, SearchResponse, SearchResults, TICKETS_PATH, TRIAGE_PATH,
    TicketCreateRequest, TicketCreateResponse, TicketList, TriageRequest, TriageResponse,
};
use gloo::net::http::{Request, Response};
use serde::{Serialize, de::DeserializeOwned};

pub async fn fetch_categories() -> Result<Vec<String>, DispatchError> {
    get_json::<CategoriesResponse>(CATEGORIES_PATH, CATEGORIES_FAILED)
        .await?
        .into_result()
}

pub async fn search(request: &SearchRequest) -> Result<SearchResults, DispatchError> {
    post_json::<_, SearchResponse>(SEARCH_PATH, request, SEARCH_FAILED)
        .await?
        .into_result()
}

pub async fn ask(request: &QueryRequest) -> Result<QueryResponse, DispatchError> {
    post_json(QUERY_PATH, request, QUESTION_FAILED).await
}

pub async fn triage(request: &TriageRequest) -> Result<TriageResponse, DispatchError> {
    post_json(TRIAGE_PATH, request, TRIAGE_FAILED).await
}

pub async fn create_ticket(
    request: &TicketCreateRequest,
) -> Result<TicketCreateResponse, DispatchError> {
    post_json(TICKETS_PATH, request, TICKET_FAILED).await
}

pub async fn list_tickets() -> Result<TicketList, DispatchError> {
    get_json(TICKETS_PATH, TICKETS_FAILED).await
}

async fn get_json<T: DeserializeOwned>(path: &str, fallback: &str) -> Result<T, DispatchError> {
    let response = Request::get(path)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| DispatchError::Transport(format!("GET {path}: {e}")))?;
    read_json(response, fallback).await
}

async fn post_json<B, T>(path: &str, body: &B, fallback: &str) -> Result<T, DispatchError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = Request::post(path)
        .header("Accept", "application/json")
        .json(body)
        .map_err(|e| DispatchError::Transport(format!("failed to encode body: {e}")))?
        .send()
        .await
        .map_err(|e| DispatchError::Transport(format!("POST {path}: {e}")))?;
    read_json(response, fallback).await
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, DispatchError> {
    let status = response.status();
    let ok = response.ok();
    let body = response
        .text()
        .await
        .map_err(|e| DispatchError::Transport(format!("failed to read body: {e}")))?;

    if !ok {
        return Err(status_failure(status, &body, fallback));
    }
    decode_body(&body, fallback)
}
