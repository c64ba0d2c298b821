mod chat;
mod filters;
mod search;
mod triage;

use yew::{
  Html,
  function_component,
  html
};
use yew_router::prelude::{
  BrowserRouter,
  Link,
  Routable,
  Switch
};

pub use self::chat::ChatPage;
pub use self::filters::FilterEvent;
pub use self::search::SearchPage;
pub use self::triage::TriagePage;

#[derive(
  Clone, Routable, PartialEq, Debug,
)]
pub enum Route {
  #[at("/")]
  Search,
  #[at("/chat")]
  Chat,
  #[at("/triage")]
  Triage,
  #[not_found]
  #[at("/404")]
  NotFound
}

fn switch(route: Route) -> Html {
  tracing::debug!(
    ?route,
    "route changed"
  );
  match route {
    | Route::Search => {
      html! { <SearchPage /> }
    }
    | Route::Chat => {
      html! { <ChatPage /> }
    }
    | Route::Triage => {
      html! { <TriagePage /> }
    }
    | Route::NotFound => html! {
        <div class="panel">
            <div class="header">{ "Not found" }</div>
            <Link<Route> to={Route::Search}>{ "Back to search" }</Link<Route>>
        </div>
    }
  }
}

#[function_component(App)]
pub fn app() -> Html {
  html! {
      <BrowserRouter>
          <nav class="top-nav">
              <span class="brand">{ "ConvoSearch" }</span>
              <Link<Route> to={Route::Search}>{ "Search" }</Link<Route>>
              <Link<Route> to={Route::Chat}>{ "Chat" }</Link<Route>>
              <Link<Route> to={Route::Triage}>{ "Triage" }</Link<Route>>
          </nav>
          <main>
              <Switch<Route> render={switch} />
          </main>
      </BrowserRouter>
  }
}
