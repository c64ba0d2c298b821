mod api;
mod app;
mod components;

fn main() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    version = env!("CARGO_PKG_VERSION"),
    "starting ConvoSearch frontend"
  );

  match gloo::utils::document()
    .get_element_by_id("app")
  {
    | Some(root) => {
      yew::Renderer::<app::App>::with_root(
        root
      )
      .render();
    }
    | None => {
      tracing::warn!(
        "no #app element, mounting on \
         body"
      );
      yew::Renderer::<app::App>::new()
        .render();
    }
  }
}
