pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod html;
pub mod render;
pub mod session;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting convosearch CLI"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;
  if let Some(base_url) = cli.base_url
  {
    cfg.apply_overrides([(
      "base_url".to_string(),
      base_url
    )])?;
  }
  if cli.html {
    cfg.output =
      config::OutputFormat::Html;
  }
  debug!(?cfg, "effective config");

  let renderer =
    render::Renderer::new(&cfg);
  let backend =
    client::HttpBackend::new(&cfg)?;

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async \
         runtime"
      )?;

  runtime.block_on(commands::dispatch(
    backend,
    &cfg,
    &renderer,
    cli.command
  ))?;

  info!("done");
  Ok(())
}
