use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

pub const DEFAULT_BASE_URL: &str =
  "http://localhost:8000";

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
  #[default]
  Text,
  Html
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub base_url:             String,
  pub search_limit:         Option<u32>,
  pub collection:           Option<String>,
  pub request_timeout_secs: u64,
  pub color:                bool,
  pub output:               OutputFormat,
  #[serde(skip)]
  pub loaded_file:          Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url:             DEFAULT_BASE_URL
        .to_string(),
      search_limit:         None,
      collection:           None,
      request_timeout_secs: 30,
      color:                true,
      output:               OutputFormat::Text,
      loaded_file:          None
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(
        config_override
      )?
    else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    let path = expand_tilde(&path);
    info!(config = %path.display(), "loading config");
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let mut cfg =
      Self::from_toml_str(&text)
        .with_context(|| {
          format!(
            "invalid config file {}",
            path.display()
          )
        })?;
    cfg.loaded_file = Some(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    text: &str
  ) -> anyhow::Result<Self> {
    let cfg: Config = toml::from_str(text)
      .context("failed to parse TOML")?;
    cfg.validate()?;
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      match key.as_str() {
        | "base_url" => {
          self.base_url = value
        }
        | "search_limit" => {
          self.search_limit =
            parse_optional(&value)
              .map(|v| {
                v.parse::<u32>()
              })
              .transpose()
              .with_context(|| {
                format!(
                  "invalid search_limit: \
                   {value}"
                )
              })?;
        }
        | "collection" => {
          self.collection =
            parse_optional(&value)
              .map(str::to_string)
        }
        | "request_timeout_secs" => {
          self.request_timeout_secs =
            value
              .trim()
              .parse()
              .with_context(|| {
                format!(
                  "invalid \
                   request_timeout_secs: \
                   {value}"
                )
              })?;
        }
        | "color" => {
          self.color = parse_bool(&value)
            .ok_or_else(|| {
              anyhow!(
                "invalid color setting: \
                 {value}"
              )
            })?
        }
        | "output" => {
          self.output =
            match value
              .trim()
              .to_ascii_lowercase()
              .as_str()
            {
              | "text" => {
                OutputFormat::Text
              }
              | "html" => {
                OutputFormat::Html
              }
              | other => bail!(
                "invalid output format: \
                 {other}"
              )
            }
        }
        | other => {
          bail!(
            "unknown config key: {other}"
          )
        }
      }
    }

    self.validate()
  }

  fn validate(
    &self
  ) -> anyhow::Result<()> {
    let base = self.base_url.trim();
    if !(base.starts_with("http://")
      || base.starts_with("https://"))
    {
      bail!(
        "base_url must start with \
         http:// or https://, got: {}",
        self.base_url
      );
    }
    if self.search_limit == Some(0) {
      bail!(
        "search_limit must be positive"
      );
    }
    Ok(())
  }

  /// Absolute URL for an API path such
  /// as `/api/search`.
  pub fn endpoint(
    &self,
    path: &str
  ) -> String {
    format!(
      "{}{}",
      self.base_url.trim().trim_end_matches('/'),
      path
    )
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(env_path) =
    std::env::var("CONVOSEARCH_CONFIG")
  {
    if env_path == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      env_path
    )));
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    debug!(
      "no platform config directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join("convosearch")
    .join("config.toml");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_optional(
  value: &str
) -> Option<&str> {
  let value = value.trim();
  if value.is_empty()
    || value.eq_ignore_ascii_case("none")
  {
    None
  } else {
    Some(value)
  }
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
