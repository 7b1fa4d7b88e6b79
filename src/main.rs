mod api;
mod commands;
mod config;
mod context;
mod navigation;
mod session;
mod util;
mod view;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::client::ApiClient;
use crate::api::error::Error;
use crate::commands::terminal::{parse_answer, run_interactive, run_scripted, Screens};
use crate::config::Config;
use crate::context::store::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::navigation::{Location, Navigator};
use crate::session::SurveyPage;

/// Terminal client for answering a survey and submitting its votes.
#[derive(Debug, Parser)]
#[command(name = "survey-vote", version, about)]
struct Cli {
  /// Location to open, e.g. "/surveys/3?source=qr&country=BR"
  #[arg(long, default_value = "/")]
  path: String,

  /// Browser user agent reported with each vote
  #[arg(long, env = "SURVEY_USER_AGENT")]
  user_agent: Option<String>,

  /// Answer as <question>=<option>; submits once and exits
  #[arg(long = "answer", value_parser = parse_answer)]
  answers: Vec<(u64, u64)>,

  /// Keep the source context in memory only
  #[arg(long)]
  ephemeral: bool,

  /// Overrides SURVEY_API_URL
  #[arg(long)]
  api_url: Option<String>,

  /// Overrides SURVEY_DATA_DIR
  #[arg(long)]
  data_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  match run(cli).await {
    Ok(true) => ExitCode::SUCCESS,
    Ok(false) => ExitCode::from(1),
    Err(err) => {
      error!("{err}");
      ExitCode::from(2)
    }
  }
}

async fn run(cli: Cli) -> Result<bool, Error> {
  let mut config = Config::load()?;
  if let Some(raw) = &cli.api_url {
    config.api_base_url = Config::normalize_base_url(raw)?;
  }
  if let Some(dir) = &cli.data_dir {
    config.data_dir = dir.clone();
  }

  let api = ApiClient::new(&config)?;
  let navigator = Navigator::new(Location::parse(&cli.path));
  info!(
    "Opening {} against {}",
    navigator.current().path(),
    config.api_base_url
  );

  if cli.ephemeral {
    drive(api, MemoryStore::default(), &navigator, &cli).await
  } else {
    let store = JsonFileStore::new(&config.data_dir);
    info!("Source context stored under {}", store.root().display());
    drive(api, store, &navigator, &cli).await
  }
}

async fn drive<S: KeyValueStore>(
  api: ApiClient,
  store: S,
  navigator: &Navigator,
  cli: &Cli,
) -> Result<bool, Error> {
  let screens = Screens::new()?;
  let mut page = SurveyPage::new(api, store, navigator, cli.user_agent.clone());
  let mut stdout = io::stdout();

  if cli.answers.is_empty() {
    let stdin = io::stdin();
    run_interactive(&mut page, navigator, &screens, stdin.lock(), &mut stdout).await?;
    Ok(true)
  } else {
    run_scripted(&mut page, &screens, &cli.answers, &mut stdout).await
  }
}
