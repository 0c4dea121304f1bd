mod display;
mod ingest;
mod models;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use feedpulse_server::{AppState, analyze::parse_request_date};
use feedpulse_sheets::{Credentials, ServiceAccount, SheetsClient};
use feedpulse_store::{DataSource, HistoryStore};
use tracing::info;

use crate::models::{Classifiers, ModelArgs, TopicMapArgs};

#[derive(Parser)]
#[command(name = "feedpulse", version)]
#[command(about = "Topic-wise sentiment analysis of session feedback")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the dashboards and the JSON analysis routes
    Serve {
        /// Address to listen on
        #[arg(long, env = "FEEDPULSE_BIND", default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        #[command(flatten)]
        history: HistoryArgs,

        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Analyze the responses of one date and print the result
    Analyze {
        /// Date to analyze (YYYY-MM-DD or M/D/YYYY); today reads the live sheet
        #[arg(long)]
        date: String,

        /// Only count responses of this session
        #[arg(long)]
        course: Option<String>,

        /// Print score-based sentiment per topic instead of counts
        #[arg(long)]
        overall: bool,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        history: HistoryArgs,

        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        sheet: SheetArgs,
    },

    /// Classify a response export and append it to the historical dataset
    Ingest {
        /// CSV export with Timestamp, Question 11 and REMARKS columns
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        history: HistoryArgs,

        #[command(flatten)]
        models: ModelArgs,
    },

    /// List topic groups and ids claimed by more than one group
    Topics {
        #[command(flatten)]
        topic_map: TopicMapArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct HistoryArgs {
    /// Historical dataset (CSV of classified responses)
    #[arg(id = "history", long = "history", env = "FEEDPULSE_HISTORY", default_value = "data_q11_topic.csv")]
    path: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct SheetArgs {
    /// Spreadsheet holding today's form responses
    #[arg(long, env = "FEEDPULSE_SHEET_ID")]
    sheet_id: Option<String>,

    #[arg(long, env = "FEEDPULSE_SHEET_RANGE", default_value = "Sheet1")]
    sheet_range: String,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Service-account key file (credentials.json)
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    service_account: Option<PathBuf>,
}

impl SheetArgs {
    fn client(&self) -> anyhow::Result<Option<SheetsClient>> {
        let Some(sheet_id) = self.sheet_id.clone() else {
            return Ok(None);
        };
        let credentials = if let Some(token) = &self.access_token {
            Credentials::Bearer(token.clone())
        } else if let Some(path) = &self.service_account {
            let account = ServiceAccount::from_file(path)
                .with_context(|| format!("loading service account {}", path.display()))?;
            info!(account = account.client_email(), "using service-account credentials");
            Credentials::ServiceAccount(Arc::new(account))
        } else if let Some(key) = &self.api_key {
            Credentials::ApiKey(key.clone())
        } else {
            Credentials::None
        };
        Ok(Some(SheetsClient::new(sheet_id, self.sheet_range.clone(), credentials)))
    }
}

fn build_state(history: &HistoryArgs, models: &ModelArgs, sheet: &SheetArgs) -> anyhow::Result<AppState> {
    let Classifiers {
        topics,
        topic_model,
        sentiment,
    } = Classifiers::load(models)?;

    let mut source = DataSource::new(HistoryStore::new(&history.path));
    match sheet.client()? {
        Some(client) => source = source.with_live(Arc::new(client)),
        None => info!("no sheet configured; today's date will be unavailable"),
    }
    Ok(AppState::new(source, topics, topic_model, sentiment))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    info!("feedpulse v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve {
            bind,
            history,
            models,
            sheet,
        } => {
            let state = build_state(&history, &models, &sheet)?;
            feedpulse_server::serve(state, bind).await?;
        }

        Command::Analyze {
            date,
            course,
            overall,
            json,
            history,
            models,
            sheet,
        } => {
            let date = parse_request_date(Some(&date))?;
            let state = build_state(&history, &models, &sheet)?;
            let analysis = feedpulse_server::analyze(&state, date)
                .await?
                .for_session(course.as_deref());

            if analysis.is_empty() {
                eprintln!("No data found for {date}");
                return Ok(());
            }
            match (overall, json) {
                (true, true) => println!("{}", serde_json::to_string_pretty(&analysis.overall())?),
                (true, false) => display::print_overall(date, &analysis.overall()),
                (false, true) => {
                    println!("{}", serde_json::to_string_pretty(&analysis.summaries())?)
                }
                (false, false) => display::print_summaries(date, analysis.mode, &analysis.summaries()),
            }
        }

        Command::Ingest {
            input,
            history,
            models,
        } => {
            let classifiers = Classifiers::load(&models)?;
            let store = HistoryStore::new(&history.path);
            let stats = tokio::task::spawn_blocking(move || {
                ingest::run_ingest(&input, &store, &classifiers)
            })
            .await
            .context("ingest task panicked")??;
            eprintln!(
                "Appended {}/{} responses to {} in {:.1}s",
                stats.appended,
                stats.total_rows,
                history.path.display(),
                stats.elapsed_secs
            );
        }

        Command::Topics { topic_map } => {
            let topics = topic_map.load()?;
            display::print_topic_groups(&topics);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn topic_map_flag_is_shared() {
        let cli = Cli::try_parse_from(["feedpulse", "topics", "--topic-map", "groups.json"]).unwrap();
        let Command::Topics { topic_map } = cli.command else {
            panic!("expected topics");
        };
        assert_eq!(topic_map.path, Some(PathBuf::from("groups.json")));

        let cli = Cli::try_parse_from(["feedpulse", "serve", "--topic-map", "groups.json"]).unwrap();
        let Command::Serve { models, .. } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(models.topic_map.path, Some(PathBuf::from("groups.json")));
    }

    #[test]
    fn service_account_key_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = SheetArgs {
            sheet_id: Some("abc123".into()),
            sheet_range: "Sheet1".into(),
            api_key: None,
            access_token: None,
            service_account: Some(dir.path().join("missing.json")),
        };
        let err = sheet.client().err().unwrap();
        assert!(err.to_string().contains("missing.json"), "{err}");
    }
}
