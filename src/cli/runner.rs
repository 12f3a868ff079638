//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{TapConfig, DEFAULT_BASE_URL, DEFAULT_US_PROD_SLO_ID};
use crate::engine::{Message, MessageSink, SyncConfig, SyncEngine};
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::state::StateManager;
use crate::streams::{discover, select};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{error, info, warn};

/// Endpoint that validates the API key
const VALIDATE_PATH: &str = "/api/v1/validate";

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read {
                streams,
                state_per_page,
            } => self.read(streams.as_deref(), *state_per_page).await,
        }
    }

    /// Load configuration
    pub fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }

        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "No config given (use --config or --config-json)",
            )),
        }
    }

    /// Load state
    pub fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec(&self) -> Result<()> {
        self.output_message(&config_spec())
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = HttpClient::from_tap_config(&config)?;

        info!(base_url = %config.base_url, "Checking connection");

        let status = match client.get(VALIDATE_PATH).await {
            Ok(_) => json!({
                "status": "SUCCEEDED",
                "message": "Connection successful"
            }),
            Err(e) => {
                warn!(error = %e, "Connection check failed");
                json!({
                    "status": "FAILED",
                    "message": format!("Connection failed: {e}")
                })
            }
        };

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }))
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let config = self.load_config()?;

        let streams: Vec<Value> = discover(&config)
            .iter()
            .map(crate::streams::StreamDescriptor::catalog_entry)
            .collect();

        self.output_message(&json!({ "streams": streams }))
    }

    /// Read data
    async fn read(&self, streams: Option<&str>, state_per_page: bool) -> Result<()> {
        let sync_start = Instant::now();
        let config = self.load_config()?;
        let state = self.load_state()?;

        let selected = select(discover(&config), &parse_stream_list(streams))?;
        let client = HttpClient::from_tap_config(&config)?;

        let sync_config = SyncConfig::new()
            .with_start_date(config.start_date.clone())
            .with_state_per_page(state_per_page);
        let mut engine = SyncEngine::new(client, state).with_config(sync_config);

        let mut sink = StdoutSink { runner: self };
        let mut failed = Vec::new();
        for stream in &selected {
            match engine.sync_stream(stream, &mut sink).await {
                Ok(()) => {}
                // Bad configuration fails every stream the same way
                Err(e) if e.is_config() => return Err(e),
                Err(e) => {
                    error!(stream = %stream.name, error = %e, "Error syncing stream");
                    engine.record_error();
                    failed.push(stream.name.clone());
                }
            }
        }

        if let Some(state_path) = &self.cli.state {
            engine
                .state()
                .save_to_file(state_path)
                .await
                .context("Failed to save final state")?;
        }

        let stats = engine.stats();
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = sync_start.elapsed().as_millis() as u64;
        info!(
            streams = stats.streams_synced,
            failed = stats.errors,
            pages = stats.pages_fetched,
            records = stats.records_synced,
            duration_ms,
            "Sync finished"
        );

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "{} stream(s) failed: {}",
                failed.len(),
                failed.join(", ")
            )))
        }
    }

    /// Render a JSON value in the selected output format
    pub fn render(&self, msg: &Value) -> Result<String> {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        Ok(rendered)
    }

    /// Output a JSON message to stdout
    fn output_message(&self, msg: &Value) -> Result<()> {
        println!("{}", self.render(msg)?);
        Ok(())
    }

    /// Output a Singer message to stdout
    fn output_engine_message(&self, msg: &Message) -> Result<()> {
        self.output_message(&msg.to_json()?)
    }
}

/// Writes each Singer message to stdout as soon as the engine emits it
struct StdoutSink<'a> {
    runner: &'a Runner,
}

impl MessageSink for StdoutSink<'_> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.runner.output_engine_message(&message)
    }
}

/// Split a `--streams a,b` list, dropping blanks
pub fn parse_stream_list(streams: Option<&str>) -> Vec<String> {
    streams
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// JSON schema of the config file
pub fn config_spec() -> Value {
    json!({
        "type": "SPEC",
        "spec": {
            "documentationUrl": "https://docs.datadoghq.com/api/latest/",
            "connectionSpecification": {
                "type": "object",
                "title": "tap-datadog",
                "required": ["api_key", "app_key"],
                "properties": {
                    "api_key": {"type": "string", "secret": true},
                    "app_key": {"type": "string", "secret": true},
                    "start_date": {
                        "type": "string",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
                        "description": "First day to sync when a stream has no bookmark"
                    },
                    "base_url": {"type": "string", "default": DEFAULT_BASE_URL},
                    "slo_ids": {
                        "type": "object",
                        "properties": {
                            "us_prod": {"type": "string", "default": DEFAULT_US_PROD_SLO_ID},
                            "eu_prod": {"type": "string"},
                            "ca_prod": {"type": "string"}
                        }
                    },
                    "metric_query": {"type": "string"},
                    "log_query": {"type": "string"},
                    "log_hosts": {"type": "array", "items": {"type": "string"}},
                    "window_anchor": {
                        "type": "string",
                        "enum": ["month_start", "rolling"],
                        "default": "month_start"
                    },
                    "timeout_seconds": {"type": "integer", "default": 30},
                    "max_retries": {"type": "integer", "default": 5},
                    "requests_per_second": {"type": ["integer", "null"], "default": 10},
                    "user_agent": {"type": "string"}
                }
            }
        }
    })
}
