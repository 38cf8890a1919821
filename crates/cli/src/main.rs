//! Dialogflow CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration**: read `DIALOGFLOW_KEY`, `DIALOGFLOW_PROJECT_NAME`
//!    and `DIALOGFLOW_LANGUAGE_CODE`, then apply command-line overrides.
//! 2. **Wire observability**: configure `tracing-subscriber` (plain or JSON)
//!    on stderr, filtered by `RUST_LOG`.
//! 3. **Construct infrastructure**: pick a token source, build the REST
//!    sessions factory, and inject it into [`Dialogflow`].
//! 4. **Run one query**: print the fulfillment text, or the full query
//!    result with `--json`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dialogflow::{Dialogflow, DialogflowConfig};
use dialogflow_rest::{
    CredentialTokenSource, RestSessionsClientFactory, StaticTokenSource, TokenSource,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Send one text query to a Dialogflow agent.
#[derive(Debug, Parser)]
#[command(name = "dialogflow", version)]
struct Cli {
    /// Text to send to the agent.
    text: String,

    /// Credential as JSON text or a path (overrides DIALOGFLOW_KEY).
    #[arg(long)]
    key: Option<String>,

    /// Google Cloud project of the agent (overrides DIALOGFLOW_PROJECT_NAME).
    #[arg(long)]
    project_name: Option<String>,

    /// Query language (overrides DIALOGFLOW_LANGUAGE_CODE).
    #[arg(long)]
    language_code: Option<String>,

    /// Reuse a conversation instead of starting a new one.
    #[arg(long)]
    session_id: Option<String>,

    /// Extra payload argument; may be repeated.
    #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    optional_args: Vec<(String, String)>,

    /// Pre-issued OAuth2 access token; otherwise one is derived from the credential.
    #[arg(long, env = "DIALOGFLOW_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// API endpoint override.
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Print the full query result as JSON.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty key in `{raw}`"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> DialogflowConfig {
    let mut config = DialogflowConfig::from_env();
    if let Some(key) = &cli.key {
        config.key = Some(key.clone());
    }
    if let Some(project_name) = &cli.project_name {
        config.project_name = Some(project_name.clone());
    }
    if let Some(language_code) = &cli.language_code {
        config.language_code = Some(language_code.clone());
    }
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(&cli);

    let token_source: Arc<dyn TokenSource> = match &cli.access_token {
        Some(token) => Arc::new(StaticTokenSource::new(token.clone())),
        None => Arc::new(CredentialTokenSource::default()),
    };
    let mut sessions = RestSessionsClientFactory::builder(token_source);
    if let Some(endpoint) = &cli.endpoint {
        sessions = sessions.endpoint(endpoint.clone());
    }
    if let Some(seconds) = cli.timeout {
        sessions = sessions.timeout(Duration::from_secs(seconds));
    }

    let sessions = Arc::new(sessions.build());
    debug!(endpoint = sessions.endpoint(), "sessions factory ready");

    let mut dialogflow = Dialogflow::from_config(sessions, config)
        .context("failed to load the Dialogflow credential")?;
    if let Some(session_id) = &cli.session_id {
        dialogflow.set_session_id(session_id.clone());
    }
    dialogflow.set_optional_args(cli.optional_args.clone());

    let reply = dialogflow
        .fetch(Some(cli.text.as_str()))
        .await
        .context("intent detection failed")?;

    if cli.json {
        let result = dialogflow.to_json().unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{reply}");
    }
    Ok(())
}
