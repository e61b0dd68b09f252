use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use chatkit::cleaner::Cleaner;
use chatkit::config::Config;
use chatkit::llm::LlmClient;
use chatkit::store::JsonStore;

#[derive(Parser)]
#[command(
    name = "chatkit",
    about = "Chat-completion client, JSON store and text cleaner"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt to the model and print the reply
    Ask {
        prompt: String,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Read the API key from this file
        #[arg(long)]
        key_file: Option<PathBuf>,
    },
    /// Normalize text: expand abbreviations and collapse laughter
    Clean {
        text: String,

        /// Only collapse laughter, skip abbreviation expansion
        #[arg(long)]
        laughter_only: bool,
    },
    /// Inspect or edit a JSON document file
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Print the document
    Show { path: PathBuf },
    /// Set a top-level key. The value is parsed as JSON, or stored as a string.
    Set {
        path: PathBuf,
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.config.as_deref() {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(),
    };

    match cli.command {
        Commands::Ask {
            prompt,
            model,
            key_file,
        } => ask(config, &prompt, model, key_file).await?,
        Commands::Clean {
            text,
            laughter_only,
        } => clean(config, &text, laughter_only)?,
        Commands::Store { action } => match action {
            StoreAction::Show { path } => store_show(path)?,
            StoreAction::Set { path, key, value } => store_set(path, key, &value)?,
        },
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn ask(
    config: Config,
    prompt: &str,
    model: Option<String>,
    key_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut llm = config.llm;
    if let Some(key_file) = key_file {
        llm.key_file = key_file;
        llm.api_key = None;
    }

    let mut client = LlmClient::from_config(&llm)?;
    if let Some(model) = model {
        client.set_model(model);
    }

    let reply = client.invoke(prompt).await?;
    println!("{reply}");
    Ok(())
}

fn clean(config: Config, text: &str, laughter_only: bool) -> anyhow::Result<()> {
    let cleaner = Cleaner::new(config.cleaner).context("Invalid abbreviation table")?;
    let cleaned = if laughter_only {
        cleaner.clean_laughter(text)
    } else {
        cleaner.clean_text(text)
    };
    println!("{cleaned}");
    Ok(())
}

fn store_show(path: PathBuf) -> anyhow::Result<()> {
    let store = JsonStore::new(path);
    let data = store
        .load()
        .with_context(|| format!("Failed to load {}", store.path().display()))?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

fn store_set(path: PathBuf, key: String, value: &str) -> anyhow::Result<()> {
    let store = JsonStore::new(path);
    let mut data = store
        .load()
        .with_context(|| format!("Failed to load {}", store.path().display()))?;

    let Value::Object(map) = &mut data else {
        bail!("{} does not hold a JSON object", store.path().display());
    };

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    tracing::info!("Setting '{key}' in {}", store.path().display());
    map.insert(key, value);

    store
        .save(&data)
        .with_context(|| format!("Failed to save {}", store.path().display()))?;
    Ok(())
}
