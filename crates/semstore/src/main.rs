mod shell;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use semstore_common::{logger, AppConfig, EmbedderKind};
use semstore_vector::{NewDocument, SemanticStore};
use std::path::{Path, PathBuf};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "semstore")]
#[command(about = "SemStore - in-memory semantic document search", long_about = None)]
struct Cli {
    /// Embedding backend (overrides SEMSTORE_EMBEDDER)
    #[arg(long, global = true, value_enum)]
    embedder: Option<EmbedderArg>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum EmbedderArg {
    Ollama,
    Hashing,
}

impl From<EmbedderArg> for EmbedderKind {
    fn from(arg: EmbedderArg) -> Self {
        match arg {
            EmbedderArg::Ollama => EmbedderKind::Ollama,
            EmbedderArg::Hashing => EmbedderKind::Hashing,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Interactive shell over a fresh store
    Shell {
        /// JSON array of {"title", "text"} objects to add first
        #[arg(long)]
        load: Option<PathBuf>,

        /// Results per search when no -k is given
        #[arg(short, long)]
        k: Option<usize>,
    },
}

fn init_logging(config: &AppConfig, console: bool) {
    if let Err(e) = logger::setup_logging(&config.log_dir, &config.log_level, console) {
        eprintln!("File logging unavailable ({}), logging to stderr only", e);
        logger::setup_console_logging(&config.log_level).ok();
    }
}

async fn load_documents(store: &SemanticStore, path: &Path) -> Result<usize> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let documents: Vec<NewDocument> = serde_json::from_str(&data)
        .with_context(|| format!("{} is not a JSON array of {{title, text}}", path.display()))?;

    let added = store.add_many(&documents).await?;
    Ok(added.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_dotenv_from_project_root();

    let mut config = AppConfig::from_env()?;
    if let Some(embedder) = cli.embedder {
        config.embedder = embedder.into();
    }

    match cli.command {
        Some(Commands::Shell { load, k }) => {
            if let Some(k) = k {
                config.default_top_k = k;
            }
            config.validate()?;

            // Keep the terminal for the shell itself
            init_logging(&config, false);

            let embedder = semstore_embed::from_config(&config)?;
            let store = SemanticStore::new(embedder);

            if let Some(path) = load {
                let count = load_documents(&store, &path).await?;
                println!("Loaded {} documents from {}", count, path.display());
            }

            println!("SemStore shell ({}). Type 'help' for commands.", store.embedder().model());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell::run(&store, stdin, &mut stdout, config.default_top_k).await?;
        }
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server_host = host;
            }
            if let Some(port) = port {
                config.server_port = port;
            }
            config.validate()?;
            init_logging(&config, true);

            tracing::info!("SemStore starting...");
            tracing::info!("  Embedder: {}", config.embedder);
            tracing::info!("  Address: {}", config.server_bind_address());

            println!("Server listening on http://{}", config.server_bind_address());
            semstore_server::start_server(config).await?;
        }
        None => {
            // Default: start server with configuration from the environment
            init_logging(&config, true);

            tracing::info!("SemStore starting with default configuration...");

            println!("Server listening on http://{}", config.server_bind_address());
            semstore_server::start_server(config).await?;
        }
    }

    Ok(())
}
