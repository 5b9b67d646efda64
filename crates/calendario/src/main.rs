use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

mod admin;
mod config;
mod error;
mod export;
mod gate;
mod html;
mod normalize;
mod renderer;
mod server;
mod source;
mod store;
mod types;

use config::Settings;
use source::{EventSource, Loader};

#[derive(Parser, Debug)]
#[command(name = "calendario")]
#[command(about = "Serve a school events calendar with a password-gated admin panel")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Events document: an http(s) URL or a local JSON file
    #[arg(short, long, env = "CALENDARIO_SOURCE", default_value = "events.json", global = true)]
    source: String,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".", global = true)]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Load the events and generate a static index.html (no server)
    Build,

    /// Load an events document and report what it contains
    Check {
        /// URL or path of the events document
        #[arg(value_name = "SOURCE")]
        document: String,
    },

    /// Write an events document back out as pretty-printed JSON
    Export {
        /// URL or path of the events document
        #[arg(value_name = "SOURCE")]
        document: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing(log_level: &str) {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    for quiet in ["hyper=warn", "tower_http=warn"] {
        if let Ok(directive) = quiet.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

fn loader_for(raw: &str, settings: &Settings) -> Result<Loader> {
    let source = EventSource::parse(raw)?;
    Ok(Loader::new(source, settings.cache_bust))
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    let args = Args::parse();

    init_tracing(&args.log_level);
    let settings = Settings::from_env()?;

    match args.command {
        // Default to serve if no command specified
        None => {
            let loader = loader_for(&args.source, &settings)?;
            let state = Arc::new(server::AppState::new(loader, &settings.admin_password));
            server::serve(8080, state).await?;
        }
        Some(Commands::Serve { port }) => {
            let loader = loader_for(&args.source, &settings)?;
            let state = Arc::new(server::AppState::new(loader, &settings.admin_password));
            server::serve(port, state).await?;
        }
        Some(Commands::Build) => {
            let loader = loader_for(&args.source, &settings)?;
            let events = loader
                .load()
                .await
                .with_context(|| format!("Failed to load events from {}", loader.source()))?;
            let html_path = args.output.join("index.html");
            html::generate_html(&events, &html_path)?;
            info!(path = %html_path.display(), count = events.len(), "HTML saved");
        }
        Some(Commands::Check { document }) => {
            let loader = loader_for(&document, &settings)?;
            let events = loader.load().await?;
            info!(count = events.len(), source = %loader.source(), "Found events");
            for (_, event) in store::EventStore::from_records(events).sorted() {
                info!(
                    start = %event.start,
                    end = %event.last_day(),
                    event_type = %event.category,
                    title = %event.title,
                    "Event"
                );
            }
        }
        Some(Commands::Export { document, out }) => {
            let loader = loader_for(&document, &settings)?;
            let events = loader.load().await?;
            match out {
                Some(path) => {
                    export::save_json(&events, &path)?;
                    info!(path = %path.display(), count = events.len(), "Events exported");
                }
                None => println!("{}", export::to_pretty_json(&events)?),
            }
        }
    }

    Ok(())
}
