//! QuoteClock terminal host
//!
//! Shows the quote for the current minute and refreshes it on every minute
//! boundary. Type a language code and press Enter to switch language, `q` to quit.
//!
//! Usage:
//!     quoteclock --bundled
//!     quoteclock --source https://example.com/quoteclock --language pt
//!     quoteclock --source ./data --timezone Europe/Lisbon --once
//!
//! Logging goes to stderr and is controlled by RUST_LOG (default: warn).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use quoteclock::clock::SystemClock;
use quoteclock::loader::{loader_for_source, StaticLoader};
use quoteclock::selection::SelectionPolicy;
use quoteclock::terminal::{render_display, render_languages, RenderStyle};
use quoteclock::{
    Clock, ClockConfig, DisplayController, Language, QuoteStore, ResourceLoader, SessionHandle, Snapshot,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (command-line flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL or directory holding <lang>/quotes.csv and <lang>/messages.json
    #[arg(short, long, conflicts_with = "bundled")]
    source: Option<String>,

    /// Use the sample data compiled into the binary
    #[arg(long)]
    bundled: bool,

    /// Language shown on startup (must be one of the configured languages)
    #[arg(short, long)]
    language: Option<String>,

    /// IANA zone name, "local" or "utc"
    #[arg(short, long)]
    timezone: Option<String>,

    /// Always show the first quote of a minute instead of a random one
    #[arg(long)]
    first: bool,

    /// Print the current quote and exit
    #[arg(long)]
    once: bool,

    /// Disable ANSI styling
    #[arg(long)]
    plain: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<ClockConfig> {
    let mut config = match &args.config {
        Some(path) => ClockConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClockConfig::default(),
    };

    if let Some(source) = &args.source {
        config.source = Some(source.clone());
    }
    if args.bundled {
        config.source = None;
    }
    if let Some(language) = &args.language {
        config.default_language = Language::from(language.as_str());
    }
    if let Some(timezone) = &args.timezone {
        config.timezone = Some(timezone.clone());
    }
    if args.first {
        config.selection = SelectionPolicy::First;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_loader(config: &ClockConfig) -> Result<Arc<dyn ResourceLoader>> {
    match &config.source {
        Some(source) => {
            loader_for_source(source).with_context(|| format!("Cannot use resource source {}", source))
        }
        None => {
            tracing::info!("no source configured, using bundled resources");
            Ok(Arc::new(quote_data::resources().collect::<StaticLoader>()))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = build_config(&args)?;
    let zone = config.zone()?;
    let style = if args.plain { RenderStyle::Plain } else { RenderStyle::Ansi };

    let loader = build_loader(&config)?;
    let store = Arc::new(QuoteStore::new(loader, config.selection.selector()));
    let mut controller = DisplayController::new(store, zone, config.languages.clone());

    if args.once {
        controller
            .set_language(config.default_language.clone(), Utc::now())
            .await?;
        println!("{}", render_display(&controller.display(), style));
        return Ok(());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let handle = SessionHandle::spawn(controller, clock, config.default_language.clone());
    run_interactive(handle, style).await
}

async fn run_interactive(handle: SessionHandle, style: RenderStyle) -> Result<()> {
    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                draw(&snapshot, handle.languages(), style);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "q" | "quit" => break,
                    code => {
                        if let Err(e) = handle.select_language(Language::from(code)) {
                            eprintln!("{} (choose one of: {})", e, render_languages(handle.languages(), None));
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn draw(snapshot: &Snapshot, languages: &[Language], style: RenderStyle) {
    if style == RenderStyle::Ansi {
        // Clear screen, cursor home
        print!("\x1b[2J\x1b[H");
    }
    println!("{}", render_languages(languages, snapshot.language.as_ref()));
    println!();
    println!("{}", render_display(&snapshot.display, style));
    println!();
    println!("Type a language code to switch, q to quit.");
}
