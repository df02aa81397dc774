use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::Parser;
use textbook_core::{ChatWidget, Config, HttpBackend, Settings};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::{App, HostPage};

#[derive(Parser)]
#[command(name = "textbook-chat", version)]
#[command(about = "Read the Physical AI & Humanoid Robotics textbook with its chat assistant at hand")]
struct Cli {
    /// Markdown page to show behind the chat widget
    page: Option<PathBuf>,

    /// Base URL of the assistant backend
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Where to write logs (defaults to the config directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Ask a single question, print the reply and exit
    #[arg(long, value_name = "QUESTION")]
    ask: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref())?;

    let mut config = Config::load()
        .unwrap_or_else(|e| {
            warn!("ignoring unreadable config: {:#}", e);
            Config::default()
        })
        .with_env();
    if let Some(url) = cli.base_url {
        config.base_url = Some(url);
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = Some(secs);
    }
    let settings = config.resolve();

    if let Some(question) = cli.ask {
        return ask_once(&settings, &question).await;
    }

    let page = HostPage::load(cli.page.as_deref())?;
    run_tui(&settings, page).await
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None => Config::config_dir()?.join("textbook-chat.log"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

async fn ask_once(settings: &Settings, question: &str) -> Result<()> {
    let backend = HttpBackend::new(&settings.base_url, settings.timeout)?;
    let mut widget = ChatWidget::mount(backend, settings);

    widget.draft_mut().push_str(question);
    if !widget.submit() {
        bail!("Question must not be empty");
    }
    widget.settle().await;

    if let Some(reply) = widget.messages().last() {
        println!("{}", reply.text);
        if !reply.sources.is_empty() {
            let labels: Vec<String> = reply.sources.iter().map(|s| s.label()).collect();
            println!("\nSources: {}", labels.join(", "));
        }
    }

    widget.unmount();
    Ok(())
}

async fn run_tui(settings: &Settings, page: HostPage) -> Result<()> {
    let mut app = App::new(settings, page)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    app.shutdown();
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        app.refresh().await;
    }
    Ok(())
}
