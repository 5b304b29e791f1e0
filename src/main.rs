use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use phia::{commands, ApiClient, Config};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "phia")]
#[command(version, about = "Dashboard and chat client for the PHIA personal health backend")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Seconds between dashboard refreshes
    #[arg(long, global = true)]
    interval: Option<u64>,
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Config file (default: <config dir>/phia/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Full-screen dashboard with health metrics and chat (default)
    Dashboard,
    /// Print backend status once
    Status,
    /// Print the current health metrics once
    Summary,
    /// Ask the health assistant one question
    Ask {
        /// Your question
        question: String,
    },
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(interval) = self.interval {
            config.poll_interval_secs = interval;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.config()?;
    let client = ApiClient::new(&config.api_url, config.request_timeout())?;

    let report = match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => {
            run_dashboard(client, &config).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Status => {
            phia::logging::init_stderr()?;
            commands::status(&client).await
        }
        Commands::Summary => {
            phia::logging::init_stderr()?;
            commands::summary(&client).await
        }
        Commands::Ask { question } => {
            phia::logging::init_stderr()?;
            commands::ask(&client, &question).await
        }
    };
    report.print();

    Ok(if report.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run_dashboard(client: ApiClient, config: &Config) -> Result<()> {
    let log_path = phia::logging::init_file()?;
    info!(
        api_url = %config.api_url,
        log = %log_path.display(),
        "Starting PHIA dashboard v{}",
        env!("CARGO_PKG_VERSION")
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender());
    app.start_polling(config.poll_interval());

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event),
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    app.shutdown();
    tui::restore()?;
    info!("Dashboard closed");
    result
}
