use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::Path;
use taskboard::api::HttpTaskStore;
use taskboard::app::App;
use taskboard::config::Config;
use taskboard::poll::PollScheduler;
use taskboard::sync::SyncClient;
use taskboard::ui::run_app;
use tracing_appender::non_blocking::WorkerGuard;

// The terminal owns stdout, so logs go to a file.
fn init_logging(level: &str, log_file: &Path) -> io::Result<WorkerGuard> {
    let log_dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(log_dir)?;
    let file_name = log_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "taskboard.log".into());

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {}", err);
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(&config.log_level, &config.log_file)?;
    tracing::info!(api_url = %config.api_url, "taskboard starting");

    let store = HttpTaskStore::new(&config.api_url, config.request_timeout)?;
    let client = SyncClient::new(store);
    let poller = PollScheduler::start(client.clone(), config.poll_interval);

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let mut app = App::new(client);
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Let complete/delete/create calls issued just before quitting land.
    app.finish_actions(config.request_timeout).await;
    poller.stop().await;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    tracing::info!("taskboard stopped");
    Ok(())
}
