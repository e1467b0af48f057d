use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use verdict::core::config::{self, CliOverrides};
use verdict::core::session::{FileStorage, SessionStore};
use verdict::core::state::App;
use verdict::gateway::HttpGateway;
use verdict::tui;

#[derive(Parser)]
#[command(name = "verdict", about = "Sentiment analysis and document summaries in your terminal")]
struct Args {
    /// Analysis service base URL (overrides config and VERDICT_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Directory holding saved chats (overrides config and VERDICT_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Display name shown in the title bar
    #[arg(long)]
    user: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to verdict.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("verdict.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("Ignoring config file: {}", e);
        config::VerdictConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.api_url,
            data_dir: args.data_dir,
            user: args.user,
        },
    );

    let gateway = HttpGateway::new(resolved.base_url.clone())
        .with_timeout(resolved.timeout)
        .with_summarize_question(resolved.summarize_question.clone());
    let storage = FileStorage::new(&resolved.data_dir, &resolved.storage_key)?;

    log::info!(
        "Verdict starting up (gateway: {}, chats: {})",
        gateway.base_url(),
        storage.path().display()
    );
    let store = SessionStore::init(Box::new(storage));
    let app = App::from_config(Arc::new(gateway), store, &resolved);

    tui::run(app, resolved.reveal_interval)
}
