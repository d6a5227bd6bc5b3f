/// Emberbin HTTP Server Binary
///
/// Starts an HTTP server that exposes the Emberbin paste API over the
/// network.

use clap::Parser;
use ember_api::Pastebin;
use ember_core::clock::Clock;
use ember_server::{metrics, router, AppState};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ember-server")]
#[command(about = "Emberbin HTTP Server", long_about = None)]
struct Args {
    /// Path to the paste store directory
    #[arg(short, long, value_name = "PATH", default_value = "ember.db")]
    db_path: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Public base URL used when building share links
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Honor the x-test-now-ms header on fetch routes
    #[arg(long)]
    allow_clock_override: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    // Default to info level, can override with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run --bin ember-server
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    // Initialize Prometheus metrics
    metrics::register_metrics();
    info!("Initialized Prometheus metrics");

    // Parse command line arguments
    let args = Args::parse();

    // Expiry checks follow caller-supplied timestamps when overrides are
    // on; never enable this on a production instance.
    let test_mode = std::env::var("EMBER_TEST_MODE")
        .map(|value| value == "1")
        .unwrap_or(false);
    let clock = if args.allow_clock_override || test_mode {
        warn!("Clock override enabled; {} will be honored on fetch routes",
            ember_server::handlers::TEST_NOW_HEADER);
        Clock::with_override_enabled()
    } else {
        Clock::system()
    };

    // Open or create the paste store
    info!("Opening paste store at {:?}", args.db_path);
    let bin = if args.db_path.exists() {
        Pastebin::open(&args.db_path)?
    } else {
        info!("Paste store not found, creating new store");
        Pastebin::create(&args.db_path)?
    };

    let addr = format!("{}:{}", args.host, args.port);
    let state = AppState::new(bin, clock, args.base_url);
    let app = router(state);

    info!("Starting Emberbin HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
