//! Basic hub session.
//!
//! Demonstrates:
//! - Running the handshake from a full service address
//! - Driving the dispatch loop on its own task
//! - Subscribing to a push method and invoking a hub method
//! - Clean shutdown on Ctrl+C
//!
//! Usage:
//!   cargo run --example basic_hub
//!   cargo run --example basic_hub -- --debug
//!   cargo run --example basic_hub -- --url https://socket.example.com/signalr --market USDT-BTC

// ============================================================================
// Imports
// ============================================================================

use signalr_client::{Client, ConnectionBuilder, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "https://socket.bittrex.com/signalr";
const DEFAULT_MARKET: &str = "USDT-BTC";
const HUB: &str = "corehub";

// ============================================================================
// Args
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    url: String,
    market: String,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url: value_of("--url").unwrap_or_else(|| DEFAULT_URL.to_string()),
            market: value_of("--market").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "signalr_client=debug"
    } else {
        "signalr_client=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Basic Hub ===\n");

    // ========================================================================
    // Handshake
    // ========================================================================

    println!("[Connect] {}", args.url);
    let builder = ConnectionBuilder::from_url(&args.url)?
        .connection_data(format!(r#"[{{"name":"{HUB}"}}]"#));
    let client = Client::connect(HUB, builder).await?;
    println!("          ✓ connection id {}\n", client.session().connection_id);

    // ========================================================================
    // Dispatch Loop
    // ========================================================================

    let cancel = CancellationToken::new();
    let runner = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { client.run(cancel).await })
    };

    // ========================================================================
    // Subscribe
    // ========================================================================

    let mut deltas = client.callback("uE")?;
    let subscribed: bool = client
        .call("SubscribeToExchangeDeltas", (args.market.as_str(),))
        .await?;
    println!("[Subscribe] {} -> {subscribed}", args.market);
    println!("            Press Ctrl+C to stop\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            message = deltas.read() => match message {
                Ok(message) => println!("[{}] {:?}", message.method, message.args),
                Err(e) => {
                    println!("[Stream] closed: {e}");
                    break;
                }
            },
        }
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    cancel.cancel();
    if let Ok(Err(e)) = runner.await {
        println!("[Session] ended with error: {e}");
    }
    client.close().await?;

    println!("\n=== Done ===");
    Ok(())
}
