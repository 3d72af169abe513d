//! Headless API server entrypoint.

use pastebin_core::config::env_flag_enabled;
use pastebin_core::DEFAULT_PORT;
use pastebin_server::{run, shutdown_signal, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    memory: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--memory" => flags.memory = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pastebin=info,pastebin_core=info,pastebin_server=info,tower_http=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;
    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let mut config = Config::from_env();
    if cli_flags.memory {
        config.backend = pastebin_core::StorageBackend::Memory;
    }

    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    run(config, allow_public, shutdown_signal()).await
}

fn print_help() {
    println!("Pastebin Server\n");
    println!("Usage: pastebin-server [OPTIONS]\n");
    println!("Options:");
    println!("  --memory          Keep all data in memory (ignores STORAGE_BACKEND)");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DATA_DIR          Data directory (default: ~/.cache/pastebin)");
    println!("  STORAGE_BACKEND   memory | json | redb (default: json)");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!("  MAX_PASTE_SIZE    Maximum paste size in bytes (default: 10MB)");
    println!("  PUBLIC_BASE_URL   Base for rendered short links");
    println!("  EXPIRED_SWEEP_INTERVAL_SECS  Expired paste sweep interval (default: 3600)");
    println!("  CHANGE_POLL_INTERVAL_MS      Change poller interval (default: 1000)");
    println!("  DEMO_FEED_INTERVAL_SECS      Enable the demo object generator");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin");
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
}
