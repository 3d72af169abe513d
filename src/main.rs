//! Pastebin server entrypoint.

use pastebin::{config::env_flag_enabled, run, shutdown_signal, Config, DEFAULT_PORT};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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
    if args.iter().skip(1).any(|arg| arg == "--help" || arg == "-h") {
        println!("Pastebin\n");
        println!("Usage: pastebin\n");
        println!("Configured through environment variables; run `pastebin-server --help` for the list.");
        println!("Default port: {}", DEFAULT_PORT);
        return Ok(());
    }
    if let Some(arg) = args.get(1) {
        anyhow::bail!("Unexpected argument: '{}'. Use --help for usage.", arg);
    }

    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }
    run(Config::from_env(), allow_public, shutdown_signal()).await
}
