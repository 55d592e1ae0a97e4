use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use meetwire::server::{RelayConfig, SignalingService, router};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meetwire")]
#[command(about = "WebRTC signaling relay for browser meetings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay.
    Serve(ConfigArgs),
    /// Print the configuration `serve` would use and exit.
    Config(ConfigArgs),
}

/// Flags override the `MEETWIRE_*` environment, which overrides defaults.
#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    bind: Option<SocketAddr>,

    #[arg(long)]
    send_timeout_ms: Option<u64>,

    #[arg(long)]
    channel_capacity: Option<usize>,

    #[arg(long)]
    max_message_bytes: Option<usize>,

    #[arg(long)]
    ping_interval_secs: Option<u64>,

    #[arg(long)]
    idle_timeout_secs: Option<u64>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<RelayConfig> {
        let mut config = RelayConfig::from_env().context("Invalid MEETWIRE_* environment")?;

        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(ms) = self.send_timeout_ms {
            config.send_timeout = Duration::from_millis(ms);
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
        if let Some(bytes) = self.max_message_bytes {
            config.max_message_bytes = bytes;
        }
        if let Some(secs) = self.ping_interval_secs {
            config.ping_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.idle_timeout_secs {
            config.idle_timeout = Duration::from_secs(secs);
        }

        config.validate().context("Invalid command line options")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let config = args.resolve()?;
            init_tracing();
            serve(config).await?;
        }
        Commands::Config(args) => {
            let config = args.resolve()?;
            print_config(&config);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(config: RelayConfig) -> Result<()> {
    let addr = config.bind_addr;
    let service =
        SignalingService::new(config.clone()).context("Invalid relay configuration")?;
    let app = router(service.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("{}", "📡 meetwire signaling relay".green().bold());
    print_config(&config);
    info!("Signaling server listening on ws://{}/ws/{{meetingCode}}/{{userId}}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(service))
        .await
        .context("Server error")?;

    info!("Signaling server stopped");
    Ok(())
}

async fn shutdown_signal(service: SignalingService) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutdown requested");
    service.shutdown();
}

fn print_config(config: &RelayConfig) {
    println!("   {} {}", "bind:".cyan(), config.bind_addr);
    println!("   {} {:?}", "send timeout:".cyan(), config.send_timeout);
    println!("   {} {}", "channel capacity:".cyan(), config.channel_capacity);
    println!("   {} {}", "max message bytes:".cyan(), config.max_message_bytes);
    println!("   {} {:?}", "ping interval:".cyan(), config.ping_interval);
    println!("   {} {:?}", "idle timeout:".cyan(), config.idle_timeout);
}
