use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use memtrack::config::{self, load_config, load_config_from_path};
use memtrack::server::{Server, ServerOptions};
use memtrack::system::collector::Collector;
use memtrack::system::filter::FilterPolicy;
use memtrack::{console, logging};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "memtrack",
    about = "Serve host memory and process snapshots over HTTP and a push stream"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// TCP port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Delay between pushed snapshots in milliseconds
    #[arg(long)]
    push_interval_ms: Option<u64>,

    /// Directory served for non-API paths
    #[arg(long)]
    static_root: Option<PathBuf>,

    /// Log format: text, json
    #[arg(long)]
    log_format: Option<String>,

    /// Render snapshots in the terminal instead of serving them.
    #[arg(long, default_value_t = false)]
    console: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    logging::init(&config.logging)?;

    if cli.console {
        return console::run(&config.console).await;
    }

    let policy = FilterPolicy::with_threshold_mb(
        config.sampler.max_processes,
        config.sampler.min_working_set_mb,
    );
    let options = ServerOptions::from_config(&config.server);
    info!(
        static_root = %options.static_files.root().display(),
        push_interval_ms = config.server.push_interval_ms,
        max_processes = policy.max_processes,
        "starting memtrack"
    );

    let server = Server::bind(
        &config.server.bind,
        config.server.port,
        Collector::new(policy),
        options,
    )
    .await?;
    server.run().await
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref bind) = cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(interval) = cli.push_interval_ms {
        config.server.push_interval_ms = interval;
    }
    if let Some(ref root) = cli.static_root {
        config.server.static_root = root.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.logging.format = format.clone();
    }

    config
}
