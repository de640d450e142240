use clap::Parser;
use recruitment_portal::cli::{handle_command, PortalCli};
use recruitment_portal::config::{get_config, init_config};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = PortalCli::parse();
    init_config()?;
    init_tracing();
    let config = get_config()?;

    tracing::debug!(api = %config.api_base_url, "starting portal client");
    handle_command(cli, config).await
}
