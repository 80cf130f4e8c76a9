use anyhow::Result;
use clap::Parser;
use germanki::logging::{
    init_logging,
    LogConfig,
};

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let log_config = cli.log_level.clone().map(LogConfig::new).unwrap_or_else(LogConfig::from_env);
    init_logging(&log_config);

    cli::run(cli).await
}
