mod cli;

use clap::Parser;
use docbase::{Client, Config, Context};
use log::info;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(args.log_level.as_deref());

    let cfg = Config::from_env().map_err(anyhow::Error::msg)?;
    let client = Client::from_config(&cfg)?;
    let ctx = Context::background().with_timeout(Duration::from_secs(cfg.timeout_secs));

    let resp = cli::run(&client, &ctx, args.command).await?;
    info!(
        "status={} rate={} meta={:?}",
        resp.status.as_u16(),
        resp.rate,
        resp.meta
    );
    Ok(())
}
