use std::path::PathBuf;

use anyhow::Context;

use batchwatch_api::MetricsClient;
use batchwatch_dashboard::config::{DEFAULT_CONFIG_PATH, DashboardConfig};
use batchwatch_dashboard::logging::{self, LogTarget};
use batchwatch_dashboard::{headless, tui};

struct Args {
    config: PathBuf,
    headless: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config: PathBuf::from(DEFAULT_CONFIG_PATH),
        headless: false,
    };
    for arg in std::env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            args.config = PathBuf::from(path);
        } else if arg == "--headless" {
            args.headless = true;
        } else {
            eprintln!("ignoring unknown argument {arg:?}");
        }
    }
    args
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();

    let (config, source) = DashboardConfig::load(&args.config)?;
    config.validate()?;

    let target = if args.headless {
        LogTarget::Stdout
    } else {
        LogTarget::File
    };
    logging::init(target, &config.logging)?;
    source.log();

    let client = MetricsClient::new(&config.api).context("failed to build HTTP client")?;
    tracing::info!(api = %client.base_url(), headless = args.headless, "batchwatch starting");

    if args.headless {
        headless::run(&config, client).await?;
    } else {
        tui::run(&config, client).await?;
    }
    Ok(())
}
