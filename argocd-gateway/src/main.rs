mod config;
mod logging;
mod statsd;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Read-only gateway in front of the ArgoCD API")]
enum CliCommand {
    /// Start the gateway
    Run(ConfigArgs),
    /// Load and validate the configuration, then exit
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to the YAML configuration file
    #[arg(long, short, default_value = "config.yaml")]
    config: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metrics(#[from] statsd::MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Querier(#[from] argocd_querier::QuerierError),
}

fn main() -> Result<(), CliError> {
    let cli = CliCommand::parse();

    match cli {
        CliCommand::CheckConfig(args) => {
            Config::from_file(&args.config)?;
            println!("{}: ok", args.config.display());
            Ok(())
        }
        CliCommand::Run(args) => {
            let config = Config::from_file(&args.config)?;

            // Sentry has to be initialised before the runtime starts
            let _sentry = logging::init(config.common.logging.as_ref());
            if let Some(metrics_config) = &config.common.metrics {
                statsd::init(metrics_config)?;
            }

            tracing::info!(config = %args.config.display(), "Starting argocd-gateway");
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(argocd_querier::run(config.argocd_querier))?;
            Ok(())
        }
    }
}
