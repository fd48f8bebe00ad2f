use clap::Parser;

use pocket_analyst::api::{self, Cli, Command};
use pocket_analyst::config::{self, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    config::init_tracing(config.log_format);

    match cli.command {
        Command::Serve(args) => {
            let addr = args.listen_addr(config.listen_addr);
            let variant = args.resolve_variant(config.variant);
            api::run_http_server(addr, variant).await?;
        }
        Command::Estimate(args) => {
            let report = api::estimate_report(&args, config.variant)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Project(args) => {
            let report = api::projection_report(&args, config.variant)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
