mod cli;
mod commands;
mod config_loader;
mod connector;
mod error;
mod init_template;
mod logging;
mod storage;

use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    logging::setup_logging(level);

    let code = match &cli.command {
        Command::Check(args) => commands::check::run(&cli.config, args).await,
        Command::Run(args) => commands::run::run(&cli.config, args).await,
        Command::Status(args) => commands::status::run(&cli.config, args).await,
        Command::History(args) => commands::history::run(&cli.config, args).await,
        Command::Explain(args) => commands::explain::run(&cli.config, args).await,
        Command::Purge(args) => commands::purge::run(&cli.config, args).await,
        Command::Migrate => commands::migrate::run(&cli.config).await,
        Command::Validate => commands::validate::run(&cli.config).await,
        Command::Init(args) => commands::init::run(args).await,
    };

    match code {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!(error = %err, "driftwatch failed");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
