use clap::Parser;
use jim_rust::cli::{Cli, Commands, commands};
use jim_rust::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let config_file = cli.config.as_deref();
    match &cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args, config_file).await?,
        Commands::Export(args) => commands::export::execute(args, config_file).await?,
        Commands::Import(args) => commands::import::execute(args, config_file).await?,
        Commands::Collaborators(args) => {
            commands::collaborators::execute(args, config_file).await?;
        }
    }
    Ok(())
}
