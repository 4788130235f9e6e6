use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use hx_api::{Harvest, HttpTransport};
use tracing_subscriber::EnvFilter;

use hx_cli::commands::{account, clients, migrate, projects, tasks, time_entries, users};
use hx_cli::{Cli, Commands, Config};

/// Load config and build an authenticated client.
fn connect(cli: &Cli) -> Result<Harvest<HttpTransport>> {
    let config = Config::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(cli.token.clone(), cli.account_id.clone());
    tracing::debug!(?config, "loaded configuration");

    let credentials = config.credentials()?;
    Harvest::connect(&credentials, config.http_options()).context("failed to create Harvest client")
}

async fn dispatch<W: Write>(
    writer: &mut W,
    harvest: &Harvest<HttpTransport>,
    command: &Commands,
) -> Result<()> {
    match command {
        Commands::Check => account::check(writer, harvest).await,
        Commands::Company => account::company(writer, harvest).await,
        Commands::Clients(args) => clients::run(writer, harvest, args).await,
        Commands::Users(args) => users::run(writer, harvest, args).await,
        Commands::Projects(args) => projects::list(writer, harvest, args).await,
        Commands::Project(args) => projects::show(writer, harvest, args).await,
        Commands::Tasks(args) => tasks::run(writer, harvest, args).await,
        Commands::TimeEntries(args) => time_entries::list(writer, harvest, args).await,
        Commands::TimeEntry(args) => time_entries::show(writer, harvest, args).await,
        Commands::UpdateTimeEntry(args) => time_entries::update(writer, harvest, args).await,
        Commands::Migrate(args) => migrate::run(writer, harvest, args).await,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let harvest = connect(&cli)?;
    // Requests are issued one at a time; a single-threaded runtime is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    runtime.block_on(dispatch(&mut writer, &harvest, command))
}
