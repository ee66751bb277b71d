use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use rsprovider::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rsprovider", version, about = "Manage AWS objects declared in a JSON file")]
struct Cli {
    /// Configuration file with the provider block, resources and data sources
    #[arg(short, long, default_value = "rsprovider.json")]
    config: PathBuf,
    /// State file
    #[arg(short, long, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every registered resource and data source type
    Types,
    /// Show what apply would change
    Plan,
    /// Apply the configuration
    Apply,
    /// Destroy every object in state
    Destroy,
    /// Adopt an existing object into state
    Import {
        /// `<type>.<name>`
        address: String,
        id: String,
    },
    /// Read the data sources of the configuration
    Data,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    if let Command::Types = cli.command {
        return print_types();
    }
    let rt = tokio::runtime::Runtime::new()?;
    let config = CloudConfig::from_file(&cli.config).context("Could not read configuration")?;
    let mut cloud = Cloud::from_config(rt.handle(), config, FileStorage::new(&cli.state))
        .context("Could not initialize provider")?;
    match cli.command {
        Command::Types => Ok(()),
        Command::Plan => {
            let changes = cloud.plan().context("Could not plan cloud infrastructure")?;
            print_changes(&changes, "No changes. Infrastructure is up-to-date.");
            Ok(())
        }
        Command::Apply => {
            let changes = cloud
                .apply()
                .context("Could not apply cloud infrastructure")?;
            print_changes(&changes, "Apply complete. Nothing changed.");
            Ok(())
        }
        Command::Destroy => {
            let changes = cloud
                .destroy()
                .context("Could not destroy cloud infrastructure")?;
            print_changes(&changes, "Nothing to destroy.");
            Ok(())
        }
        Command::Import { address, id } => {
            let (type_name, _) = address
                .split_once('.')
                .ok_or_else(|| anyhow!("Invalid address {}, expected <type>.<name>", address))?;
            let record = cloud
                .import(&address, type_name, &id)
                .with_context(|| format!("Could not import {} into {}", id, address))?;
            println!("Imported {} as {}", record.id, record.address);
            Ok(())
        }
        Command::Data => {
            for (address, value) in cloud
                .read_data_sources()
                .context("Could not read data sources")?
            {
                println!("{} = {}", address, serde_json::to_string_pretty(&value)?);
            }
            Ok(())
        }
    }
}

fn print_types() -> anyhow::Result<()> {
    for package in service_packages() {
        println!("{}", package.service_package_name());
        for descriptor in package
            .framework_resources()
            .iter()
            .chain(package.sdk_resources())
        {
            println!("  resource    {}", descriptor.type_name);
        }
        for descriptor in package
            .framework_data_sources()
            .iter()
            .chain(package.sdk_data_sources())
        {
            println!("  data source {}", descriptor.type_name);
        }
    }
    default_registry().context("Service packages do not register cleanly")?;
    Ok(())
}

fn print_changes(changes: &[PlannedChange], unchanged: &str) {
    let mut pending = pending(changes).peekable();
    if pending.peek().is_none() {
        println!("{}", unchanged);
        return;
    }
    for change in pending {
        println!("{}", change);
    }
}
