//! Vitrinex CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! vx-cli migrate
//!
//! # Create an owner account
//! vx-cli owner create -e ana@example.com -n "Ana López" -p 'a long password' --premium
//!
//! # Change an owner's plan
//! vx-cli owner set-plan -e ana@example.com free
//!
//! # Create an owner, store and catalog from YAML
//! vx-cli seed crates/cli/seeds/barberia.yaml
//!
//! # Maintenance
//! vx-cli maintenance recount-unread
//! vx-cli maintenance purge-messages --days 90
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use vitrinex_core::Plan;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "vx-cli")]
#[command(author, version, about = "Vitrinex CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage owner accounts
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
    /// Create an owner, store and catalog from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: String,
    },
    /// Periodic data maintenance
    Maintenance {
        #[command(subcommand)]
        task: MaintenanceTask,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Create a new owner account
    Create {
        /// Owner email address
        #[arg(short, long)]
        email: String,

        /// Owner display name
        #[arg(short, long)]
        name: String,

        /// Initial password
        #[arg(short, long)]
        password: String,

        /// Start on the premium plan
        #[arg(long)]
        premium: bool,
    },
    /// Change an owner's plan
    SetPlan {
        /// Owner email address
        #[arg(short, long)]
        email: String,

        /// New plan (`free` or `premium`)
        plan: Plan,
    },
}

#[derive(Subcommand)]
enum MaintenanceTask {
    /// Recompute unread counters from the message table
    RecountUnread,
    /// Delete old messages of cancelled, completed or fulfilled records
    PurgeMessages {
        /// Minimum message age in days
        #[arg(long, default_value_t = 90)]
        days: u16,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Owner { action } => match action {
            OwnerAction::Create {
                email,
                name,
                password,
                premium,
            } => {
                let plan = if premium { Plan::Premium } else { Plan::Free };
                commands::owner::create(&email, &name, &password, plan).await?;
            }
            OwnerAction::SetPlan { email, plan } => {
                commands::owner::set_plan(&email, plan).await?;
            }
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Maintenance { task } => match task {
            MaintenanceTask::RecountUnread => commands::maintenance::recount_unread().await?,
            MaintenanceTask::PurgeMessages { days } => {
                commands::maintenance::purge_messages(days).await?;
            }
        },
    }
    Ok(())
}
