//! Handset CLI - Database migrations and customer management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! handset-cli migrate
//!
//! # Register a customer account
//! handset-cli customer create -e shop@retailer.example -n "Retailer"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `customer create` - Register customer accounts (the API cannot)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "handset-cli")]
#[command(author, version, about = "Handset CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage customer accounts
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Register a new customer
    Create {
        /// Login email, matched against the token `username` claim
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Customer { action } => match action {
            CustomerAction::Create { email, name } => {
                commands::customer::create(&email, &name).await?;
            }
        },
    }
    Ok(())
}
