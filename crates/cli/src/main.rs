//! Wardrobe CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! wd-cli migrate
//!
//! # Create a shopper and print their API token
//! wd-cli user create --name "Alice" --label laptop
//!
//! # Issue another token for an existing shopper
//! wd-cli user issue-token --user-id 1 --label phone
//!
//! # Revoke all of a shopper's tokens
//! wd-cli user revoke-tokens --user-id 1
//!
//! # Load products from YAML
//! wd-cli seed products --file crates/cli/seed/products.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user` - Create users, issue and revoke API tokens
//! - `seed` - Seed the product catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wd-cli")]
#[command(author, version, about = "Wardrobe CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage shoppers and their API tokens
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user and issue their first API token
    Create {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Label for the issued token
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Issue an additional API token for an existing user
    IssueToken {
        /// User ID
        #[arg(short, long)]
        user_id: i32,

        /// Label for the issued token
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Revoke every live API token of a user
    RevokeTokens {
        /// User ID
        #[arg(short, long)]
        user_id: i32,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert products from a YAML file
    Products {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::User { action } => match action {
            UserAction::Create { name, label } => {
                commands::user::create(&name, label.as_deref()).await?;
            }
            UserAction::IssueToken { user_id, label } => {
                commands::user::issue_token(user_id, label.as_deref()).await?;
            }
            UserAction::RevokeTokens { user_id } => {
                commands::user::revoke_tokens(user_id).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
    }
    Ok(())
}
