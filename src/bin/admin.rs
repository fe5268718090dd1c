//! CLI administration tool for river-monitor.
//!
//! Manages operator accounts, trims the activity log and inspects the
//! PostgreSQL database without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create an operator account
//! cargo run --bin admin -- user create --username ana --role Técnico
//!
//! # List accounts
//! cargo run --bin admin -- user list
//!
//! # Remove activity entries older than 90 days
//! cargo run --bin admin -- activity purge --days 90
//!
//! # Row counts
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string

use river_monitor::application::services::activity_service::MAX_RETENTION_DAYS;
use river_monitor::application::services::user_service::UserInput;
use river_monitor::application::services::{ActivityService, UserService};
use river_monitor::domain::entities::Role;
use river_monitor::infrastructure::Container;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing river-monitor.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage operator accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Activity log maintenance
    Activity {
        #[command(subcommand)]
        action: ActivityAction,
    },

    /// Show row counts
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create an account
    Create {
        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        /// Administrador, Técnico or Observador
        #[arg(short, long)]
        role: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all accounts
    List,
}

#[derive(Subcommand)]
enum ActivityAction {
    /// Delete entries older than the given number of days
    Purge {
        /// Between 1 and 3650
        #[arg(
            short,
            long,
            default_value_t = 90,
            value_parser = clap::value_parser!(i64).range(1..=MAX_RETENTION_DAYS)
        )]
        days: i64,

        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Activity { action } => handle_activity_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}


fn container(pool: &PgPool) -> Container {
    Container::postgres(Arc::new(pool.clone()))
}

async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let c = container(pool);
    let service = UserService::new(c.users.clone(), c.stations.clone(), c.activity.clone());

    match action {
        UserAction::Create {
            username,
            email,
            role,
            yes,
        } => {
            println!("{}", "👤 Create account".bright_blue().bold());
            println!();

            let username = match username {
                Some(u) => u,
                None => Input::new().with_prompt("Username").interact_text()?,
            };
            let email = match email {
                Some(e) => e,
                None => Input::new().with_prompt("Email").interact_text()?,
            };
            let role = match role {
                Some(r) => Role::normalize(&r),
                None => {
                    let raw: String = Input::new()
                        .with_prompt("Role")
                        .with_initial_text("Observador")
                        .interact_text()?;
                    Role::normalize(&raw)
                }
            };
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Repeat password", "Passwords do not match")
                .interact()?;

            println!();
            println!("  Username: {}", username.cyan());
            println!("  Email:    {}", email.cyan());
            println!("  Role:     {}", role.as_str().bright_yellow());
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Create this account?")
                    .default(true)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let user = service
                .create_user(
                    UserInput {
                        username,
                        email,
                        password,
                        role: Some(role.as_str().to_string()),
                        is_staff: role == Role::Administrador,
                        ..UserInput::default()
                    },
                    None,
                )
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create account: {}", e))?;

            println!(
                "{} {}",
                "✅ Account created with id".green().bold(),
                user.id.to_string().bright_white().bold()
            );
        }
        UserAction::List => {
            println!("{}", "📋 Accounts".bright_blue().bold());
            println!();

            let users = service
                .list_users()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list accounts: {}", e))?;

            if users.is_empty() {
                println!("{}", "  No accounts found".yellow());
                return Ok(());
            }

            println!(
                "  {:<5} {:<20} {:<30} {:<14} {:<8}",
                "ID".bright_white().bold(),
                "Username".bright_white().bold(),
                "Email".bright_white().bold(),
                "Role".bright_white().bold(),
                "Stations".bright_white().bold()
            );
            println!("  {}", "─".repeat(80).bright_black());

            for user in &users {
                let role = match user.role {
                    Role::Administrador => user.role.as_str().red(),
                    Role::Tecnico => user.role.as_str().yellow(),
                    Role::Observador => user.role.as_str().green(),
                };

                println!(
                    "  {:<5} {:<20} {:<30} {:<14} {}",
                    user.id.to_string().bright_black(),
                    user.username.cyan(),
                    user.email,
                    role,
                    user.assigned_stations.len()
                );
            }

            println!();
            println!("  Total: {}", users.len().to_string().bright_white().bold());
        }
    }

    Ok(())
}

async fn handle_activity_action(action: ActivityAction, pool: &PgPool) -> Result<()> {
    let service = ActivityService::new(container(pool).activity);

    match action {
        ActivityAction::Purge { days, yes } => {
            println!(
                "{} {}",
                "🧹 Purging activity entries older than".bright_blue().bold(),
                format!("{days} days").bright_white().bold()
            );

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Delete these entries?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let removed = service
                .purge(days, None)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to purge activity log: {}", e))?;

            println!(
                "{} {}",
                "✅ Entries removed:".green().bold(),
                removed.to_string().bright_white().bold()
            );
        }
    }

    Ok(())
}

async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let counts = [
        ("Stations", "SELECT COUNT(*) FROM stations"),
        ("Measurements", "SELECT COUNT(*) FROM measurements"),
        ("Active alerts", "SELECT COUNT(*) FROM alerts WHERE is_active"),
        ("Users", "SELECT COUNT(*) FROM users"),
        ("Activity entries", "SELECT COUNT(*) FROM activity_logs"),
    ];

    for (label, query) in counts {
        let count: i64 = sqlx::query_scalar(query).fetch_one(pool).await?;
        println!(
            "  {:<17} {}",
            format!("{label}:"),
            count.to_string().bright_green().bold()
        );
    }
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
