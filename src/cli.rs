//! CLI interface for seat-watch

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{self, Config};
use crate::monitor::{MonitorContext, TaskRegistry};
use crate::types::{Crn, UserId};

#[derive(Parser)]
#[command(name = "seat-watch")]
#[command(about = "Watches course sections for open seats and pushes alerts", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true, env = "SEAT_WATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every monitor and serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// Start every monitor without the HTTP API
    Watch,
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage tracked courses
    Course {
        #[command(subcommand)]
        command: CourseCommands,
    },
    /// Fetch a user's courses once and print their availability
    Check {
        /// User id
        user_id: String,
    },
    /// Configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user
    Add {
        /// Display name
        name: String,
    },
    /// List registered users
    List,
}

#[derive(Subcommand)]
enum CourseCommands {
    /// Track a CRN for a user
    Add {
        /// User id
        user_id: String,
        /// Course reference number
        crn: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn build_registry(config: &Config) -> Result<Arc<TaskRegistry>> {
    let ctx = MonitorContext::from_config(config)?;
    Ok(Arc::new(TaskRegistry::new(ctx)))
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { port, host } => {
            let registry = build_registry(&config)?;
            let started = registry.start_all().await.context("Failed to start monitors")?;
            println!("✓ {} monitor(s) running", started);

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let served = crate::server::start(&host, port, registry.clone()).await;

            registry.shutdown().await;
            served?;
        }
        Commands::Watch => {
            let registry = build_registry(&config)?;
            let started = registry.start_all().await.context("Failed to start monitors")?;
            println!("✓ {} monitor(s) running, press Ctrl+C to stop", started);

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            println!("Stopping monitors...");
            registry.shutdown().await;
        }
        Commands::User { command } => {
            let registry = build_registry(&config)?;
            match command {
                UserCommands::Add { name } => {
                    let record = registry
                        .store()
                        .add_user(name.trim())
                        .context("Failed to register user")?;
                    println!("✓ Registered {}", record.name);
                    println!("  id:         {}", record.id);
                    if let Some(topic) = &record.ntfy_topic {
                        println!("  ntfy topic: {}", topic);
                    }
                }
                UserCommands::List => {
                    let users = registry.store().users().context("Failed to read users")?;
                    if users.is_empty() {
                        println!("No users registered.");
                    }
                    for user in users {
                        let crns: Vec<&str> = user.courses.iter().map(Crn::as_str).collect();
                        println!("{}  {}  [{}]", user.id, user.name, crns.join(", "));
                    }
                }
            }
        }
        Commands::Course { command } => {
            let registry = build_registry(&config)?;
            match command {
                CourseCommands::Add { user_id, crn } => {
                    let user = UserId::new(user_id);
                    let crn = Crn::new(crn.trim());
                    registry
                        .add_course(&user, &crn)
                        .await
                        .with_context(|| format!("Failed to add CRN {}", crn))?;
                    println!("✓ User {} now tracking CRN {}", user, crn);
                }
            }
        }
        Commands::Check { user_id } => {
            let registry = build_registry(&config)?;
            let statuses = registry
                .check(&UserId::new(user_id))
                .await
                .context("Failed to check courses")?;
            if statuses.is_empty() {
                println!("No courses tracked.");
            }
            for status in statuses {
                println!("{}", status);
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                if let Some(path) = &cli.config {
                    println!("Config file:       {}", path.display());
                } else {
                    println!("Config file:       {}", config::config_path()?.display());
                }
                config::show_config(&config)?;
            }
        },
    }

    Ok(())
}
