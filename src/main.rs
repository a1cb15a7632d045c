mod client;
mod commands;
mod config;
mod controller;
mod error;
mod models;
mod session;
mod storage;
mod view;
mod web;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use controller::Event;

/// School activities client: list activities and manage student sign-ups.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file
    #[arg(short = 'c', long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Override the backend base URL from config
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Print detailed API responses
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List activities, their schedules and participants
    Activities,

    /// Log in as a teacher; the session is kept for later commands
    Login {
        #[arg(short = 'u', long)]
        user: String,

        #[arg(short = 'p', long)]
        password: String,
    },

    /// Log out and forget the stored session
    Logout,

    /// Sign a student up for an activity (requires login)
    ///
    /// Example:
    ///   signup --email kid@school.edu --activity "Chess Club"
    Signup {
        /// Student email
        #[arg(short = 'e', long)]
        email: String,

        /// Activity name, as shown by `activities`
        #[arg(short = 'a', long)]
        activity: String,
    },

    /// Remove a student from an activity (requires login)
    Unregister {
        /// Activity name, as shown by `activities`
        #[arg(short = 'a', long)]
        activity: String,

        /// Student email
        #[arg(short = 'e', long)]
        email: String,
    },

    /// Show the logged-in teacher, if any
    Whoami,

    /// Start the local web dashboard
    Serve {
        /// Listen address (e.g. "127.0.0.1:3000")
        #[arg(short = 'a', long, default_value = "127.0.0.1:3010")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cfg = config::load_config(&cli.config)?;
    let mut controller = commands::open_controller(&cfg, &cli.config, cli.base_url.as_deref())?;

    match cli.command {
        Command::Activities => commands::run_activities(&mut controller).await?,
        Command::Login { user, password } => {
            commands::run_event(
                &mut controller,
                Event::Login {
                    username: user,
                    password,
                },
            )
            .await?
        }
        Command::Logout => commands::run_event(&mut controller, Event::Logout).await?,
        Command::Signup { email, activity } => {
            commands::run_event(&mut controller, Event::Signup { email, activity }).await?
        }
        Command::Unregister { activity, email } => {
            commands::run_event(&mut controller, Event::Unregister { activity, email }).await?
        }
        Command::Whoami => commands::run_whoami(&controller),
        Command::Serve { addr } => {
            let tz = config::timezone(&cfg)?;
            web::serve(controller, tz, &addr).await?;
        }
    }

    Ok(())
}
