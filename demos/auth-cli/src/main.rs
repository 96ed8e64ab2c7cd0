//! Command-line client for the Archipel Libre API.
//!
//! Keeps the bearer token in a JSON file between runs, so `login` once
//! and the other commands reuse the session:
//!
//! ```text
//! auth-cli login --user testuser --password password123
//! auth-cli whoami
//! auth-cli profile
//! auth-cli logout
//! ```
//!
//! Set `RUST_LOG=archipel=debug` to see what the client does.

use std::path::PathBuf;

use archipel::prelude::*;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] archipel::ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not logged in")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "auth-cli", about = "Log in to an Archipel Libre backend")]
struct Cli {
    /// JSON client configuration; every field is optional.
    #[arg(long, env = "ARCHIPEL_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides `apiUrl` from the config.
    #[arg(long, env = "ARCHIPEL_API_URL")]
    api_url: Option<String>,

    /// File holding the persistent token.
    #[arg(long, env = "ARCHIPEL_STORE", default_value = ".archipel/session.json")]
    store: PathBuf,

    /// Token scope for this run. A `session` token is gone when the
    /// process exits.
    #[arg(long)]
    scope: Option<StorageScope>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the token.
    Login {
        #[arg(long)]
        user: String,
        #[arg(long, env = "ARCHIPEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Does not log in.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ARCHIPEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// Show the user recorded in the stored token.
    Whoami,
    /// Fetch the profile from the server.
    Profile,
    /// Check whether a route would be let through.
    Guard { url: String },
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| {
                CliError::ReadConfig {
                    path: path.clone(),
                    source,
                }
            })?;
            ClientConfig::from_json(&json)?
        }
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(scope) = cli.scope {
        config.storage = scope;
    }
    config.storage_path.get_or_insert_with(|| cli.store.clone());
    Ok(config)
}

fn print_user(user: &Session) {
    println!("{} <{}> role={}", user.username, user.email, user.role);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let client = AuthClient::builder(config)
        .navigator(|route: &str| eprintln!("session ended, log in again ({route})"))
        .connect()?;

    match cli.command {
        Command::Login { user, password } => {
            let session = client.login(&LoginRequest::new(user, password)).await?;
            print!("logged in as ");
            print_user(&session);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let ack = client
                .register(&RegisterRequest::new(username, email, password))
                .await?;
            println!("{}", ack.message);
        }
        Command::Logout => {
            client.logout()?;
            println!("logged out");
        }
        Command::Whoami => match client.current_user() {
            Some(user) => print_user(&user),
            None if client.is_authenticated() => {
                println!("token stored, but it carries no user claims");
            }
            None => return Err(CliError::NotLoggedIn),
        },
        Command::Profile => {
            if !client.is_authenticated() {
                return Err(CliError::NotLoggedIn);
            }
            let profile = client.profile().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&profile).unwrap_or_else(|_| profile.to_string())
            );
        }
        Command::Guard { url } => match client.can_activate(&url) {
            GuardDecision::Allow => println!("allow {url}"),
            GuardDecision::Redirect { to } => println!("redirect {to}"),
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
