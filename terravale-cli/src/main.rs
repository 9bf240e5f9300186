//! Terravale CLI - operator tooling for the credential store

mod doctor;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use terravale_core::{init_logging, Role, TerravaleConfig, UserProfile};
use terravale_web::auth::{
    database::DatabaseUserStore,
    users::{UserService, UserStore},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "terravale")]
#[command(about = "Operator tooling for Terravale Ventures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Credential store URL; overrides DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the credential store and report data-integrity issues
    Doctor {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Provision an account of any role, including admin
    CreateUser {
        /// Login email
        #[arg(long)]
        email: String,

        /// admin, buyer or labour
        #[arg(long)]
        role: Role,

        /// Display name
        #[arg(long)]
        full_name: String,

        /// Password; read from TERRAVALE_NEW_PASSWORD when omitted
        #[arg(long, env = "TERRAVALE_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        company: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config =
        TerravaleConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.database_url {
        config.database.url = Some(url);
    }

    // Keep operator output readable: only the configured level, no per-crate debug
    config.logging.filter_directives.clear();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    info!("Starting Terravale CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Doctor { json } => handle_doctor(config.database.url.as_deref(), json).await,
        Commands::CreateUser {
            email,
            role,
            full_name,
            password,
            company,
        } => {
            let url = config
                .database
                .url
                .as_deref()
                .context("No database URL configured; set DATABASE_URL or pass --database-url")?;
            let profile = UserProfile {
                full_name,
                company,
                ..UserProfile::default()
            };
            handle_create_user(url, &email, &password, role, profile).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn handle_doctor(database_url: Option<&str>, json: bool) -> anyhow::Result<ExitCode> {
    let outcome = doctor::run(database_url).await;

    match &outcome {
        doctor::DoctorOutcome::MissingConfig => {
            eprintln!("No database URL configured; set DATABASE_URL or pass --database-url");
        }
        doctor::DoctorOutcome::Failed(message) => {
            eprintln!("Could not inspect the store: {}", message);
        }
        doctor::DoctorOutcome::Completed(report) if json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        doctor::DoctorOutcome::Completed(report) => {
            print!("{}", doctor::render(report));
        }
    }

    Ok(ExitCode::from(outcome.exit_code()))
}

async fn handle_create_user(
    database_url: &str,
    email: &str,
    password: &str,
    role: Role,
    profile: UserProfile,
) -> anyhow::Result<()> {
    let store = DatabaseUserStore::connect(database_url)
        .await
        .context("Failed to open credential store")?;
    let users = UserService::new(UserStore::database(store));

    let user = users
        .provision(email, password, role, profile)
        .await
        .with_context(|| format!("Failed to create {} account for {}", role, email))?;

    println!("Created {} account {} ({})", user.role, user.email, user.id);
    Ok(())
}
