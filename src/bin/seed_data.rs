//! Seed data script - fills the accounting database with randomized samples
//!
//! Run with: cargo run --bin seed-data -- invoices
//!
//! Modes:
//! - basics: 3 customers and 3 suppliers, only into empty tables
//! - invoices: parties, 10 sales and 8 purchase invoices, 6 payments
//! - payments: replaces every payment with 15 received and 10 paid

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use muhasaba::{
    config,
    db::{self, DbConfig},
    seed::{self, SeedMode},
};

#[derive(Parser, Debug)]
#[command(name = "seed-data", about = "Insert sample accounting data")]
struct Cli {
    /// SQLite URL; defaults to the configured database
    #[arg(long)]
    database_url: Option<String>,

    /// Fixed RNG seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Mode {
    /// Customers and suppliers only
    Basics,
    /// Parties, invoices and invoice payments
    Invoices,
    /// Replace all payments with fresh samples
    Payments,
}

impl From<Mode> for SeedMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Basics => SeedMode::Basics,
            Mode::Invoices => SeedMode::Invoices,
            Mode::Payments => SeedMode::Payments,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => {
            config::init_tracing("info", false);
            url
        }
        None => {
            let cfg = config::load_config().context("failed to load configuration")?;
            config::init_tracing(cfg.log_level(), cfg.log_json);
            cfg.database_url
        }
    };

    let mode = SeedMode::from(cli.mode);
    info!(%mode, "=== Muhasaba seed data ===");

    let db_config = DbConfig {
        url: database_url.clone(),
        ..Default::default()
    };
    info!("Connecting to database: {}", database_url);
    let db = db::establish_connection_with_config(&db_config)
        .await
        .context("failed to connect to database")?;
    db::run_migrations(&db)
        .await
        .context("failed to prepare schema")?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = seed::run(&db, mode, &mut rng)
        .await
        .with_context(|| format!("seeding '{}' failed", mode))?;

    println!("{}", seed::describe(mode, &report));
    Ok(())
}
