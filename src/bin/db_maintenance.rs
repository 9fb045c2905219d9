//! Database maintenance - integrity check and reset
//!
//! Run with: cargo run --bin db-maintenance -- check
//!
//! Commands:
//! - check: file, connection, tables, columns, foreign keys, indexes, row counts, SQLite integrity
//! - reset --yes: drop every table and recreate the schema, optionally with sample invoices

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use muhasaba::{
    config,
    db::{self, DbConfig},
    maintenance::{self, Verdict},
    seed::{self, SeedMode},
};

#[derive(Parser, Debug)]
#[command(name = "db-maintenance", about = "Check or reset the accounting database")]
struct Cli {
    /// SQLite URL; defaults to the configured database
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every integrity check and print the report
    Check,
    /// Drop all tables and recreate the schema
    Reset {
        /// Confirm that all data will be deleted
        #[arg(long)]
        yes: bool,

        /// Add sample parties, invoices and payments afterwards
        #[arg(long)]
        sample_data: bool,

        /// Fixed RNG seed for the sample data
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn database_url(cli_url: Option<String>) -> anyhow::Result<String> {
    match cli_url {
        Some(url) => {
            config::init_tracing("info", false);
            Ok(url)
        }
        None => {
            let cfg = config::load_config().context("failed to load configuration")?;
            config::init_tracing(cfg.log_level(), cfg.log_json);
            Ok(cfg.database_url)
        }
    }
}

async fn reset(database_url: &str, sample_data: bool, rng_seed: Option<u64>) -> anyhow::Result<()> {
    let db_config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };
    info!("Connecting to database: {}", database_url);
    let db = db::establish_connection_with_config(&db_config)
        .await
        .context("failed to connect to database")?;

    println!("🔄 إعادة إنشاء قاعدة البيانات...");
    maintenance::reset_database(&db)
        .await
        .context("failed to reset database")?;
    println!("✅ تم إنشاء قاعدة البيانات الجديدة");

    if sample_data {
        let mut rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let report = seed::run(&db, SeedMode::Invoices, &mut rng)
            .await
            .context("failed to add sample data")?;
        println!("{}", seed::describe(SeedMode::Invoices, &report));
    }

    println!("🎉 تم إعادة إنشاء قاعدة البيانات بنجاح!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let database_url = database_url(cli.database_url)?;

    match cli.command {
        Command::Check => {
            println!("🔍 فحص سلامة قاعدة البيانات الشامل");
            println!("{}", "=".repeat(60));
            let report = maintenance::inspect(&database_url).await;
            println!("{}", report);
            if report.verdict() == Verdict::Healthy {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Reset {
            yes,
            sample_data,
            seed,
        } => {
            if !yes {
                bail!("reset deletes all data in {}; pass --yes to confirm", database_url);
            }
            reset(&database_url, sample_data, seed).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
