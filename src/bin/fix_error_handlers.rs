//! Adds `logger.error` lines to bare exception handlers in a Flask app file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use muhasaba::{config, patcher};

#[derive(Parser, Debug)]
#[command(name = "fix-error-handlers", about = "Patch exception handlers in place")]
struct Cli {
    /// File to patch
    #[arg(default_value = patcher::DEFAULT_TARGET)]
    file: PathBuf,

    /// Report fixes without writing the file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_tracing("info", false);

    let outcome = patcher::patch_file(&cli.file, cli.dry_run)
        .with_context(|| format!("failed to patch {}", cli.file.display()))?;

    for rule in &outcome.applied {
        println!("  {}: {}", rule.rule, rule.fixes);
    }
    if cli.dry_run {
        for (number, line) in &outcome.added {
            println!("  + {}:{}: {}", cli.file.display(), number, line.trim());
        }
    }
    if outcome.fixes == 0 {
        println!("لا توجد معالجات أخطاء تحتاج إلى إصلاح في {}", cli.file.display());
    } else if cli.dry_run {
        println!("سيتم إصلاح {} معالج خطأ في {}", outcome.fixes, cli.file.display());
    } else {
        println!("تم إصلاح {} معالج خطأ في {}", outcome.fixes, cli.file.display());
    }
    Ok(())
}
