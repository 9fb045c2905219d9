//! Database integrity checks and schema reset.
//!
//! The checks never stop at the first problem: a check that errors is
//! recorded as failed and the remaining checks still run.

use std::{fmt, path::PathBuf};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Statement,
};
use sea_orm_migration::{MigratorTrait, SchemaManager};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    db::{self, DbConfig},
    entities::{customer, invoice, payment, purchase_invoice, supplier, user},
    errors::ServiceError,
    migrator::Migrator,
    services::users,
};

pub const REQUIRED_TABLES: [&str; 6] = [
    "users",
    "customers",
    "suppliers",
    "invoices",
    "purchase_invoices",
    "payments",
];

pub const REQUIRED_COLUMNS: [(&str, &[&str]); 4] = [
    ("users", &["id", "username", "password_hash", "full_name"]),
    (
        "invoices",
        &["id", "invoice_number", "date", "customer_name", "total_amount", "status", "invoice_type"],
    ),
    (
        "purchase_invoices",
        &["id", "invoice_number", "date", "supplier_name", "total_amount", "status"],
    ),
    (
        "payments",
        &["id", "date", "amount", "payment_method", "payment_type", "invoice_id"],
    ),
];

const LINKED_TABLES: [&str; 3] = ["invoices", "purchase_invoices", "payments"];

/// Result of one named check
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub details: Vec<String>,
}

impl CheckOutcome {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            passed: true,
            details: Vec::new(),
        }
    }

    fn detail(&mut self, line: impl Into<String>) {
        self.details.push(line.into());
    }

    fn fail(&mut self, line: impl Into<String>) {
        self.passed = false;
        self.details.push(line.into());
    }

    fn errored(name: &'static str, err: &DbErr) -> Self {
        warn!(check = name, error = %err, "integrity check errored");
        let mut outcome = Self::new(name);
        outcome.fail(format!("خطأ: {}", err));
        outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Healthy,
    NeedsAttention,
    NeedsRepair,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Healthy => "قاعدة البيانات سليمة تماماً",
            Self::NeedsAttention => "قاعدة البيانات تحتاج بعض التحسينات",
            Self::NeedsRepair => "قاعدة البيانات تحتاج إصلاح شامل",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IntegrityReport {
    pub checks: Vec<CheckOutcome>,
}

impl IntegrityReport {
    pub fn passed(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn success_rate(&self) -> f64 {
        if self.checks.is_empty() {
            return 0.0;
        }
        self.passed() as f64 / self.total() as f64 * 100.0
    }

    pub fn check(&self, name: &str) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.name == name)
    }

    /// All passed is healthy, at least 80% needs attention, anything less needs repair
    pub fn verdict(&self) -> Verdict {
        let passed = self.passed();
        if !self.checks.is_empty() && passed == self.total() {
            Verdict::Healthy
        } else if passed * 10 >= self.total() * 8 && passed > 0 {
            Verdict::NeedsAttention
        } else {
            Verdict::NeedsRepair
        }
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let mark = if check.passed { "✅" } else { "❌" };
            let state = if check.passed { "نجح" } else { "فشل" };
            writeln!(f, "{} {}: {}", mark, check.name, state)?;
            for line in &check.details {
                writeln!(f, "  • {}", line)?;
            }
        }
        writeln!(f, "نتائج الفحص: {}/{} فحص نجح", self.passed(), self.total())?;
        writeln!(f, "معدل النجاح: {:.1}%", self.success_rate())?;
        writeln!(f, "{}", self.verdict())
    }
}

pub const FILE_CHECK: &str = "فحص ملف قاعدة البيانات";
pub const CONNECTION_CHECK: &str = "فحص الاتصال";
pub const TABLES_CHECK: &str = "فحص هيكل الجداول";
pub const COLUMNS_CHECK: &str = "فحص أعمدة الجداول";
pub const FOREIGN_KEYS_CHECK: &str = "فحص المفاتيح الخارجية";
pub const INDEXES_CHECK: &str = "فحص الفهارس";
pub const ROWS_CHECK: &str = "فحص سلامة البيانات";
pub const SQLITE_CHECK: &str = "فحص سلامة SQLite";

/// Path of the database file behind a SQLite URL; `None` for in-memory databases
pub fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, query),
        None => (rest, ""),
    };
    if path.is_empty() || path == ":memory:" || query.contains("mode=memory") {
        return None;
    }
    Some(PathBuf::from(path))
}

pub fn check_database_file(database_url: &str) -> CheckOutcome {
    let mut outcome = CheckOutcome::new(FILE_CHECK);
    if !database_url.starts_with("sqlite:") {
        outcome.detail("ليست قاعدة بيانات SQLite");
        return outcome;
    }
    match sqlite_file_path(database_url) {
        None => outcome.detail("قاعدة بيانات في الذاكرة"),
        Some(path) => match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                outcome.detail(format!("{} - الحجم: {} بايت", path.display(), meta.len()))
            }
            _ => outcome.fail(format!("{} - غير موجود", path.display())),
        },
    }
    outcome
}

pub async fn check_connection(db: &DatabaseConnection) -> CheckOutcome {
    let mut outcome = CheckOutcome::new(CONNECTION_CHECK);
    match db::check_connection(db).await {
        Ok(()) => outcome.detail("الاتصال بقاعدة البيانات يعمل"),
        Err(err) => outcome.fail(format!("خطأ في الاتصال: {}", err)),
    }
    outcome
}

async fn check_tables(db: &DatabaseConnection) -> Result<CheckOutcome, DbErr> {
    let manager = SchemaManager::new(db);
    let mut outcome = CheckOutcome::new(TABLES_CHECK);
    let mut present = 0;
    for table in REQUIRED_TABLES {
        if manager.has_table(table).await? {
            present += 1;
            outcome.detail(format!("✅ {}", table));
        } else {
            outcome.fail(format!("❌ {} - مفقود", table));
        }
    }
    outcome.detail(format!(
        "الجداول الموجودة: {}/{}",
        present,
        REQUIRED_TABLES.len()
    ));
    Ok(outcome)
}

async fn check_columns(db: &DatabaseConnection) -> Result<CheckOutcome, DbErr> {
    let manager = SchemaManager::new(db);
    let mut outcome = CheckOutcome::new(COLUMNS_CHECK);
    for (table, columns) in REQUIRED_COLUMNS {
        if !manager.has_table(table).await? {
            outcome.fail(format!("{}: الجدول مفقود", table));
            continue;
        }
        let mut missing = Vec::new();
        for column in columns {
            if !manager.has_column(table, column).await? {
                missing.push(*column);
            }
        }
        if missing.is_empty() {
            outcome.detail(format!("{}: {} أعمدة", table, columns.len()));
        } else {
            outcome.fail(format!("{}: أعمدة مفقودة {}", table, missing.join(", ")));
        }
    }
    Ok(outcome)
}

fn pragma(sql: String) -> Statement {
    Statement::from_string(DbBackend::Sqlite, sql)
}

/// Declared foreign keys plus rows whose parent row is missing
async fn check_foreign_keys(db: &DatabaseConnection) -> Result<CheckOutcome, DbErr> {
    let manager = SchemaManager::new(db);
    let mut outcome = CheckOutcome::new(FOREIGN_KEYS_CHECK);
    for table in LINKED_TABLES {
        if !manager.has_table(table).await? {
            continue;
        }
        let keys = db
            .query_all(pragma(format!("PRAGMA foreign_key_list({})", table)))
            .await?;
        if keys.is_empty() {
            outcome.detail(format!("{}: لا توجد مفاتيح خارجية", table));
        }
        for key in keys {
            let from: String = key.try_get("", "from")?;
            let parent: String = key.try_get("", "table")?;
            let to: Option<String> = key.try_get("", "to")?;
            outcome.detail(format!(
                "{}.{} -> {}.{}",
                table,
                from,
                parent,
                to.as_deref().unwrap_or("id")
            ));
        }
    }

    let violations = db
        .query_all(pragma("PRAGMA foreign_key_check".to_string()))
        .await?;
    for row in violations {
        let table: String = row.try_get("", "table")?;
        let parent: String = row.try_get("", "parent")?;
        let rowid: Option<i64> = row.try_get("", "rowid")?;
        outcome.fail(format!(
            "{} #{}: يشير إلى سجل غير موجود في {}",
            table,
            rowid.map_or_else(|| "-".to_string(), |id| id.to_string()),
            parent
        ));
    }
    Ok(outcome)
}

async fn check_indexes(db: &DatabaseConnection) -> Result<CheckOutcome, DbErr> {
    let manager = SchemaManager::new(db);
    let mut outcome = CheckOutcome::new(INDEXES_CHECK);
    for table in REQUIRED_TABLES {
        if !manager.has_table(table).await? {
            continue;
        }
        let indexes = db
            .query_all(pragma(format!("PRAGMA index_list({})", table)))
            .await?;
        if indexes.is_empty() {
            outcome.detail(format!("{}: لا توجد فهارس", table));
        }
        for index in indexes {
            let name: String = index.try_get("", "name")?;
            let unique: i64 = index.try_get("", "unique")?;
            let kind = if unique != 0 { "فريد" } else { "عادي" };
            outcome.detail(format!("{}: {} ({})", table, name, kind));
        }
    }
    Ok(outcome)
}

async fn check_rows(db: &DatabaseConnection) -> Result<CheckOutcome, DbErr> {
    let mut outcome = CheckOutcome::new(ROWS_CHECK);
    let counts = [
        ("المستخدمين", user::Entity::find().count(db).await?),
        ("العملاء", customer::Entity::find().count(db).await?),
        ("الموردين", supplier::Entity::find().count(db).await?),
        ("الفواتير", invoice::Entity::find().count(db).await?),
        ("فواتير المشتريات", purchase_invoice::Entity::find().count(db).await?),
        ("المدفوعات", payment::Entity::find().count(db).await?),
    ];
    let mut total = 0;
    for (label, count) in counts {
        total += count;
        outcome.detail(format!("{}: {} سجل", label, count));
    }
    outcome.detail(format!("إجمالي السجلات: {}", total));

    let linked = payment::Entity::find()
        .filter(payment::Column::InvoiceId.is_not_null())
        .count(db)
        .await?;
    outcome.detail(format!(
        "المدفوعات المرتبطة بفواتير: {}/{}",
        linked, counts[5].1
    ));
    Ok(outcome)
}

async fn check_sqlite(db: &DatabaseConnection) -> Result<CheckOutcome, DbErr> {
    let mut outcome = CheckOutcome::new(SQLITE_CHECK);
    let rows = db
        .query_all(pragma("PRAGMA integrity_check".to_string()))
        .await?;
    let messages = rows
        .iter()
        .map(|row| row.try_get::<String>("", "integrity_check"))
        .collect::<Result<Vec<_>, _>>()?;
    if messages.len() == 1 && messages[0] == "ok" {
        outcome.detail("قاعدة البيانات سليمة");
    } else {
        outcome.fail("توجد مشاكل");
        for message in messages {
            outcome.detail(message);
        }
    }
    Ok(outcome)
}

/// Runs every check except the file check against an open connection
#[instrument(skip(db))]
pub async fn run_checks(db: &DatabaseConnection) -> IntegrityReport {
    let mut report = IntegrityReport::default();
    let connection = check_connection(db).await;
    let connected = connection.passed;
    report.checks.push(connection);
    if !connected {
        return report;
    }

    let results = [
        (TABLES_CHECK, check_tables(db).await),
        (COLUMNS_CHECK, check_columns(db).await),
        (FOREIGN_KEYS_CHECK, check_foreign_keys(db).await),
        (INDEXES_CHECK, check_indexes(db).await),
        (ROWS_CHECK, check_rows(db).await),
        (SQLITE_CHECK, check_sqlite(db).await),
    ];
    for (name, result) in results {
        report
            .checks
            .push(result.unwrap_or_else(|err| CheckOutcome::errored(name, &err)));
    }

    info!(
        passed = report.passed(),
        total = report.total(),
        "integrity checks finished"
    );
    report
}

/// File check, then the remaining checks over a fresh connection.
///
/// A missing database file stops here so that connecting does not create it.
pub async fn inspect(database_url: &str) -> IntegrityReport {
    let file = check_database_file(database_url);
    if !file.passed {
        return IntegrityReport { checks: vec![file] };
    }

    let config = DbConfig {
        url: database_url.to_string(),
        max_connections: 1,
        ..Default::default()
    };
    let mut report = match db::establish_connection_with_config(&config).await {
        Ok(db) => run_checks(&db).await,
        Err(err) => {
            let mut outcome = CheckOutcome::new(CONNECTION_CHECK);
            outcome.fail(format!("خطأ في الاتصال: {}", err));
            IntegrityReport {
                checks: vec![outcome],
            }
        }
    };
    report.checks.insert(0, file);
    report
}

/// Drops every table, recreates the schema and the default administrator
#[instrument(skip(db))]
pub async fn reset_database(db: &DatabaseConnection) -> Result<(), ServiceError> {
    warn!("dropping all tables");
    Migrator::fresh(db).await?;
    let created = users::ensure_default_admin(db).await?;
    info!(admin_created = created, "database reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entities::{PaymentMethod, PaymentType}, seed::{self, SeedMode}};
    use chrono::Utc;
    use rand::{rngs::StdRng, SeedableRng};
    use rust_decimal_macros::dec;
    use sea_orm::{ActiveModelTrait, Set};

    async fn connect() -> DatabaseConnection {
        db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .unwrap()
    }

    async fn migrated() -> DatabaseConnection {
        let db = connect().await;
        db::run_migrations(&db).await.unwrap();
        db
    }

    #[test]
    fn file_path_comes_from_sqlite_url() {
        assert_eq!(
            sqlite_file_path("sqlite://accounting.db?mode=rwc"),
            Some(PathBuf::from("accounting.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:///var/lib/app/data.db"),
            Some(PathBuf::from("/var/lib/app/data.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("sqlite://file?mode=memory&cache=shared"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }

    #[test]
    fn missing_file_fails_and_existing_file_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounting.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        assert!(!check_database_file(&url).passed);

        std::fs::write(&path, b"0123456789").unwrap();
        let outcome = check_database_file(&url);
        assert!(outcome.passed);
        assert!(outcome.details[0].contains("10 بايت"));
        assert!(check_database_file("sqlite::memory:").passed);
    }

    #[tokio::test]
    async fn migrated_database_passes_every_check() {
        let db = migrated().await;
        users::ensure_default_admin(&db).await.unwrap();

        let report = run_checks(&db).await;
        assert_eq!(report.total(), 7);
        assert_eq!(report.passed(), 7, "{}", report);
        assert_eq!(report.verdict(), Verdict::Healthy);

        let keys = report.check(FOREIGN_KEYS_CHECK).unwrap();
        assert!(keys.details.iter().any(|d| d == "payments.invoice_id -> invoices.id"));
        let indexes = report.check(INDEXES_CHECK).unwrap();
        assert!(indexes.details.iter().any(|d| d.contains("idx_payments_date")));
        let rows = report.check(ROWS_CHECK).unwrap();
        assert!(rows.details.contains(&"المستخدمين: 1 سجل".to_string()));
    }

    #[tokio::test]
    async fn empty_database_is_missing_tables() {
        let db = connect().await;
        let report = run_checks(&db).await;

        assert!(report.check(CONNECTION_CHECK).unwrap().passed);
        let tables = report.check(TABLES_CHECK).unwrap();
        assert!(!tables.passed);
        assert!(tables.details.contains(&"❌ payments - مفقود".to_string()));
        assert!(!report.check(COLUMNS_CHECK).unwrap().passed);
        assert!(!report.check(ROWS_CHECK).unwrap().passed);
        assert_eq!(report.verdict(), Verdict::NeedsRepair);
    }

    #[tokio::test]
    async fn orphaned_payment_fails_foreign_key_check() {
        let db = migrated().await;
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await.unwrap();
        payment::ActiveModel {
            date: Set(Utc::now()),
            amount: Set(dec!(10)),
            payment_method: Set(PaymentMethod::Cash),
            payment_type: Set(PaymentType::Received),
            invoice_id: Set(Some(999)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let report = run_checks(&db).await;
        let keys = report.check(FOREIGN_KEYS_CHECK).unwrap();
        assert!(!keys.passed);
        assert!(keys.details.iter().any(|d| d.contains("payments #1")));
        assert_eq!(report.verdict(), Verdict::NeedsAttention);
    }

    #[tokio::test]
    async fn inspect_stops_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let report = inspect(&format!("sqlite://{}?mode=rwc", path.display())).await;
        assert_eq!(report.total(), 1);
        assert!(!report.checks[0].passed);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn reset_empties_tables_and_keeps_admin() {
        let db = migrated().await;
        users::ensure_default_admin(&db).await.unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        seed::run(&db, SeedMode::Invoices, &mut rng).await.unwrap();
        assert!(invoice::Entity::find().count(&db).await.unwrap() > 0);

        reset_database(&db).await.unwrap();

        assert_eq!(invoice::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(payment::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(customer::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(run_checks(&db).await.verdict(), Verdict::Healthy);
    }

    #[test]
    fn verdict_thresholds() {
        let outcome = |passed| CheckOutcome {
            name: "x",
            passed,
            details: Vec::new(),
        };
        let report = |passed: usize, failed: usize| IntegrityReport {
            checks: std::iter::repeat_with(|| outcome(true))
                .take(passed)
                .chain(std::iter::repeat_with(|| outcome(false)).take(failed))
                .collect(),
        };
        assert_eq!(report(8, 0).verdict(), Verdict::Healthy);
        assert_eq!(report(7, 1).verdict(), Verdict::NeedsAttention);
        assert_eq!(report(6, 2).verdict(), Verdict::NeedsRepair);
        assert_eq!(IntegrityReport::default().verdict(), Verdict::NeedsRepair);
        assert_eq!(report(4, 1).verdict(), Verdict::NeedsAttention);
    }
}
