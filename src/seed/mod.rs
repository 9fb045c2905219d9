//! Randomized sample data.
//!
//! Every mode runs inside a single transaction: either all of its rows are
//! written or none are.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::{seq::SliceRandom, Rng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Iterable, PaginatorTrait,
    Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::{
    entities::{
        customer, invoice,
        invoice::SALES_INVOICE_TYPE,
        payment, purchase_invoice, supplier, InvoiceStatus, PaymentMethod, PaymentType,
    },
    errors::ServiceError,
    services::{
        customers::{self, NewCustomer},
        invoices::{
            document_number, next_sequence, InvoiceTotals, PURCHASE_PREFIX, SALES_PREFIX,
        },
        payments::{self, NewPayment, PaymentSummary},
        suppliers::{self, NewSupplier},
    },
};

pub const SEED_VAT_RATE: Decimal = dec!(0.15);

const SALES_INVOICES: usize = 10;
const PURCHASE_INVOICES: usize = 8;
const INVOICE_PAYMENTS: usize = 6;
const RECEIVED_PAYMENTS: usize = 15;
const PAID_PAYMENTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// A few customers and suppliers, only into empty tables
    Basics,
    /// Parties, sales and purchase invoices, and payments against invoices
    Invoices,
    /// Replaces all payments with received and paid samples
    Payments,
}

impl fmt::Display for SeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basics => "basics",
            Self::Invoices => "invoices",
            Self::Payments => "payments",
        };
        f.write_str(name)
    }
}

/// Rows written by one run plus the resulting table sizes
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeedReport {
    pub customers_created: u64,
    pub suppliers_created: u64,
    pub sales_invoices_created: u64,
    pub purchase_invoices_created: u64,
    pub payments_created: u64,
    pub payments_deleted: u64,
    pub customers: u64,
    pub suppliers: u64,
    pub sales_invoices: u64,
    pub purchase_invoices: u64,
    pub payments: u64,
    /// Totals over the payments written by the `payments` mode
    pub payment_summary: Option<PaymentSummary>,
}

struct CustomerSeed {
    name: &'static str,
    email: &'static str,
    phone: &'static str,
}

struct SupplierSeed {
    name: &'static str,
    contact_info: &'static str,
}

const BASIC_CUSTOMERS: [CustomerSeed; 3] = [
    CustomerSeed {
        name: "شركة التجارة المتقدمة",
        email: "info@advanced.com",
        phone: "0501234567",
    },
    CustomerSeed {
        name: "مؤسسة الأعمال الحديثة",
        email: "contact@modern.com",
        phone: "0507654321",
    },
    CustomerSeed {
        name: "شركة الخدمات المتكاملة",
        email: "services@integrated.com",
        phone: "0551234567",
    },
];

const BASIC_SUPPLIERS: [SupplierSeed; 3] = [
    SupplierSeed {
        name: "شركة الإمداد الحديثة",
        contact_info: "supply@modern.com",
    },
    SupplierSeed {
        name: "مؤسسة التوريد المتقدمة",
        contact_info: "advanced@supply.com",
    },
    SupplierSeed {
        name: "شركة المواد الأساسية",
        contact_info: "materials@basic.com",
    },
];

const INVOICE_CUSTOMERS: [CustomerSeed; 5] = [
    CustomerSeed {
        name: "شركة الرياض للتجارة",
        email: "riyadh@company.com",
        phone: "0112345678",
    },
    CustomerSeed {
        name: "مؤسسة جدة التجارية",
        email: "jeddah@company.com",
        phone: "0123456789",
    },
    CustomerSeed {
        name: "شركة الدمام للصناعات",
        email: "dammam@company.com",
        phone: "0134567890",
    },
    CustomerSeed {
        name: "مكتب الخبر للاستشارات",
        email: "khobar@company.com",
        phone: "0145678901",
    },
    CustomerSeed {
        name: "شركة المدينة للخدمات",
        email: "madinah@company.com",
        phone: "0156789012",
    },
];

const INVOICE_SUPPLIERS: [SupplierSeed; 3] = [
    SupplierSeed {
        name: "مورد الرياض",
        contact_info: "أحمد محمد - 0112345678",
    },
    SupplierSeed {
        name: "مورد جدة",
        contact_info: "محمد أحمد - 0123456789",
    },
    SupplierSeed {
        name: "مورد الدمام",
        contact_info: "سعد علي - 0134567890",
    },
];

const PAYMENT_CUSTOMERS: [CustomerSeed; 4] = [
    CustomerSeed {
        name: "أحمد محمد",
        email: "ahmed@example.com",
        phone: "0501234567",
    },
    CustomerSeed {
        name: "فاطمة علي",
        email: "fatima@example.com",
        phone: "0507654321",
    },
    CustomerSeed {
        name: "محمد سالم",
        email: "mohammed@example.com",
        phone: "0509876543",
    },
    CustomerSeed {
        name: "نورا أحمد",
        email: "nora@example.com",
        phone: "0502468135",
    },
];

const PAYMENT_SUPPLIERS: [SupplierSeed; 3] = [
    SupplierSeed {
        name: "شركة التوريدات المتقدمة",
        contact_info: "advanced@supply.com - 0112345678",
    },
    SupplierSeed {
        name: "مؤسسة الخليج للتجارة",
        contact_info: "gulf@trade.com - 0118765432",
    },
    SupplierSeed {
        name: "شركة النور للمواد",
        contact_info: "alnoor@materials.com - 0119876543",
    },
];

impl CustomerSeed {
    fn to_input(&self) -> NewCustomer {
        NewCustomer {
            name: self.name.to_string(),
            email: Some(self.email.to_string()),
            phone: Some(self.phone.to_string()),
        }
    }
}

impl SupplierSeed {
    fn to_input(&self) -> NewSupplier {
        NewSupplier {
            name: self.name.to_string(),
            contact_info: Some(self.contact_info.to_string()),
        }
    }
}

/// Uniform amount in `[low, high]` with cent precision
pub fn random_amount<R: Rng + ?Sized>(rng: &mut R, low: Decimal, high: Decimal) -> Decimal {
    let low = to_cents(low);
    let high = to_cents(high).max(low);
    Decimal::new(rng.gen_range(low..=high), 2)
}

fn to_cents(value: Decimal) -> i64 {
    let mut cents = value.round_dp(2);
    cents.rescale(2);
    cents.mantissa() as i64
}

/// A timestamp between 1 and `max_days` days before `now`
pub fn random_past_date<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, max_days: i64) -> DateTime<Utc> {
    now - Duration::days(rng.gen_range(1..=max_days.max(1)))
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Result<&'a T, ServiceError> {
    items
        .choose(rng)
        .ok_or_else(|| ServiceError::InternalError("nothing to choose from".into()))
}

fn pick_variant<T: Iterable + Copy, R: Rng + ?Sized>(rng: &mut R) -> Result<T, ServiceError> {
    let variants: Vec<T> = T::iter().collect();
    pick(rng, &variants).copied()
}

/// Runs one seeding mode in a transaction; on error nothing is committed.
#[instrument(skip(db, rng))]
pub async fn run<R: Rng + ?Sized>(
    db: &DatabaseConnection,
    mode: SeedMode,
    rng: &mut R,
) -> Result<SeedReport, ServiceError> {
    let txn = db.begin().await?;

    let outcome = match mode {
        SeedMode::Basics => seed_basics(&txn).await,
        SeedMode::Invoices => seed_invoices(&txn, rng).await,
        SeedMode::Payments => seed_payments(&txn, rng).await,
    };

    let mut report = match outcome {
        Ok(report) => report,
        Err(e) => {
            error!(mode = %mode, error = %e, "seeding failed, rolling back");
            txn.rollback().await?;
            return Err(e);
        }
    };

    if let Err(e) = fill_counts(&txn, &mut report).await {
        txn.rollback().await?;
        return Err(e.into());
    }
    txn.commit().await?;

    info!(
        mode = %mode,
        customers = report.customers_created,
        suppliers = report.suppliers_created,
        sales_invoices = report.sales_invoices_created,
        purchase_invoices = report.purchase_invoices_created,
        payments = report.payments_created,
        "seeding committed"
    );
    Ok(report)
}

async fn fill_counts<C: ConnectionTrait>(db: &C, report: &mut SeedReport) -> Result<(), sea_orm::DbErr> {
    report.customers = customer::Entity::find().count(db).await?;
    report.suppliers = supplier::Entity::find().count(db).await?;
    report.sales_invoices = invoice::Entity::find().count(db).await?;
    report.purchase_invoices = purchase_invoice::Entity::find().count(db).await?;
    report.payments = payment::Entity::find().count(db).await?;
    Ok(())
}

async fn seed_basics<C: ConnectionTrait>(db: &C) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport::default();

    if customer::Entity::find().count(db).await? == 0 {
        for seed in &BASIC_CUSTOMERS {
            customers::insert(db, &seed.to_input()).await?;
            report.customers_created += 1;
        }
    }

    if supplier::Entity::find().count(db).await? == 0 {
        for seed in &BASIC_SUPPLIERS {
            suppliers::insert(db, &seed.to_input()).await?;
            report.suppliers_created += 1;
        }
    }

    Ok(report)
}

/// Inserts the customers whose names are not taken yet
async fn upsert_customers<C: ConnectionTrait>(db: &C, seeds: &[CustomerSeed]) -> Result<u64, ServiceError> {
    let mut created = 0;
    for seed in seeds {
        if customers::find_by_name(db, seed.name).await?.is_none() {
            customers::insert(db, &seed.to_input()).await?;
            created += 1;
        }
    }
    Ok(created)
}

async fn upsert_suppliers<C: ConnectionTrait>(db: &C, seeds: &[SupplierSeed]) -> Result<u64, ServiceError> {
    let mut created = 0;
    for seed in seeds {
        if suppliers::find_by_name(db, seed.name).await?.is_none() {
            suppliers::insert(db, &seed.to_input()).await?;
            created += 1;
        }
    }
    Ok(created)
}

async fn seed_invoices<C: ConnectionTrait, R: Rng + ?Sized>(
    db: &C,
    rng: &mut R,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport {
        customers_created: upsert_customers(db, &INVOICE_CUSTOMERS).await?,
        suppliers_created: upsert_suppliers(db, &INVOICE_SUPPLIERS).await?,
        ..Default::default()
    };

    let now = Utc::now();
    let year = now.year();

    let all_customers = customer::Entity::find().all(db).await?;
    let mut sales = Vec::with_capacity(SALES_INVOICES);
    for _ in 0..SALES_INVOICES {
        let customer = pick(rng, &all_customers)?;
        let totals = InvoiceTotals::compute(
            random_amount(rng, dec!(1000), dec!(10000)),
            SEED_VAT_RATE,
            Decimal::ZERO,
        )
        .ok_or_else(|| ServiceError::InternalError("invoice totals overflowed".into()))?;
        let seq =
            next_sequence::<invoice::Entity, _>(db, invoice::Column::InvoiceNumber, SALES_PREFIX, year)
                .await?;

        let created = invoice::ActiveModel {
            invoice_number: Set(document_number(SALES_PREFIX, year, seq)),
            customer_id: Set(Some(customer.id)),
            customer_name: Set(customer.name.clone()),
            date: Set(random_past_date(rng, now, 30)),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            discount: Set(totals.discount),
            total_amount: Set(totals.total_amount),
            status: Set(pick_variant::<InvoiceStatus, _>(rng)?),
            invoice_type: Set(SALES_INVOICE_TYPE.to_string()),
            notes: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        sales.push(created);
        report.sales_invoices_created += 1;
    }

    let all_suppliers = supplier::Entity::find().all(db).await?;
    for _ in 0..PURCHASE_INVOICES {
        let supplier = pick(rng, &all_suppliers)?;
        let totals = InvoiceTotals::compute(
            random_amount(rng, dec!(2000), dec!(15000)),
            SEED_VAT_RATE,
            Decimal::ZERO,
        )
        .ok_or_else(|| ServiceError::InternalError("invoice totals overflowed".into()))?;
        let seq = next_sequence::<purchase_invoice::Entity, _>(
            db,
            purchase_invoice::Column::InvoiceNumber,
            PURCHASE_PREFIX,
            year,
        )
        .await?;

        purchase_invoice::ActiveModel {
            invoice_number: Set(document_number(PURCHASE_PREFIX, year, seq)),
            supplier_id: Set(Some(supplier.id)),
            supplier_name: Set(supplier.name.clone()),
            date: Set(random_past_date(rng, now, 30)),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            discount: Set(totals.discount),
            total_amount: Set(totals.total_amount),
            status: Set(pick_variant::<InvoiceStatus, _>(rng)?),
            notes: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.purchase_invoices_created += 1;
    }

    for i in 0..INVOICE_PAYMENTS {
        let invoice = pick(rng, &sales)?;
        let low = invoice.total_amount.min(dec!(500));
        payments::insert(
            db,
            NewPayment {
                date: Some(random_past_date(rng, now, 20)),
                amount: random_amount(rng, low, invoice.total_amount),
                payment_method: pick_variant::<PaymentMethod, _>(rng)?,
                payment_type: pick_variant::<PaymentType, _>(rng)?,
                reference_number: Some(document_number("PAY", year, i as u32 + 1)),
                invoice_id: Some(invoice.id),
                customer_name: Some(invoice.customer_name.clone()),
                supplier_name: None,
                notes: Some(format!("دفعة من فاتورة {}", invoice.invoice_number)),
            },
        )
        .await?;
        report.payments_created += 1;
    }

    Ok(report)
}

async fn seed_payments<C: ConnectionTrait, R: Rng + ?Sized>(
    db: &C,
    rng: &mut R,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport {
        payments_deleted: payment::Entity::delete_many().exec(db).await?.rows_affected,
        ..Default::default()
    };

    let mut all_customers = customer::Entity::find().all(db).await?;
    if all_customers.is_empty() {
        for seed in &PAYMENT_CUSTOMERS {
            all_customers.push(customers::insert(db, &seed.to_input()).await?);
            report.customers_created += 1;
        }
    }
    let mut all_suppliers = supplier::Entity::find().all(db).await?;
    if all_suppliers.is_empty() {
        for seed in &PAYMENT_SUPPLIERS {
            all_suppliers.push(suppliers::insert(db, &seed.to_input()).await?);
            report.suppliers_created += 1;
        }
    }

    let now = Utc::now();
    let mut written = Vec::with_capacity(RECEIVED_PAYMENTS + PAID_PAYMENTS);

    for i in 0..RECEIVED_PAYMENTS {
        let customer = pick(rng, &all_customers)?;
        written.push(
            payments::insert(
                db,
                NewPayment {
                    date: Some(random_past_date(rng, now, 90)),
                    amount: random_amount(rng, dec!(500), dec!(5000)),
                    payment_method: pick_variant::<PaymentMethod, _>(rng)?,
                    payment_type: PaymentType::Received,
                    reference_number: Some(format!("REC-{}", 1000 + i)),
                    invoice_id: None,
                    customer_name: Some(customer.name.clone()),
                    supplier_name: None,
                    notes: Some(format!("دفعة من العميل {}", customer.name)),
                },
            )
            .await?,
        );
    }

    for i in 0..PAID_PAYMENTS {
        let supplier = pick(rng, &all_suppliers)?;
        written.push(
            payments::insert(
                db,
                NewPayment {
                    date: Some(random_past_date(rng, now, 60)),
                    amount: random_amount(rng, dec!(1000), dec!(8000)),
                    payment_method: pick_variant::<PaymentMethod, _>(rng)?,
                    payment_type: PaymentType::Paid,
                    reference_number: Some(format!("PAY-{}", 2000 + i)),
                    invoice_id: None,
                    customer_name: None,
                    supplier_name: Some(supplier.name.clone()),
                    notes: Some(format!("دفعة للمورد {}", supplier.name)),
                },
            )
            .await?,
        );
    }

    report.payments_created = written.len() as u64;
    report.payment_summary = Some(PaymentSummary::from_payments(&written));
    Ok(report)
}

/// Human-readable summary printed by the seeding tool
pub fn describe(mode: SeedMode, report: &SeedReport) -> String {
    let mut lines = vec![
        format!("وضع التوليد: {}", mode),
        format!("العملاء: {} (جديد: {})", report.customers, report.customers_created),
        format!("الموردين: {} (جديد: {})", report.suppliers, report.suppliers_created),
        format!(
            "فواتير المبيعات: {} (جديد: {})",
            report.sales_invoices, report.sales_invoices_created
        ),
        format!(
            "فواتير المشتريات: {} (جديد: {})",
            report.purchase_invoices, report.purchase_invoices_created
        ),
        format!("المدفوعات: {} (جديد: {})", report.payments, report.payments_created),
    ];

    if let Some(summary) = &report.payment_summary {
        lines.push(format!(
            "إجمالي المقبوضات: {}",
            crate::views::format_money(summary.total_received)
        ));
        lines.push(format!(
            "إجمالي المدفوعات: {}",
            crate::views::format_money(summary.total_paid)
        ));
        lines.push(format!(
            "صافي التدفق: {}",
            crate::views::format_money(summary.net_flow)
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, DbConfig};
    use rand::{rngs::StdRng, SeedableRng};
    use sea_orm::{ColumnTrait, QueryFilter};

    async fn database() -> DatabaseConnection {
        let db = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .unwrap();
        db::run_migrations(&db).await.unwrap();
        db
    }

    #[test]
    fn random_amounts_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let amount = random_amount(&mut rng, dec!(500), dec!(5000));
            assert!(amount >= dec!(500) && amount <= dec!(5000));
            assert_eq!(amount, amount.round_dp(2));
        }
        assert_eq!(random_amount(&mut rng, dec!(300), dec!(300)), dec!(300));
    }

    #[test]
    fn past_dates_are_within_window() {
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();
        for _ in 0..200 {
            let date = random_past_date(&mut rng, now, 30);
            let days = (now - date).num_days();
            assert!((1..=30).contains(&days));
        }
    }

    #[tokio::test]
    async fn basics_only_fill_empty_tables() {
        let db = database().await;
        let mut rng = StdRng::seed_from_u64(3);

        let first = run(&db, SeedMode::Basics, &mut rng).await.unwrap();
        assert_eq!(first.customers_created, 3);
        assert_eq!(first.suppliers_created, 3);

        let second = run(&db, SeedMode::Basics, &mut rng).await.unwrap();
        assert_eq!(second.customers_created, 0);
        assert_eq!(second.customers, 3);
        assert_eq!(second.suppliers, 3);
    }

    #[tokio::test]
    async fn invoices_add_up_and_parties_are_not_duplicated() {
        let db = database().await;
        let mut rng = StdRng::seed_from_u64(42);

        let report = run(&db, SeedMode::Invoices, &mut rng).await.unwrap();
        assert_eq!(report.customers_created, 5);
        assert_eq!(report.suppliers_created, 3);
        assert_eq!(report.sales_invoices, 10);
        assert_eq!(report.purchase_invoices, 8);
        assert_eq!(report.payments, 6);

        for inv in invoice::Entity::find().all(&db).await.unwrap() {
            let subtotal = inv.subtotal.round_dp(2);
            let tax = inv.tax_amount.round_dp(2);
            assert_eq!(tax, (subtotal * SEED_VAT_RATE).round_dp(2));
            assert_eq!(inv.total_amount.round_dp(2), subtotal + tax);
            assert!(subtotal >= dec!(1000) && subtotal <= dec!(10000));
            assert!(inv.invoice_number.starts_with("INV-"));
            assert_eq!(inv.invoice_number.len(), "INV-".len() + 8);
        }

        let again = run(&db, SeedMode::Invoices, &mut rng).await.unwrap();
        assert_eq!(again.customers_created, 0);
        assert_eq!(again.suppliers_created, 0);
        assert_eq!(again.customers, 5);
        assert_eq!(again.sales_invoices, 20);
    }

    #[tokio::test]
    async fn invoice_payments_do_not_exceed_their_invoice() {
        let db = database().await;
        let mut rng = StdRng::seed_from_u64(9);
        run(&db, SeedMode::Invoices, &mut rng).await.unwrap();

        for p in payment::Entity::find().all(&db).await.unwrap() {
            let invoice_id = p.invoice_id.unwrap();
            let inv = invoice::Entity::find_by_id(invoice_id)
                .one(&db)
                .await
                .unwrap()
                .unwrap();
            let amount = p.amount.round_dp(2);
            assert!(amount <= inv.total_amount.round_dp(2));
            assert!(amount >= inv.total_amount.round_dp(2).min(dec!(500)));
            assert!(p.reference_number.unwrap().starts_with("PAY-"));
        }
    }

    #[tokio::test]
    async fn payments_mode_replaces_all_payments() {
        let db = database().await;
        let mut rng = StdRng::seed_from_u64(11);
        run(&db, SeedMode::Invoices, &mut rng).await.unwrap();

        let report = run(&db, SeedMode::Payments, &mut rng).await.unwrap();
        assert_eq!(report.payments_deleted, 6);
        assert_eq!(report.customers_created, 0);
        assert_eq!(report.payments, 25);

        let received = payment::Entity::find()
            .filter(payment::Column::PaymentType.eq(PaymentType::Received))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(received.len(), 15);
        for p in &received {
            let amount = p.amount.round_dp(2);
            assert!(amount >= dec!(500) && amount <= dec!(5000));
            assert!(p.reference_number.as_deref().unwrap().starts_with("REC-1"));
        }

        let summary = report.payment_summary.unwrap();
        assert_eq!(summary.received_count, 15);
        assert_eq!(summary.paid_count, 10);
        assert_eq!(summary.net_flow, summary.total_received - summary.total_paid);
    }

    #[tokio::test]
    async fn payments_mode_creates_parties_on_empty_database() {
        let db = database().await;
        let mut rng = StdRng::seed_from_u64(5);
        let report = run(&db, SeedMode::Payments, &mut rng).await.unwrap();
        assert_eq!(report.customers_created, 4);
        assert_eq!(report.suppliers_created, 3);
        assert_eq!(report.payments, 25);
    }

    #[tokio::test]
    async fn same_seed_gives_same_amounts() {
        let amounts = |seed| async move {
            let db = database().await;
            let mut rng = StdRng::seed_from_u64(seed);
            run(&db, SeedMode::Payments, &mut rng).await.unwrap();
            let mut rows: Vec<Decimal> = payment::Entity::find()
                .all(&db)
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.amount.round_dp(2))
                .collect();
            rows.sort();
            rows
        };
        assert_eq!(amounts(21).await, amounts(21).await);
    }
}
