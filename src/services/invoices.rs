use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};

use super::{ensure_amount_in_range, non_empty, Page, MAX_AMOUNT};
use crate::{
    db::DbPool,
    entities::{
        customer, invoice,
        invoice::{InvoiceStatus, SALES_INVOICE_TYPE},
        purchase_invoice, supplier,
    },
    errors::ServiceError,
};

pub const SALES_PREFIX: &str = "INV";
pub const PURCHASE_PREFIX: &str = "PUR";

/// Rounds a money amount to two decimal places
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a configured VAT rate (e.g. 0.15) to a decimal
pub fn vat_rate_decimal(rate: f64) -> Decimal {
    Decimal::try_from(rate)
        .map(|r| r.round_dp(4))
        .unwrap_or(Decimal::ZERO)
}

/// Amounts of one invoice. `total = subtotal + tax - discount` holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceTotals {
    /// Tax is taken on the already rounded subtotal. `None` when the
    /// arithmetic overflows.
    pub fn compute(subtotal: Decimal, tax_rate: Decimal, discount: Decimal) -> Option<Self> {
        let subtotal = round_money(subtotal);
        let tax_amount = round_money(subtotal.checked_mul(tax_rate)?);
        let discount = round_money(discount);
        let total_amount = subtotal.checked_add(tax_amount)?.checked_sub(discount)?;
        Some(Self {
            subtotal,
            tax_amount,
            discount,
            total_amount,
        })
    }
}

/// Builds a document number such as `INV-20250007`
pub fn document_number(prefix: &str, year: i32, seq: u32) -> String {
    format!("{}-{}{:04}", prefix, year, seq)
}

/// Next free sequence number for `<prefix>-<year>` among the values of `column`
pub async fn next_sequence<E, C>(
    db: &C,
    column: E::Column,
    prefix: &str,
    year: i32,
) -> Result<u32, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let stem = format!("{}-{}", prefix, year);
    let numbers: Vec<String> = E::find()
        .select_only()
        .column(column)
        .filter(column.starts_with(&stem))
        .into_tuple()
        .all(db)
        .await?;

    Ok(numbers
        .iter()
        .filter_map(|n| n.strip_prefix(&stem)?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1)
}

/// Input for a new sales or purchase invoice
#[derive(Debug, Clone)]
pub struct NewInvoice {
    /// Customer id for sales, supplier id for purchases
    pub party_id: Option<i32>,
    /// Free-text party name, used when no id is given
    pub party_name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub subtotal: Decimal,
    /// Falls back to the configured VAT rate
    pub tax_rate: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
}

impl NewInvoice {
    fn totals(&self, default_rate: Decimal) -> Result<InvoiceTotals, ServiceError> {
        if self.subtotal < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "المبلغ قبل الضريبة يجب ألا يكون سالباً".into(),
            ));
        }
        let rate = self.tax_rate.unwrap_or(default_rate);
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(ServiceError::ValidationError(
                "نسبة الضريبة يجب أن تكون بين 0 و 100%".into(),
            ));
        }
        let discount = self.discount.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO {
            return Err(ServiceError::ValidationError("الخصم يجب ألا يكون سالباً".into()));
        }

        ensure_amount_in_range(self.subtotal, "المبلغ")?;
        ensure_amount_in_range(discount, "الخصم")?;

        let too_large =
            || ServiceError::ValidationError("إجمالي الفاتورة يتجاوز الحد المسموح".into());
        let totals = InvoiceTotals::compute(self.subtotal, rate, discount).ok_or_else(too_large)?;
        if totals.total_amount > MAX_AMOUNT {
            return Err(too_large());
        }
        if totals.total_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "الخصم أكبر من قيمة الفاتورة".into(),
            ));
        }
        Ok(totals)
    }
}

/// Sales and purchase invoices
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    vat_rate: Decimal,
}

impl InvoiceService {
    pub fn new(db_pool: Arc<DbPool>, vat_rate: Decimal) -> Self {
        Self { db_pool, vat_rate }
    }

    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    #[instrument(skip(self))]
    pub async fn create_sales(&self, input: NewInvoice) -> Result<invoice::Model, ServiceError> {
        let totals = input.totals(self.vat_rate)?;
        let txn = self.db_pool.begin().await?;

        let (customer_id, customer_name) = match input.party_id {
            Some(id) => {
                let customer = customer::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::ValidationError("العميل المحدد غير موجود".into()))?;
                (Some(customer.id), customer.name)
            }
            None => match non_empty(input.party_name.clone()) {
                Some(name) => (None, name),
                None => return Err(ServiceError::ValidationError("يرجى اختيار العميل".into())),
            },
        };

        let date = input.date.unwrap_or_else(Utc::now);
        let seq = next_sequence::<invoice::Entity, _>(
            &txn,
            invoice::Column::InvoiceNumber,
            SALES_PREFIX,
            date.year(),
        )
        .await?;

        let created = invoice::ActiveModel {
            invoice_number: Set(document_number(SALES_PREFIX, date.year(), seq)),
            customer_id: Set(customer_id),
            customer_name: Set(customer_name),
            date: Set(date),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            discount: Set(totals.discount),
            total_amount: Set(totals.total_amount),
            status: Set(input.status),
            invoice_type: Set(SALES_INVOICE_TYPE.to_string()),
            notes: Set(non_empty(input.notes)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(invoice_id = created.id, number = %created.invoice_number, "sales invoice created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn create_purchase(
        &self,
        input: NewInvoice,
    ) -> Result<purchase_invoice::Model, ServiceError> {
        let totals = input.totals(self.vat_rate)?;
        let txn = self.db_pool.begin().await?;

        let (supplier_id, supplier_name) = match input.party_id {
            Some(id) => {
                let supplier = supplier::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| ServiceError::ValidationError("المورد المحدد غير موجود".into()))?;
                (Some(supplier.id), supplier.name)
            }
            None => match non_empty(input.party_name.clone()) {
                Some(name) => (None, name),
                None => return Err(ServiceError::ValidationError("يرجى اختيار المورد".into())),
            },
        };

        let date = input.date.unwrap_or_else(Utc::now);
        let seq = next_sequence::<purchase_invoice::Entity, _>(
            &txn,
            purchase_invoice::Column::InvoiceNumber,
            PURCHASE_PREFIX,
            date.year(),
        )
        .await?;

        let created = purchase_invoice::ActiveModel {
            invoice_number: Set(document_number(PURCHASE_PREFIX, date.year(), seq)),
            supplier_id: Set(supplier_id),
            supplier_name: Set(supplier_name),
            date: Set(date),
            subtotal: Set(totals.subtotal),
            tax_amount: Set(totals.tax_amount),
            discount: Set(totals.discount),
            total_amount: Set(totals.total_amount),
            status: Set(input.status),
            notes: Set(non_empty(input.notes)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(invoice_id = created.id, number = %created.invoice_number, "purchase invoice created");
        Ok(created)
    }

    pub async fn list_sales(&self, page: u64, per_page: u64) -> Result<Page<invoice::Model>, ServiceError> {
        let paginator = invoice::Entity::find()
            .order_by_desc(invoice::Column::Date)
            .order_by_desc(invoice::Column::Id)
            .paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    pub async fn list_purchases(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<Page<purchase_invoice::Model>, ServiceError> {
        let paginator = purchase_invoice::Entity::find()
            .order_by_desc(purchase_invoice::Column::Date)
            .order_by_desc(purchase_invoice::Column::Id)
            .paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    pub async fn all_sales(&self) -> Result<Vec<invoice::Model>, ServiceError> {
        Ok(invoice::Entity::find()
            .order_by_desc(invoice::Column::Date)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn all_purchases(&self) -> Result<Vec<purchase_invoice::Model>, ServiceError> {
        Ok(purchase_invoice::Entity::find()
            .order_by_desc(purchase_invoice::Column::Date)
            .all(&*self.db_pool)
            .await?)
    }

    /// Deletes a sales invoice; payments drawn against it keep their rows
    #[instrument(skip(self))]
    pub async fn delete_sales(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let found = invoice::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("invoice {} not found", id)))?;
        found.delete(db).await?;
        info!(invoice_id = id, "sales invoice deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_purchase(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let found = purchase_invoice::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("purchase invoice {} not found", id)))?;
        found.delete(db).await?;
        info!(invoice_id = id, "purchase invoice deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_add_up_exactly() {
        let t = InvoiceTotals::compute(dec!(1234.567), dec!(0.15), dec!(10)).unwrap();
        assert_eq!(t.subtotal, dec!(1234.57));
        assert_eq!(t.tax_amount, dec!(185.19));
        assert_eq!(t.discount, dec!(10.00));
        assert_eq!(t.total_amount, t.subtotal + t.tax_amount - t.discount);
        assert_eq!(t.total_amount, dec!(1409.76));
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        let t = InvoiceTotals::compute(dec!(0.10), dec!(0.15), Decimal::ZERO).unwrap();
        assert_eq!(t.tax_amount, dec!(0.02));
    }

    #[test]
    fn overflowing_totals_are_none() {
        assert!(InvoiceTotals::compute(Decimal::MAX, dec!(0.15), Decimal::ZERO).is_none());
        assert!(InvoiceTotals::compute(Decimal::MAX, Decimal::ZERO, -Decimal::MAX).is_none());
    }

    #[test]
    fn document_numbers_are_zero_padded() {
        assert_eq!(document_number("INV", 2025, 7), "INV-20250007");
        assert_eq!(document_number("PUR", 2025, 1234), "PUR-20251234");
    }

    #[test]
    fn vat_rate_conversion() {
        assert_eq!(vat_rate_decimal(0.15), dec!(0.15));
        assert_eq!(vat_rate_decimal(f64::NAN), Decimal::ZERO);
    }

    fn input(subtotal: Decimal, discount: Option<Decimal>) -> NewInvoice {
        NewInvoice {
            party_id: None,
            party_name: Some("شركة الأمل".into()),
            date: None,
            subtotal,
            tax_rate: None,
            discount,
            status: InvoiceStatus::Pending,
            notes: None,
        }
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(input(dec!(-1), None).totals(dec!(0.15)).is_err());
        assert!(input(dec!(100), Some(dec!(-5))).totals(dec!(0.15)).is_err());
        assert!(input(dec!(100), Some(dec!(500))).totals(dec!(0.15)).is_err());
    }

    #[test]
    fn amounts_beyond_column_range_are_rejected() {
        assert_matches::assert_matches!(
            input(Decimal::MAX, None).totals(dec!(0.15)),
            Err(ServiceError::ValidationError(_))
        );
        // Subtotal fits but the taxed total does not
        assert!(input(MAX_AMOUNT, None).totals(dec!(0.15)).is_err());
        assert!(input(MAX_AMOUNT, None).totals(Decimal::ZERO).is_ok());
    }

    #[test]
    fn configured_rate_is_the_default() {
        let totals = input(dec!(1000), None).totals(dec!(0.15)).unwrap();
        assert_eq!(totals.tax_amount, dec!(150.00));
        assert_eq!(totals.total_amount, dec!(1150.00));
    }
}
