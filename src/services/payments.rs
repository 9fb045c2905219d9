use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, PaginatorTrait,
    QueryOrder, Set,
};
use serde::Serialize;
use tracing::{info, instrument};

use super::{ensure_amount_in_range, invoices::round_money, non_empty, Page};
use crate::{
    db::DbPool,
    entities::{
        invoice, payment,
        payment::{PaymentMethod, PaymentType},
    },
    errors::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub date: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub reference_number: Option<String>,
    pub invoice_id: Option<i32>,
    pub customer_name: Option<String>,
    pub supplier_name: Option<String>,
    pub notes: Option<String>,
}

/// Inserts a payment without validation; used by the web service and the seeder.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    input: NewPayment,
) -> Result<payment::Model, DbErr> {
    payment::ActiveModel {
        date: Set(input.date.unwrap_or_else(Utc::now)),
        amount: Set(round_money(input.amount)),
        payment_method: Set(input.payment_method),
        payment_type: Set(input.payment_type),
        reference_number: Set(non_empty(input.reference_number)),
        invoice_id: Set(input.invoice_id),
        customer_name: Set(non_empty(input.customer_name)),
        supplier_name: Set(non_empty(input.supplier_name)),
        notes: Set(non_empty(input.notes)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Cash-flow totals over all payments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub total_received: Decimal,
    pub total_paid: Decimal,
    pub net_flow: Decimal,
    pub received_count: u64,
    pub paid_count: u64,
}

impl PaymentSummary {
    pub fn from_payments<'a>(payments: impl IntoIterator<Item = &'a payment::Model>) -> Self {
        let mut summary = Self::default();
        for p in payments {
            let amount = round_money(p.amount);
            match p.payment_type {
                PaymentType::Received => {
                    summary.total_received = summary.total_received.saturating_add(amount);
                    summary.received_count += 1;
                }
                PaymentType::Paid => {
                    summary.total_paid = summary.total_paid.saturating_add(amount);
                    summary.paid_count += 1;
                }
            }
        }
        summary.net_flow = summary.total_received.saturating_sub(summary.total_paid);
        summary
    }

    pub fn count(&self) -> u64 {
        self.received_count + self.paid_count
    }
}

pub async fn summarize<C: ConnectionTrait>(db: &C) -> Result<PaymentSummary, DbErr> {
    let payments = payment::Entity::find().all(db).await?;
    Ok(PaymentSummary::from_payments(&payments))
}

#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
}

impl PaymentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: NewPayment) -> Result<payment::Model, ServiceError> {
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "المبلغ يجب أن يكون أكبر من صفر".into(),
            ));
        }
        ensure_amount_in_range(input.amount, "المبلغ")?;
        let db = &*self.db_pool;

        if let Some(invoice_id) = input.invoice_id {
            if invoice::Entity::find_by_id(invoice_id).one(db).await?.is_none() {
                return Err(ServiceError::ValidationError("الفاتورة المحددة غير موجودة".into()));
            }
        }

        let created = insert(db, input).await?;
        info!(payment_id = created.id, amount = %created.amount, "payment recorded");
        Ok(created)
    }

    pub async fn all(&self) -> Result<Vec<payment::Model>, ServiceError> {
        Ok(payment::Entity::find()
            .order_by_desc(payment::Column::Date)
            .order_by_desc(payment::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page<payment::Model>, ServiceError> {
        let paginator = payment::Entity::find()
            .order_by_desc(payment::Column::Date)
            .order_by_desc(payment::Column::Id)
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

    pub async fn summary(&self) -> Result<PaymentSummary, ServiceError> {
        Ok(summarize(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let found = payment::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("payment {} not found", id)))?;
        found.delete(db).await?;
        info!(payment_id = id, "payment deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment(amount: Decimal, payment_type: PaymentType) -> payment::Model {
        payment::Model {
            id: 0,
            date: Utc::now(),
            amount,
            payment_method: PaymentMethod::Cash,
            payment_type,
            reference_number: None,
            invoice_id: None,
            customer_name: None,
            supplier_name: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_nets_received_against_paid() {
        let rows = vec![
            payment(dec!(1000.50), PaymentType::Received),
            payment(dec!(250.25), PaymentType::Received),
            payment(dec!(400), PaymentType::Paid),
        ];
        let summary = PaymentSummary::from_payments(&rows);
        assert_eq!(summary.total_received, dec!(1250.75));
        assert_eq!(summary.total_paid, dec!(400));
        assert_eq!(summary.net_flow, dec!(850.75));
        assert_eq!(summary.count(), 3);
    }

    #[test]
    fn summary_saturates_instead_of_overflowing() {
        let rows = vec![
            payment(Decimal::MAX, PaymentType::Received),
            payment(Decimal::MAX, PaymentType::Received),
            payment(Decimal::MAX, PaymentType::Paid),
        ];
        let summary = PaymentSummary::from_payments(&rows);
        assert_eq!(summary.total_received, Decimal::MAX);
        assert_eq!(summary.net_flow, Decimal::ZERO);
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = PaymentSummary::from_payments(Vec::<payment::Model>::new().iter());
        assert_eq!(summary, PaymentSummary::default());
        assert_eq!(summary.net_flow, Decimal::ZERO);
    }
}
