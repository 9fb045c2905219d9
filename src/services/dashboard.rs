use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    invoices::round_money,
    payments::{summarize, PaymentSummary},
};
use crate::entities::{customer, invoice, purchase_invoice, supplier};

/// Figures shown on the dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub customers: u64,
    pub suppliers: u64,
    pub sales_invoices: u64,
    pub purchase_invoices: u64,
    pub total_sales: Decimal,
    pub total_purchases: Decimal,
    pub payments: PaymentSummary,
}

/// Saturating sum, so one oversized row cannot take the dashboard down
fn sum_money(values: Vec<Decimal>) -> Decimal {
    values
        .into_iter()
        .map(round_money)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

pub async fn collect<C: ConnectionTrait>(db: &C) -> Result<DashboardStats, DbErr> {
    let sales: Vec<Decimal> = invoice::Entity::find()
        .select_only()
        .column(invoice::Column::TotalAmount)
        .into_tuple()
        .all(db)
        .await?;
    let purchases: Vec<Decimal> = purchase_invoice::Entity::find()
        .select_only()
        .column(purchase_invoice::Column::TotalAmount)
        .into_tuple()
        .all(db)
        .await?;

    Ok(DashboardStats {
        customers: customer::Entity::find().count(db).await?,
        suppliers: supplier::Entity::find().count(db).await?,
        sales_invoices: sales.len() as u64,
        purchase_invoices: purchases.len() as u64,
        total_sales: sum_money(sales),
        total_purchases: sum_money(purchases),
        payments: summarize(db).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_sums_round_and_saturate() {
        assert_eq!(sum_money(vec![dec!(10.005), dec!(0.994)]), dec!(11.00));
        assert_eq!(sum_money(Vec::new()), Decimal::ZERO);
        assert_eq!(sum_money(vec![Decimal::MAX, Decimal::MAX]), Decimal::MAX);
    }
}
