use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sales invoice issued to a customer
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub invoice_number: String,
    #[sea_orm(nullable)]
    pub customer_id: Option<i32>,
    pub customer_name: String,
    pub date: DateTime<Utc>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub tax_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
    pub invoice_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_delete = "SetNull"
    )]
    Customer,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const SALES_INVOICE_TYPE: &str = "sales";

/// Invoice status, shared by sales and purchase invoices
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

impl InvoiceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "معلقة",
            Self::Paid => "مدفوعة",
            Self::Overdue => "متأخرة",
        }
    }

    /// Bootstrap badge class used when rendering the status
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "bg-warning",
            Self::Paid => "bg-success",
            Self::Overdue => "bg-danger",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::try_from_value(&code.trim().to_ascii_lowercase()).ok()
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn status_codes_round_trip_through_parse() {
        for status in InvoiceStatus::iter() {
            assert_eq!(InvoiceStatus::parse(&status.to_value()), Some(status));
        }
        assert_eq!(InvoiceStatus::parse(" PAID "), Some(InvoiceStatus::Paid));
        assert_eq!(InvoiceStatus::parse("cancelled"), None);
    }

    #[test]
    fn labels_are_arabic() {
        assert_eq!(InvoiceStatus::Pending.label(), "معلقة");
        assert_eq!(InvoiceStatus::Paid.label(), "مدفوعة");
        assert_eq!(InvoiceStatus::Overdue.label(), "متأخرة");
    }
}
