use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cash-flow record, either money received from a customer or paid to a supplier
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: DateTime<Utc>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    #[sea_orm(nullable)]
    pub reference_number: Option<String>,
    #[sea_orm(nullable)]
    pub invoice_id: Option<i32>,
    #[sea_orm(nullable)]
    pub customer_name: Option<String>,
    #[sea_orm(nullable)]
    pub supplier_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Name of the other party, whichever side of the flow it is on
    pub fn counterparty(&self) -> &str {
        self.customer_name
            .as_deref()
            .or(self.supplier_name.as_deref())
            .unwrap_or("-")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id",
        on_delete = "SetNull"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "card")]
    Card,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "نقدي",
            Self::BankTransfer => "تحويل بنكي",
            Self::Check => "شيك",
            Self::Card => "بطاقة ائتمان",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::try_from_value(&code.trim().to_ascii_lowercase()).ok()
    }
}

/// Direction of a payment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[sea_orm(string_value = "received")]
    Received,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl PaymentType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Received => "مقبوضات",
            Self::Paid => "مدفوعات",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::try_from_value(&code.trim().to_ascii_lowercase()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn method_codes_and_labels() {
        assert_eq!(PaymentMethod::BankTransfer.to_value(), "bank_transfer");
        assert_eq!(PaymentMethod::parse("card"), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::Card.label(), "بطاقة ائتمان");
        assert_eq!(PaymentMethod::parse("crypto"), None);
        assert_eq!(PaymentMethod::iter().count(), 4);
    }

    #[test]
    fn type_codes_and_labels() {
        assert_eq!(PaymentType::parse("received"), Some(PaymentType::Received));
        assert_eq!(PaymentType::Paid.label(), "مدفوعات");
    }
}
