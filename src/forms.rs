//! Submitted HTML forms and their conversion into service inputs.
//!
//! Browsers send every field as text, and blank inputs arrive as empty
//! strings, so all fields are read as strings and parsed here.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    entities::{InvoiceStatus, PaymentMethod, PaymentType},
    errors::ServiceError,
    services::{ensure_amount_in_range, invoices::NewInvoice, non_empty, payments::NewPayment},
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Sales or purchase invoice form. The party fields accept both the
/// customer and the supplier field names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceForm {
    #[serde(default, alias = "customer_id", alias = "supplier_id")]
    pub party_id: Option<String>,
    #[serde(default, alias = "customer_name", alias = "supplier_name")]
    pub party_name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, alias = "amount")]
    pub subtotal: String,
    /// Percentage, e.g. `15`
    #[serde(default)]
    pub tax_rate: Option<String>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl InvoiceForm {
    pub fn parse(&self) -> Result<NewInvoice, ServiceError> {
        let subtotal = match non_empty(Some(self.subtotal.clone())) {
            Some(raw) => parse_decimal(&raw, "المبلغ")?,
            None => return Err(ServiceError::ValidationError("المبلغ مطلوب".into())),
        };

        let tax_rate = parse_optional_decimal(&self.tax_rate, "نسبة الضريبة")?
            .map(|percent| percent / HUNDRED);

        let status = match non_empty(self.status.clone()) {
            Some(code) => InvoiceStatus::parse(&code)
                .ok_or_else(|| ServiceError::ValidationError("حالة الفاتورة غير صالحة".into()))?,
            None => InvoiceStatus::Pending,
        };

        Ok(NewInvoice {
            party_id: parse_optional_id(&self.party_id)?,
            party_name: non_empty(self.party_name.clone()),
            date: parse_optional_date(&self.date)?,
            subtotal,
            tax_rate,
            discount: parse_optional_decimal(&self.discount, "الخصم")?,
            status,
            notes: non_empty(self.notes.clone()),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentForm {
    pub fn parse(&self) -> Result<NewPayment, ServiceError> {
        let amount = match non_empty(Some(self.amount.clone())) {
            Some(raw) => parse_decimal(&raw, "المبلغ")?,
            None => return Err(ServiceError::ValidationError("المبلغ مطلوب".into())),
        };

        let payment_method = match non_empty(self.payment_method.clone()) {
            Some(code) => PaymentMethod::parse(&code)
                .ok_or_else(|| ServiceError::ValidationError("طريقة الدفع غير صالحة".into()))?,
            None => PaymentMethod::Cash,
        };
        let payment_type = match non_empty(self.payment_type.clone()) {
            Some(code) => PaymentType::parse(&code)
                .ok_or_else(|| ServiceError::ValidationError("نوع الدفعة غير صالح".into()))?,
            None => PaymentType::Received,
        };

        Ok(NewPayment {
            date: parse_optional_date(&self.date)?,
            amount,
            payment_method,
            payment_type,
            reference_number: non_empty(self.reference_number.clone()),
            invoice_id: parse_optional_id(&self.invoice_id)?,
            customer_name: non_empty(self.customer_name.clone()),
            supplier_name: non_empty(self.supplier_name.clone()),
            notes: non_empty(self.notes.clone()),
        })
    }
}

/// Parses an amount, accepting thousands separators
pub fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, ServiceError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let value = Decimal::from_str(&cleaned)
        .map_err(|_| ServiceError::ValidationError(format!("قيمة {} غير صالحة", field)))?;
    ensure_amount_in_range(value, field)
}

fn parse_optional_decimal(raw: &Option<String>, field: &str) -> Result<Option<Decimal>, ServiceError> {
    non_empty(raw.clone())
        .map(|v| parse_decimal(&v, field))
        .transpose()
}

fn parse_optional_id(raw: &Option<String>) -> Result<Option<i32>, ServiceError> {
    non_empty(raw.clone())
        .map(|v| {
            v.parse::<i32>()
                .map_err(|_| ServiceError::ValidationError("المعرف المحدد غير صالح".into()))
        })
        .transpose()
}

/// `YYYY-MM-DD` from a date input, taken as midnight UTC
pub fn parse_optional_date(raw: &Option<String>) -> Result<Option<DateTime<Utc>>, ServiceError> {
    non_empty(raw.clone())
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .ok_or_else(|| ServiceError::ValidationError("صيغة التاريخ غير صالحة".into()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Datelike;
    use rust_decimal_macros::dec;

    #[test]
    fn invoice_form_parses_percentages_and_defaults() {
        let form = InvoiceForm {
            party_id: Some("3".into()),
            subtotal: "1,250.50".into(),
            tax_rate: Some("15".into()),
            discount: Some("".into()),
            date: Some("2025-03-09".into()),
            ..Default::default()
        };
        let parsed = form.parse().unwrap();
        assert_eq!(parsed.party_id, Some(3));
        assert_eq!(parsed.subtotal, dec!(1250.50));
        assert_eq!(parsed.tax_rate, Some(dec!(0.15)));
        assert_eq!(parsed.discount, None);
        assert_eq!(parsed.status, InvoiceStatus::Pending);
        let date = parsed.date.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 3, 9));
    }

    #[test]
    fn invoice_form_requires_amount() {
        let form = InvoiceForm::default();
        assert_matches!(form.parse(), Err(ServiceError::ValidationError(_)));

        let form = InvoiceForm {
            subtotal: "abc".into(),
            ..Default::default()
        };
        assert_matches!(form.parse(), Err(ServiceError::ValidationError(_)));
    }

    #[test]
    fn invoice_form_rejects_unknown_status_and_bad_date() {
        let form = InvoiceForm {
            subtotal: "10".into(),
            status: Some("archived".into()),
            ..Default::default()
        };
        assert!(form.parse().is_err());

        let form = InvoiceForm {
            subtotal: "10".into(),
            date: Some("09/03/2025".into()),
            ..Default::default()
        };
        assert!(form.parse().is_err());
    }

    #[test]
    fn payment_form_defaults_to_cash_received() {
        let form = PaymentForm {
            amount: "500".into(),
            customer_name: Some("  ".into()),
            ..Default::default()
        };
        let parsed = form.parse().unwrap();
        assert_eq!(parsed.payment_method, PaymentMethod::Cash);
        assert_eq!(parsed.payment_type, PaymentType::Received);
        assert_eq!(parsed.customer_name, None);
        assert_eq!(parsed.amount, dec!(500));
    }

    #[test]
    fn amounts_are_bounded_by_column_precision() {
        assert_eq!(parse_decimal("9,999,999,999.99", "المبلغ").unwrap(), dec!(9999999999.99));
        assert_matches!(
            parse_decimal("79228162514264337593543950335", "المبلغ"),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            parse_decimal("-10000000000", "الخصم"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn supplier_field_names_map_onto_party() {
        let form: InvoiceForm =
            serde_json::from_value(serde_json::json!({"supplier_id": "4", "subtotal": "1"}))
                .unwrap();
        assert_eq!(form.party_id.as_deref(), Some("4"));
    }
}
