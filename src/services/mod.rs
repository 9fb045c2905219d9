//! Business operations over the accounting tables.

pub mod customers;
pub mod dashboard;
pub mod invoices;
pub mod payments;
pub mod suppliers;
pub mod users;

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

/// Largest amount a `decimal(12, 2)` money column holds: 9,999,999,999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Rejects amounts the money columns cannot store
pub fn ensure_amount_in_range(value: Decimal, field: &str) -> Result<Decimal, ServiceError> {
    if value.abs() > MAX_AMOUNT {
        return Err(ServiceError::ValidationError(format!(
            "قيمة {} تتجاوز الحد المسموح",
            field
        )));
    }
    Ok(value)
}

/// A page of rows together with the total row count
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

pub(crate) fn validate<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(describe_validation_errors(&e)))
}

/// Flattens field errors into one user-facing sentence, ordered by field name.
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("قيمة الحقل {} غير صالحة", field),
            })
        })
        .collect::<Vec<_>>()
        .join("، ")
}

/// Trims a submitted value, treating blanks as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
