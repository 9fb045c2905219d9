//! Database entities for the accounting schema.

pub mod customer;
pub mod invoice;
pub mod payment;
pub mod purchase_invoice;
pub mod supplier;
pub mod user;

pub use invoice::InvoiceStatus;
pub use payment::{PaymentMethod, PaymentType};

pub mod prelude {
    pub use super::customer::Entity as Customer;
    pub use super::invoice::Entity as Invoice;
    pub use super::payment::Entity as Payment;
    pub use super::purchase_invoice::Entity as PurchaseInvoice;
    pub use super::supplier::Entity as Supplier;
    pub use super::user::Entity as User;
}
