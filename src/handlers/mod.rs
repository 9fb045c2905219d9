pub mod api;
pub mod common;
pub mod invoices;
pub mod pages;
pub mod parties;
pub mod payments;
