pub mod entities;
pub mod envelope;

pub use entities::{
    Customer, Employee, Genre, Invoice, InvoiceLine, Track, amount_to_cents, cents_to_amount,
};
pub use envelope::{REPORT_ENVELOPE_SCHEMA_VERSION, ReportEnvelope, StepFailures};
