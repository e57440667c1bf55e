//! Background [`Task`]s definitions.

mod background;
pub mod audit_overdue_payments;
pub mod generate_monthly_payments;

pub use common::Handler as Task;

pub use self::{
    audit_overdue_payments::AuditOverduePayments, background::Background,
    generate_monthly_payments::GenerateMonthlyPayments,
};
