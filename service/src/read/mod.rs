//! Read model definitions.

pub mod contract;
pub mod payment;

/// Selector of every record of some entity.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct All;
