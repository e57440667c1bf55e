//! Per-entity operation implementations of the [`Memory`] store.
//!
//! [`Memory`]: super::Memory

mod contract;
mod payment;
mod property;
mod user;
