//! Domain definitions.

pub mod contract;
pub mod payment;
pub mod property;
pub mod user;

pub use self::{
    contract::Contract, payment::Payment, property::Property, user::User,
};
