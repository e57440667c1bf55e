//! [`Database`]-related implementations.

pub mod cache;
pub mod memory;

use derive_more::{Display, Error as StdError, From};

pub use self::{cache::Cached, memory::Memory};

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Memory`] error.
    Memory(memory::Error),
}
