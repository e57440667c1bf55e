//! [`Payment`] read model definitions.

use derive_more::{Display, From, Into};

#[cfg(doc)]
use crate::domain::Payment;

/// Count of [`Payment`]s still pending past their due date.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq,
)]
pub struct OverdueCount(u64);
