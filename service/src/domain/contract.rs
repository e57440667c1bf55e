//! [`Contract`] definitions.

use common::{DateOf, Money};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{property, user};
#[cfg(doc)]
use crate::domain::{Property, User};

/// Rental contract binding a tenant [`User`] to a [`Property`].
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the [`User`] renting under this [`Contract`].
    pub tenant_id: user::Id,

    /// ID of the [`Property`] occupied under this [`Contract`].
    pub property_id: property::Id,

    /// [`Date`] this [`Contract`] starts on.
    ///
    /// [`Date`]: common::Date
    pub start_date: StartDate,

    /// [`Date`] this [`Contract`] ended on.
    ///
    /// Set if and only if this [`Contract`] is not active.
    ///
    /// [`Date`]: common::Date
    pub end_date: Option<EndDate>,

    /// Monthly rent snapshotted from the [`Property`] at creation time.
    ///
    /// Later rent edits on the [`Property`] don't affect this [`Contract`].
    pub monthly_rent: Money,

    /// Indicator whether this [`Contract`] currently governs occupancy.
    pub active: bool,
}

impl Contract {
    /// Returns whether this [`Contract`] is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivates this [`Contract`], ending it on the provided [`EndDate`].
    pub fn deactivate(&mut self, on: EndDate) {
        self.active = false;
        self.end_date = Some(on);
    }
}

/// ID of a [`Contract`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Marker type indicating a [`Contract`] start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Date a [`Contract`] starts on.
pub type StartDate = DateOf<(Contract, Start)>;

/// Marker type indicating a [`Contract`] end.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Date a [`Contract`] ended on.
pub type EndDate = DateOf<(Contract, End)>;
