//! [`Payment`] definitions.

#[cfg(doc)]
use common::{Date, DateTime};
use common::{define_kind, DateOf, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, Contract};

/// Single billable or billed line item tied to one [`Contract`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Contract`] owning this [`Payment`].
    pub contract_id: contract::Id,

    /// Amount owed or paid.
    pub amount: Money,

    /// [`Date`] this [`Payment`] is due on.
    ///
    /// `(contract_id, kind, due_date)` is unique for
    /// [`Kind::MonthlyRent`] [`Payment`]s.
    pub due_date: DueDate,

    /// [`Kind`] of this [`Payment`].
    pub kind: Kind,

    /// Settlement [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`DateTime`] this [`Payment`] was settled at.
    ///
    /// Set if and only if the status is [`Status::Success`].
    pub paid_at: Option<SettlementDateTime>,
}

impl Payment {
    /// Creates the initial [`Kind::Deposit`] and [`Kind::InitialRent`]
    /// [`Payment`]s of a fresh [`Contract`].
    ///
    /// Both are collected at signing time, so are created as
    /// [`Status::Success`] settled now, dated at the [`Contract`] start.
    #[must_use]
    pub fn initial(contract: &Contract) -> [Self; 2] {
        let settled = |kind| Self {
            id: Id::new(),
            contract_id: contract.id,
            amount: contract.monthly_rent,
            due_date: contract.start_date.coerce(),
            kind,
            status: Status::Success,
            paid_at: Some(SettlementDateTime::now()),
        };

        [settled(Kind::Deposit), settled(Kind::InitialRent)]
    }

    /// Creates the first [`Kind::MonthlyRent`] [`Payment`] of a fresh
    /// [`Contract`], due one month after its start.
    #[must_use]
    pub fn first_monthly(contract: &Contract) -> Self {
        Self::monthly(contract, contract.start_date.plus_months(1).coerce())
    }

    /// Creates a [`Kind::MonthlyRent`] [`Payment`] of the provided
    /// [`Contract`], pending until the tenant settles it.
    #[must_use]
    pub fn monthly(contract: &Contract, due_date: DueDate) -> Self {
        Self {
            id: Id::new(),
            contract_id: contract.id,
            amount: contract.monthly_rent,
            due_date,
            kind: Kind::MonthlyRent,
            status: Status::Pending,
            paid_at: None,
        }
    }

    /// Returns whether this [`Payment`] is still awaiting settlement.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }
}

/// ID of a [`Payment`].
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

define_kind! {
    #[doc = "Kind of a [`Payment`]."]
    enum Kind {
        #[doc = "First rent period, collected at signing time."]
        InitialRent = 1,

        #[doc = "Deposit, collected at signing time."]
        Deposit = 2,

        #[doc = "Recurring monthly rent obligation."]
        MonthlyRent = 3,
    }
}

define_kind! {
    #[doc = "Settlement status of a [`Payment`]."]
    enum Status {
        #[doc = "Awaiting settlement by the tenant."]
        Pending = 1,

        #[doc = "Settled."]
        Success = 2,

        #[doc = "Voided by the owning contract's termination."]
        Canceled = 3,
    }
}

/// Marker type indicating a [`Payment`] due.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Date a [`Payment`] is due on.
pub type DueDate = DateOf<(Payment, Due)>;

/// Marker type indicating a [`Payment`] settlement.
#[derive(Clone, Copy, Debug)]
pub struct Settlement;

/// [`DateTime`] a [`Payment`] was settled at.
pub type SettlementDateTime = DateTimeOf<(Payment, Settlement)>;
