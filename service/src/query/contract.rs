//! [`Query`] collection related to [`Contract`]s.

use common::operations::By;

use crate::{
    domain::{contract, property, user, Contract},
    read::{self, contract::Active},
};
#[cfg(doc)]
use crate::{domain::Property, Query};

use super::DatabaseQuery;

/// Queries a [`Contract`] by its [`contract::Id`].
pub type ById = DatabaseQuery<By<Option<Contract>, contract::Id>>;

/// Queries the [`Active`] [`Contract`] of a tenant.
pub type ActiveForTenant =
    DatabaseQuery<By<Option<Active<Contract>>, user::Id>>;

/// Queries the whole [`Contract`] history of a tenant, active first.
pub type HistoryForTenant = DatabaseQuery<By<Vec<Contract>, user::Id>>;

/// Queries the [`Contract`]s of a [`Property`], newest first.
pub type ForProperty = DatabaseQuery<By<Vec<Contract>, property::Id>>;

/// Queries all the [`Contract`]s, active first.
pub type List = DatabaseQuery<By<Vec<Contract>, read::All>>;

/// Queries all the [`Active`] [`Contract`]s.
pub type ActiveList = DatabaseQuery<By<Vec<Active<Contract>>, read::All>>;
