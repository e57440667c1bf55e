//! [`Query`] collection related to [`Property`]s.

use common::operations::By;

use crate::{
    domain::{property, user, Property},
    read,
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Property`] by its [`property::Id`].
pub type ById = DatabaseQuery<By<Option<Property>, property::Id>>;

/// Queries the [`Property`]s of an owner, newest first.
pub type ForOwner = DatabaseQuery<By<Vec<Property>, user::Id>>;

/// Queries all the [`Property`]s, newest first.
pub type List = DatabaseQuery<By<Vec<Property>, read::All>>;
