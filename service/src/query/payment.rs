//! [`Query`] collection related to [`Payment`]s.

use common::{
    operations::{By, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::ErrorKind,
    domain::{contract, payment, property, user, Payment, Property},
    infra::{database, Database},
    read,
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Payment`] by its [`payment::Id`].
pub type ById = DatabaseQuery<By<Option<Payment>, payment::Id>>;

/// Queries the [`Payment`]s of a tenant, in ledger order.
pub type ForTenant = DatabaseQuery<By<Vec<Payment>, user::Id>>;

/// Queries the [`Payment`]s of a [`Contract`], in ledger order.
///
/// [`Contract`]: crate::domain::Contract
pub type ForContract = DatabaseQuery<By<Vec<Payment>, contract::Id>>;

/// Queries all the [`Payment`]s, in ledger order.
pub type List = DatabaseQuery<By<Vec<Payment>, read::All>>;

/// Queries the count of still-pending [`Payment`]s due strictly before the
/// provided [`Date`].
pub type OverdueCount =
    DatabaseQuery<By<read::payment::OverdueCount, Date>>;

/// [`Query`] for the [`Payment`]s of a [`Property`], checked against its
/// owner.
#[derive(Clone, Copy, Debug)]
pub struct ForProperty {
    /// ID of the [`Property`] to list the [`Payment`]s of.
    pub property_id: property::Id,

    /// ID of the [`User`] expected to own the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    pub owner_id: user::Id,
}

impl<Db> Query<ForProperty> for Service<Db>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, property::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Payment>;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, q: ForProperty) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ForProperty {
            property_id,
            owner_id,
        } = q;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if property.owner_id != owner_id {
            return Err(tracerr::new!(E::NotPropertyOwner(owner_id)));
        }

        self.database()
            .execute(Select(By::<Vec<Payment>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`ForProperty`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`User`] does not own the [`Property`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` does not own the `Property`")]
    NotPropertyOwner(#[error(not(source))] user::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::PropertyNotExists(_) => ErrorKind::NotFound,
            Self::NotPropertyOwner(_) => ErrorKind::Unauthorized,
        }
    }
}
