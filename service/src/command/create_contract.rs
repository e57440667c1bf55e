//! [`Command`] for creating a new [`Contract`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, property, user, Contract, Payment, Property, User},
    infra::{database, Database},
    read::contract::Active,
    Service,
};

use super::{Command, ErrorKind};

/// [`Command`] for creating a new [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct CreateContract {
    /// ID of the [`Property`] to rent.
    pub property_id: property::Id,

    /// ID of the [`User`] who rents the [`Property`].
    pub tenant_id: user::Id,

    /// [`Date`] a new [`Contract`] starts on.
    ///
    /// Defaults to today.
    ///
    /// [`Date`]: common::Date
    pub start_date: Option<contract::StartDate>,
}

impl<Db> Command<CreateContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Active<Contract>>, user::Id>>,
            Ok = Option<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateContract {
            property_id,
            tenant_id,
            start_date,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<User>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TenantNotExists(tenant_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Property`.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if tx
            .execute(Select(By::<Option<Active<Contract>>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some()
        {
            return Err(tracerr::new!(E::TenantAlreadyRents(tenant_id)));
        }

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if property.status != property::Status::Available {
            return Err(tracerr::new!(E::PropertyUnavailable(property_id)));
        }

        let contract = Contract {
            id: contract::Id::new(),
            tenant_id,
            property_id,
            start_date: start_date
                .unwrap_or_else(|| Date::today().coerce()),
            end_date: None,
            // Later rent edits on the `Property` must not affect the
            // signed `Contract`.
            monthly_rent: property.monthly_rent,
            active: true,
        };
        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        for payment in Payment::initial(&contract) {
            tx.execute(Insert(payment))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Insert(Payment::first_monthly(&contract)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        property.status = property::Status::Rented;
        property.updated_at = property::UpdateDateTime::now();
        tx.execute(Update(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Contract(id: {})` created: `User(id: {tenant_id})` rents \
             `Property(id: {property_id})`",
            contract.id,
        );

        Ok(contract)
    }
}

/// Error of [`CreateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    TenantNotExists(#[error(not(source))] user::Id),

    /// [`User`] holds an active [`Contract`] already.
    #[display("`User(id: {_0})` holds an active `Contract` already")]
    TenantAlreadyRents(#[error(not(source))] user::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Property`] is not available for rent.
    #[display("`Property(id: {_0})` is not available for rent")]
    PropertyUnavailable(#[error(not(source))] property::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::TenantNotExists(_) | Self::PropertyNotExists(_) => {
                ErrorKind::NotFound
            }
            Self::TenantAlreadyRents(_) | Self::PropertyUnavailable(_) => {
                ErrorKind::Conflict
            }
        }
    }
}
