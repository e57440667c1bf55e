//! [`Command`] for cancelling an active [`Contract`] by its tenant.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, property, user, Contract, Property},
    infra::{database, Database},
    Service,
};

use super::{Command, ErrorKind};

/// [`Command`] for cancelling an active [`Contract`] by its tenant.
///
/// Cancelling leaves the [`Contract`]'s payments untouched.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Copy, Debug)]
pub struct CancelContract {
    /// ID of the [`Contract`] to cancel.
    pub contract_id: contract::Id,

    /// ID of the [`User`] requesting the cancellation.
    ///
    /// [`User`]: crate::domain::User
    pub tenant_id: user::Id,
}

impl<Db> Command<CancelContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelContract {
            contract_id,
            tenant_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Contract`.
        tx.execute(Lock(By::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotExists(contract_id))
            .map_err(tracerr::wrap!())?;
        if contract.tenant_id != tenant_id {
            return Err(tracerr::new!(E::NotContractHolder(tenant_id)));
        }
        if !contract.is_active() {
            // Cancelling a finished `Contract` is an idempotent no-op.
            return Ok(());
        }

        contract.deactivate(Date::today().coerce());
        tx.execute(Update(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(mut property) = tx
            .execute(Select(By::<Option<Property>, _>::new(
                contract.property_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            property.status = property::Status::Available;
            property.updated_at = property::UpdateDateTime::now();
            tx.execute(Update(property))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Contract(id: {contract_id})` cancelled by \
             `User(id: {tenant_id})`",
        );

        Ok(())
    }
}

/// Error of [`CancelContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),

    /// [`User`] does not hold the [`Contract`].
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` does not hold the `Contract`")]
    NotContractHolder(#[error(not(source))] user::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::ContractNotExists(_) => ErrorKind::NotFound,
            Self::NotContractHolder(_) => ErrorKind::Unauthorized,
        }
    }
}
