//! Administrative [`Command`] for ending a [`Contract`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, payment, property, Contract, Payment, Property},
    infra::{database, Database},
    Service,
};

use super::{Command, ErrorKind};

/// Administrative [`Command`] for ending a [`Contract`].
///
/// Unlike [`CancelContract`], every still-pending [`Payment`] of the
/// [`Contract`] is voided.
///
/// [`CancelContract`]: super::CancelContract
/// [`Contract`]: crate::domain::Contract
/// [`Payment`]: crate::domain::Payment
#[derive(Clone, Copy, Debug)]
pub struct EndContract {
    /// ID of the [`Contract`] to end.
    pub contract_id: contract::Id,
}

impl<Db> Command<EndContract> for Service<Db>
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
            Select<By<Vec<Payment>, contract::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: EndContract) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EndContract { contract_id } = cmd;

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
        if !contract.is_active() {
            // Ending a finished `Contract` is an idempotent no-op.
            return Ok(());
        }

        contract.deactivate(Date::today().coerce());
        tx.execute(Update(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(contract_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for mut payment in payments {
            if !payment.is_pending() {
                continue;
            }
            payment.status = payment::Status::Canceled;
            tx.execute(Update(payment))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

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

        log::info!("`Contract(id: {contract_id})` ended");

        Ok(())
    }
}

/// Error of [`EndContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Contract`] with the provided ID does not exist.
    #[display("`Contract(id: {_0})` does not exist")]
    ContractNotExists(#[error(not(source))] contract::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::ContractNotExists(_) => ErrorKind::NotFound,
        }
    }
}
