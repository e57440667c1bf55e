//! [`Command`] for settling a pending [`Payment`] by its tenant.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, payment, user, Contract, Payment},
    infra::{database, Database},
    Service,
};

use super::{Command, ErrorKind};

/// [`Command`] for settling a pending [`Payment`] by its tenant.
///
/// [`Payment`]: crate::domain::Payment
#[derive(Clone, Copy, Debug)]
pub struct RecordPayment {
    /// ID of the [`Payment`] to settle.
    ///
    /// [`Payment`]: crate::domain::Payment
    pub payment_id: payment::Id,

    /// ID of the [`User`] settling the [`Payment`].
    ///
    /// [`Payment`]: crate::domain::Payment
    /// [`User`]: crate::domain::User
    pub tenant_id: user::Id,
}

impl<Db> Command<RecordPayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordPayment {
            payment_id,
            tenant_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent settlements of the same `Payment`.
        tx.execute(Lock(By::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        let holds_contract = tx
            .execute(Select(By::<Option<Contract>, _>::new(
                payment.contract_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .is_some_and(|c| c.tenant_id == tenant_id);
        if !holds_contract {
            return Err(tracerr::new!(E::NotPaymentHolder(tenant_id)));
        }

        if !payment.is_pending() {
            // Settling a settled or voided `Payment` is an idempotent no-op.
            return Ok(());
        }

        payment.status = payment::Status::Success;
        payment.paid_at = Some(payment::SettlementDateTime::now());
        tx.execute(Update(payment))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Payment(id: {payment_id})` settled by `User(id: {tenant_id})`",
        );

        Ok(())
    }
}

/// Error of [`RecordPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] with the provided ID does not exist.
    ///
    /// [`Payment`]: crate::domain::Payment
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`User`] does not hold the [`Contract`] owning the [`Payment`].
    ///
    /// [`Payment`]: crate::domain::Payment
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` does not hold the `Contract` of the payment")]
    NotPaymentHolder(#[error(not(source))] user::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::PaymentNotExists(_) => ErrorKind::NotFound,
            Self::NotPaymentHolder(_) => ErrorKind::Unauthorized,
        }
    }
}
