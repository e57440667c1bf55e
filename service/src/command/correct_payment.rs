//! Administrative [`Command`] for correcting a [`Payment`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{payment, Payment},
    infra::{database, Database},
    Service,
};

use super::{Command, ErrorKind};

/// Administrative [`Command`] for correcting a [`Payment`].
///
/// Overwrites the amount and the status of the [`Payment`] bypassing the
/// ownership rules.
///
/// [`Payment`]: crate::domain::Payment
#[derive(Clone, Copy, Debug)]
pub struct CorrectPayment {
    /// ID of the [`Payment`] to correct.
    ///
    /// [`Payment`]: crate::domain::Payment
    pub payment_id: payment::Id,

    /// Corrected amount of the [`Payment`].
    ///
    /// [`Payment`]: crate::domain::Payment
    pub amount: Money,

    /// Corrected [`payment::Status`] of the [`Payment`].
    ///
    /// [`Payment`]: crate::domain::Payment
    pub status: payment::Status,
}

impl<Db> Command<CorrectPayment> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CorrectPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CorrectPayment {
            payment_id,
            amount,
            status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Payment`.
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

        payment.amount = amount;
        payment.status = status;
        match status {
            payment::Status::Success => {
                if payment.paid_at.is_none() {
                    payment.paid_at =
                        Some(payment::SettlementDateTime::now());
                }
            }
            payment::Status::Pending => {
                payment.paid_at = None;
            }
            payment::Status::Canceled => {}
        }

        tx.execute(Update(payment))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Payment(id: {payment_id})` corrected to {amount} ({status})",
        );

        Ok(())
    }
}

/// Error of [`CorrectPayment`] [`Command`] execution.
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
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::PaymentNotExists(_) => ErrorKind::NotFound,
        }
    }
}
