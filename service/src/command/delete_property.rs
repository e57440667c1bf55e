//! Administrative [`Command`] for deleting a [`Property`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{property, Contract, Property},
    infra::{database, Database},
    Service,
};

use super::{Command, ErrorKind};

/// Administrative [`Command`] for deleting a [`Property`].
///
/// Deletes every [`Contract`] referencing the [`Property`] alongside.
///
/// [`Contract`]: crate::domain::Contract
/// [`Property`]: crate::domain::Property
#[derive(Clone, Copy, Debug)]
pub struct DeleteProperty {
    /// ID of the [`Property`] to delete.
    ///
    /// [`Property`]: crate::domain::Property
    pub property_id: property::Id,
}

impl<Db> Command<DeleteProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProperty { property_id } = cmd;

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

        tx.execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        tx.execute(Delete(By::<Contract, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Delete(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Property(id: {property_id})` deleted");

        Ok(())
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    ///
    /// [`Property`]: crate::domain::Property
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::PropertyNotExists(_) => ErrorKind::NotFound,
        }
    }
}
