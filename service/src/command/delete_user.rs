//! Administrative [`Command`] for deleting a [`User`].

use common::{
    operations::{
        By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contract, property, user, Contract, Payment, Property, User,
    },
    infra::{database, Database},
    Service,
};

use super::{Command, ErrorKind};

/// Administrative [`Command`] for deleting a [`User`].
///
/// A tenant's active [`Contract`]s are cancelled (their properties become
/// available again) and the tenant's contracts and payments are removed.
/// An owner's properties are removed with their contracts.
///
/// [`Contract`]: crate::domain::Contract
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug)]
pub struct DeleteUser {
    /// ID of the [`User`] to delete.
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,
}

impl<Db> Command<DeleteUser> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Contract>, user::Id>>,
            Ok = Vec<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Property>, user::Id>>,
            Ok = Vec<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Contract>, Err = Traced<database::Error>>
        + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<
            Delete<By<Payment, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Contract, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<User, user::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteUser { user_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        match user.role {
            user::Role::Admin => {
                return Err(tracerr::new!(E::CannotDeleteAdmin(user_id)));
            }
            user::Role::Tenant => {
                let contracts = tx
                    .execute(Select(By::<Vec<Contract>, _>::new(user_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                for mut contract in contracts {
                    if contract.is_active() {
                        contract.deactivate(Date::today().coerce());
                        tx.execute(Update(contract.clone()))
                            .await
                            .map_err(tracerr::map_from_and_wrap!(=> E))
                            .map(drop)?;

                        if let Some(mut prop) = tx
                            .execute(Select(By::<Option<Property>, _>::new(
                                contract.property_id,
                            )))
                            .await
                            .map_err(tracerr::map_from_and_wrap!(=> E))?
                        {
                            prop.status = property::Status::Available;
                            prop.updated_at = property::UpdateDateTime::now();
                            tx.execute(Update(prop))
                                .await
                                .map_err(tracerr::map_from_and_wrap!(=> E))
                                .map(drop)?;
                        }
                    }

                    tx.execute(Delete(By::<Payment, _>::new(contract.id)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                    tx.execute(Delete(By::<Contract, contract::Id>::new(
                        contract.id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                }
            }
            user::Role::Owner => {
                let properties = tx
                    .execute(Select(By::<Vec<Property>, _>::new(user_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                for prop in properties {
                    tx.execute(Delete(By::<Contract, property::Id>::new(
                        prop.id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                    tx.execute(Delete(By::<Property, _>::new(prop.id)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))
                        .map(drop)?;
                }
            }
        }

        tx.execute(Delete(By::<User, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`User(id: {user_id})` deleted ({})", user.role);

        Ok(())
    }
}

/// Error of [`DeleteUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID is an administrator.
    ///
    /// [`User`]: crate::domain::User
    #[display("`User(id: {_0})` is an administrator")]
    CannotDeleteAdmin(#[error(not(source))] user::Id),
}

impl ExecutionError {
    /// Returns the [`ErrorKind`] of this [`ExecutionError`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Internal,
            Self::UserNotExists(_) => ErrorKind::NotFound,
            Self::CannotDeleteAdmin(_) => ErrorKind::Conflict,
        }
    }
}
