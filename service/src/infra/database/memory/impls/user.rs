//! [`User`]-related [`Database`] implementations.
//!
//! [`Database`]: crate::infra::Database

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::database::{
        self,
        memory::{Connection, Error, Memory},
        Database as Db,
    },
    read,
};

impl<C> Db<Select<By<Option<User>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(move |state| state.users.get(&id).cloned()).await
    }
}

impl<C> Db<Select<By<Vec<User>, read::All>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<Vec<User>, read::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read(|state| {
            let mut users = state.users.values().cloned().collect::<Vec<_>>();
            users.sort_by_key(|u| u.created_at);
            users
        })
        .await
    }
}

impl<C> Db<Insert<User>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            if state.users.contains_key(&user.id) {
                return Err(Error::UniqueViolation("users_pkey"));
            }
            drop(state.users.insert(user.id, user));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Delete<By<User, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |state| {
            drop(state.users.remove(&id));
            Ok(())
        })
        .await
    }
}
