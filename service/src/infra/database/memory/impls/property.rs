//! [`Property`]-related [`Database`] implementations.
//!
//! [`Database`]: crate::infra::Database

use std::cmp::Reverse;

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{property, user, Property},
    infra::database::{
        self,
        memory::{Connection, Error, Memory},
        Database as Db,
    },
    read,
};

impl<C> Db<Select<By<Option<Property>, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(move |state| state.properties.get(&id).cloned()).await
    }
}

impl<C> Db<Select<By<Vec<Property>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        self.read(move |state| {
            let mut properties = state
                .properties
                .values()
                .filter(|p| p.owner_id == owner_id)
                .cloned()
                .collect::<Vec<_>>();
            properties.sort_by_key(|p| Reverse(p.created_at));
            properties
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Property>, read::All>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<Vec<Property>, read::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read(|state| {
            let mut properties =
                state.properties.values().cloned().collect::<Vec<_>>();
            properties.sort_by_key(|p| Reverse(p.created_at));
            properties
        })
        .await
    }
}

impl<C> Db<Insert<Property>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            if state.properties.contains_key(&property.id) {
                return Err(Error::UniqueViolation("properties_pkey"));
            }
            drop(state.properties.insert(property.id, property));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Update<Property>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            drop(state.properties.insert(property.id, property));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Delete<By<Property, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |state| {
            drop(state.properties.remove(&id));
            Ok(())
        })
        .await
    }
}
