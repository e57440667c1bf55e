//! [`Contract`]-related [`Database`] implementations.
//!
//! [`Database`]: crate::infra::Database

use std::cmp::Reverse;

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{contract, property, user, Contract},
    infra::database::{
        self,
        memory::{Connection, Error, Memory},
        Database as Db,
    },
    read::{self, contract::Active},
};

impl<C> Db<Select<By<Option<Contract>, contract::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(move |state| state.contracts.get(&id).cloned())
            .await
    }
}

impl<C> Db<Select<By<Option<Active<Contract>>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Active<Contract>>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tenant_id = by.into_inner();
        self.read(move |state| {
            state
                .contracts
                .values()
                .find(|c| c.tenant_id == tenant_id && c.is_active())
                .cloned()
                .map(Active)
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Contract>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tenant_id = by.into_inner();
        self.read(move |state| {
            let mut contracts = state
                .contracts
                .values()
                .filter(|c| c.tenant_id == tenant_id)
                .cloned()
                .collect::<Vec<_>>();
            // Active contracts first, then the most recently vacated.
            contracts.sort_by_key(|c| {
                (u8::from(!c.is_active()), Reverse(c.end_date))
            });
            contracts
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Contract>, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        self.read(move |state| {
            let mut contracts = state
                .contracts
                .values()
                .filter(|c| c.property_id == property_id)
                .cloned()
                .collect::<Vec<_>>();
            contracts.sort_by_key(|c| Reverse(c.start_date));
            contracts
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Contract>, read::All>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<Vec<Contract>, read::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read(|state| {
            let mut contracts =
                state.contracts.values().cloned().collect::<Vec<_>>();
            // Active contracts first by start date, then finished ones by
            // end date.
            contracts.sort_by_key(|c| {
                let date = if c.is_active() {
                    c.start_date.coerce()
                } else {
                    c.end_date
                        .map_or_else(|| c.start_date.coerce(), |d| d.coerce())
                };
                (u8::from(!c.is_active()), Reverse::<common::Date>(date))
            });
            contracts
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Active<Contract>>, read::All>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Active<Contract>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<Vec<Active<Contract>>, read::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read(|state| {
            state
                .contracts
                .values()
                .filter(|c| c.is_active())
                .cloned()
                .map(Active)
                .collect()
        })
        .await
    }
}

impl<C> Db<Insert<Contract>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            if state.contracts.contains_key(&contract.id) {
                return Err(Error::UniqueViolation("contracts_pkey"));
            }
            drop(state.contracts.insert(contract.id, contract));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Update<Contract>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            drop(state.contracts.insert(contract.id, contract));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Delete<By<Contract, contract::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(move |state| {
            drop(state.contracts.remove(&id));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Delete<By<Contract, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Contract, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        self.write(move |state| {
            state.contracts.retain(|_, c| c.property_id != property_id);
            Ok(())
        })
        .await
    }
}
