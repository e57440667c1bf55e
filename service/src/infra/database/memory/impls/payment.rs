//! [`Payment`]-related [`Database`] implementations.
//!
//! [`Database`]: crate::infra::Database

use std::cmp::Reverse;

use common::operations::{By, Delete, Insert, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{contract, payment, property, user, Payment},
    infra::database::{
        self,
        memory::{Connection, Error, Memory, State},
        Database as Db,
    },
    read,
};

/// Sorts the provided [`Payment`]s in the ledger order: [`Pending`] ones
/// first, then settled ones by their settlement time, newest first.
///
/// [`Pending`]: payment::Status::Pending
fn sort_ledger(payments: &mut [Payment]) {
    payments.sort_by_key(|p| {
        (u8::from(!p.is_pending()), Reverse(p.paid_at), Reverse(p.due_date))
    });
}

/// Collects all the [`Payment`]s of the given [`State`] matching the provided
/// predicate, in the ledger order.
fn collect_ledger(
    state: &State,
    f: impl Fn(&Payment) -> bool,
) -> Vec<Payment> {
    let mut payments =
        state.payments.values().filter(|p| f(p)).cloned().collect::<Vec<_>>();
    sort_ledger(&mut payments);
    payments
}

impl<C> Db<Select<By<Option<Payment>, payment::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(move |state| state.payments.get(&id).cloned()).await
    }
}

impl<C> Db<Select<By<Vec<Payment>, contract::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract_id = by.into_inner();
        self.read(move |state| {
            collect_ledger(state, |p| p.contract_id == contract_id)
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Payment>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let tenant_id = by.into_inner();
        self.read(move |state| {
            collect_ledger(state, |p| {
                state
                    .contracts
                    .get(&p.contract_id)
                    .is_some_and(|c| c.tenant_id == tenant_id)
            })
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Payment>, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property_id = by.into_inner();
        self.read(move |state| {
            collect_ledger(state, |p| {
                state
                    .contracts
                    .get(&p.contract_id)
                    .is_some_and(|c| c.property_id == property_id)
            })
        })
        .await
    }
}

impl<C> Db<Select<By<Vec<Payment>, read::All>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(_): Select<By<Vec<Payment>, read::All>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read(|state| collect_ledger(state, |_| true)).await
    }
}

impl<C>
    Db<Select<By<bool, (contract::Id, payment::Kind, payment::DueDate)>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<bool, (contract::Id, payment::Kind, payment::DueDate)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (contract_id, kind, due_date) = by.into_inner();
        self.read(move |state| {
            state.payments.values().any(|p| {
                p.contract_id == contract_id
                    && p.kind == kind
                    && p.due_date == due_date
            })
        })
        .await
    }
}

impl<C> Db<Select<By<read::payment::OverdueCount, common::Date>>> for Memory<C>
where
    C: Connection,
{
    type Ok = read::payment::OverdueCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::payment::OverdueCount, common::Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        self.read(move |state| {
            u64::try_from(
                state
                    .payments
                    .values()
                    .filter(|p| p.is_pending() && p.due_date.coerce() < today)
                    .count(),
            )
            .unwrap_or(u64::MAX)
            .into()
        })
        .await
    }
}

impl<C> Db<Insert<Payment>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            if state.payments.contains_key(&payment.id) {
                return Err(Error::UniqueViolation("payments_pkey"));
            }
            // `MONTHLY_RENT` payments are unique per contract and due date.
            if payment.kind == payment::Kind::MonthlyRent
                && state.payments.values().any(|p| {
                    p.contract_id == payment.contract_id
                        && p.kind == payment.kind
                        && p.due_date == payment.due_date
                })
            {
                return Err(Error::UniqueViolation(
                    "payments_contract_id_kind_due_date_idx",
                ));
            }
            drop(state.payments.insert(payment.id, payment));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Update<Payment>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(move |state| {
            drop(state.payments.insert(payment.id, payment));
            Ok(())
        })
        .await
    }
}

impl<C> Db<Delete<By<Payment, contract::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract_id = by.into_inner();
        self.write(move |state| {
            state.payments.retain(|_, p| p.contract_id != contract_id);
            Ok(())
        })
        .await
    }
}
