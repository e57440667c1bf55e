//! In-memory [`Database`] implementation.

mod impls;

use std::{collections::HashMap, future::Future, sync::Arc};

use common::operations::{By, Commit, Lock, Transact};
use derive_more::{Deref, Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{
        contract, payment, property, user, Contract, Payment, Property, User,
    },
    infra::database,
};
#[cfg(doc)]
use crate::infra::Database;

use super::Database as Db;

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] client.
    #[must_use]
    pub fn new() -> Self {
        Self(NonTx::default())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole state held by a [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`User`]s.
    pub users: HashMap<user::Id, User>,

    /// Stored [`Property`]s.
    pub properties: HashMap<property::Id, Property>,

    /// Stored [`Contract`]s.
    pub contracts: HashMap<contract::Id, Contract>,

    /// Stored [`Payment`]s.
    pub payments: HashMap<payment::Id, Payment>,
}

/// Non-transactional [`Memory`] client.
///
/// Every operation locks the [`State`] for its own duration only, so is
/// atomic on its own.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`State`] of the store.
    state: Arc<Mutex<State>>,
}

/// Transactional [`Memory`] client.
///
/// Holds the exclusive [`State`] guard for its whole lifetime, so no other
/// client (transactional or not) can interleave until this one is finished.
/// Mutations are applied to a staged copy of the [`State`] and become
/// visible only on [`Commit`]; dropping the client without committing rolls
/// everything back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Inner representation of this client.
    inner: Arc<Mutex<TxInner>>,
}

/// Inner representation of a [`Tx`] client.
#[derive(Debug)]
struct TxInner {
    /// Exclusive guard over the shared [`State`].
    guard: OwnedMutexGuard<State>,

    /// Staged copy of the [`State`] receiving the mutations.
    staged: State,

    /// Indicator whether this transaction has been committed already.
    committed: bool,
}

/// Connection capable of running operations over a [`State`].
pub trait Connection {
    /// Runs the provided closure over a read-only view of the [`State`].
    fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;

    /// Runs the provided closure over a mutable view of the [`State`].
    fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Connection for NonTx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let state = self.state.lock().await;
        Ok(f(&state))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        let mut state = self.state.lock().await;
        f(&mut state)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for Tx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&State) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let inner = self.inner.lock().await;
        Ok(f(&inner.staged))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        let mut inner = self.inner.lock().await;
        f(&mut inner.staged)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl Db<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let guard = Arc::clone(&self.0.state).lock_owned().await;
        let staged = guard.clone();

        Ok(Memory(Tx {
            inner: Arc::new(Mutex::new(TxInner {
                guard,
                staged,
                committed: false,
            })),
        }))
    }
}

impl Db<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let mut inner = self.0.inner.lock().await;
        let TxInner {
            guard,
            staged,
            committed,
        } = &mut *inner;
        if !*committed {
            *committed = true;
            **guard = staged.clone();
        }
        Ok(())
    }
}

// Row locks are trivially satisfied: the transaction already holds the
// exclusive guard over the whole `State`.
impl<W, B> Db<Lock<By<W, B>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Lock<By<W, B>>) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

/// In-memory database [`Error`].
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique index violation.
    #[display("unique index `{_0}` violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}
