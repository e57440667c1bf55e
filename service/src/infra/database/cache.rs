//! Caching layer for a [`Database`].

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    hash::{Hash, Hasher as _},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::Debug;
use xxhash_rust::xxh3::Xxh3;

use super::Database;

/// Shared state of a [`Cached`] layer.
#[derive(Debug, Default)]
struct Store {
    /// Cached values, keyed by the selected type and the hash of the
    /// selector.
    #[debug(skip)]
    entries: RwLock<HashMap<(TypeId, u64), Box<dyn Any + Send + Sync>>>,

    /// Number of evictions performed so far.
    ///
    /// A read-through fill is abandoned when an eviction slips in between
    /// the cache miss and the insertion, otherwise a concurrently committed
    /// write could be shadowed by the stale value until the next eviction.
    epoch: AtomicU64,
}

/// [`Database`] wrapper caching results of [`Select`] operations.
///
/// Any mutating operation ([`Insert`], [`Update`] or [`Delete`]), and any
/// [`Commit`] of a transaction started through this wrapper, evicts the whole
/// cache, so reads following a write always hit the wrapped [`Database`].
#[derive(Clone, Debug)]
pub struct Cached<Db> {
    /// Wrapped [`Database`].
    db: Db,

    /// Cached [`Select`] results.
    store: Arc<Store>,
}

impl<Db> Cached<Db> {
    /// Wraps the provided [`Database`] into a [`Cached`] layer.
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            store: Arc::new(Store::default()),
        }
    }
}

/// Computes the cache key of a [`Select`]`<`[`By`]`<W, B>>` operation.
fn key_of<W: 'static, B: Hash>(by: &B) -> (TypeId, u64) {
    let mut hasher = Xxh3::new();
    by.hash(&mut hasher);
    (TypeId::of::<W>(), hasher.finish())
}

/// Removes all the cached entries, bumping the eviction epoch.
fn evict(store: &Store) {
    _ = store.epoch.fetch_add(1, Ordering::SeqCst);
    store
        .entries
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

impl<Db, W, B> Database<Select<By<W, B>>> for Cached<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W>,
    W: Clone + Send + Sync + 'static,
    B: Hash,
{
    type Ok = W;
    type Err = Db::Err;

    async fn execute(
        &self,
        Select(by): Select<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        let by = by.into_inner();
        let key = key_of::<W, B>(&by);

        let epoch = self.store.epoch.load(Ordering::SeqCst);
        let cached = self
            .store
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .and_then(|v| v.downcast_ref::<W>().cloned());
        if let Some(value) = cached {
            return Ok(value);
        }

        let value = self.db.execute(Select(By::new(by))).await?;
        // The fetched value may predate an eviction that happened meanwhile,
        // so it's only stored while the epoch is unchanged.
        if self.store.epoch.load(Ordering::SeqCst) == epoch {
            drop(
                self.store
                    .entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key, Box::new(value.clone())),
            );
        }
        Ok(value)
    }
}

impl<Db, T> Database<Insert<T>> for Cached<Db>
where
    Db: Database<Insert<T>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(&self, op: Insert<T>) -> Result<Self::Ok, Self::Err> {
        let result = self.db.execute(op).await;
        evict(&self.store);
        result
    }
}

impl<Db, T> Database<Update<T>> for Cached<Db>
where
    Db: Database<Update<T>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(&self, op: Update<T>) -> Result<Self::Ok, Self::Err> {
        let result = self.db.execute(op).await;
        evict(&self.store);
        result
    }
}

impl<Db, W, B> Database<Delete<By<W, B>>> for Cached<Db>
where
    Db: Database<Delete<By<W, B>>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(
        &self,
        op: Delete<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        let result = self.db.execute(op).await;
        evict(&self.store);
        result
    }
}

impl<Db> Database<Transact> for Cached<Db>
where
    Db: Database<Transact>,
{
    type Ok = Tx<Transacted<Db>>;
    type Err = Db::Err;

    async fn execute(&self, op: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Tx {
            db: self.db.execute(op).await?,
            store: Arc::clone(&self.store),
        })
    }
}

/// Transaction started through a [`Cached`] layer.
///
/// Operations inside the transaction bypass the cache entirely, so reads
/// always observe the staged writes. [`Commit`]ting evicts the whole cache of
/// the originating [`Cached`] layer.
#[derive(Clone, Debug)]
pub struct Tx<Db> {
    /// Wrapped transactional [`Database`].
    db: Db,

    /// Cache of the originating [`Cached`] layer.
    store: Arc<Store>,
}

impl<Db, W, B> Database<Select<By<W, B>>> for Tx<Db>
where
    Db: Database<Select<By<W, B>>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(
        &self,
        op: Select<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.db.execute(op).await
    }
}

impl<Db, W, B> Database<Lock<By<W, B>>> for Tx<Db>
where
    Db: Database<Lock<By<W, B>>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(
        &self,
        op: Lock<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.db.execute(op).await
    }
}

impl<Db, T> Database<Insert<T>> for Tx<Db>
where
    Db: Database<Insert<T>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(&self, op: Insert<T>) -> Result<Self::Ok, Self::Err> {
        self.db.execute(op).await
    }
}

impl<Db, T> Database<Update<T>> for Tx<Db>
where
    Db: Database<Update<T>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(&self, op: Update<T>) -> Result<Self::Ok, Self::Err> {
        self.db.execute(op).await
    }
}

impl<Db, W, B> Database<Delete<By<W, B>>> for Tx<Db>
where
    Db: Database<Delete<By<W, B>>>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(
        &self,
        op: Delete<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.db.execute(op).await
    }
}

impl<Db> Database<Commit> for Tx<Db>
where
    Db: Database<Commit>,
{
    type Ok = Db::Ok;
    type Err = Db::Err;

    async fn execute(&self, op: Commit) -> Result<Self::Ok, Self::Err> {
        let committed = self.db.execute(op).await?;
        evict(&self.store);
        Ok(committed)
    }
}
