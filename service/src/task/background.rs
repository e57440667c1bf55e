//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Background environment for running [`Task`]s.
///
/// Spawned [`Task`]s don't run until this environment is awaited.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Handles of the spawned [`Task`]s.
    handles: Vec<task::JoinHandle<Result<(), Box<dyn Error + 'static>>>>,
}

impl Background {
    /// Spawns a new [`Task`] inside the [`Background`] environment.
    pub fn spawn<F, E>(&mut self, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        self.handles.push(self.set.spawn_local(
            future.map_err(|e| Box::<dyn Error + 'static>::from(Box::new(e))),
        ));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Box<dyn Error>>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let joined = handles.into_iter().map(|handle| {
            handle
                .map(|res| match res {
                    Ok(task_result) => task_result,
                    Err(e) => {
                        Err(Box::<dyn Error + 'static>::from(Box::new(e)))
                    }
                })
                .boxed_local()
        });
        future::try_join_all(
            iter::once(set.map(Ok).boxed_local()).chain(joined),
        )
        .map_ok(drop)
        .boxed_local()
    }
}
