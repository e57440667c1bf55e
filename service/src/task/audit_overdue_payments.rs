//! [`AuditOverduePayments`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Select, Start},
    Date,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    infra::{database, Database},
    read,
    Service,
};

use super::Task;

/// Configuration for [`AuditOverduePayments`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between audit runs.
    pub interval: time::Duration,
}

/// [`Task`] counting [`Payment`]s remaining `PENDING` past their due date.
///
/// [`Payment`]: crate::domain::Payment
#[derive(Clone, Copy, Debug)]
pub struct AuditOverduePayments<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<S> AuditOverduePayments<S> {
    /// Creates a new [`AuditOverduePayments`] [`Task`].
    pub fn new(config: Config, service: S) -> Self {
        Self { config, service }
    }
}

impl<Db> Task<Start<By<AuditOverduePayments<Self>, Config>>> for Service<Db>
where
    AuditOverduePayments<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<AuditOverduePayments<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = AuditOverduePayments::new(config, self.clone());

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::AuditOverduePayments` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for AuditOverduePayments<Service<Db>>
where
    Db: Database<
        Select<By<read::payment::OverdueCount, Date>>,
        Ok = read::payment::OverdueCount,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let today = Date::today();
        let count = self
            .service
            .database()
            .execute(Select(By::<read::payment::OverdueCount, _>::new(today)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        if u64::from(count) > 0 {
            log::warn!("{count} payment(s) are overdue as of {today}");
        } else {
            log::info!("no overdue payments as of {today}");
        }

        Ok(())
    }
}

/// Error of [`AuditOverduePayments`] execution.
pub type ExecutionError = Traced<database::Error>;
