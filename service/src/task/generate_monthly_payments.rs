//! [`GenerateMonthlyPayments`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{
        By, Commit, Insert, Perform, Select, Start, Transact, Transacted,
    },
    Date,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{contract, payment, Contract, Payment},
    infra::{database, Database},
    read::{self, contract::Active},
    Service,
};

use super::Task;

/// Configuration for [`GenerateMonthlyPayments`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between [`Payment`]s generation runs.
    pub interval: time::Duration,
}

/// [`Task`] generating the upcoming [`payment::Kind::MonthlyRent`]
/// [`Payment`] for every active [`Contract`].
#[derive(Clone, Copy, Debug)]
pub struct GenerateMonthlyPayments<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<S> GenerateMonthlyPayments<S> {
    /// Creates a new [`GenerateMonthlyPayments`] [`Task`].
    pub fn new(config: Config, service: S) -> Self {
        Self { config, service }
    }
}

impl<Db> Task<Start<By<GenerateMonthlyPayments<Self>, Config>>> for Service<Db>
where
    GenerateMonthlyPayments<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<GenerateMonthlyPayments<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = GenerateMonthlyPayments::new(config, self.clone());

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::GenerateMonthlyPayments` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for GenerateMonthlyPayments<Service<Db>>
where
    Db: Database<
            Select<By<Vec<Active<Contract>>, read::All>>,
            Ok = Vec<Active<Contract>>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<bool, (contract::Id, payment::Kind, payment::DueDate)>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let contracts = self
            .service
            .database()
            .execute(Select(By::<Vec<Active<Contract>>, _>::new(read::All)))
            .await
            .map_err(tracerr::map_from_and_wrap!())?;

        // Billing runs on a fixed grid: the first day of the next month.
        let next_due: payment::DueDate =
            Date::today().first_of_month().plus_months(1).coerce();

        for Active(contract) in contracts {
            // A failure on one contract must not abort the whole run.
            let generated = async {
                let tx = self
                    .service
                    .database()
                    .execute(Transact)
                    .await?;

                let exists = tx
                    .execute(Select(By::<bool, _>::new((
                        contract.id,
                        payment::Kind::MonthlyRent,
                        next_due,
                    ))))
                    .await?;
                if exists {
                    return Ok(false);
                }

                tx.execute(Insert(Payment::monthly(&contract, next_due)))
                    .await?;
                tx.execute(Commit).await?;

                Ok::<_, Traced<database::Error>>(true)
            }
            .await;

            match generated {
                Ok(true) => {
                    log::info!(
                        "generated `MONTHLY_RENT` payment for \
                         `Contract(id: {})` due on {next_due}",
                        contract.id,
                    );
                }
                Ok(false) => {
                    log::info!(
                        "`MONTHLY_RENT` payment for `Contract(id: {})` \
                         due on {next_due} exists already",
                        contract.id,
                    );
                }
                Err(e) => {
                    log::error!(
                        "cannot generate `MONTHLY_RENT` payment for \
                         `Contract(id: {})`: {e}",
                        contract.id,
                    );
                }
            }
        }

        Ok(())
    }
}

/// Error of [`GenerateMonthlyPayments`] execution.
pub type ExecutionError = Traced<database::Error>;
