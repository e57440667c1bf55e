//! Recurring payment scheduler scenarios.

mod support;

use common::{
    operations::{Insert, Perform},
    Date,
};
use service::{
    command::{CancelContract, CreateContract},
    domain::{payment, user, Payment},
    infra::{
        database::{self, memory},
        Database as _,
    },
    query,
    task::{AuditOverduePayments, GenerateMonthlyPayments},
    Command as _, Task as _,
};

use self::support::{date, money, seed_property, seed_user, service};

#[tokio::test]
async fn generates_exactly_one_monthly_payment_per_contract() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: Some(date("2024-01-15").coerce()),
        })
        .await
        .unwrap();

    let task = GenerateMonthlyPayments::new(
        support::config().generate_monthly_payments,
        svc.clone(),
    );
    // A second run must observe the first run's payment and skip it.
    task.execute(Perform(())).await.unwrap();
    task.execute(Perform(())).await.unwrap();

    let next_due = Date::today().first_of_month().plus_months(1);
    let payments = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 4);

    let generated = payments
        .iter()
        .filter(|p| {
            p.kind == payment::Kind::MonthlyRent
                && p.due_date.coerce() == next_due
        })
        .collect::<Vec<_>>();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].status, payment::Status::Pending);
    assert_eq!(generated[0].amount, money("800.00USD"));
}

#[tokio::test]
async fn skips_inactive_contracts() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: Some(date("2024-01-15").coerce()),
        })
        .await
        .unwrap();
    svc.execute(CancelContract {
        contract_id: contract.id,
        tenant_id: tenant.id,
    })
    .await
    .unwrap();

    let task = GenerateMonthlyPayments::new(
        support::config().generate_monthly_payments,
        svc.clone(),
    );
    task.execute(Perform(())).await.unwrap();

    let payments = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 3);
}

#[tokio::test]
async fn unique_index_rejects_duplicate_monthly_payment() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: Some(date("2024-01-15").coerce()),
        })
        .await
        .unwrap();

    let due = date("2024-03-01").coerce();
    db.execute(Insert(Payment::monthly(&contract, due)))
        .await
        .unwrap();
    let err = db
        .execute(Insert(Payment::monthly(&contract, due)))
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        database::Error::Memory(memory::Error::UniqueViolation(_)),
    ));
}

#[tokio::test]
async fn audits_overdue_payments() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    // The first monthly payment is due 2024-02-15 and never settled.
    svc.execute(CreateContract {
        property_id: prop.id,
        tenant_id: tenant.id,
        start_date: Some(date("2024-01-15").coerce()),
    })
    .await
    .unwrap();

    let count = svc
        .execute(query::payment::OverdueCount::by(Date::today()))
        .await
        .unwrap();
    assert_eq!(u64::from(count), 1);

    let task = AuditOverduePayments::new(
        support::config().audit_overdue_payments,
        svc.clone(),
    );
    task.execute(Perform(())).await.unwrap();
}
