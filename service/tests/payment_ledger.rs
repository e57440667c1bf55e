//! Payment ledger scenarios driven through the [`Service`] commands and
//! queries.
//!
//! [`Service`]: service::Service

mod support;

use service::{
    command::{
        record_payment, CorrectPayment, CreateContract, ErrorKind,
        RecordPayment,
    },
    domain::{payment, user, Contract},
    query::{self, payment::ForProperty},
    Command as _,
};

use self::support::{date, money, seed_property, seed_user, service};

/// Creates a contract of the provided tenant over a fresh property.
async fn rent(
    svc: &service::Service<support::Db>,
    db: &support::Db,
    tenant_id: user::Id,
) -> Contract {
    let owner = seed_user(db, user::Role::Owner).await;
    let prop = seed_property(db, owner.id, money("800.00USD")).await;
    svc.execute(CreateContract {
        property_id: prop.id,
        tenant_id,
        start_date: Some(date("2024-01-15").coerce()),
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn settles_pending_payment_once() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let contract = rent(&svc, &db, tenant.id).await;

    let monthly_id = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap()
        .id;

    svc.execute(RecordPayment {
        payment_id: monthly_id,
        tenant_id: tenant.id,
    })
    .await
    .unwrap();

    let paid = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.status, payment::Status::Success);
    let settled_at = paid.paid_at.unwrap();

    // Settling again is an idempotent no-op.
    svc.execute(RecordPayment {
        payment_id: monthly_id,
        tenant_id: tenant.id,
    })
    .await
    .unwrap();

    let paid = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paid.status, payment::Status::Success);
    assert_eq!(paid.paid_at.unwrap(), settled_at);
}

#[tokio::test]
async fn cached_reads_observe_settlement() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let contract = rent(&svc, &db, tenant.id).await;

    let monthly_id = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap()
        .id;

    // Prime the cache with the still-pending payment.
    let pending = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert!(pending.is_pending());

    svc.execute(RecordPayment {
        payment_id: monthly_id,
        tenant_id: tenant.id,
    })
    .await
    .unwrap();

    // Committing the settlement must evict the primed entry.
    let settled = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, payment::Status::Success);
}

#[tokio::test]
async fn settling_requires_the_contract_holder() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let stranger = seed_user(&db, user::Role::Tenant).await;
    let contract = rent(&svc, &db, tenant.id).await;

    let monthly_id = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap()
        .id;

    let err = svc
        .execute(RecordPayment {
            payment_id: monthly_id,
            tenant_id: stranger.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        record_payment::ExecutionError::NotPaymentHolder(_),
    ));
    assert_eq!(err.as_ref().kind(), ErrorKind::Unauthorized);

    // The rejected attempt must not mutate the ledger.
    let untouched = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, payment::Status::Pending);
    assert!(untouched.paid_at.is_none());
}

#[tokio::test]
async fn settling_unknown_payment_fails() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;

    let err = svc
        .execute(RecordPayment {
            payment_id: payment::Id::new(),
            tenant_id: tenant.id,
        })
        .await
        .unwrap_err();
    assert_eq!(err.as_ref().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn correction_tracks_settlement_time() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let contract = rent(&svc, &db, tenant.id).await;

    let monthly_id = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap()
        .id;

    // PENDING -> SUCCESS stamps the settlement time.
    svc.execute(CorrectPayment {
        payment_id: monthly_id,
        amount: money("750.00USD"),
        status: payment::Status::Success,
    })
    .await
    .unwrap();
    let corrected = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(corrected.amount, money("750.00USD"));
    assert_eq!(corrected.status, payment::Status::Success);
    assert!(corrected.paid_at.is_some());

    // SUCCESS -> PENDING clears it back.
    svc.execute(CorrectPayment {
        payment_id: monthly_id,
        amount: money("750.00USD"),
        status: payment::Status::Pending,
    })
    .await
    .unwrap();
    let reset = svc
        .execute(query::payment::ById::by(monthly_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reset.status, payment::Status::Pending);
    assert!(reset.paid_at.is_none());
}

#[tokio::test]
async fn ledger_lists_pending_payments_first() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let contract = rent(&svc, &db, tenant.id).await;

    let payments = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 3);
    assert_eq!(payments[0].kind, payment::Kind::MonthlyRent);
    assert_eq!(payments[0].status, payment::Status::Pending);
    assert!(payments[1..].iter().all(|p| !p.is_pending()));

    let for_tenant = svc
        .execute(query::payment::ForTenant::by(tenant.id))
        .await
        .unwrap();
    assert_eq!(for_tenant.len(), 3);
    assert!(for_tenant[0].is_pending());
}

#[tokio::test]
async fn property_payments_are_owner_scoped() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let stranger = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    svc.execute(CreateContract {
        property_id: prop.id,
        tenant_id: tenant.id,
        start_date: None,
    })
    .await
    .unwrap();

    let payments = svc
        .execute(ForProperty {
            property_id: prop.id,
            owner_id: owner.id,
        })
        .await
        .unwrap();
    assert_eq!(payments.len(), 3);

    let err = svc
        .execute(ForProperty {
            property_id: prop.id,
            owner_id: stranger.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        query::payment::ExecutionError::NotPropertyOwner(_),
    ));
    assert_eq!(err.as_ref().kind(), ErrorKind::Unauthorized);
}
