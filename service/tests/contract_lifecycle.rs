//! Contract lifecycle scenarios driven through the [`Service`] commands.
//!
//! [`Service`]: service::Service

mod support;

use common::operations::Insert;
use service::{
    command::{
        cancel_contract, create_contract, CancelContract, CreateContract,
        DeleteProperty, DeleteUser, EndContract, ErrorKind,
    },
    domain::{contract, payment, property, user, Contract},
    infra::Database as _,
    query, read, Command as _,
};

use self::support::{date, money, seed_property, seed_user, service};

#[tokio::test]
async fn creates_contract_with_initial_payments() {
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

    assert!(contract.is_active());
    assert_eq!(contract.monthly_rent, money("800.00USD"));
    assert_eq!(contract.start_date.coerce(), date("2024-01-15"));

    let payments = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 3);

    let deposit = payments
        .iter()
        .find(|p| p.kind == payment::Kind::Deposit)
        .unwrap();
    assert_eq!(deposit.status, payment::Status::Success);
    assert_eq!(deposit.amount, money("800.00USD"));
    assert!(deposit.paid_at.is_some());

    let initial = payments
        .iter()
        .find(|p| p.kind == payment::Kind::InitialRent)
        .unwrap();
    assert_eq!(initial.status, payment::Status::Success);
    assert!(initial.paid_at.is_some());

    let monthly = payments
        .iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap();
    assert_eq!(monthly.status, payment::Status::Pending);
    assert_eq!(monthly.due_date.coerce(), date("2024-02-15"));
    assert!(monthly.paid_at.is_none());

    let stored = svc
        .execute(query::property::ById::by(prop.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, property::Status::Rented);
}

#[tokio::test]
async fn rejects_second_active_contract_of_tenant() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let first = seed_property(&db, owner.id, money("800.00USD")).await;
    let second = seed_property(&db, owner.id, money("950.00USD")).await;

    svc.execute(CreateContract {
        property_id: first.id,
        tenant_id: tenant.id,
        start_date: None,
    })
    .await
    .unwrap();

    let err = svc
        .execute(CreateContract {
            property_id: second.id,
            tenant_id: tenant.id,
            start_date: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        create_contract::ExecutionError::TenantAlreadyRents(_),
    ));
    assert_eq!(err.as_ref().kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn rejects_rented_property() {
    let (svc, db) = service();
    let first_tenant = seed_user(&db, user::Role::Tenant).await;
    let second_tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    svc.execute(CreateContract {
        property_id: prop.id,
        tenant_id: first_tenant.id,
        start_date: None,
    })
    .await
    .unwrap();

    let err = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: second_tenant.id,
            start_date: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        create_contract::ExecutionError::PropertyUnavailable(_),
    ));
    assert_eq!(err.as_ref().kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn create_then_cancel_round_trip() {
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

    let stored = svc
        .execute(query::contract::ById::by(contract.id))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active());
    assert!(stored.end_date.is_some());

    let prop = svc
        .execute(query::property::ById::by(prop.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(prop.status, property::Status::Available);

    // Cancelling must not touch the ledger.
    let payments = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 3);
    let monthly = payments
        .iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap();
    assert_eq!(monthly.status, payment::Status::Pending);

    // Cancelling a finished contract is an idempotent no-op.
    svc.execute(CancelContract {
        contract_id: contract.id,
        tenant_id: tenant.id,
    })
    .await
    .unwrap();

    // The tenant may rent again afterwards.
    let other = seed_property(&db, owner.id, money("950.00USD")).await;
    svc.execute(CreateContract {
        property_id: other.id,
        tenant_id: tenant.id,
        start_date: None,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn cancel_requires_the_contract_holder() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let stranger = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: None,
        })
        .await
        .unwrap();

    let err = svc
        .execute(CancelContract {
            contract_id: contract.id,
            tenant_id: stranger.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_ref(),
        cancel_contract::ExecutionError::NotContractHolder(_),
    ));
    assert_eq!(err.as_ref().kind(), ErrorKind::Unauthorized);

    let stored = svc
        .execute(query::contract::ById::by(contract.id))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_active());
}

#[tokio::test]
async fn ending_cancels_pending_payments() {
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

    svc.execute(EndContract {
        contract_id: contract.id,
    })
    .await
    .unwrap();

    let stored = svc
        .execute(query::contract::ById::by(contract.id))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active());

    let payments = svc
        .execute(query::payment::ForContract::by(contract.id))
        .await
        .unwrap();
    let monthly = payments
        .iter()
        .find(|p| p.kind == payment::Kind::MonthlyRent)
        .unwrap();
    assert_eq!(monthly.status, payment::Status::Canceled);
    // Settled payments stay settled.
    let deposit = payments
        .iter()
        .find(|p| p.kind == payment::Kind::Deposit)
        .unwrap();
    assert_eq!(deposit.status, payment::Status::Success);

    let prop = svc
        .execute(query::property::ById::by(prop.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(prop.status, property::Status::Available);

    // Ending a finished contract is an idempotent no-op.
    svc.execute(EndContract {
        contract_id: contract.id,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn ending_unknown_contract_fails() {
    let (svc, _) = service();

    let err = svc
        .execute(EndContract {
            contract_id: contract::Id::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.as_ref().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn deleting_property_removes_its_contracts() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: None,
        })
        .await
        .unwrap();

    svc.execute(DeleteProperty {
        property_id: prop.id,
    })
    .await
    .unwrap();

    assert!(svc
        .execute(query::property::ById::by(prop.id))
        .await
        .unwrap()
        .is_none());
    assert!(svc
        .execute(query::contract::ById::by(contract.id))
        .await
        .unwrap()
        .is_none());

    // Payments of the removed contracts are orphaned, not deleted, and the
    // tenant-scoped view tolerates them.
    let all = svc
        .execute(query::payment::List::by(read::All))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    let for_tenant = svc
        .execute(query::payment::ForTenant::by(tenant.id))
        .await
        .unwrap();
    assert!(for_tenant.is_empty());
}

#[tokio::test]
async fn contract_listings_order_active_first() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let other = seed_user(&db, user::Role::Tenant).await;

    let seeded = |tenant_id, start: &str, end: Option<&str>| Contract {
        id: contract::Id::new(),
        tenant_id,
        property_id: property::Id::new(),
        start_date: date(start).coerce(),
        end_date: end.map(|d| date(d).coerce()),
        monthly_rent: money("800.00USD"),
        active: end.is_none(),
    };

    let active = seeded(tenant.id, "2024-03-01", None);
    let recent = seeded(tenant.id, "2024-01-01", Some("2024-06-30"));
    let old = seeded(tenant.id, "2023-01-01", Some("2023-12-31"));
    let newest_active = seeded(other.id, "2024-05-01", None);
    for c in [&active, &recent, &old, &newest_active] {
        db.execute(Insert(c.clone())).await.unwrap();
    }

    // Tenant history: the active contract first, then the finished ones by
    // end date, newest first.
    let history = svc
        .execute(query::contract::HistoryForTenant::by(tenant.id))
        .await
        .unwrap();
    assert_eq!(
        history.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![active.id, recent.id, old.id],
    );

    // System-wide listing: active contracts by start date, then finished
    // ones by end date, newest first.
    let all = svc
        .execute(query::contract::List::by(read::All))
        .await
        .unwrap();
    assert_eq!(
        all.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![newest_active.id, active.id, recent.id, old.id],
    );
}

#[tokio::test]
async fn deleting_admin_is_rejected() {
    let (svc, db) = service();
    let admin = seed_user(&db, user::Role::Admin).await;

    let err = svc
        .execute(DeleteUser { user_id: admin.id })
        .await
        .unwrap_err();
    assert_eq!(err.as_ref().kind(), ErrorKind::Conflict);
    assert!(svc
        .execute(query::user::ById::by(admin.id))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn deleting_tenant_cascades_contracts_and_payments() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: None,
        })
        .await
        .unwrap();

    svc.execute(DeleteUser { user_id: tenant.id }).await.unwrap();

    assert!(svc
        .execute(query::user::ById::by(tenant.id))
        .await
        .unwrap()
        .is_none());
    assert!(svc
        .execute(query::contract::ById::by(contract.id))
        .await
        .unwrap()
        .is_none());
    let all = svc
        .execute(query::payment::List::by(read::All))
        .await
        .unwrap();
    assert!(all.is_empty());

    let prop = svc
        .execute(query::property::ById::by(prop.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(prop.status, property::Status::Available);
}

#[tokio::test]
async fn deleting_owner_cascades_properties() {
    let (svc, db) = service();
    let tenant = seed_user(&db, user::Role::Tenant).await;
    let owner = seed_user(&db, user::Role::Owner).await;
    let prop = seed_property(&db, owner.id, money("800.00USD")).await;

    let contract = svc
        .execute(CreateContract {
            property_id: prop.id,
            tenant_id: tenant.id,
            start_date: None,
        })
        .await
        .unwrap();

    svc.execute(DeleteUser { user_id: owner.id }).await.unwrap();

    assert!(svc
        .execute(query::user::ById::by(owner.id))
        .await
        .unwrap()
        .is_none());
    assert!(svc
        .execute(query::property::ById::by(prop.id))
        .await
        .unwrap()
        .is_none());
    assert!(svc
        .execute(query::contract::ById::by(contract.id))
        .await
        .unwrap()
        .is_none());
    // The tenant itself survives the owner's removal.
    assert!(svc
        .execute(query::user::ById::by(tenant.id))
        .await
        .unwrap()
        .is_some());
}
