//! Shared fixtures of the integration tests.

#![allow(dead_code)]

use std::time;

use common::{operations::Insert, Date, Money};
use service::{
    domain::{property, user, Property, User},
    infra::{Cached, Database as _, Memory},
    task, Config, Service,
};

/// Database layer the tests run against.
pub type Db = Cached<Memory>;

/// Creates a new [`Service`] over a fresh in-memory store.
pub fn service() -> (Service<Db>, Db) {
    let db = Cached::new(Memory::new());
    let (svc, bg) = Service::new(config(), db.clone());
    drop(bg);
    (svc, db)
}

/// [`Config`] used by the tests.
pub fn config() -> Config {
    Config {
        generate_monthly_payments: task::generate_monthly_payments::Config {
            interval: time::Duration::from_secs(60 * 60 * 24),
        },
        audit_overdue_payments: task::audit_overdue_payments::Config {
            interval: time::Duration::from_secs(60 * 5),
        },
    }
}

/// Parses the provided [`Money`] literal.
pub fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// Parses the provided [`Date`] literal.
pub fn date(s: &str) -> Date {
    s.parse().unwrap()
}

/// Stores a new [`User`] with the provided [`user::Role`].
pub async fn seed_user(db: &Db, role: user::Role) -> User {
    let user = User {
        id: user::Id::new(),
        name: "Jordan Example".parse().unwrap(),
        email: Some("jordan@example.com".parse().unwrap()),
        phone: None,
        role,
        created_at: user::CreationDateTime::now(),
    };
    db.execute(Insert(user.clone())).await.unwrap();
    user
}

/// Stores a new available [`Property`] of the provided owner.
pub async fn seed_property(
    db: &Db,
    owner_id: user::Id,
    monthly_rent: Money,
) -> Property {
    let property = Property {
        id: property::Id::new(),
        owner_id,
        title: "Two-room flat".parse().unwrap(),
        description: None,
        city: "Springfield".parse().unwrap(),
        address: "742 Evergreen Terrace".parse().unwrap(),
        monthly_rent,
        status: property::Status::Available,
        created_at: property::CreationDateTime::now(),
        updated_at: property::UpdateDateTime::now(),
    };
    db.execute(Insert(property.clone())).await.unwrap();
    property
}
