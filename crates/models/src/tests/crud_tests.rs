use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;
use chrono::Utc;

use crate::status::{OrderStatus, PaymentStatus};
use crate::{cart, dispute, order, order_history, password_reset_token, payment_intent, product, user, user_credentials};

use super::{setup_test_db, skip_db};

fn unique_email() -> String {
    format!("model_{}@example.com", Uuid::new_v4())
}

async fn insert_product<C: sea_orm::ConnectionTrait>(db: &C, price: &str) -> Result<product::Model> {
    let now = Utc::now().into();
    let am = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set("Brake Pad".into()),
        description: Set("Ceramic front pads".into()),
        price: Set(Decimal::from_str(price)?),
        sku: Set(format!("SKU-{}", Uuid::new_v4())),
        make: Set(Some("Toyota".into())),
        model: Set(Some("Corolla".into())),
        year: Set(Some(2018)),
        brand: Set(None),
        car_name: Set(None),
        body_type: Set(None),
        engine: Set(None),
        horsepower: Set(None),
        fuel_type: Set(None),
        fuel_capacity: Set(None),
        engine_displacement: Set(None),
        rpm: Set(None),
        car_price: Set(None),
        car_location: Set(None),
        transmission: Set(None),
        colour: Set(None),
        mileage: Set(None),
        images: Set(vec![]),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Test user creation, lookup and credential upsert
#[tokio::test]
async fn test_user_crud() -> Result<()> {
    if skip_db() {
        return Ok(());
    }
    let db = setup_test_db().await?;

    let email = unique_email();
    let created = user::create(&db, &email.to_uppercase(), "Test User", &[]).await?;
    assert_eq!(created.email, email);
    assert_eq!(created.roles, vec!["CUSTOMER"]);

    let found = user::find_by_email(&db, &email).await?;
    assert_eq!(found.map(|u| u.id), Some(created.id));

    // duplicate email violates unique constraint
    let dup = user::create(&db, &email, "Other", &[]).await;
    assert!(dup.is_err());

    let c1 = user_credentials::upsert_password(&db, created.id, "hash-1".into(), "argon2").await?;
    let c2 = user_credentials::upsert_password(&db, created.id, "hash-2".into(), "argon2").await?;
    assert_eq!(c1.id, c2.id);
    assert_eq!(c2.password_hash, "hash-2");

    user::Entity::delete_by_id(created.id).exec(&db).await?;
    assert!(user_credentials::find_by_user(&db, created.id).await?.is_none());
    Ok(())
}

/// Test cart creation is idempotent per user
#[tokio::test]
async fn test_cart_get_or_create() -> Result<()> {
    if skip_db() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let u = user::create(&db, &unique_email(), "Cart Owner", &[]).await?;

    let a = cart::get_or_create(&db, u.id).await?;
    let b = cart::get_or_create(&db, u.id).await?;
    assert_eq!(a.id, b.id);

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    assert!(cart::find_by_user(&db, u.id).await?.is_none());
    Ok(())
}

/// Test order status change writes history
#[tokio::test]
async fn test_order_status_history() -> Result<()> {
    if skip_db() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let u = user::create(&db, &unique_email(), "Buyer", &[]).await?;

    let o = order::create(&db, u.id, Decimal::from_str("120.50")?, OrderStatus::Paid).await?;
    let o = order::set_status(&db, o, OrderStatus::Shipped, Some("dispatched".into())).await?;
    assert_eq!(o.status, "SHIPPED");

    let history = order_history::Entity::find()
        .filter(order_history::Column::OrderId.eq(o.id))
        .all(&db)
        .await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].note.as_deref(), Some("dispatched"));

    let d = dispute::create(&db, u.id, o.id, "Late", "Took three weeks").await?;
    assert_eq!(d.status, "OPEN");

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    Ok(())
}

/// A pending intent can be claimed exactly once, and a rolled back claim is released
#[tokio::test]
async fn test_payment_intent_claim_once() -> Result<()> {
    if skip_db() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let u = user::create(&db, &unique_email(), "Payer", &[]).await?;
    let reference = format!("ref_{}", Uuid::new_v4().simple());
    let intent = payment_intent::create_pending(&db, u.id, &reference, Decimal::from_str("99.99")?, "NGN").await?;
    assert_eq!(intent.status, PaymentStatus::Pending.as_str());

    let txn = db.begin().await?;
    assert!(payment_intent::claim_pending(&txn, intent.id).await?);
    txn.rollback().await?;

    assert!(payment_intent::claim_pending(&db, intent.id).await?);
    assert!(!payment_intent::claim_pending(&db, intent.id).await?);

    let p = insert_product(&db, "10.00").await?;
    let o = order::create(&db, u.id, intent.amount, OrderStatus::Paid).await?;
    payment_intent::link_order(&db, intent.id, o.id).await?;
    let reloaded = payment_intent::find_by_reference(&db, &reference).await?.expect("intent");
    assert_eq!(reloaded.order_id, Some(o.id));
    assert_eq!(reloaded.status, "succeeded");

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    product::Entity::delete_by_id(p.id).exec(&db).await?;
    Ok(())
}

/// A reset token is redeemable once; expired tokens never are
#[tokio::test]
async fn test_reset_token_claim_once() -> Result<()> {
    if skip_db() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let u = user::create(&db, &unique_email(), "Forgetful", &[]).await?;
    let fresh = format!("fresh_{}", Uuid::new_v4().simple());
    let stale = format!("stale_{}", Uuid::new_v4().simple());
    password_reset_token::issue(&db, u.id, &fresh, chrono::Duration::minutes(30)).await?;
    password_reset_token::issue(&db, u.id, &stale, chrono::Duration::minutes(-1)).await?;

    let txn = db.begin().await?;
    assert!(password_reset_token::claim(&txn, &fresh).await?.is_some());
    txn.rollback().await?;

    let claimed = password_reset_token::claim(&db, &fresh).await?.expect("first claim");
    assert_eq!(claimed.user_id, u.id);
    assert!(claimed.used);
    assert!(password_reset_token::claim(&db, &fresh).await?.is_none());
    assert!(password_reset_token::claim(&db, &stale).await?.is_none());
    assert!(password_reset_token::claim(&db, "no-such-token").await?.is_none());

    user::Entity::delete_by_id(u.id).exec(&db).await?;
    Ok(())
}
