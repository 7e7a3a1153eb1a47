use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{cart, cart_item, product};

use crate::errors::ServiceError;
use crate::views::products_by_id;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateQuantityInput {
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub line_total: Decimal,
    pub product: product::Model,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl CartView {
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// Load the cart with products and totals. Lines whose product has gone
/// away are skipped.
pub async fn load_view<C: ConnectionTrait>(db: &C, cart: &cart::Model) -> Result<CartView, ServiceError> {
    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .order_by_asc(cart_item::Column::CreatedAt)
        .all(db)
        .await?;
    let products = products_by_id(db, items.iter().map(|i| i.product_id).collect()).await?;

    let lines: Vec<CartLine> = items
        .into_iter()
        .filter_map(|i| {
            let p = products.get(&i.product_id)?.clone();
            Some(CartLine {
                id: i.id,
                product_id: i.product_id,
                quantity: i.quantity,
                line_total: p.price * Decimal::from(i.quantity),
                product: p,
            })
        })
        .collect();
    let subtotal = lines.iter().map(|l| l.line_total).sum();
    let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();
    Ok(CartView { id: cart.id, user_id: cart.user_id, items: lines, item_count, subtotal })
}

pub async fn get(db: &DatabaseConnection, user_id: Uuid) -> Result<CartView, ServiceError> {
    let cart = cart::get_or_create(db, user_id).await?;
    load_view(db, &cart).await
}

/// Add a product; an existing line is incremented instead of duplicated.
#[instrument(skip(db, input), fields(product_id = %input.product_id))]
pub async fn add_item(db: &DatabaseConnection, user_id: Uuid, input: AddItemInput) -> Result<CartView, ServiceError> {
    let quantity = input.quantity.unwrap_or(1);
    cart_item::validate_quantity(quantity)?;
    if product::Entity::find_by_id(input.product_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found("Product"));
    }
    let cart = cart::get_or_create(db, user_id).await?;
    let existing = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .filter(cart_item::Column::ProductId.eq(input.product_id))
        .one(db)
        .await?;

    let now = Utc::now().into();
    match existing {
        Some(item) => {
            let next = item.quantity.saturating_add(quantity);
            cart_item::validate_quantity(next)?;
            let mut am: cart_item::ActiveModel = item.into();
            am.quantity = Set(next);
            am.updated_at = Set(now);
            am.update(db).await?;
        }
        None => {
            let am = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(input.product_id),
                quantity: Set(quantity),
                created_at: Set(now),
                updated_at: Set(now),
            };
            am.insert(db).await?;
        }
    }
    info!(user_id = %user_id, cart_id = %cart.id, "cart_item_added");
    load_view(db, &cart).await
}

/// Find an item only if it belongs to the caller's cart.
async fn owned_item(db: &DatabaseConnection, user_id: Uuid, item_id: Uuid) -> Result<(cart::Model, cart_item::Model), ServiceError> {
    let not_found = || ServiceError::not_found("Cart item");
    let cart = cart::find_by_user(db, user_id).await?.ok_or_else(not_found)?;
    let item = cart_item::Entity::find_by_id(item_id)
        .filter(cart_item::Column::CartId.eq(cart.id))
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    Ok((cart, item))
}

#[instrument(skip(db))]
pub async fn update_item(db: &DatabaseConnection, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<CartView, ServiceError> {
    cart_item::validate_quantity(quantity)?;
    let (cart, item) = owned_item(db, user_id, item_id).await?;
    let mut am: cart_item::ActiveModel = item.into();
    am.quantity = Set(quantity);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    load_view(db, &cart).await
}

#[instrument(skip(db))]
pub async fn remove_item(db: &DatabaseConnection, user_id: Uuid, item_id: Uuid) -> Result<CartView, ServiceError> {
    let (cart, item) = owned_item(db, user_id, item_id).await?;
    cart_item::Entity::delete_by_id(item.id).exec(db).await?;
    info!(user_id = %user_id, item_id = %item_id, "cart_item_removed");
    load_view(db, &cart).await
}

/// Remove every line from the user's cart.
pub async fn clear<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, ServiceError> {
    let Some(cart) = cart::find_by_user(db, user_id).await? else {
        return Ok(0);
    };
    let res = cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_product, make_user, skip_db};

    #[tokio::test]
    async fn add_merges_and_totals() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        let p = make_product(&db, "10.25").await?;

        let empty = get(&db, u.id).await?;
        assert!(empty.is_empty());
        assert_eq!(empty.subtotal, Decimal::ZERO);

        add_item(&db, u.id, AddItemInput { product_id: p.id, quantity: None }).await?;
        let view = add_item(&db, u.id, AddItemInput { product_id: p.id, quantity: Some(3) }).await?;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 4);
        assert_eq!(view.subtotal, Decimal::new(4100, 2));

        let missing = add_item(&db, u.id, AddItemInput { product_id: Uuid::new_v4(), quantity: None }).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        let zero = add_item(&db, u.id, AddItemInput { product_id: p.id, quantity: Some(0) }).await;
        assert!(matches!(zero, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn items_are_scoped_to_owner() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let owner = make_user(&db).await?;
        let other = make_user(&db).await?;
        let p = make_product(&db, "5.00").await?;

        let view = add_item(&db, owner.id, AddItemInput { product_id: p.id, quantity: Some(2) }).await?;
        let item_id = view.items[0].id;

        assert!(matches!(update_item(&db, other.id, item_id, 5).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(remove_item(&db, other.id, item_id).await, Err(ServiceError::NotFound(_))));

        let updated = update_item(&db, owner.id, item_id, 7).await?;
        assert_eq!(updated.item_count, 7);
        let after = remove_item(&db, owner.id, item_id).await?;
        assert!(after.is_empty());

        add_item(&db, owner.id, AddItemInput { product_id: p.id, quantity: None }).await?;
        assert_eq!(clear(&db, owner.id).await?, 1);
        assert!(get(&db, owner.id).await?.is_empty());
        Ok(())
    }
}
