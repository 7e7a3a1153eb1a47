//! Response shapes that join an entity with its related rows.
//!
//! Relations are loaded in batches (one `IN (...)` query per relation) and
//! stitched together in memory.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use models::{dispute, order, order_history, order_item, payment_intent, product, user};

use crate::errors::ServiceError;

/// Public profile; never carries credentials.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<user::Model> for PublicUser {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            roles: u.roles,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<&user::Model> for UserSummary {
    fn from(u: &user::Model) -> Self {
        Self { id: u.id, email: u.email.clone(), full_name: u.full_name.clone() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub title: String,
    pub sku: String,
    pub price: Decimal,
    pub images: Vec<String>,
}

impl From<&product::Model> for ProductSummary {
    fn from(p: &product::Model) -> Self {
        Self { id: p.id, title: p.title.clone(), sku: p.sku.clone(), price: p.price, images: p.images.clone() }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub line_total: Decimal,
    pub product: Option<ProductSummary>,
}

/// Order with items; the optional relations are filled on admin views.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<OrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intents: Option<Vec<payment_intent::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disputes: Option<Vec<dispute::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<order_history::Model>>,
}

/// Which relations to attach when building `OrderView`s.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderIncludes {
    pub user: bool,
    pub payment_intents: bool,
    pub disputes: bool,
    pub history: bool,
}

impl OrderIncludes {
    pub const ADMIN_LIST: OrderIncludes = OrderIncludes { user: true, payment_intents: true, disputes: true, history: false };
    pub const ADMIN_DETAIL: OrderIncludes = OrderIncludes { user: true, payment_intents: true, disputes: true, history: true };
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeView {
    #[serde(flatten)]
    pub dispute: dispute::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub order: Option<OrderView>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    #[serde(flatten)]
    pub intent: payment_intent::Model,
    pub user: Option<UserSummary>,
    pub order: Option<order::Model>,
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn users_by_id<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<HashMap<Uuid, UserSummary>, ServiceError> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = user::Entity::find().filter(user::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.iter().map(|u| (u.id, UserSummary::from(u))).collect())
}

pub async fn products_by_id<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = product::Entity::find().filter(product::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn orders_by_id<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<HashMap<Uuid, order::Model>, ServiceError> {
    let ids = dedup(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = order::Entity::find().filter(order::Column::Id.is_in(ids)).all(db).await?;
    Ok(rows.into_iter().map(|o| (o.id, o)).collect())
}

fn group_by<T, K: std::hash::Hash + Eq>(rows: Vec<T>, key: impl Fn(&T) -> K) -> HashMap<K, Vec<T>> {
    let mut map: HashMap<K, Vec<T>> = HashMap::new();
    for r in rows {
        map.entry(key(&r)).or_default().push(r);
    }
    map
}

/// Build order views preserving the input order.
pub async fn order_views<C: ConnectionTrait>(db: &C, orders: Vec<order::Model>, inc: OrderIncludes) -> Result<Vec<OrderView>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids.clone()))
        .all(db)
        .await?;
    let products = products_by_id(db, items.iter().map(|i| i.product_id).collect()).await?;
    let mut items = group_by(items, |i| i.order_id);

    let mut users = if inc.user {
        users_by_id(db, orders.iter().map(|o| o.user_id).collect()).await?
    } else {
        HashMap::new()
    };

    let mut intents = if inc.payment_intents {
        let rows = payment_intent::Entity::find()
            .filter(payment_intent::Column::OrderId.is_in(order_ids.clone()))
            .order_by_desc(payment_intent::Column::CreatedAt)
            .all(db)
            .await?;
        group_by(rows, |p| p.order_id.unwrap_or_default())
    } else {
        HashMap::new()
    };

    let mut disputes = if inc.disputes {
        let rows = dispute::Entity::find()
            .filter(dispute::Column::OrderId.is_in(order_ids.clone()))
            .order_by_desc(dispute::Column::CreatedAt)
            .all(db)
            .await?;
        group_by(rows, |d| d.order_id)
    } else {
        HashMap::new()
    };

    let mut history = if inc.history {
        let rows = order_history::Entity::find()
            .filter(order_history::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_history::Column::CreatedAt)
            .all(db)
            .await?;
        group_by(rows, |h| h.order_id)
    } else {
        HashMap::new()
    };

    Ok(orders
        .into_iter()
        .map(|o| {
            let lines = items
                .remove(&o.id)
                .unwrap_or_default()
                .into_iter()
                .map(|i| OrderLine {
                    id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    price: i.price,
                    line_total: i.line_total(),
                    product: products.get(&i.product_id).map(ProductSummary::from),
                })
                .collect();
            OrderView {
                items: lines,
                user: if inc.user { users.remove(&o.user_id) } else { None },
                payment_intents: inc.payment_intents.then(|| intents.remove(&o.id).unwrap_or_default()),
                disputes: inc.disputes.then(|| disputes.remove(&o.id).unwrap_or_default()),
                history: inc.history.then(|| history.remove(&o.id).unwrap_or_default()),
                order: o,
            }
        })
        .collect())
}

/// Dispute views with reporter and (optionally expanded) order.
pub async fn dispute_views<C: ConnectionTrait>(
    db: &C,
    disputes: Vec<dispute::Model>,
    with_user: bool,
    order_inc: OrderIncludes,
) -> Result<Vec<DisputeView>, ServiceError> {
    let users = if with_user {
        users_by_id(db, disputes.iter().map(|d| d.user_id).collect()).await?
    } else {
        HashMap::new()
    };
    let orders = orders_by_id(db, disputes.iter().map(|d| d.order_id).collect()).await?;
    let views = order_views(db, orders.into_values().collect(), order_inc).await?;
    // 同一订单可能对应多条争议，这里按需克隆
    let by_id: HashMap<Uuid, OrderView> = views.into_iter().map(|v| (v.order.id, v)).collect();

    Ok(disputes
        .into_iter()
        .map(|d| DisputeView {
            user: users.get(&d.user_id).cloned(),
            order: by_id.get(&d.order_id).cloned(),
            dispute: d,
        })
        .collect())
}

pub async fn transaction_views<C: ConnectionTrait>(db: &C, intents: Vec<payment_intent::Model>) -> Result<Vec<TransactionView>, ServiceError> {
    let users = users_by_id(db, intents.iter().map(|p| p.user_id).collect()).await?;
    let orders = orders_by_id(db, intents.iter().filter_map(|p| p.order_id).collect()).await?;
    Ok(intents
        .into_iter()
        .map(|p| TransactionView {
            user: users.get(&p.user_id).cloned(),
            order: p.order_id.and_then(|id| orders.get(&id).cloned()),
            intent: p,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn order_view_flattens_and_hides_absent_relations() {
        let now = Utc::now().into();
        let view = OrderView {
            order: order::Model {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                total: Decimal::new(2500, 2),
                status: "PAID".into(),
                created_at: now,
                updated_at: now,
            },
            items: vec![],
            user: None,
            payment_intents: Some(vec![]),
            disputes: None,
            history: None,
        };
        let v = serde_json::to_value(&view).unwrap();
        assert_eq!(v["status"], "PAID");
        assert_eq!(v["total"], "25.00");
        assert!(v.get("userId").is_some());
        assert!(v.get("user").is_none());
        assert_eq!(v["paymentIntents"], serde_json::json!([]));
        assert!(v.get("history").is_none());
    }
}
