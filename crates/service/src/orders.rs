use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::status::OrderStatus;
use models::{order, user};

use crate::errors::ServiceError;
use crate::filters::{contains_ci, like_pattern, search_term, DateRange};
use crate::pagination::{Page, Paged};
use crate::stats::{self, MonthlyPoint, StatusBucket};
use crate::views::{order_views, OrderIncludes, OrderView};

#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<Uuid>,
    pub range: DateRange,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAnalytics {
    pub total_orders: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub pending_orders: u64,
    pub processing_orders: u64,
    pub shipped_orders: u64,
    pub delivered_orders: u64,
    pub cancelled_orders: u64,
    pub refunded_orders: u64,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub completion_rate: f64,
    pub status_distribution: Vec<StatusBucket>,
    pub monthly_data: Vec<MonthlyPoint>,
}

pub(crate) fn status_names() -> Vec<&'static str> {
    OrderStatus::ALL.iter().map(|s| s.as_str()).collect()
}

pub(crate) fn revenue_filter(q: Select<order::Entity>) -> Select<order::Entity> {
    q.filter(order::Column::Status.is_in(OrderStatus::REVENUE.iter().map(|s| s.as_str())))
}

/// Caller's orders with items and products, newest first.
pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<OrderView>, ServiceError> {
    let orders = order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .all(db)
        .await?;
    order_views(db, orders, OrderIncludes::default()).await
}

fn apply_filter(mut q: Select<order::Entity>, f: &OrderFilter) -> Select<order::Entity> {
    if let Some(s) = f.status {
        q = q.filter(order::Column::Status.eq(s.as_str()));
    }
    if let Some(u) = f.user_id {
        q = q.filter(order::Column::UserId.eq(u));
    }
    stats::within(q, order::Column::CreatedAt, &f.range)
}

async fn page_of(db: &DatabaseConnection, q: Select<order::Entity>, page: Page) -> Result<Paged<OrderView>, ServiceError> {
    let total = q.clone().count(db).await?;
    let rows = q
        .order_by_desc(order::Column::CreatedAt)
        .offset(page.offset)
        .limit(page.limit)
        .all(db)
        .await?;
    let items = order_views(db, rows, OrderIncludes::ADMIN_LIST).await?;
    Ok(Paged { items, pagination: page.meta(total) })
}

pub async fn admin_list(db: &DatabaseConnection, filter: &OrderFilter, page: Page) -> Result<Paged<OrderView>, ServiceError> {
    page_of(db, apply_filter(order::Entity::find(), filter), page).await
}

/// Match the order id text or the buyer's name/email.
pub async fn admin_search(db: &DatabaseConnection, q: Option<&str>, filter: &OrderFilter, page: Page) -> Result<Paged<OrderView>, ServiceError> {
    let term = search_term(q).ok_or_else(|| ServiceError::validation("Search query is required"))?;
    let id_text = Expr::col((order::Entity, order::Column::Id)).cast_as(Alias::new("TEXT"));
    let query = apply_filter(order::Entity::find(), filter)
        .join(JoinType::InnerJoin, order::Relation::User.def())
        .filter(
            Condition::any()
                .add(Expr::expr(id_text).like(like_pattern(term)))
                .add(contains_ci((user::Entity, user::Column::FullName), term))
                .add(contains_ci((user::Entity, user::Column::Email), term)),
        );
    page_of(db, query, page).await
}

pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<OrderView, ServiceError> {
    let o = order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order"))?;
    order_views(db, vec![o], OrderIncludes::ADMIN_DETAIL)
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Order"))
}

/// Set any status (no transition rules) and record it in the history.
#[instrument(skip(db, input), fields(status = %input.status))]
pub async fn update_status(db: &DatabaseConnection, id: Uuid, input: UpdateStatusInput) -> Result<OrderView, ServiceError> {
    let status: OrderStatus = input.status.parse()?;
    let o = order::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order"))?;
    let from = o.status.clone();
    order::set_status(db, o, status, input.note).await?;
    info!(order_id = %id, %from, to = %status, "order_status_updated");
    detail(db, id).await
}

pub async fn analytics(db: &DatabaseConnection, range: DateRange) -> Result<OrderAnalytics, ServiceError> {
    let base = || stats::within(order::Entity::find(), order::Column::CreatedAt, &range);
    let names = status_names();
    let counts = stats::status_counts(db, base(), order::Column::Status, &names).await?;
    let total_orders = stats::total(&counts);
    let c = |s: OrderStatus| stats::count_of(&counts, s.as_str());

    let total_revenue = stats::sum(db, revenue_filter(base()), order::Column::Total).await?;
    let average_order_value = stats::avg(db, revenue_filter(base()), order::Column::Total).await?;
    let monthly_data = stats::monthly(db, base(), order::Column::CreatedAt, Some(order::Column::Total), Utc::now()).await?;

    Ok(OrderAnalytics {
        total_orders,
        pending_orders: c(OrderStatus::Pending),
        processing_orders: c(OrderStatus::Processing),
        shipped_orders: c(OrderStatus::Shipped),
        delivered_orders: c(OrderStatus::Delivered),
        cancelled_orders: c(OrderStatus::Cancelled),
        refunded_orders: c(OrderStatus::Refunded),
        total_revenue,
        average_order_value,
        completion_rate: crate::filters::percent(c(OrderStatus::Delivered) + c(OrderStatus::Refunded), total_orders),
        status_distribution: stats::distribution(&counts, &names),
        status_counts: counts,
        monthly_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Pagination, ADMIN_DEFAULT_LIMIT};
    use crate::test_support::{get_db, make_user, skip_db};

    #[tokio::test]
    async fn status_update_writes_history() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        let o = order::create(&db, u.id, Decimal::new(5000, 2), OrderStatus::Paid).await?;

        let bad = update_status(&db, o.id, UpdateStatusInput { status: "LOST".into(), note: None }).await;
        assert!(matches!(bad, Err(ServiceError::Validation(_))));

        let v = update_status(&db, o.id, UpdateStatusInput { status: "shipped".into(), note: Some("DHL".into()) }).await?;
        assert_eq!(v.order.status, "SHIPPED");
        let history = v.history.unwrap();
        assert_eq!(history.last().unwrap().note.as_deref(), Some("DHL"));
        assert_eq!(v.user.unwrap().id, u.id);

        let missing = update_status(&db, Uuid::new_v4(), UpdateStatusInput { status: "PAID".into(), note: None }).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn search_matches_buyer_email_and_order_id() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        let o = order::create(&db, u.id, Decimal::new(100, 0), OrderStatus::Pending).await?;
        let page = Pagination::default().normalize(ADMIN_DEFAULT_LIMIT)?;
        let f = OrderFilter::default();

        let by_email = admin_search(&db, Some(&u.email), &f, page).await?;
        assert_eq!(by_email.items.len(), 1);
        let prefix = &o.id.to_string()[..8];
        let by_id = admin_search(&db, Some(prefix), &f, page).await?;
        assert!(by_id.items.iter().any(|v| v.order.id == o.id));
        assert!(admin_search(&db, Some("  "), &f, page).await.is_err());

        let mine = list_for_user(&db, u.id).await?;
        assert_eq!(mine.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn analytics_counts_revenue_statuses_only() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        for (amount, status) in [(100, OrderStatus::Delivered), (300, OrderStatus::Paid), (999, OrderStatus::Cancelled)] {
            order::create(&db, u.id, Decimal::from(amount), status).await?;
        }
        let a = analytics(&db, DateRange::default()).await?;
        assert!(a.total_orders >= 3);
        assert!(a.total_revenue >= Decimal::from(400));
        assert_eq!(a.monthly_data.len(), 6);
        assert_eq!(a.status_distribution.len(), OrderStatus::ALL.len());
        Ok(())
    }
}
