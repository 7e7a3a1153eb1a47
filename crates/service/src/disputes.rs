use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::status::DisputeStatus;
use models::{dispute, order, user};

use crate::errors::ServiceError;
use crate::filters::{contains_ci, percent, search_term, DateRange};
use crate::pagination::{Page, Paged};
use crate::stats::{self, MonthlyPoint, StatusBucket};
use crate::views::{dispute_views, DisputeView, OrderIncludes};

const ACTIVE_EXISTS: &str = "An active dispute already exists for this order";

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDisputeInput {
    pub order_id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateDispute {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DisputeFilter {
    pub status: Option<DisputeStatus>,
    pub user_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub range: DateRange,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeAnalytics {
    pub total_disputes: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub open_disputes: u64,
    pub in_progress_disputes: u64,
    pub resolved_disputes: u64,
    pub rejected_disputes: u64,
    pub resolution_rate: f64,
    pub status_distribution: Vec<StatusBucket>,
    pub monthly_data: Vec<MonthlyPoint>,
}

fn status_names() -> Vec<&'static str> {
    DisputeStatus::ALL.iter().map(|s| s.as_str()).collect()
}

/// File a dispute against one of the caller's own orders.
#[instrument(skip(db, input), fields(order_id = %input.order_id))]
pub async fn create(db: &DatabaseConnection, user_id: Uuid, input: CreateDisputeInput) -> Result<dispute::Model, ServiceError> {
    dispute::validate_text(&input.title, &input.description)?;
    let owned = order::Entity::find_by_id(input.order_id)
        .filter(order::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    if owned.is_none() {
        return Err(ServiceError::not_found("Order"));
    }
    let active = dispute::Entity::find()
        .filter(dispute::Column::OrderId.eq(input.order_id))
        .filter(dispute::Column::Status.is_in(DisputeStatus::ACTIVE.iter().map(|s| s.as_str())))
        .count(db)
        .await?;
    if active > 0 {
        return Err(ServiceError::Conflict(ACTIVE_EXISTS.into()));
    }
    let created = match dispute::create(db, user_id, input.order_id, &input.title, &input.description).await {
        Ok(d) => d,
        // 并发提交时由部分唯一索引兜底
        Err(models::errors::ModelError::Db(e)) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(ServiceError::Conflict(ACTIVE_EXISTS.into()));
        }
        Err(e) => return Err(e.into()),
    };
    info!(dispute_id = %created.id, user_id = %user_id, "dispute_created");
    Ok(created)
}

pub async fn list_own(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<DisputeView>, ServiceError> {
    let rows = dispute::Entity::find()
        .filter(dispute::Column::UserId.eq(user_id))
        .order_by_desc(dispute::Column::CreatedAt)
        .all(db)
        .await?;
    dispute_views(db, rows, false, OrderIncludes::default()).await
}

pub async fn get_own(db: &DatabaseConnection, user_id: Uuid, id: Uuid) -> Result<DisputeView, ServiceError> {
    let d = dispute::Entity::find_by_id(id)
        .filter(dispute::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Dispute"))?;
    dispute_views(db, vec![d], false, OrderIncludes::default())
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Dispute"))
}

fn apply_filter(mut q: Select<dispute::Entity>, f: &DisputeFilter) -> Select<dispute::Entity> {
    if let Some(s) = f.status {
        q = q.filter(dispute::Column::Status.eq(s.as_str()));
    }
    if let Some(u) = f.user_id {
        q = q.filter(dispute::Column::UserId.eq(u));
    }
    if let Some(o) = f.order_id {
        q = q.filter(dispute::Column::OrderId.eq(o));
    }
    stats::within(q, dispute::Column::CreatedAt, &f.range)
}

async fn page_of(db: &DatabaseConnection, q: Select<dispute::Entity>, page: Page) -> Result<Paged<DisputeView>, ServiceError> {
    let total = q.clone().count(db).await?;
    let rows = q
        .order_by_desc(dispute::Column::CreatedAt)
        .offset(page.offset)
        .limit(page.limit)
        .all(db)
        .await?;
    let items = dispute_views(db, rows, true, OrderIncludes::default()).await?;
    Ok(Paged { items, pagination: page.meta(total) })
}

pub async fn admin_list(db: &DatabaseConnection, filter: &DisputeFilter, page: Page) -> Result<Paged<DisputeView>, ServiceError> {
    page_of(db, apply_filter(dispute::Entity::find(), filter), page).await
}

/// Match title, description, or the reporter's name/email.
pub async fn admin_search(db: &DatabaseConnection, q: Option<&str>, filter: &DisputeFilter, page: Page) -> Result<Paged<DisputeView>, ServiceError> {
    let term = search_term(q).ok_or_else(|| ServiceError::validation("Search query is required"))?;
    let query = apply_filter(dispute::Entity::find(), filter)
        .join(JoinType::InnerJoin, dispute::Relation::User.def())
        .filter(
            Condition::any()
                .add(contains_ci((dispute::Entity, dispute::Column::Title), term))
                .add(contains_ci((dispute::Entity, dispute::Column::Description), term))
                .add(contains_ci((user::Entity, user::Column::FullName), term))
                .add(contains_ci((user::Entity, user::Column::Email), term)),
        );
    page_of(db, query, page).await
}

/// Dispute with reporter and the full order (items, history, intents).
pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<DisputeView, ServiceError> {
    let d = dispute::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Dispute"))?;
    let inc = OrderIncludes { user: false, payment_intents: true, disputes: false, history: true };
    dispute_views(db, vec![d], true, inc)
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Dispute"))
}

#[instrument(skip(db, input))]
pub async fn admin_update(db: &DatabaseConnection, id: Uuid, input: AdminUpdateDispute) -> Result<DisputeView, ServiceError> {
    let status = input.status.as_deref().map(str::parse::<DisputeStatus>).transpose()?;
    let current = dispute::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Dispute"))?;
    let mut am: dispute::ActiveModel = current.into();
    if let Some(s) = status {
        am.status = Set(s.as_str().to_string());
    }
    if let Some(notes) = input.admin_notes {
        am.admin_notes = Set(Some(notes.trim().to_string()).filter(|n| !n.is_empty()));
    }
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    info!(dispute_id = %id, status = ?status, "dispute_updated");
    detail(db, id).await
}

pub async fn analytics(db: &DatabaseConnection, range: DateRange) -> Result<DisputeAnalytics, ServiceError> {
    let base = || stats::within(dispute::Entity::find(), dispute::Column::CreatedAt, &range);
    let names = status_names();
    let counts = stats::status_counts(db, base(), dispute::Column::Status, &names).await?;
    let total = stats::total(&counts);
    let c = |s: DisputeStatus| stats::count_of(&counts, s.as_str());
    let monthly_data = stats::monthly(db, base(), dispute::Column::CreatedAt, None, Utc::now()).await?;

    Ok(DisputeAnalytics {
        total_disputes: total,
        open_disputes: c(DisputeStatus::Open),
        in_progress_disputes: c(DisputeStatus::InProgress),
        resolved_disputes: c(DisputeStatus::Resolved),
        rejected_disputes: c(DisputeStatus::Rejected),
        resolution_rate: percent(c(DisputeStatus::Resolved) + c(DisputeStatus::Rejected), total),
        status_distribution: stats::distribution(&counts, &names),
        status_counts: counts,
        monthly_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_user, skip_db};
    use models::status::OrderStatus;
    use rust_decimal::Decimal;

    fn input(order_id: Uuid) -> CreateDisputeInput {
        CreateDisputeInput { order_id, title: "Wrong part".into(), description: "Received rear pads".into() }
    }

    #[tokio::test]
    async fn one_active_dispute_per_order() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let owner = make_user(&db).await?;
        let stranger = make_user(&db).await?;
        let o = order::create(&db, owner.id, Decimal::from(40), OrderStatus::Delivered).await?;

        assert!(matches!(create(&db, stranger.id, input(o.id)).await, Err(ServiceError::NotFound(_))));

        let d = create(&db, owner.id, input(o.id)).await?;
        assert_eq!(d.status, "OPEN");
        assert!(matches!(create(&db, owner.id, input(o.id)).await, Err(ServiceError::Conflict(_))));

        let upd = admin_update(&db, d.id, AdminUpdateDispute { status: Some("resolved".into()), admin_notes: Some("Refunded".into()) }).await?;
        assert_eq!(upd.dispute.status, "RESOLVED");
        assert_eq!(upd.dispute.admin_notes.as_deref(), Some("Refunded"));
        assert!(upd.order.unwrap().history.is_some());

        // 已解决后允许再次提交
        create(&db, owner.id, input(o.id)).await?;
        assert_eq!(list_own(&db, owner.id).await?.len(), 2);
        assert!(matches!(get_own(&db, stranger.id, d.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn invalid_status_rejected() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let r = admin_update(&db, Uuid::new_v4(), AdminUpdateDispute { status: Some("CLOSED".into()), admin_notes: None }).await;
        assert!(matches!(r, Err(ServiceError::Validation(_))));
        Ok(())
    }
}
