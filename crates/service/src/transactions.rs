use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Select,
};
use serde::Serialize;
use uuid::Uuid;

use models::payment_intent;
use models::status::PaymentStatus;
use models::user;

use crate::errors::ServiceError;
use crate::filters::{contains_ci, percent, search_term, DateRange};
use crate::pagination::{Page, Paged};
use crate::stats::{self, MonthlyPoint, StatusBucket};
use crate::views::{transaction_views, TransactionView};

#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub range: DateRange,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalytics {
    pub total_transactions: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub successful_transactions: u64,
    pub pending_transactions: u64,
    pub failed_transactions: u64,
    pub total_value: Decimal,
    pub average_value: Decimal,
    pub success_rate: f64,
    pub status_distribution: Vec<StatusBucket>,
    pub monthly_data: Vec<MonthlyPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_transactions: Option<Vec<TransactionView>>,
}

pub(crate) fn status_names() -> Vec<&'static str> {
    PaymentStatus::ALL.iter().map(|s| s.as_str()).collect()
}

fn apply_filter(mut q: Select<payment_intent::Entity>, f: &TransactionFilter) -> Select<payment_intent::Entity> {
    if let Some(s) = f.status {
        q = q.filter(payment_intent::Column::Status.eq(s.as_str()));
    }
    if let Some(u) = f.user_id {
        q = q.filter(payment_intent::Column::UserId.eq(u));
    }
    if let Some(o) = f.order_id {
        q = q.filter(payment_intent::Column::OrderId.eq(o));
    }
    stats::within(q, payment_intent::Column::CreatedAt, &f.range)
}

async fn page_of(db: &DatabaseConnection, q: Select<payment_intent::Entity>, page: Page) -> Result<Paged<TransactionView>, ServiceError> {
    let total = q.clone().count(db).await?;
    let rows = q
        .order_by_desc(payment_intent::Column::CreatedAt)
        .offset(page.offset)
        .limit(page.limit)
        .all(db)
        .await?;
    Ok(Paged { items: transaction_views(db, rows).await?, pagination: page.meta(total) })
}

pub async fn list(db: &DatabaseConnection, filter: &TransactionFilter, page: Page) -> Result<Paged<TransactionView>, ServiceError> {
    page_of(db, apply_filter(payment_intent::Entity::find(), filter), page).await
}

/// Match the payment reference or the payer's name/email.
pub async fn search(db: &DatabaseConnection, q: Option<&str>, filter: &TransactionFilter, page: Page) -> Result<Paged<TransactionView>, ServiceError> {
    let term = search_term(q).ok_or_else(|| ServiceError::validation("Search query is required"))?;
    let query = apply_filter(payment_intent::Entity::find(), filter)
        .join(JoinType::InnerJoin, payment_intent::Relation::User.def())
        .filter(
            Condition::any()
                .add(contains_ci((payment_intent::Entity, payment_intent::Column::Reference), term))
                .add(contains_ci((user::Entity, user::Column::FullName), term))
                .add(contains_ci((user::Entity, user::Column::Email), term)),
        );
    page_of(db, query, page).await
}

pub async fn detail(db: &DatabaseConnection, id: Uuid) -> Result<TransactionView, ServiceError> {
    let p = payment_intent::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Transaction"))?;
    transaction_views(db, vec![p])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Transaction"))
}

pub async fn recent(db: &DatabaseConnection, n: u64) -> Result<Vec<TransactionView>, ServiceError> {
    let rows = payment_intent::Entity::find()
        .order_by_desc(payment_intent::Column::CreatedAt)
        .limit(n)
        .all(db)
        .await?;
    transaction_views(db, rows).await
}

/// Per-status counts and succeeded-value totals. `recent` attaches that many
/// latest transactions.
pub async fn analytics(db: &DatabaseConnection, range: DateRange, recent_n: Option<u64>) -> Result<TransactionAnalytics, ServiceError> {
    let base = || stats::within(payment_intent::Entity::find(), payment_intent::Column::CreatedAt, &range);
    let succeeded = || base().filter(payment_intent::Column::Status.eq(PaymentStatus::Succeeded.as_str()));
    let names = status_names();
    let counts = stats::status_counts(db, base(), payment_intent::Column::Status, &names).await?;
    let total = stats::total(&counts);
    let c = |s: PaymentStatus| stats::count_of(&counts, s.as_str());

    let total_value = stats::sum(db, succeeded(), payment_intent::Column::Amount).await?;
    let average_value = stats::avg(db, succeeded(), payment_intent::Column::Amount).await?;
    let monthly_data = stats::monthly(db, base(), payment_intent::Column::CreatedAt, Some(payment_intent::Column::Amount), Utc::now()).await?;
    let recent_transactions = match recent_n {
        Some(n) => Some(recent(db, n).await?),
        None => None,
    };

    Ok(TransactionAnalytics {
        total_transactions: total,
        successful_transactions: c(PaymentStatus::Succeeded),
        pending_transactions: c(PaymentStatus::Pending),
        failed_transactions: c(PaymentStatus::Failed),
        total_value,
        average_value,
        success_rate: percent(c(PaymentStatus::Succeeded), total),
        status_distribution: stats::distribution(&counts, &names),
        status_counts: counts,
        monthly_data,
        recent_transactions,
    })
}
