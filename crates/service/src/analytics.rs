//! Admin dashboard rollups.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;

use models::status::{DisputeStatus, OrderStatus};
use models::{dispute, order, product, user};

use crate::errors::ServiceError;
use crate::filters::DateRange;
use crate::orders::{revenue_filter, status_names};
use crate::stats::{self, MonthlyPoint, StatusBucket};
use crate::transactions::{self, TransactionAnalytics};
use crate::views::{dispute_views, order_views, DisputeView, OrderIncludes, OrderView};

const RECENT: u64 = 5;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub users: u64,
    pub orders: u64,
    pub products: u64,
    pub disputes: u64,
    pub open_disputes: u64,
    pub pending_orders: u64,
    pub completed_orders: u64,
    pub total_revenue: Decimal,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub recent_orders: Vec<OrderView>,
    pub recent_disputes: Vec<DisputeView>,
    pub recent_products: Vec<product::Model>,
    pub revenue_by_month: Vec<MonthlyPoint>,
    pub order_status_distribution: Vec<StatusBucket>,
    pub order_status_counts: BTreeMap<String, u64>,
    pub user_growth: Vec<MonthlyPoint>,
}

pub async fn dashboard(db: &DatabaseConnection) -> Result<Dashboard, ServiceError> {
    let now = Utc::now();
    let names = status_names();
    let order_counts = stats::status_counts(db, order::Entity::find(), order::Column::Status, &names).await?;

    let totals = DashboardTotals {
        users: user::Entity::find().count(db).await?,
        orders: stats::total(&order_counts),
        products: product::Entity::find().count(db).await?,
        disputes: dispute::Entity::find().count(db).await?,
        open_disputes: dispute::Entity::find()
            .filter(dispute::Column::Status.is_in(DisputeStatus::ACTIVE.iter().map(|s| s.as_str())))
            .count(db)
            .await?,
        pending_orders: stats::count_of(&order_counts, OrderStatus::Pending.as_str()),
        completed_orders: stats::count_of(&order_counts, OrderStatus::Delivered.as_str()),
        total_revenue: stats::sum(db, revenue_filter(order::Entity::find()), order::Column::Total).await?,
    };

    let recent_orders = order::Entity::find()
        .order_by_desc(order::Column::CreatedAt)
        .limit(RECENT)
        .all(db)
        .await?;
    let recent_orders = order_views(db, recent_orders, OrderIncludes { user: true, ..Default::default() }).await?;

    let recent_disputes = dispute::Entity::find()
        .order_by_desc(dispute::Column::CreatedAt)
        .limit(RECENT)
        .all(db)
        .await?;
    let recent_disputes = dispute_views(db, recent_disputes, true, OrderIncludes::default()).await?;

    let recent_products = product::Entity::find()
        .order_by_desc(product::Column::CreatedAt)
        .limit(RECENT)
        .all(db)
        .await?;

    let revenue_by_month = stats::monthly(db, revenue_filter(order::Entity::find()), order::Column::CreatedAt, Some(order::Column::Total), now).await?;
    let user_growth = stats::monthly(db, user::Entity::find(), user::Column::CreatedAt, None, now).await?;

    Ok(Dashboard {
        totals,
        recent_orders,
        recent_disputes,
        recent_products,
        revenue_by_month,
        order_status_distribution: stats::distribution(&order_counts, &names),
        order_status_counts: order_counts,
        user_growth,
    })
}

/// Transaction rollup with the ten latest intents attached.
pub async fn transaction_analytics(db: &DatabaseConnection, range: DateRange) -> Result<TransactionAnalytics, ServiceError> {
    transactions::analytics(db, range, Some(10)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_product, make_user, skip_db};

    #[tokio::test]
    async fn dashboard_shapes() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        make_product(&db, "1.00").await?;
        order::create(&db, u.id, Decimal::from(70), OrderStatus::Delivered).await?;

        let d = dashboard(&db).await?;
        assert!(d.totals.users >= 1);
        assert!(d.totals.completed_orders >= 1);
        assert!(d.totals.total_revenue >= Decimal::from(70));
        assert!(d.recent_orders.len() <= 5 && !d.recent_orders.is_empty());
        assert!(d.recent_orders[0].user.is_some());
        assert_eq!(d.revenue_by_month.len(), 6);
        assert_eq!(d.user_growth.len(), 6);

        let t = transaction_analytics(&db, DateRange::default()).await?;
        assert!(t.recent_transactions.is_some());
        Ok(())
    }
}
