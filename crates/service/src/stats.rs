//! Grouping helpers behind the admin analytics endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Select};
use serde::Serialize;

use crate::errors::ServiceError;
use crate::filters::{monthly_window, percent, DateRange};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    pub status: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
    pub total: Decimal,
}

/// Restrict `q` to rows whose `col` falls inside `range`.
pub fn within<E: EntityTrait>(mut q: Select<E>, col: E::Column, range: &DateRange) -> Select<E> {
    if let Some(s) = range.start {
        q = q.filter(col.gte(s));
    }
    if let Some(e) = range.end {
        q = q.filter(col.lte(e));
    }
    q
}

/// `status -> count`, zero-filled for every known status.
pub async fn status_counts<E, C>(db: &C, q: Select<E>, col: E::Column, known: &[&str]) -> Result<BTreeMap<String, u64>, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let rows: Vec<(String, i64)> = q
        .select_only()
        .column(col)
        .column_as(Expr::col((E::default(), col)).count(), "count")
        .group_by(col)
        .into_tuple()
        .all(db)
        .await?;
    let mut out: BTreeMap<String, u64> = known.iter().map(|s| (s.to_string(), 0)).collect();
    for (status, n) in rows {
        *out.entry(status).or_insert(0) += n.max(0) as u64;
    }
    Ok(out)
}

pub fn total(counts: &BTreeMap<String, u64>) -> u64 {
    counts.values().sum()
}

pub fn count_of(counts: &BTreeMap<String, u64>, status: &str) -> u64 {
    counts.get(status).copied().unwrap_or(0)
}

/// Share of each status, in `known` order.
pub fn distribution(counts: &BTreeMap<String, u64>, known: &[&str]) -> Vec<StatusBucket> {
    let all = total(counts);
    known
        .iter()
        .map(|s| {
            let n = count_of(counts, s);
            StatusBucket { status: s.to_string(), count: n, percentage: percent(n, all) }
        })
        .collect()
}

/// `SUM(col)`; zero when no rows match.
pub async fn sum<E, C>(db: &C, q: Select<E>, col: E::Column) -> Result<Decimal, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let v: Option<Option<Decimal>> = q
        .select_only()
        .column_as(Expr::col((E::default(), col)).sum(), "total")
        .into_tuple()
        .one(db)
        .await?;
    Ok(v.flatten().unwrap_or(Decimal::ZERO))
}

/// `AVG(col)` rounded to two decimals; zero when no rows match.
pub async fn avg<E, C>(db: &C, q: Select<E>, col: E::Column) -> Result<Decimal, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let v: Option<Option<Decimal>> = q
        .select_only()
        .column_as(SimpleExpr::FunctionCall(sea_orm::sea_query::Func::avg(Expr::col((E::default(), col)))), "avg")
        .into_tuple()
        .one(db)
        .await?;
    Ok(v.flatten().unwrap_or(Decimal::ZERO).round_dp(2))
}

fn month_expr<E: EntityTrait>(created: E::Column) -> SimpleExpr {
    Expr::cust_with_expr("to_char(date_trunc('month', $1 AT TIME ZONE 'UTC'), 'YYYY-MM')", Expr::col((E::default(), created)))
}

/// Per-month row counts (and sums of `sum_col`) over the reporting window,
/// zero-filled and oldest first.
pub async fn monthly<E, C>(
    db: &C,
    q: Select<E>,
    created: E::Column,
    sum_col: Option<E::Column>,
    now: DateTime<Utc>,
) -> Result<Vec<MonthlyPoint>, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let (start, keys) = monthly_window(now);
    let total_expr: SimpleExpr = match sum_col {
        Some(c) => Expr::col((E::default(), c)).sum(),
        None => Expr::cust("NULL::numeric"),
    };
    let rows: Vec<(String, i64, Option<Decimal>)> = q
        .filter(created.gte(start))
        .select_only()
        .column_as(month_expr::<E>(created), "month")
        .column_as(Expr::col((E::default(), created)).count(), "count")
        .column_as(total_expr, "total")
        .group_by(month_expr::<E>(created))
        .into_tuple()
        .all(db)
        .await?;
    let found: BTreeMap<String, (u64, Decimal)> = rows
        .into_iter()
        .map(|(m, n, t)| (m, (n.max(0) as u64, t.unwrap_or(Decimal::ZERO))))
        .collect();
    Ok(keys
        .into_iter()
        .map(|month| {
            let (count, total) = found.get(&month).copied().unwrap_or((0, Decimal::ZERO));
            MonthlyPoint { month, count, total }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn distribution_keeps_known_order_and_zero_fills() {
        let known = ["OPEN", "IN_PROGRESS", "RESOLVED", "REJECTED"];
        let mut counts: BTreeMap<String, u64> = known.iter().map(|s| (s.to_string(), 0)).collect();
        counts.insert("OPEN".into(), 3);
        counts.insert("RESOLVED".into(), 1);
        let d = distribution(&counts, &known);
        assert_eq!(d.iter().map(|b| b.status.as_str()).collect::<Vec<_>>(), known);
        assert_eq!(d[0].percentage, 75.0);
        assert_eq!(d[1].count, 0);
        assert_eq!(total(&counts), 4);
    }

    #[test]
    fn months_are_bucketed_in_utc() {
        use models::order;
        let sql = order::Entity::find()
            .select_only()
            .column_as(month_expr::<order::Entity>(order::Column::CreatedAt), "month")
            .build(DbBackend::Postgres)
            .to_string();
        assert!(
            sql.contains(r#"date_trunc('month', "orders"."created_at" AT TIME ZONE 'UTC')"#),
            "{sql}"
        );
    }
}
