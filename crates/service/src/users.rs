use std::collections::HashMap;

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::status::Role;
use models::{dispute, order, user, user_credentials};

use crate::auth::password;
use crate::errors::ServiceError;
use crate::filters::{contains_ci, percent, search_term, DateRange};
use crate::pagination::{Page, Paged};
use crate::stats::{self, MonthlyPoint};
use crate::views::{order_views, OrderIncludes, OrderView, PublicUser};

/// Self-service profile changes. Roles are deliberately absent.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeInput {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub range: DateRange,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub orders: u64,
    pub disputes: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserRow {
    #[serde(flatten)]
    pub user: PublicUser,
    #[serde(rename = "_count")]
    pub counts: UserCounts,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserDetail {
    #[serde(flatten)]
    pub user: PublicUser,
    pub orders: Vec<OrderView>,
    pub disputes: Vec<dispute::Model>,
    #[serde(rename = "_count")]
    pub counts: UserCounts,
}

#[derive(Clone, Debug, PartialEq, Serialize, FromQueryResult)]
pub struct RoleCount {
    pub role: String,
    pub count: i64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub total_users: u64,
    pub active_users: u64,
    pub new_users_last_30_days: u64,
    pub activity_rate: f64,
    pub role_distribution: Vec<RoleCount>,
    pub monthly_signups: Vec<MonthlyPoint>,
}

async fn find(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))
}

pub async fn me(db: &DatabaseConnection, user_id: Uuid) -> Result<PublicUser, ServiceError> {
    Ok(find(db, user_id).await?.into())
}

async fn ensure_email_free(db: &DatabaseConnection, email: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
    let mut q = user::Entity::find().filter(user::Column::Email.eq(user::normalize_email(email)));
    if let Some(id) = except {
        q = q.filter(user::Column::Id.ne(id));
    }
    if q.count(db).await? > 0 {
        return Err(ServiceError::Conflict("User with this email already exists".into()));
    }
    Ok(())
}

async fn set_password<C: ConnectionTrait>(db: &C, user_id: Uuid, raw: &str) -> Result<(), ServiceError> {
    password::validate_password(raw)?;
    let hash = password::hash_password(raw)?;
    user_credentials::upsert_password(db, user_id, hash, password::ALGORITHM).await?;
    Ok(())
}

/// Shared profile update; `roles` is only ever `Some` on the admin path.
async fn apply_update(
    db: &DatabaseConnection,
    id: Uuid,
    email: Option<String>,
    full_name: Option<String>,
    new_password: Option<String>,
    roles: Option<Vec<String>>,
) -> Result<PublicUser, ServiceError> {
    let current = find(db, id).await?;
    let mut am: user::ActiveModel = current.into();
    if let Some(email) = email {
        user::validate_email(&email)?;
        ensure_email_free(db, &email, Some(id)).await?;
        am.email = Set(user::normalize_email(&email));
    }
    if let Some(name) = full_name {
        user::validate_name(&name)?;
        am.full_name = Set(name.trim().to_string());
    }
    if let Some(roles) = roles {
        am.roles = Set(user::normalize_roles(&roles)?);
    }
    if let Some(pw) = new_password {
        set_password(db, id, &pw).await?;
    }
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?.into())
}

#[instrument(skip(db, input))]
pub async fn update_me(db: &DatabaseConnection, user_id: Uuid, input: UpdateMeInput) -> Result<PublicUser, ServiceError> {
    let updated = apply_update(db, user_id, input.email, input.full_name, input.password, None).await?;
    info!(user_id = %user_id, "profile_updated");
    Ok(updated)
}

pub async fn my_orders(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<OrderView>, ServiceError> {
    crate::orders::list_for_user(db, user_id).await
}

fn apply_filter(mut q: Select<user::Entity>, f: &UserFilter) -> Select<user::Entity> {
    if let Some(term) = search_term(f.search.as_deref()) {
        q = q.filter(
            Condition::any()
                .add(contains_ci(user::Column::FullName, term))
                .add(contains_ci(user::Column::Email, term)),
        );
    }
    if let Some(role) = f.role {
        q = q.filter(Expr::cust_with_values("$1 = ANY(\"users\".\"roles\")", [role.as_str()]));
    }
    stats::within(q, user::Column::CreatedAt, &f.range)
}

async fn counts_by_user<E, C>(db: &C, user_col: E::Column, ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64)> = E::find()
        .select_only()
        .column(user_col)
        .column_as(Expr::col((E::default(), user_col)).count(), "count")
        .filter(user_col.is_in(ids.iter().copied()))
        .group_by(user_col)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect())
}

async fn page_of(db: &DatabaseConnection, q: Select<user::Entity>, page: Page) -> Result<Paged<AdminUserRow>, ServiceError> {
    let total = q.clone().count(db).await?;
    let rows = q
        .order_by_desc(user::Column::CreatedAt)
        .offset(page.offset)
        .limit(page.limit)
        .all(db)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|u| u.id).collect();
    let orders = counts_by_user::<order::Entity, _>(db, order::Column::UserId, &ids).await?;
    let disputes = counts_by_user::<dispute::Entity, _>(db, dispute::Column::UserId, &ids).await?;
    let items = rows
        .into_iter()
        .map(|u| AdminUserRow {
            counts: UserCounts {
                orders: orders.get(&u.id).copied().unwrap_or(0),
                disputes: disputes.get(&u.id).copied().unwrap_or(0),
            },
            user: u.into(),
        })
        .collect();
    Ok(Paged { items, pagination: page.meta(total) })
}

pub async fn admin_list(db: &DatabaseConnection, filter: &UserFilter, page: Page) -> Result<Paged<AdminUserRow>, ServiceError> {
    page_of(db, apply_filter(user::Entity::find(), filter), page).await
}

pub async fn admin_search(db: &DatabaseConnection, q: Option<&str>, filter: &UserFilter, page: Page) -> Result<Paged<AdminUserRow>, ServiceError> {
    let term = search_term(q).ok_or_else(|| ServiceError::validation("Search query is required"))?;
    let f = UserFilter { search: Some(term.to_string()), ..filter.clone() };
    admin_list(db, &f, page).await
}

pub async fn analytics(db: &DatabaseConnection) -> Result<UserAnalytics, ServiceError> {
    let now = Utc::now();
    let total_users = user::Entity::find().count(db).await?;
    let active: Option<i64> = order::Entity::find()
        .select_only()
        .column_as(Expr::cust("COUNT(DISTINCT \"orders\".\"user_id\")"), "n")
        .into_tuple()
        .one(db)
        .await?;
    let active_users = active.unwrap_or(0).max(0) as u64;
    let new_users_last_30_days = user::Entity::find()
        .filter(user::Column::CreatedAt.gte(now - Duration::days(30)))
        .count(db)
        .await?;
    let role_distribution = RoleCount::find_by_statement(Statement::from_string(
        DbBackend::Postgres,
        "SELECT r AS role, COUNT(*)::bigint AS count FROM users, unnest(users.roles) AS r GROUP BY r ORDER BY r",
    ))
    .all(db)
    .await?;
    let monthly_signups = stats::monthly(db, user::Entity::find(), user::Column::CreatedAt, None, now).await?;

    Ok(UserAnalytics {
        total_users,
        active_users,
        new_users_last_30_days,
        activity_rate: percent(active_users, total_users),
        role_distribution,
        monthly_signups,
    })
}

#[instrument(skip(db, input), fields(email = %input.email))]
pub async fn admin_create(db: &DatabaseConnection, input: AdminCreateUser) -> Result<PublicUser, ServiceError> {
    user::validate_email(&input.email)?;
    user::validate_name(&input.full_name)?;
    password::validate_password(&input.password)?;
    ensure_email_free(db, &input.email, None).await?;
    let hash = password::hash_password(&input.password)?;

    let txn = db.begin().await?;
    let created = user::create(&txn, &input.email, &input.full_name, &input.roles).await?;
    user_credentials::upsert_password(&txn, created.id, hash, password::ALGORITHM).await?;
    txn.commit().await?;
    info!(user_id = %created.id, roles = ?created.roles, "user_created_by_admin");
    Ok(created.into())
}

/// Profile plus the ten most recent orders and disputes.
pub async fn admin_detail(db: &DatabaseConnection, id: Uuid) -> Result<AdminUserDetail, ServiceError> {
    let u = find(db, id).await?;
    let recent_orders = order::Entity::find()
        .filter(order::Column::UserId.eq(id))
        .order_by_desc(order::Column::CreatedAt)
        .limit(10)
        .all(db)
        .await?;
    let disputes = dispute::Entity::find()
        .filter(dispute::Column::UserId.eq(id))
        .order_by_desc(dispute::Column::CreatedAt)
        .limit(10)
        .all(db)
        .await?;
    let counts = UserCounts {
        orders: order::Entity::find().filter(order::Column::UserId.eq(id)).count(db).await?,
        disputes: dispute::Entity::find().filter(dispute::Column::UserId.eq(id)).count(db).await?,
    };
    Ok(AdminUserDetail {
        user: u.into(),
        orders: order_views(db, recent_orders, OrderIncludes::default()).await?,
        disputes,
        counts,
    })
}

#[instrument(skip(db, input))]
pub async fn admin_update(db: &DatabaseConnection, id: Uuid, input: AdminUpdateUser) -> Result<PublicUser, ServiceError> {
    let updated = apply_update(db, id, input.email, input.full_name, input.password, input.roles).await?;
    info!(user_id = %id, roles = ?updated.roles, "user_updated_by_admin");
    Ok(updated)
}

/// Delete a user and (by cascade) their cart, credentials and disputes.
#[instrument(skip(db))]
pub async fn admin_delete(db: &DatabaseConnection, actor_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
    if actor_id == id {
        return Err(ServiceError::validation("You cannot delete your own account"));
    }
    let res = user::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("User"));
    }
    info!(user_id = %id, by = %actor_id, "user_deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{Pagination, ADMIN_DEFAULT_LIMIT};
    use crate::test_support::{get_db, make_user, skip_db, unique};
    use models::status::OrderStatus;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn customers_cannot_touch_roles_but_admins_can() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;

        let p = update_me(&db, u.id, UpdateMeInput { full_name: Some("  New Name ".into()), ..Default::default() }).await?;
        assert_eq!(p.full_name, "New Name");
        assert_eq!(p.roles, vec!["CUSTOMER"]);

        let p = admin_update(&db, u.id, AdminUpdateUser { roles: Some(vec!["admin".into(), "customer".into()]), ..Default::default() }).await?;
        assert_eq!(p.roles, vec!["ADMIN", "CUSTOMER"]);

        let other = make_user(&db).await?;
        let clash = update_me(&db, u.id, UpdateMeInput { email: Some(other.email.to_uppercase()), ..Default::default() }).await;
        assert!(matches!(clash, Err(ServiceError::Conflict(_))));
        let short = update_me(&db, u.id, UpdateMeInput { password: Some("123".into()), ..Default::default() }).await;
        assert!(matches!(short, Err(ServiceError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_counts_and_role_filter() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let email = format!("{}@example.com", unique("admin"));
        let admin = admin_create(&db, AdminCreateUser {
            email: email.clone(),
            full_name: "Ops".into(),
            password: "secret99".into(),
            roles: vec!["ADMIN".into()],
        })
        .await?;
        order::create(&db, admin.id, Decimal::from(10), OrderStatus::Paid).await?;

        let page = Pagination::default().normalize(ADMIN_DEFAULT_LIMIT)?;
        let f = UserFilter { role: Some(Role::Admin), ..Default::default() };
        let found = admin_search(&db, Some(&email), &f, page).await?;
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].counts.orders, 1);

        let f = UserFilter { role: Some(Role::Customer), search: Some(email), ..Default::default() };
        assert_eq!(admin_list(&db, &f, page).await?.pagination.total, 0);

        let detail = admin_detail(&db, admin.id).await?;
        assert_eq!(detail.orders.len(), 1);
        assert_eq!(detail.counts.orders, 1);

        let a = analytics(&db).await?;
        assert!(a.active_users >= 1);
        assert!(a.role_distribution.iter().any(|r| r.role == "ADMIN"));
        assert_eq!(a.monthly_signups.len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn admin_cannot_delete_self() -> Result<(), anyhow::Error> {
        if skip_db() { return Ok(()); }
        let db = get_db().await?;
        let u = make_user(&db).await?;
        assert!(matches!(admin_delete(&db, u.id, u.id).await, Err(ServiceError::Validation(_))));
        admin_delete(&db, Uuid::new_v4(), u.id).await?;
        assert!(matches!(me(&db, u.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
