use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::status::PaymentStatus;
use crate::{order, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "payment_intent")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub reference: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User, Order }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Order => Entity::belongs_to(order::Entity)
                .from(Column::OrderId)
                .to(order::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create_pending<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    reference: &str,
    amount: Decimal,
    currency: &str,
) -> Result<Model, ModelError> {
    if reference.trim().is_empty() {
        return Err(ModelError::Validation("payment reference required".into()));
    }
    if amount <= Decimal::ZERO {
        return Err(ModelError::Validation("payment amount must be > 0".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        order_id: Set(None),
        reference: Set(reference.to_string()),
        amount: Set(amount.round_dp(2)),
        currency: Set(currency.to_string()),
        status: Set(PaymentStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_reference<C: ConnectionTrait>(db: &C, reference: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Reference.eq(reference)).one(db).await?)
}

/// Move a pending intent to `succeeded`. Returns false when another caller
/// already claimed it.
pub async fn claim_pending<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Status, Expr::value(PaymentStatus::Succeeded.as_str()))
        .col_expr(Column::UpdatedAt, Expr::value(DateTimeWithTimeZone::from(Utc::now())))
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(PaymentStatus::Pending.as_str()))
        .exec(db)
        .await?;
    Ok(res.rows_affected == 1)
}

pub async fn link_order<C: ConnectionTrait>(db: &C, id: Uuid, order_id: Uuid) -> Result<(), ModelError> {
    Entity::update_many()
        .col_expr(Column::OrderId, Expr::value(Some(order_id)))
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Amount in the gateway's minor unit (kobo for NGN).
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    use rust_decimal::prelude::ToPrimitive;
    (amount * Decimal::from(100)).round().to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn minor_units_round_half_even_cents() {
        assert_eq!(to_minor_units(Decimal::from_str("1500.00").unwrap()), Some(150_000));
        assert_eq!(to_minor_units(Decimal::from_str("19.99").unwrap()), Some(1_999));
        assert_eq!(to_minor_units(Decimal::from_str("0.015").unwrap()), Some(2));
    }
}
