use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::order_history;
use crate::status::OrderStatus;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, user_id: Uuid, total: Decimal, status: OrderStatus) -> Result<Model, ModelError> {
    if total.is_sign_negative() {
        return Err(ModelError::Validation("order total must be >= 0".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total: Set(total.round_dp(2)),
        status: Set(status.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Set the status and append a history row describing the change.
pub async fn set_status<C: ConnectionTrait>(db: &C, order: Model, status: OrderStatus, note: Option<String>) -> Result<Model, ModelError> {
    let order_id = order.id;
    let mut am: ActiveModel = order.into();
    am.status = Set(status.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    order_history::append(db, order_id, status, note).await?;
    Ok(updated)
}
