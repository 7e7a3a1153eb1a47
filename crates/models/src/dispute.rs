use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::status::DisputeStatus;
use crate::{order, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "dispute")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
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

pub fn validate_text(title: &str, description: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("title required".into()));
    }
    if title.chars().count() > 255 {
        return Err(ModelError::Validation("title too long (<=255)".into()));
    }
    if description.trim().is_empty() {
        return Err(ModelError::Validation("description required".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, user_id: Uuid, order_id: Uuid, title: &str, description: &str) -> Result<Model, ModelError> {
    validate_text(title, description)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        order_id: Set(order_id),
        status: Set(DisputeStatus::Open.as_str().to_string()),
        title: Set(title.trim().to_string()),
        description: Set(description.trim().to_string()),
        admin_notes: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_description_required() {
        assert!(validate_text("Damaged part", "Arrived cracked").is_ok());
        assert!(validate_text(" ", "x").is_err());
        assert!(validate_text("x", "").is_err());
        assert!(validate_text(&"t".repeat(256), "x").is_err());
    }
}
