use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use sea_orm::sea_query::Expr;
use uuid::Uuid;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "password_reset_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub token: String,
    pub expires_at: DateTimeWithTimeZone,
    pub used: bool,
    pub created_at: DateTimeWithTimeZone,
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

impl ActiveModelBehavior for ActiveModel {}

pub async fn issue<C: ConnectionTrait>(db: &C, user_id: Uuid, token: &str, ttl: Duration) -> Result<Model, ModelError> {
    if token.len() < 16 {
        return Err(ModelError::Validation("reset token too short".into()));
    }
    let now = Utc::now();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        token: Set(token.to_string()),
        expires_at: Set((now + ttl).into()),
        used: Set(false),
        created_at: Set(now.into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_token<C: ConnectionTrait>(db: &C, token: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Token.eq(token)).one(db).await?)
}

/// Flip an unused, unexpired token to used. Only the caller whose update hit
/// the row gets it back; replays and concurrent redemptions see `None`.
pub async fn claim<C: ConnectionTrait>(db: &C, token: &str) -> Result<Option<Model>, ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let res = Entity::update_many()
        .col_expr(Column::Used, Expr::value(true))
        .filter(Column::Token.eq(token))
        .filter(Column::Used.eq(false))
        .filter(Column::ExpiresAt.gt(now))
        .exec(db)
        .await?;
    if res.rows_affected != 1 {
        return Ok(None);
    }
    find_by_token(db, token).await
}
