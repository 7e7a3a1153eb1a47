use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{cart, product};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "cart_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Cart, Product }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Cart => Entity::belongs_to(cart::Entity)
                .from(Column::CartId)
                .to(cart::Column::Id)
                .into(),
            Relation::Product => Entity::belongs_to(product::Entity)
                .from(Column::ProductId)
                .to(product::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const MAX_QUANTITY: i32 = 999;

pub fn validate_quantity(quantity: i32) -> Result<(), ModelError> {
    if quantity < 1 {
        return Err(ModelError::Validation("quantity must be >= 1".into()));
    }
    if quantity > MAX_QUANTITY {
        return Err(ModelError::Validation(format!("quantity must be <= {MAX_QUANTITY}")));
    }
    Ok(())
}
