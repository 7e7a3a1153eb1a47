use sea_orm::entity::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    #[sea_orm(unique)]
    pub sku: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub brand: Option<String>,
    pub car_name: Option<String>,
    pub body_type: Option<String>,
    pub engine: Option<String>,
    pub horsepower: Option<String>,
    pub fuel_type: Option<String>,
    pub fuel_capacity: Option<String>,
    pub engine_displacement: Option<String>,
    pub rpm: Option<String>,
    pub car_price: Option<String>,
    pub car_location: Option<String>,
    pub transmission: Option<String>,
    pub colour: Option<String>,
    pub mileage: Option<String>,
    pub images: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("title required".into()));
    }
    Ok(())
}

pub fn validate_sku(sku: &str) -> Result<(), ModelError> {
    let sku = sku.trim();
    if sku.is_empty() || sku.len() > 128 {
        return Err(ModelError::Validation("sku must be 1..=128 characters".into()));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), ModelError> {
    if price.is_sign_negative() {
        return Err(ModelError::Validation("price must be >= 0".into()));
    }
    if price.scale() > 2 {
        return Err(ModelError::Validation("price supports at most 2 decimal places".into()));
    }
    Ok(())
}

pub fn validate_year(year: Option<i32>) -> Result<(), ModelError> {
    if let Some(y) = year {
        if !(1886..=2100).contains(&y) {
            return Err(ModelError::Validation("year out of range".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn price_rules() {
        assert!(validate_price(Decimal::from_str("19.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::from_str("-1").unwrap()).is_err());
        assert!(validate_price(Decimal::from_str("1.999").unwrap()).is_err());
    }

    #[test]
    fn sku_and_title_required() {
        assert!(validate_sku("  ").is_err());
        assert!(validate_sku("BRK-001").is_ok());
        assert!(validate_title("").is_err());
    }

    #[test]
    fn year_bounds() {
        assert!(validate_year(None).is_ok());
        assert!(validate_year(Some(2020)).is_ok());
        assert!(validate_year(Some(1700)).is_err());
    }
}
