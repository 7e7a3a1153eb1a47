use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::product;

use crate::errors::ServiceError;
use crate::filters::{contains_ci, search_term};
use crate::pagination::{Page, Paged};

/// Catalog filters; all optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub search: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Create payload.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
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
    #[serde(default)]
    pub images: Vec<String>,
}

/// Partial update; absent fields stay unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub sku: Option<String>,
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
    pub images: Option<Vec<String>>,
}

fn apply_filter(mut q: Select<product::Entity>, f: &ProductFilter) -> Result<Select<product::Entity>, ServiceError> {
    if let Some(term) = search_term(f.search.as_deref()) {
        q = q.filter(
            Condition::any()
                .add(contains_ci(product::Column::Title, term))
                .add(contains_ci(product::Column::Description, term))
                .add(contains_ci(product::Column::Make, term))
                .add(contains_ci(product::Column::Model, term)),
        );
    }
    if let Some(make) = search_term(f.make.as_deref()) {
        q = q.filter(contains_ci(product::Column::Make, make));
    }
    if let Some(model) = search_term(f.model.as_deref()) {
        q = q.filter(contains_ci(product::Column::Model, model));
    }
    if let Some(year) = f.year {
        q = q.filter(product::Column::Year.eq(year));
    }
    if let (Some(min), Some(max)) = (f.min_price, f.max_price) {
        if min > max {
            return Err(ServiceError::validation("minPrice must not exceed maxPrice"));
        }
    }
    if let Some(min) = f.min_price {
        q = q.filter(product::Column::Price.gte(min));
    }
    if let Some(max) = f.max_price {
        q = q.filter(product::Column::Price.lte(max));
    }
    Ok(q)
}

/// Filtered catalog page, newest first.
pub async fn list(db: &DatabaseConnection, filter: &ProductFilter, page: Page) -> Result<Paged<product::Model>, ServiceError> {
    let q = apply_filter(product::Entity::find(), filter)?;
    let total = q.clone().count(db).await?;
    let items = q
        .order_by_desc(product::Column::CreatedAt)
        .offset(page.offset)
        .limit(page.limit)
        .all(db)
        .await?;
    Ok(Paged { items, pagination: page.meta(total) })
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<product::Model, ServiceError> {
    product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product"))
}

fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn validate_images(images: &[String]) -> Result<(), ServiceError> {
    if images.iter().any(|u| u.trim().is_empty()) {
        return Err(ServiceError::validation("image urls must be non-empty"));
    }
    Ok(())
}

#[instrument(skip(db, input), fields(sku = %input.sku))]
pub async fn create(db: &DatabaseConnection, input: ProductInput) -> Result<product::Model, ServiceError> {
    product::validate_title(&input.title)?;
    if input.description.trim().is_empty() {
        return Err(ServiceError::validation("description required"));
    }
    product::validate_sku(&input.sku)?;
    product::validate_price(input.price)?;
    product::validate_year(input.year)?;
    validate_images(&input.images)?;

    let exists = product::Entity::find()
        .filter(product::Column::Sku.eq(input.sku.trim()))
        .count(db)
        .await?;
    if exists > 0 {
        return Err(ServiceError::Conflict("Product with this SKU already exists".into()));
    }

    let now = Utc::now().into();
    let am = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description.trim().to_string()),
        price: Set(input.price),
        sku: Set(input.sku.trim().to_string()),
        make: Set(clean(input.make)),
        model: Set(clean(input.model)),
        year: Set(input.year),
        brand: Set(clean(input.brand)),
        car_name: Set(clean(input.car_name)),
        body_type: Set(clean(input.body_type)),
        engine: Set(clean(input.engine)),
        horsepower: Set(clean(input.horsepower)),
        fuel_type: Set(clean(input.fuel_type)),
        fuel_capacity: Set(clean(input.fuel_capacity)),
        engine_displacement: Set(clean(input.engine_displacement)),
        rpm: Set(clean(input.rpm)),
        car_price: Set(clean(input.car_price)),
        car_location: Set(clean(input.car_location)),
        transmission: Set(clean(input.transmission)),
        colour: Set(clean(input.colour)),
        mileage: Set(clean(input.mileage)),
        images: Set(input.images),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = am.insert(db).await?;
    info!(product_id = %created.id, "product_created");
    Ok(created)
}

#[instrument(skip(db, patch))]
pub async fn update(db: &DatabaseConnection, id: Uuid, patch: ProductPatch) -> Result<product::Model, ServiceError> {
    let current = get(db, id).await?;
    let mut am: product::ActiveModel = current.clone().into();

    if let Some(title) = patch.title {
        product::validate_title(&title)?;
        am.title = Set(title.trim().to_string());
    }
    if let Some(desc) = patch.description {
        if desc.trim().is_empty() {
            return Err(ServiceError::validation("description required"));
        }
        am.description = Set(desc.trim().to_string());
    }
    if let Some(price) = patch.price {
        product::validate_price(price)?;
        am.price = Set(price);
    }
    if let Some(sku) = patch.sku {
        product::validate_sku(&sku)?;
        let sku = sku.trim().to_string();
        if sku != current.sku {
            let taken = product::Entity::find()
                .filter(product::Column::Sku.eq(sku.as_str()))
                .filter(product::Column::Id.ne(id))
                .count(db)
                .await?;
            if taken > 0 {
                return Err(ServiceError::Conflict("Product with this SKU already exists".into()));
            }
        }
        am.sku = Set(sku);
    }
    if patch.year.is_some() {
        product::validate_year(patch.year)?;
        am.year = Set(patch.year);
    }
    if let Some(images) = patch.images {
        validate_images(&images)?;
        am.images = Set(images);
    }

    macro_rules! patch_text {
        ($($field:ident),+) => {
            $(if let Some(v) = patch.$field { am.$field = Set(clean(Some(v))); })+
        };
    }
    patch_text!(
        make, model, brand, car_name, body_type, engine, horsepower, fuel_type, fuel_capacity,
        engine_displacement, rpm, car_price, car_location, transmission, colour, mileage
    );

    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(product_id = %id, "product_updated");
    Ok(updated)
}

/// Delete a product; a product referenced by past orders cannot be removed.
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<(), ServiceError> {
    let res = product::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::not_found("Product"));
    }
    info!(product_id = %id, "product_deleted");
    Ok(())
}
