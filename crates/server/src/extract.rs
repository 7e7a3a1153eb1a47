//! Extractor wrappers whose rejections render as the JSON error envelope.

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use models::status::Role;

use service::disputes::DisputeFilter;
use service::filters::DateRange;
use service::orders::OrderFilter;
use service::pagination::{Page, Pagination};
use service::products::ProductFilter;
use service::transactions::TransactionFilter;
use service::users::UserFilter;

use crate::errors::ApiError;

pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(v) = axum::Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(v))
    }
}

pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(v) = axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(v))
    }
}

pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(v) = axum::extract::Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(v))
    }
}

/// Flat query string shared by list and search endpoints. Numbers arrive as
/// strings so that non-numeric values can be answered with a 400 envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub q: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub user_id: Option<String>,
    pub order_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt<T: std::str::FromStr>(v: &Option<String>, name: &str) -> Result<Option<T>, ApiError> {
    non_blank(v)
        .map(|s| s.parse::<T>().map_err(|_| ApiError::bad_request(format!("{name} must be a valid number"))))
        .transpose()
}

fn parse_uuid(v: &Option<String>, name: &str) -> Result<Option<Uuid>, ApiError> {
    non_blank(v)
        .map(|s| Uuid::parse_str(s).map_err(|_| ApiError::bad_request(format!("{name} must be a valid id"))))
        .transpose()
}

impl ListQuery {
    pub fn page(&self, default_limit: u64) -> Result<Page, ApiError> {
        let limit = parse_opt::<i64>(&self.limit, "limit")?;
        let offset = parse_opt::<i64>(&self.offset, "offset")?;
        Ok(Pagination::new(limit, offset).normalize(default_limit)?)
    }

    pub fn q(&self) -> Option<&str> {
        non_blank(&self.q)
    }

    pub fn range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange::parse(non_blank(&self.start_date), non_blank(&self.end_date))?)
    }

    fn status<T>(&self) -> Result<Option<T>, ApiError>
    where
        T: std::str::FromStr<Err = models::errors::ModelError>,
    {
        non_blank(&self.status)
            .map(|s| s.parse::<T>().map_err(service::errors::ServiceError::from))
            .transpose()
            .map_err(ApiError::from)
    }

    pub fn product_filter(&self) -> Result<ProductFilter, ApiError> {
        Ok(ProductFilter {
            search: non_blank(&self.search).or(self.q()).map(str::to_string),
            make: non_blank(&self.make).map(str::to_string),
            model: non_blank(&self.model).map(str::to_string),
            year: parse_opt(&self.year, "year")?,
            min_price: parse_opt(&self.min_price, "minPrice")?,
            max_price: parse_opt(&self.max_price, "maxPrice")?,
        })
    }

    pub fn user_filter(&self) -> Result<UserFilter, ApiError> {
        Ok(UserFilter {
            search: non_blank(&self.search).map(str::to_string),
            role: non_blank(&self.role)
                .map(|r| r.parse::<Role>().map_err(service::errors::ServiceError::from))
                .transpose()?,
            range: self.range()?,
        })
    }

    pub fn order_filter(&self) -> Result<OrderFilter, ApiError> {
        Ok(OrderFilter { status: self.status()?, user_id: parse_uuid(&self.user_id, "userId")?, range: self.range()? })
    }

    pub fn dispute_filter(&self) -> Result<DisputeFilter, ApiError> {
        Ok(DisputeFilter {
            status: self.status()?,
            user_id: parse_uuid(&self.user_id, "userId")?,
            order_id: parse_uuid(&self.order_id, "orderId")?,
            range: self.range()?,
        })
    }

    pub fn transaction_filter(&self) -> Result<TransactionFilter, ApiError> {
        Ok(TransactionFilter {
            status: self.status()?,
            user_id: parse_uuid(&self.user_id, "userId")?,
            order_id: parse_uuid(&self.order_id, "orderId")?,
            range: self.range()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::status::OrderStatus;

    fn q(pairs: &[(&str, &str)]) -> ListQuery {
        let s = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
        let uri: axum::http::Uri = format!("/x?{s}").parse().unwrap();
        axum::extract::Query::<ListQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn pagination_errors_are_bad_requests() {
        assert!(matches!(q(&[("limit", "abc")]).page(50), Err(ApiError::BadRequest { .. })));
        assert!(q(&[("offset", "-1")]).page(50).is_err());
        let p = q(&[("limit", "500"), ("offset", "10")]).page(50).unwrap();
        assert_eq!((p.limit, p.offset), (100, 10));
        assert_eq!(q(&[]).page(50).unwrap().limit, 50);
    }

    #[test]
    fn filters_parse_typed_values() {
        let f = q(&[("status", "shipped"), ("startDate", "2024-01-01"), ("endDate", "2024-01-31")]).order_filter().unwrap();
        assert_eq!(f.status, Some(OrderStatus::Shipped));
        assert!(f.range.start.is_some() && f.range.end.is_some());

        assert!(q(&[("status", "LOST")]).order_filter().is_err());
        assert!(q(&[("userId", "nope")]).dispute_filter().is_err());

        let p = q(&[("minPrice", "10.5"), ("year", "2019"), ("make", "Toyota")]).product_filter().unwrap();
        assert_eq!(p.year, Some(2019));
        assert_eq!(p.make.as_deref(), Some("Toyota"));
        assert!(q(&[("year", "twenty")]).product_filter().is_err());
    }
}
