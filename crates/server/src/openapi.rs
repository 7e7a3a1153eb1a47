use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub timestamp: String, pub uptime_secs: u64 }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct RegisterRequest { pub email: String, pub password: String, pub full_name: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct ForgotPasswordRequest { pub email: String }

#[derive(ToSchema)]
pub struct ResetPasswordRequest { pub token: String, pub password: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UpdateMeRequest { pub email: Option<String>, pub full_name: Option<String>, pub password: Option<String> }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct AddCartItemRequest { pub product_id: Uuid, pub quantity: Option<i32> }

#[derive(ToSchema)]
pub struct UpdateQuantityRequest { pub quantity: i32 }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CreateDisputeRequest { pub order_id: Uuid, pub title: String, pub description: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct AdminCreateUserRequest { pub email: String, pub full_name: String, pub password: String, pub roles: Vec<String> }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// Catalog entry; on update every field is optional.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ProductRequest {
    pub title: String,
    pub description: String,
    /// Decimal as number or string, e.g. `"1250.00"`.
    pub price: String,
    pub sku: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub brand: Option<String>,
    pub car_name: Option<String>,
    pub body_type: Option<String>,
    pub engine: Option<String>,
    pub transmission: Option<String>,
    pub colour: Option<String>,
    pub mileage: Option<String>,
    pub images: Vec<String>,
}

#[derive(ToSchema)]
pub struct UpdateOrderStatusRequest { pub status: String, pub note: Option<String> }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct AdminUpdateDisputeRequest { pub status: Option<String>, pub admin_notes: Option<String> }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::app::root,
        crate::routes::app::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::auth::me,
        crate::routes::users::me,
        crate::routes::users::update_me,
        crate::routes::users::my_orders,
        crate::routes::products::list,
        crate::routes::products::get,
        crate::routes::cart::get,
        crate::routes::cart::add_item,
        crate::routes::cart::update_item,
        crate::routes::cart::remove_item,
        crate::routes::cart::clear,
        crate::routes::checkout::initiate,
        crate::routes::checkout::webhook,
        crate::routes::orders::list,
        crate::routes::disputes::create,
        crate::routes::disputes::list,
        crate::routes::disputes::get,
        crate::routes::uploads::image,
        crate::routes::admin::users::list,
        crate::routes::admin::users::search,
        crate::routes::admin::users::analytics,
        crate::routes::admin::users::create,
        crate::routes::admin::users::detail,
        crate::routes::admin::users::update,
        crate::routes::admin::users::delete,
        crate::routes::admin::products::list,
        crate::routes::admin::products::search,
        crate::routes::admin::products::get,
        crate::routes::admin::products::create,
        crate::routes::admin::products::update,
        crate::routes::admin::products::delete,
        crate::routes::admin::orders::list,
        crate::routes::admin::orders::search,
        crate::routes::admin::orders::analytics,
        crate::routes::admin::orders::detail,
        crate::routes::admin::orders::update_status,
        crate::routes::admin::disputes::list,
        crate::routes::admin::disputes::search,
        crate::routes::admin::disputes::analytics,
        crate::routes::admin::disputes::detail,
        crate::routes::admin::disputes::update,
        crate::routes::admin::transactions::list,
        crate::routes::admin::transactions::search,
        crate::routes::admin::transactions::analytics,
        crate::routes::admin::transactions::detail,
        crate::routes::admin::analytics::dashboard,
        crate::routes::admin::analytics::transactions,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdateMeRequest,
            AddCartItemRequest,
            UpdateQuantityRequest,
            CreateDisputeRequest,
            AdminCreateUserRequest,
            AdminUpdateUserRequest,
            ProductRequest,
            UpdateOrderStatusRequest,
            AdminUpdateDisputeRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "products"),
        (name = "cart"),
        (name = "checkout"),
        (name = "orders"),
        (name = "disputes"),
        (name = "uploads"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
