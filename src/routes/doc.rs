use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        activity_logs::ActivityLogDto,
        admin::DashboardStats,
        auth::{
            CheckPasswordResponse, DashboardDto, PrincipalDto, RegisterCustomerRequest,
            RegisterShopRequest, UserExistsResponse,
        },
        customers::{CustomerDto, CustomerUpdateRequest, RecordOrderRequest},
        shops::{ShopDto, ShopRatingRequest, ShopUpdateRequest},
        users::UserDto,
    },
    middleware::session::SESSION_COOKIE_NAME,
    models::{Role, ShopStatus},
    response::{ApiResponse, Meta},
    routes::{admin, auth, customer, debug, health, params, public, register, shop},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login_page,
        auth::perform_login,
        auth::logout,
        auth::dashboard,
        auth::me,
        register::register_shop,
        register::register_customer,
        shop::own_profile,
        shop::update_own_profile,
        customer::own_profile,
        customer::update_own_profile,
        public::list_shops,
        admin::dashboard_stats,
        admin::list_shops,
        admin::list_pending_shops,
        admin::get_shop,
        admin::approve_shop,
        admin::reject_shop,
        admin::update_shop,
        admin::update_shop_rating,
        admin::record_shop_order,
        admin::list_customers,
        admin::get_customer,
        admin::deactivate_customer,
        admin::record_customer_order,
        admin::list_activity_logs,
        admin::list_user_activity_logs,
        admin::list_users,
        admin::list_users_by_role,
        admin::deactivate_user,
        debug::user_exists,
        debug::check_password
    ),
    components(
        schemas(
            Role,
            ShopStatus,
            ShopDto,
            ShopUpdateRequest,
            ShopRatingRequest,
            CustomerDto,
            CustomerUpdateRequest,
            RecordOrderRequest,
            RegisterShopRequest,
            RegisterCustomerRequest,
            UserDto,
            ActivityLogDto,
            DashboardStats,
            PrincipalDto,
            DashboardDto,
            UserExistsResponse,
            CheckPasswordResponse,
            auth::LoginPageData,
            params::Pagination,
            Meta,
            ApiResponse<ShopDto>,
            ApiResponse<CustomerDto>,
            ApiResponse<DashboardStats>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Form login, logout and the current principal"),
        (name = "Registration", description = "Shop and customer sign-up"),
        (name = "Shop", description = "Endpoints for the logged-in shop"),
        (name = "Customer", description = "Endpoints for the logged-in customer"),
        (name = "Public", description = "Anonymous storefront endpoints"),
        (name = "Admin", description = "Marketplace administration"),
        (name = "Debug", description = "Account diagnostics, disabled by default"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
