pub mod account_service;
pub mod activity_log_service;
pub mod admin_service;
pub mod auth_service;
pub mod customer_service;
pub mod shop_service;
