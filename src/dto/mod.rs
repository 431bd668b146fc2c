pub mod activity_logs;
pub mod admin;
pub mod auth;
pub mod customers;
pub mod shops;
pub mod users;
