pub mod accounts;
pub mod activity_logs;
pub mod customer_profiles;
pub mod processed_orders;
pub mod shop_profiles;

pub use accounts::Entity as Accounts;
pub use activity_logs::Entity as ActivityLogs;
pub use customer_profiles::Entity as CustomerProfiles;
pub use processed_orders::Entity as ProcessedOrders;
pub use shop_profiles::Entity as ShopProfiles;
