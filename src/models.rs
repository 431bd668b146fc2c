use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{accounts, customer_profiles, shop_profiles},
    error::{AppError, AppResult},
};

/// Highest rating a shop can hold.
pub const MAX_RATING: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Shop,
    Customer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Shop, Role::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Shop => "SHOP",
            Role::Customer => "CUSTOMER",
        }
    }

    /// Landing page for a freshly logged-in account of this role.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Shop => "/shop/dashboard",
            Role::Customer => "/customer/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AppError::BadRequest(format!("unknown role `{value}`")))
    }
}

/// Lifecycle of a shop, derived from the approval and active flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShopStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopFlags {
    pub is_approved: bool,
    pub is_active: bool,
}

impl ShopFlags {
    /// Flags of a newly registered shop.
    pub fn pending() -> Self {
        Self {
            is_approved: false,
            is_active: true,
        }
    }

    pub fn status(self) -> ShopStatus {
        match (self.is_approved, self.is_active) {
            (true, _) => ShopStatus::Approved,
            (false, true) => ShopStatus::Pending,
            (false, false) => ShopStatus::Rejected,
        }
    }

    /// PENDING -> APPROVED. Only the approval flag moves.
    pub fn approve(self) -> AppResult<Self> {
        self.require_pending("approved")?;
        Ok(Self {
            is_approved: true,
            ..self
        })
    }

    /// PENDING -> REJECTED. Only the active flag moves.
    pub fn reject(self) -> AppResult<Self> {
        self.require_pending("rejected")?;
        Ok(Self {
            is_active: false,
            ..self
        })
    }

    fn require_pending(self, verb: &str) -> AppResult<()> {
        match self.status() {
            ShopStatus::Pending => Ok(()),
            other => Err(AppError::Conflict(format!(
                "Shop is {other:?} and cannot be {verb}"
            ))),
        }
    }
}

/// Fix a stored decimal to two places so zero reads back as `0.00`.
pub fn two_places(value: Decimal) -> Decimal {
    let mut value = value;
    value.rescale(2);
    value
}

/// Round a rating to two decimals, half-up, and check it is within 0..=5.
pub fn normalize_rating(raw: Decimal) -> AppResult<Decimal> {
    let mut rating = raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rating.rescale(2);
    if rating < Decimal::ZERO || rating > MAX_RATING {
        return Err(AppError::BadRequest(format!(
            "rating must be between 0 and 5, got {raw}"
        )));
    }
    Ok(rating)
}

/// Round an order amount to cents; it must stay strictly positive.
pub fn normalize_amount(raw: Decimal) -> AppResult<Decimal> {
    let mut amount = raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    if amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(format!(
            "order amount must be positive, got {raw}"
        )));
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopProfile {
    pub shop_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub is_approved: bool,
    pub rating: Decimal,
    pub total_orders: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerProfile {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub preferred_payment_method: Option<String>,
    pub total_orders: i32,
    pub total_spent: Decimal,
}

/// Role-specific data attached to an account. Admins carry no profile and
/// are handled as bare account rows.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountProfile {
    Shop(ShopProfile),
    Customer(CustomerProfile),
}

/// An identity record together with its role-specific profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: AccountProfile,
}

impl Account {
    pub fn shop(&self) -> Option<&ShopProfile> {
        match &self.profile {
            AccountProfile::Shop(shop) => Some(shop),
            _ => None,
        }
    }

    pub fn shop_status(&self) -> Option<ShopStatus> {
        self.shop().map(|shop| {
            ShopFlags {
                is_approved: shop.is_approved,
                is_active: self.is_active,
            }
            .status()
        })
    }

    pub fn from_shop(account: accounts::Model, shop: shop_profiles::Model) -> Self {
        Self::with_profile(
            account,
            AccountProfile::Shop(ShopProfile {
                shop_name: shop.shop_name,
                description: shop.description,
                address: shop.address,
                city: shop.city,
                postal_code: shop.postal_code,
                is_approved: shop.is_approved,
                rating: shop.rating,
                total_orders: shop.total_orders,
            }),
        )
    }

    pub fn from_customer(account: accounts::Model, customer: customer_profiles::Model) -> Self {
        Self::with_profile(
            account,
            AccountProfile::Customer(CustomerProfile {
                address: customer.address,
                city: customer.city,
                postal_code: customer.postal_code,
                date_of_birth: customer.date_of_birth,
                preferred_payment_method: customer.preferred_payment_method,
                total_orders: customer.total_orders,
                total_spent: customer.total_spent,
            }),
        )
    }

    fn with_profile(account: accounts::Model, profile: AccountProfile) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            phone_number: account.phone_number,
            is_active: account.is_active,
            created_at: account.created_at.with_timezone(&Utc),
            updated_at: account.updated_at.with_timezone(&Utc),
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Shop".parse::<Role>().unwrap(), Role::Shop);
        assert_eq!("CUSTOMER".parse::<Role>().unwrap(), Role::Customer);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn new_shop_is_pending_and_unapproved() {
        let flags = ShopFlags::pending();
        assert!(!flags.is_approved);
        assert!(flags.is_active);
        assert_eq!(flags.status(), ShopStatus::Pending);
    }

    #[test]
    fn approve_only_touches_the_approval_flag() {
        let approved = ShopFlags::pending().approve().unwrap();
        assert!(approved.is_approved);
        assert!(approved.is_active);
        assert_eq!(approved.status(), ShopStatus::Approved);
    }

    #[test]
    fn reject_only_touches_the_active_flag() {
        let rejected = ShopFlags::pending().reject().unwrap();
        assert!(!rejected.is_approved);
        assert!(!rejected.is_active);
        assert_eq!(rejected.status(), ShopStatus::Rejected);
    }

    #[test]
    fn terminal_states_do_not_transition() {
        let approved = ShopFlags::pending().approve().unwrap();
        let rejected = ShopFlags::pending().reject().unwrap();
        assert!(matches!(approved.approve(), Err(AppError::Conflict(_))));
        assert!(matches!(approved.reject(), Err(AppError::Conflict(_))));
        assert!(matches!(rejected.approve(), Err(AppError::Conflict(_))));
        assert!(matches!(rejected.reject(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn rating_rounds_half_up_on_the_decimal_value() {
        assert_eq!(normalize_rating(dec("4.005")).unwrap(), dec("4.01"));
        assert_eq!(normalize_rating(dec("4.004")).unwrap(), dec("4.00"));
        assert_eq!(normalize_rating(dec("3.125")).unwrap(), dec("3.13"));
        assert_eq!(normalize_rating(dec("4")).unwrap().to_string(), "4.00");
        assert_eq!(normalize_rating(dec("4.50")).unwrap().to_string(), "4.50");
    }

    #[test]
    fn rating_outside_range_is_rejected() {
        assert!(normalize_rating(dec("-0.01")).is_err());
        assert!(normalize_rating(dec("5.01")).is_err());
        assert_eq!(normalize_rating(dec("5.004")).unwrap(), dec("5.00"));
        assert_eq!(normalize_rating(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn order_amount_must_be_positive() {
        assert_eq!(normalize_amount(dec("19.995")).unwrap(), dec("20.00"));
        assert_eq!(two_places(Decimal::ZERO).to_string(), "0.00");
        assert_eq!(two_places(dec("12.5")).to_string(), "12.50");
        assert!(normalize_amount(Decimal::ZERO).is_err());
        assert!(normalize_amount(dec("-3")).is_err());
        assert!(normalize_amount(dec("0.004")).is_err());
    }
}
