use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Account, AccountProfile, ShopStatus, two_places},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopDto {
    pub id: Uuid,
    pub shop_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub phone_number: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    pub status: ShopStatus,
    pub rating: Decimal,
    pub total_orders: i32,
    pub owner_name: String,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Account> for ShopDto {
    type Error = AppError;

    fn try_from(account: Account) -> Result<Self, Self::Error> {
        let status = account.shop_status();
        let (AccountProfile::Shop(shop), Some(status)) = (account.profile, status) else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "account {} has no shop profile",
                account.id
            )));
        };
        Ok(Self {
            id: account.id,
            shop_name: shop.shop_name,
            description: shop.description,
            address: shop.address,
            city: shop.city,
            postal_code: shop.postal_code,
            phone_number: account.phone_number,
            is_approved: shop.is_approved,
            is_active: account.is_active,
            status,
            rating: two_places(shop.rating),
            total_orders: shop.total_orders,
            owner_name: account.name,
            owner_email: account.email,
            created_at: account.created_at,
            updated_at: account.updated_at,
        })
    }
}

/// Replaces every whitelisted shop field; omitted optional fields are cleared.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShopUpdateRequest {
    pub shop_name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShopRatingRequest {
    #[schema(value_type = String, example = "4.25")]
    pub rating: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShopSearchQuery {
    /// Only shops in this city.
    pub city: Option<String>,
    /// Substring of the shop name.
    pub q: Option<String>,
}
