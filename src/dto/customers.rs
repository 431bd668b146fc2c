use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{Account, AccountProfile, two_places},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub preferred_payment_method: Option<String>,
    pub total_orders: i32,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<Account> for CustomerDto {
    type Error = AppError;

    fn try_from(account: Account) -> Result<Self, Self::Error> {
        let AccountProfile::Customer(customer) = account.profile else {
            return Err(AppError::Internal(anyhow::anyhow!(
                "account {} has no customer profile",
                account.id
            )));
        };
        Ok(Self {
            id: account.id,
            email: account.email,
            name: account.name,
            phone_number: account.phone_number,
            is_active: account.is_active,
            address: customer.address,
            city: customer.city,
            postal_code: customer.postal_code,
            date_of_birth: customer.date_of_birth,
            preferred_payment_method: customer.preferred_payment_method,
            total_orders: customer.total_orders,
            total_spent: two_places(customer.total_spent),
            created_at: account.created_at,
            updated_at: account.updated_at,
        })
    }
}

/// Replaces every whitelisted customer field; omitted optional fields are cleared.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdateRequest {
    pub name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub preferred_payment_method: Option<String>,
}

/// A completed order to fold into the customer's totals.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordOrderRequest {
    pub order_id: Uuid,
    #[schema(value_type = String, example = "49.90")]
    pub amount: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CustomerListQuery {
    /// Exact (case-insensitive) email lookup; other filters are ignored.
    pub email: Option<String>,
    pub city: Option<String>,
    pub active_only: Option<bool>,
    /// Only customers who spent at least this much, biggest spenders first.
    #[param(value_type = Option<String>)]
    pub min_spent: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerProfile;

    #[test]
    fn zero_spend_serializes_with_cents() {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: "casey@example.com".into(),
            name: "Casey".into(),
            phone_number: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            profile: AccountProfile::Customer(CustomerProfile {
                address: None,
                city: None,
                postal_code: None,
                date_of_birth: None,
                preferred_payment_method: None,
                total_orders: 0,
                total_spent: Decimal::ZERO,
            }),
        };

        let dto = CustomerDto::try_from(account).unwrap();
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["totalSpent"], "0.00");
        assert_eq!(json["totalOrders"], 0);
    }
}
