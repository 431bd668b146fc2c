//! Lookups and writes shared by every account kind.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QuerySelect, Set, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    dto::auth::Credentials,
    entity::{
        accounts::{ActiveModel as AccountActive, Column as AccountCol, Entity as Accounts, Model as AccountModel},
        customer_profiles::{Entity as CustomerProfiles, Model as CustomerModel},
        shop_profiles::{Entity as ShopProfiles, Model as ShopModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Account, Role},
};

pub async fn find_account_by_email<C>(conn: &C, email: &str) -> AppResult<Option<AccountModel>>
where
    C: ConnectionTrait,
{
    let account = Accounts::find()
        .filter(AccountCol::Email.eq(email))
        .one(conn)
        .await?;
    Ok(account)
}

/// Fails with `Conflict` if any account already uses `email`.
pub async fn ensure_email_available<C>(conn: &C, email: &str) -> AppResult<()>
where
    C: ConnectionTrait,
{
    if find_account_by_email(conn, email).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "An account with email {email} already exists"
        )));
    }
    Ok(())
}

pub async fn insert_account<C>(
    conn: &C,
    credentials: &Credentials,
    password_hash: String,
    role: Role,
    phone_number: Option<String>,
) -> AppResult<AccountModel>
where
    C: ConnectionTrait,
{
    let email = credentials.email.clone();
    AccountActive {
        id: Set(Uuid::new_v4()),
        email: Set(credentials.email.clone()),
        password_hash: Set(password_hash),
        name: Set(credentials.name.clone()),
        phone_number: Set(phone_number),
        role: Set(role.as_str().to_string()),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await
    .map_err(|err| {
        AppError::from_unique_violation(err, format!("An account with email {email} already exists"))
    })
}

pub async fn find_account<C>(conn: &C, id: Uuid) -> AppResult<AccountModel>
where
    C: ConnectionTrait,
{
    Accounts::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

/// Account row locked `FOR UPDATE` for the rest of the transaction.
pub async fn lock_account<C>(conn: &C, id: Uuid) -> AppResult<AccountModel>
where
    C: ConnectionTrait,
{
    Accounts::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

/// Shop profile and its account, both locked for update.
pub async fn lock_shop<C>(conn: &C, id: Uuid) -> AppResult<(AccountModel, ShopModel)>
where
    C: ConnectionTrait,
{
    // Postgres refuses FOR UPDATE across the outer join, so lock each row.
    let shop = ShopProfiles::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    let account = match lock_account(conn, id).await {
        Err(AppError::NotFound(_)) => return Err(orphaned_profile(id)),
        other => other?,
    };
    Ok((account, shop))
}

/// Customer profile and its account, both locked for update.
pub async fn lock_customer<C>(conn: &C, id: Uuid) -> AppResult<(AccountModel, CustomerModel)>
where
    C: ConnectionTrait,
{
    // Postgres refuses FOR UPDATE across the outer join, so lock each row.
    let customer = CustomerProfiles::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;
    let account = match lock_account(conn, id).await {
        Err(AppError::NotFound(_)) => return Err(orphaned_profile(id)),
        other => other?,
    };
    Ok((account, customer))
}

pub async fn load_shop<C>(conn: &C, id: Uuid) -> AppResult<Account>
where
    C: ConnectionTrait,
{
    let row = ShopProfiles::find_by_id(id)
        .find_also_related(Accounts)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    shop_from_row(row)
}

pub async fn load_customer<C>(conn: &C, id: Uuid) -> AppResult<Account>
where
    C: ConnectionTrait,
{
    let row = CustomerProfiles::find_by_id(id)
        .find_also_related(Accounts)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;
    customer_from_row(row)
}

pub fn shop_from_row((shop, account): (ShopModel, Option<AccountModel>)) -> AppResult<Account> {
    let account = account.ok_or_else(|| orphaned_profile(shop.account_id))?;
    Ok(Account::from_shop(account, shop))
}

pub fn customer_from_row(
    (customer, account): (CustomerModel, Option<AccountModel>),
) -> AppResult<Account> {
    let account = account.ok_or_else(|| orphaned_profile(customer.account_id))?;
    Ok(Account::from_customer(account, customer))
}

/// Bump `updated_at` on an account the caller already changed or locked.
pub fn touch(active: &mut AccountActive) {
    active.updated_at = Set(Utc::now().into());
}

pub fn parse_role(account: &AccountModel) -> AppResult<Role> {
    account.role.parse::<Role>().map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "account {} has unknown role {}",
            account.id,
            account.role
        ))
    })
}

/// Admins may manage any account; everyone else only their own.
pub fn can_manage(user: &AuthUser, account_id: Uuid, role: Role) -> bool {
    user.role == Role::Admin || (user.role == role && user.user_id == account_id)
}

fn orphaned_profile(id: Uuid) -> AppError {
    AppError::Internal(anyhow::anyhow!("profile {id} has no account row"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "u@example.com".into(),
            name: "U".into(),
            role,
        }
    }

    #[test]
    fn admins_manage_everyone() {
        let admin = user(Role::Admin);
        assert!(can_manage(&admin, Uuid::new_v4(), Role::Shop));
        assert!(can_manage(&admin, Uuid::new_v4(), Role::Customer));
    }

    #[test]
    fn owners_manage_only_themselves() {
        let shop = user(Role::Shop);
        assert!(can_manage(&shop, shop.user_id, Role::Shop));
        assert!(!can_manage(&shop, Uuid::new_v4(), Role::Shop));
        assert!(!can_manage(&shop, shop.user_id, Role::Customer));
    }
}
