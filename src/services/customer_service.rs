use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use crate::{
    audit::{AuditContext, NewActivity, log_activity},
    dto::{
        auth::{Credentials, RegisterCustomerRequest, normalize_email},
        customers::{CustomerDto, CustomerListQuery, CustomerUpdateRequest, RecordOrderRequest},
    },
    entity::{
        accounts::{ActiveModel as AccountActive, Column as AccountCol, Entity as Accounts},
        customer_profiles::{
            ActiveModel as CustomerActive, Column as CustomerCol, Entity as CustomerProfiles,
        },
        processed_orders::{
            ActiveModel as ProcessedActive, Column as ProcessedCol, Entity as ProcessedOrders,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Account, Role, normalize_amount},
    response::{ApiResponse, Meta},
    services::account_service::{
        can_manage, customer_from_row, ensure_email_available, insert_account, load_customer,
        lock_customer, touch,
    },
    state::AppState,
};

const ENTITY: &str = "CUSTOMER";

pub async fn register_customer(
    state: &AppState,
    ctx: &AuditContext,
    payload: RegisterCustomerRequest,
) -> AppResult<ApiResponse<CustomerDto>> {
    let credentials = Credentials::parse(&payload.email, &payload.password, &payload.name)?;
    let password_hash = state.passwords.encode(&credentials.password)?;

    let txn = state.orm.begin().await?;
    ensure_email_available(&txn, &credentials.email).await?;

    let account = insert_account(
        &txn,
        &credentials,
        password_hash,
        Role::Customer,
        payload.phone_number,
    )
    .await?;

    let customer = CustomerActive {
        account_id: Set(account.id),
        address: Set(payload.address),
        city: Set(payload.city),
        postal_code: Set(payload.postal_code),
        date_of_birth: Set(payload.date_of_birth),
        preferred_payment_method: Set(payload.preferred_payment_method),
        total_orders: Set(0),
        total_spent: Set(Decimal::ZERO),
    }
    .insert(&txn)
    .await?;

    log_activity(
        &txn,
        &ctx.acting_as(account.id),
        NewActivity::on(
            "CUSTOMER_REGISTERED",
            format!("Customer registered: {}", account.email),
            ENTITY,
            account.id,
        ),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(customer_id = %account.id, "customer registered");
    let dto = CustomerDto::try_from(Account::from_customer(account, customer))?;
    Ok(ApiResponse::success(
        "Customer registered",
        dto,
        Some(Meta::empty()),
    ))
}

pub async fn update_customer(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
    payload: CustomerUpdateRequest,
) -> AppResult<ApiResponse<CustomerDto>> {
    if !can_manage(user, id, Role::Customer) {
        return Err(AppError::Forbidden);
    }
    let txn = state.orm.begin().await?;
    let (account, customer) = lock_customer(&txn, id).await?;

    let mut account_active: AccountActive = account.into();
    let mut customer_active: CustomerActive = customer.into();
    apply_customer_update(payload, &mut account_active, &mut customer_active)?;
    touch(&mut account_active);

    let account = account_active.update(&txn).await?;
    let customer = customer_active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "CUSTOMER_UPDATED",
            format!("Customer updated: {}", account.email),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    let dto = CustomerDto::try_from(Account::from_customer(account, customer))?;
    Ok(ApiResponse::success("Customer updated", dto, Some(Meta::empty())))
}

pub async fn deactivate_customer(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
) -> AppResult<ApiResponse<CustomerDto>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let (account, customer) = lock_customer(&txn, id).await?;

    let mut account_active: AccountActive = account.into();
    account_active.is_active = Set(false);
    touch(&mut account_active);
    let account = account_active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "CUSTOMER_DEACTIVATED",
            format!("Customer deactivated: {}", account.email),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    state.sessions.revoke(id).await;
    tracing::info!(customer_id = %id, admin_id = %user.user_id, "customer deactivated");
    let dto = CustomerDto::try_from(Account::from_customer(account, customer))?;
    Ok(ApiResponse::success(
        "Customer deactivated",
        dto,
        Some(Meta::empty()),
    ))
}

/// Fold one completed order into the customer's totals.
///
/// Each `order_id` is counted once: replaying an order already in the ledger
/// returns the customer unchanged.
pub async fn update_customer_stats(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
    payload: RecordOrderRequest,
) -> AppResult<ApiResponse<CustomerDto>> {
    ensure_admin(user)?;
    let amount = normalize_amount(payload.amount)?;

    let txn = state.orm.begin().await?;
    lock_customer(&txn, id).await?;

    let inserted = ProcessedOrders::insert(ProcessedActive {
        order_id: Set(payload.order_id),
        customer_id: Set(id),
        amount: Set(amount),
        processed_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(ProcessedCol::OrderId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    if inserted == 0 {
        let existing = ProcessedOrders::find_by_id(payload.order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;
        if existing.customer_id != id {
            return Err(AppError::Conflict(format!(
                "Order {} was already recorded for another customer",
                payload.order_id
            )));
        }
        let account = load_customer(&txn, id).await?;
        txn.commit().await?;
        tracing::debug!(customer_id = %id, order_id = %payload.order_id, "order already counted");
        return Ok(ApiResponse::success(
            "Order already recorded",
            CustomerDto::try_from(account)?,
            Some(Meta::empty()),
        ));
    }

    CustomerProfiles::update_many()
        .col_expr(
            CustomerCol::TotalOrders,
            Expr::col(CustomerCol::TotalOrders).add(1),
        )
        .col_expr(
            CustomerCol::TotalSpent,
            Expr::col(CustomerCol::TotalSpent).add(amount),
        )
        .filter(CustomerCol::AccountId.eq(id))
        .exec(&txn)
        .await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "CUSTOMER_ORDER_RECORDED",
            format!("Order {} recorded, amount {}", payload.order_id, amount),
            ENTITY,
            id,
        ),
    )
    .await?;
    let account = load_customer(&txn, id).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Order recorded",
        CustomerDto::try_from(account)?,
        Some(Meta::empty()),
    ))
}

pub async fn get_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CustomerDto>> {
    if !can_manage(user, id, Role::Customer) {
        return Err(AppError::Forbidden);
    }
    let account = load_customer(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Customer found",
        CustomerDto::try_from(account)?,
        Some(Meta::empty()),
    ))
}

pub async fn find_customer_by_email(
    state: &AppState,
    user: &AuthUser,
    email: &str,
) -> AppResult<ApiResponse<CustomerDto>> {
    ensure_admin(user)?;
    let row = CustomerProfiles::find()
        .find_also_related(Accounts)
        .filter(AccountCol::Email.eq(normalize_email(email)))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;
    Ok(ApiResponse::success(
        "Customer found",
        CustomerDto::try_from(customer_from_row(row)?)?,
        Some(Meta::empty()),
    ))
}

/// Admin listing. With `email` set this is a single-customer lookup; the
/// other filters narrow the list.
pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    query: CustomerListQuery,
) -> AppResult<ApiResponse<Vec<CustomerDto>>> {
    ensure_admin(user)?;
    if let Some(email) = query.email.as_deref().filter(|e| !e.trim().is_empty()) {
        let found = find_customer_by_email(state, user, email).await?;
        return Ok(ApiResponse::list(
            "Customers",
            found.into_data().into_iter().collect(),
        ));
    }

    let filter = CustomerFilter {
        city: query.city.filter(|c| !c.trim().is_empty()),
        active_only: query.active_only.unwrap_or(false),
        min_spent: query.min_spent,
    };
    let customers = fetch_customers(state, filter).await?;
    Ok(ApiResponse::list("Customers", customers))
}

pub async fn list_active_customers(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<CustomerDto>>> {
    list_customers(
        state,
        user,
        CustomerListQuery {
            active_only: Some(true),
            ..CustomerListQuery::default()
        },
    )
    .await
}

/// Active customers in `city`.
pub async fn list_customers_by_city(
    state: &AppState,
    user: &AuthUser,
    city: &str,
) -> AppResult<ApiResponse<Vec<CustomerDto>>> {
    list_customers(
        state,
        user,
        CustomerListQuery {
            city: Some(city.to_string()),
            active_only: Some(true),
            ..CustomerListQuery::default()
        },
    )
    .await
}

pub async fn list_top_customers(
    state: &AppState,
    user: &AuthUser,
    min_spent: Decimal,
) -> AppResult<ApiResponse<Vec<CustomerDto>>> {
    list_customers(
        state,
        user,
        CustomerListQuery {
            min_spent: Some(min_spent),
            ..CustomerListQuery::default()
        },
    )
    .await
}

#[derive(Debug, Default)]
struct CustomerFilter {
    city: Option<String>,
    active_only: bool,
    min_spent: Option<Decimal>,
}

async fn fetch_customers(state: &AppState, filter: CustomerFilter) -> AppResult<Vec<CustomerDto>> {
    let mut finder = CustomerProfiles::find().find_also_related(Accounts);
    if let Some(city) = filter.city {
        finder = finder.filter(CustomerCol::City.eq(city.trim()));
    }
    if filter.active_only {
        finder = finder.filter(AccountCol::IsActive.eq(true));
    }
    finder = match filter.min_spent {
        Some(min_spent) => finder
            .filter(CustomerCol::TotalSpent.gte(min_spent))
            .order_by_desc(CustomerCol::TotalSpent),
        None => finder.order_by_desc(AccountCol::CreatedAt),
    };

    finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| customer_from_row(row).and_then(CustomerDto::try_from))
        .collect()
}

/// Overwrite exactly the whitelisted customer fields. Email, password, active
/// flag and the order totals stay untouched.
pub(crate) fn apply_customer_update(
    update: CustomerUpdateRequest,
    account: &mut AccountActive,
    customer: &mut CustomerActive,
) -> AppResult<()> {
    let name = update.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    account.name = Set(name.to_string());
    account.phone_number = Set(update.phone_number);
    customer.address = Set(update.address);
    customer.city = Set(update.city);
    customer.postal_code = Set(update.postal_code);
    customer.date_of_birth = Set(update.date_of_birth);
    customer.preferred_payment_method = Set(update.preferred_payment_method);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use sea_orm::{ActiveValue, IntoActiveModel};

    use super::*;
    use crate::entity::{accounts, customer_profiles};

    fn account() -> accounts::Model {
        let now = Utc::now().into();
        accounts::Model {
            id: Uuid::new_v4(),
            email: "cust@example.com".into(),
            password_hash: "hash".into(),
            name: "Old Name".into(),
            phone_number: None,
            role: "CUSTOMER".into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn customer(account_id: Uuid) -> customer_profiles::Model {
        customer_profiles::Model {
            account_id,
            address: None,
            city: Some("Oldtown".into()),
            postal_code: None,
            date_of_birth: None,
            preferred_payment_method: Some("CARD".into()),
            total_orders: 3,
            total_spent: Decimal::new(12050, 2),
        }
    }

    fn update() -> CustomerUpdateRequest {
        CustomerUpdateRequest {
            name: "New Name".into(),
            phone_number: Some("555-0142".into()),
            address: Some("9 Elm St".into()),
            city: Some("Newtown".into()),
            postal_code: Some("22222".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 1),
            preferred_payment_method: None,
        }
    }

    #[test]
    fn update_overwrites_whitelisted_fields() {
        let account = account();
        let mut account_active = account.clone().into_active_model();
        let mut customer_active = customer(account.id).into_active_model();

        apply_customer_update(update(), &mut account_active, &mut customer_active).unwrap();

        assert!(matches!(&account_active.name, ActiveValue::Set(n) if n == "New Name"));
        assert!(
            matches!(&account_active.phone_number, ActiveValue::Set(Some(p)) if p == "555-0142")
        );
        assert!(matches!(&customer_active.city, ActiveValue::Set(Some(c)) if c == "Newtown"));
        assert!(matches!(
            customer_active.date_of_birth,
            ActiveValue::Set(Some(d)) if d == NaiveDate::from_ymd_opt(1990, 4, 1).unwrap()
        ));
        assert!(matches!(
            &customer_active.preferred_payment_method,
            ActiveValue::Set(None)
        ));
    }

    #[test]
    fn update_preserves_totals_and_credentials() {
        let account = account();
        let mut account_active = account.clone().into_active_model();
        let mut customer_active = customer(account.id).into_active_model();

        apply_customer_update(update(), &mut account_active, &mut customer_active).unwrap();

        assert!(matches!(customer_active.total_orders, ActiveValue::Unchanged(3)));
        assert!(matches!(
            customer_active.total_spent,
            ActiveValue::Unchanged(s) if s == Decimal::new(12050, 2)
        ));
        assert!(matches!(&account_active.email, ActiveValue::Unchanged(e) if e == "cust@example.com"));
        assert!(matches!(account_active.is_active, ActiveValue::Unchanged(true)));
        assert!(matches!(&account_active.role, ActiveValue::Unchanged(r) if r == "CUSTOMER"));
    }

    #[test]
    fn update_requires_a_name() {
        let account = account();
        let mut account_active = account.clone().into_active_model();
        let mut customer_active = customer(account.id).into_active_model();
        let blank = CustomerUpdateRequest {
            name: " ".into(),
            ..update()
        };
        assert!(matches!(
            apply_customer_update(blank, &mut account_active, &mut customer_active),
            Err(AppError::BadRequest(_))
        ));
    }
}
