use marketplace_api::{
    audit::{AuditContext, NewActivity, log_activity},
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::auth::{Credentials, RegisterCustomerRequest, RegisterShopRequest},
    middleware::auth::AuthUser,
    models::Role,
    password::encoder_for,
    services::{
        account_service::{find_account_by_email, insert_account},
        customer_service, shop_service,
    },
    state::AppState,
};
use sea_orm::TransactionTrait;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let state = AppState::new(&pool, encoder_for(config.password_encoding));
    let ctx = AuditContext::system();

    let admin = ensure_admin(&state, &ctx, "admin@example.com", "admin123").await?;
    let shop_id = ensure_shop(&state, &ctx, &admin).await?;
    let customer_id = ensure_customer(&state, &ctx).await?;

    println!(
        "Seed completed. Admin ID: {}, Shop ID: {shop_id}, Customer ID: {customer_id}",
        admin.user_id
    );
    Ok(())
}

async fn ensure_admin(
    state: &AppState,
    ctx: &AuditContext,
    email: &str,
    password: &str,
) -> anyhow::Result<AuthUser> {
    let account = match find_account_by_email(&state.orm, email).await? {
        Some(account) => account,
        None => {
            let credentials = Credentials::parse(email, password, "Administrator")?;
            let password_hash = state.passwords.encode(&credentials.password)?;
            let txn = state.orm.begin().await?;
            let account =
                insert_account(&txn, &credentials, password_hash, Role::Admin, None).await?;
            log_activity(
                &txn,
                ctx,
                NewActivity::on(
                    "ADMIN_CREATED",
                    format!("Admin account seeded: {email}"),
                    "USER",
                    account.id,
                ),
            )
            .await?;
            txn.commit().await?;
            account
        }
    };
    Ok(AuthUser {
        user_id: account.id,
        email: account.email,
        name: account.name,
        role: Role::Admin,
    })
}

async fn ensure_shop(
    state: &AppState,
    ctx: &AuditContext,
    admin: &AuthUser,
) -> anyhow::Result<Uuid> {
    let email = "shop@example.com";
    if let Some(account) = find_account_by_email(&state.orm, email).await? {
        return Ok(account.id);
    }

    let registered = shop_service::register_shop(
        state,
        ctx,
        RegisterShopRequest {
            email: email.into(),
            password: "shop123".into(),
            name: "Sample Owner".into(),
            phone_number: Some("555-0100".into()),
            shop_name: "Sample Shop".into(),
            description: Some("Seeded shop".into()),
            address: Some("1 Market Street".into()),
            city: Some("Springfield".into()),
            postal_code: Some("12345".into()),
        },
    )
    .await?;
    let shop = registered
        .into_data()
        .ok_or_else(|| anyhow::anyhow!("shop registration returned no data"))?;

    shop_service::approve_shop(state, admin, &ctx.acting_as(admin.user_id), shop.id).await?;
    Ok(shop.id)
}

async fn ensure_customer(state: &AppState, ctx: &AuditContext) -> anyhow::Result<Uuid> {
    let email = "customer@example.com";
    if let Some(account) = find_account_by_email(&state.orm, email).await? {
        return Ok(account.id);
    }

    let registered = customer_service::register_customer(
        state,
        ctx,
        RegisterCustomerRequest {
            email: email.into(),
            password: "customer123".into(),
            name: "Sample Customer".into(),
            phone_number: None,
            address: Some("2 Elm Street".into()),
            city: Some("Springfield".into()),
            postal_code: Some("12345".into()),
            date_of_birth: None,
            preferred_payment_method: Some("CARD".into()),
        },
    )
    .await?;
    let customer = registered
        .into_data()
        .ok_or_else(|| anyhow::anyhow!("customer registration returned no data"))?;
    Ok(customer.id)
}
