use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, Func, LikeExpr},
};
use uuid::Uuid;

use crate::{
    audit::{AuditContext, NewActivity, log_activity},
    dto::{
        auth::{Credentials, RegisterShopRequest},
        shops::{ShopDto, ShopRatingRequest, ShopSearchQuery, ShopUpdateRequest},
    },
    entity::{
        accounts::{
            ActiveModel as AccountActive, Column as AccountCol, Entity as Accounts,
        },
        shop_profiles::{
            ActiveModel as ShopActive, Column as ShopCol, Entity as ShopProfiles,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Account, Role, ShopFlags, normalize_rating},
    response::{ApiResponse, Meta},
    services::account_service::{
        can_manage, ensure_email_available, insert_account, load_shop, lock_shop, shop_from_row,
        touch,
    },
    state::AppState,
};

const ENTITY: &str = "SHOP";

pub async fn register_shop(
    state: &AppState,
    ctx: &AuditContext,
    payload: RegisterShopRequest,
) -> AppResult<ApiResponse<ShopDto>> {
    let credentials = Credentials::parse(&payload.email, &payload.password, &payload.name)?;
    let shop_name = required_shop_name(&payload.shop_name)?;
    let password_hash = state.passwords.encode(&credentials.password)?;

    let txn = state.orm.begin().await?;
    ensure_email_available(&txn, &credentials.email).await?;

    let account = insert_account(
        &txn,
        &credentials,
        password_hash,
        Role::Shop,
        payload.phone_number,
    )
    .await?;

    let flags = ShopFlags::pending();
    let shop = ShopActive {
        account_id: Set(account.id),
        shop_name: Set(shop_name),
        description: Set(payload.description),
        address: Set(payload.address),
        city: Set(payload.city),
        postal_code: Set(payload.postal_code),
        is_approved: Set(flags.is_approved),
        rating: Set(Decimal::ZERO),
        total_orders: Set(0),
    }
    .insert(&txn)
    .await?;

    log_activity(
        &txn,
        &ctx.acting_as(account.id),
        NewActivity::on(
            "SHOP_REGISTERED",
            format!("Shop registered: {}", shop.shop_name),
            ENTITY,
            account.id,
        ),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(shop_id = %account.id, "shop registered, awaiting approval");
    let dto = ShopDto::try_from(Account::from_shop(account, shop))?;
    Ok(ApiResponse::success("Shop registered", dto, Some(Meta::empty())))
}

pub async fn approve_shop(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
) -> AppResult<ApiResponse<ShopDto>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let (account, shop) = lock_shop(&txn, id).await?;

    let flags = ShopFlags {
        is_approved: shop.is_approved,
        is_active: account.is_active,
    }
    .approve()?;

    let mut shop_active: ShopActive = shop.into();
    shop_active.is_approved = Set(flags.is_approved);
    let shop = shop_active.update(&txn).await?;

    let mut account_active: AccountActive = account.into();
    touch(&mut account_active);
    let account = account_active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "SHOP_APPROVED",
            format!("Shop approved: {}", shop.shop_name),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    tracing::info!(shop_id = %id, admin_id = %user.user_id, "shop approved");
    let dto = ShopDto::try_from(Account::from_shop(account, shop))?;
    Ok(ApiResponse::success("Shop approved", dto, Some(Meta::empty())))
}

pub async fn reject_shop(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
) -> AppResult<ApiResponse<ShopDto>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let (account, shop) = lock_shop(&txn, id).await?;

    let flags = ShopFlags {
        is_approved: shop.is_approved,
        is_active: account.is_active,
    }
    .reject()?;

    let mut account_active: AccountActive = account.into();
    account_active.is_active = Set(flags.is_active);
    touch(&mut account_active);
    let account = account_active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "SHOP_REJECTED",
            format!("Shop rejected: {}", shop.shop_name),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    state.sessions.revoke(id).await;
    tracing::info!(shop_id = %id, admin_id = %user.user_id, "shop rejected");
    let dto = ShopDto::try_from(Account::from_shop(account, shop))?;
    Ok(ApiResponse::success("Shop rejected", dto, Some(Meta::empty())))
}

pub async fn update_shop(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
    payload: ShopUpdateRequest,
) -> AppResult<ApiResponse<ShopDto>> {
    if !can_manage(user, id, Role::Shop) {
        return Err(AppError::Forbidden);
    }
    let txn = state.orm.begin().await?;
    let (account, shop) = lock_shop(&txn, id).await?;

    let mut account_active: AccountActive = account.into();
    let mut shop_active: ShopActive = shop.into();
    apply_shop_update(payload, &mut account_active, &mut shop_active)?;
    touch(&mut account_active);

    let account = account_active.update(&txn).await?;
    let shop = shop_active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "SHOP_UPDATED",
            format!("Shop updated: {}", shop.shop_name),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    let dto = ShopDto::try_from(Account::from_shop(account, shop))?;
    Ok(ApiResponse::success("Shop updated", dto, Some(Meta::empty())))
}

pub async fn update_shop_rating(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
    payload: ShopRatingRequest,
) -> AppResult<ApiResponse<ShopDto>> {
    ensure_admin(user)?;
    let rating = normalize_rating(payload.rating)?;

    let txn = state.orm.begin().await?;
    let (account, shop) = lock_shop(&txn, id).await?;

    let mut shop_active: ShopActive = shop.into();
    shop_active.rating = Set(rating);
    let shop = shop_active.update(&txn).await?;

    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "SHOP_RATING_UPDATED",
            format!("Shop {} rated {}", shop.shop_name, rating),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    let dto = ShopDto::try_from(Account::from_shop(account, shop))?;
    Ok(ApiResponse::success("Rating updated", dto, Some(Meta::empty())))
}

/// Count one more completed order for the shop.
pub async fn increment_shop_orders(
    state: &AppState,
    user: &AuthUser,
    ctx: &AuditContext,
    id: Uuid,
) -> AppResult<ApiResponse<ShopDto>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let result = ShopProfiles::update_many()
        .col_expr(ShopCol::TotalOrders, Expr::col(ShopCol::TotalOrders).add(1))
        .filter(ShopCol::AccountId.eq(id))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Shop"));
    }

    let account = load_shop(&txn, id).await?;
    let shop_name = account
        .shop()
        .map(|shop| shop.shop_name.clone())
        .unwrap_or_default();
    log_activity(
        &txn,
        ctx,
        NewActivity::on(
            "SHOP_ORDER_RECORDED",
            format!("Order recorded for shop {shop_name}"),
            ENTITY,
            id,
        ),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Order recorded",
        ShopDto::try_from(account)?,
        Some(Meta::empty()),
    ))
}

pub async fn get_shop(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ShopDto>> {
    if !can_manage(user, id, Role::Shop) {
        return Err(AppError::Forbidden);
    }
    let account = load_shop(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Shop found",
        ShopDto::try_from(account)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_shops(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Vec<ShopDto>>> {
    ensure_admin(user)?;
    let shops = fetch_shops(state, ShopFilter::All).await?;
    Ok(ApiResponse::list("Shops", shops))
}

/// Shops waiting for a decision: not approved and still active.
pub async fn list_pending_shops(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<ShopDto>>> {
    ensure_admin(user)?;
    let shops = fetch_shops(state, ShopFilter::Pending).await?;
    Ok(ApiResponse::list("Pending shops", shops))
}

/// Storefront listing: approved and active shops, optionally narrowed by city
/// and a name substring.
pub async fn list_approved_shops(
    state: &AppState,
    query: ShopSearchQuery,
) -> AppResult<ApiResponse<Vec<ShopDto>>> {
    let city = query.city.filter(|c| !c.trim().is_empty());
    let name = query.q.filter(|q| !q.trim().is_empty());
    let shops = fetch_shops(state, ShopFilter::Approved { city, name }).await?;
    Ok(ApiResponse::list("Shops", shops))
}

pub async fn list_shops_by_city(
    state: &AppState,
    city: &str,
) -> AppResult<ApiResponse<Vec<ShopDto>>> {
    list_approved_shops(
        state,
        ShopSearchQuery {
            city: Some(city.to_string()),
            q: None,
        },
    )
    .await
}

pub async fn search_shops_by_name(
    state: &AppState,
    name: &str,
) -> AppResult<ApiResponse<Vec<ShopDto>>> {
    list_approved_shops(
        state,
        ShopSearchQuery {
            city: None,
            q: Some(name.to_string()),
        },
    )
    .await
}

pub(crate) enum ShopFilter {
    All,
    Pending,
    Approved {
        city: Option<String>,
        name: Option<String>,
    },
}

pub(crate) async fn fetch_shops(state: &AppState, filter: ShopFilter) -> AppResult<Vec<ShopDto>> {
    let mut finder = ShopProfiles::find().find_also_related(Accounts);
    finder = match filter {
        ShopFilter::All => finder,
        ShopFilter::Pending => finder
            .filter(ShopCol::IsApproved.eq(false))
            .filter(AccountCol::IsActive.eq(true)),
        ShopFilter::Approved { city, name } => {
            let mut finder = finder
                .filter(ShopCol::IsApproved.eq(true))
                .filter(AccountCol::IsActive.eq(true));
            if let Some(city) = city {
                finder = finder.filter(ShopCol::City.eq(city.trim()));
            }
            if let Some(name) = name {
                let pattern = format!("%{}%", escape_like(&name.trim().to_lowercase()));
                finder = finder.filter(
                    Expr::expr(Func::lower(Expr::col((ShopProfiles, ShopCol::ShopName))))
                        .like(LikeExpr::new(pattern).escape('\\')),
                );
            }
            finder
        }
    };

    finder
        .order_by_desc(AccountCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| shop_from_row(row).and_then(ShopDto::try_from))
        .collect()
}

/// Make `%` and `_` match literally inside a LIKE pattern escaped with `\`.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn required_shop_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("shop name is required".into()));
    }
    Ok(name.to_string())
}

/// Overwrite exactly the whitelisted shop fields. Approval, rating, order
/// count and credentials stay untouched.
pub(crate) fn apply_shop_update(
    update: ShopUpdateRequest,
    account: &mut AccountActive,
    shop: &mut ShopActive,
) -> AppResult<()> {
    shop.shop_name = Set(required_shop_name(&update.shop_name)?);
    shop.description = Set(update.description);
    shop.address = Set(update.address);
    shop.city = Set(update.city);
    shop.postal_code = Set(update.postal_code);
    account.phone_number = Set(update.phone_number);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{ActiveValue, IntoActiveModel};

    use super::*;
    use crate::entity::{accounts, shop_profiles};

    fn account() -> accounts::Model {
        let now = Utc::now().into();
        accounts::Model {
            id: Uuid::new_v4(),
            email: "shop@example.com".into(),
            password_hash: "hash".into(),
            name: "Owner".into(),
            phone_number: Some("555-0100".into()),
            role: "SHOP".into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn shop(account_id: Uuid) -> shop_profiles::Model {
        shop_profiles::Model {
            account_id,
            shop_name: "Old Name".into(),
            description: Some("old".into()),
            address: Some("1 Old Rd".into()),
            city: Some("Oldtown".into()),
            postal_code: Some("00000".into()),
            is_approved: true,
            rating: Decimal::new(425, 2),
            total_orders: 7,
        }
    }

    fn update() -> ShopUpdateRequest {
        ShopUpdateRequest {
            shop_name: "  New Name ".into(),
            description: None,
            address: Some("2 New St".into()),
            city: Some("Newtown".into()),
            postal_code: Some("11111".into()),
            phone_number: Some("555-0199".into()),
        }
    }

    #[test]
    fn update_overwrites_whitelisted_fields() {
        let account = account();
        let mut account_active = account.clone().into_active_model();
        let mut shop_active = shop(account.id).into_active_model();

        apply_shop_update(update(), &mut account_active, &mut shop_active).unwrap();

        assert!(matches!(&shop_active.shop_name, ActiveValue::Set(n) if n == "New Name"));
        assert!(matches!(&shop_active.description, ActiveValue::Set(None)));
        assert!(matches!(&shop_active.address, ActiveValue::Set(Some(a)) if a == "2 New St"));
        assert!(matches!(&shop_active.city, ActiveValue::Set(Some(c)) if c == "Newtown"));
        assert!(matches!(&shop_active.postal_code, ActiveValue::Set(Some(p)) if p == "11111"));
        assert!(
            matches!(&account_active.phone_number, ActiveValue::Set(Some(p)) if p == "555-0199")
        );
    }

    #[test]
    fn update_preserves_everything_else() {
        let account = account();
        let mut account_active = account.clone().into_active_model();
        let mut shop_active = shop(account.id).into_active_model();

        apply_shop_update(update(), &mut account_active, &mut shop_active).unwrap();

        assert!(matches!(shop_active.is_approved, ActiveValue::Unchanged(true)));
        assert!(matches!(shop_active.total_orders, ActiveValue::Unchanged(7)));
        assert!(matches!(shop_active.rating, ActiveValue::Unchanged(r) if r == Decimal::new(425, 2)));
        assert!(matches!(&account_active.email, ActiveValue::Unchanged(e) if e == "shop@example.com"));
        assert!(matches!(&account_active.name, ActiveValue::Unchanged(n) if n == "Owner"));
        assert!(matches!(account_active.is_active, ActiveValue::Unchanged(true)));
        assert!(matches!(&account_active.password_hash, ActiveValue::Unchanged(h) if h == "hash"));
    }

    #[test]
    fn update_requires_a_shop_name() {
        let account = account();
        let mut account_active = account.clone().into_active_model();
        let mut shop_active = shop(account.id).into_active_model();
        let blank = ShopUpdateRequest {
            shop_name: "   ".into(),
            ..update()
        };

        let err = apply_shop_update(blank, &mut account_active, &mut shop_active).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(matches!(&shop_active.shop_name, ActiveValue::Unchanged(n) if n == "Old Name"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("corner shop"), "corner shop");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
    }
}
