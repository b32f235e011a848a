use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{DashboardStats, UserList},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{Column as OrderCol, Entity as Orders},
        products::Entity as Products,
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::order_service::order_from_entity,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

/// Delete a user and everything that hangs off it: cart rows first, then the
/// user row (orders and their lines follow through the cascade rules), all in
/// one transaction. Deleting your own account is rejected up front.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    target: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    if target == user.user_id {
        return Err(AppError::Validation("cannot delete own account".into()));
    }

    let txn = state.orm.begin().await?;

    if Users::find_by_id(target).one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(target))
        .exec(&txn)
        .await?;

    Users::delete_by_id(target).exec(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "user_delete",
        Some("users"),
        Some(serde_json::json!({ "target_user_id": target })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn dashboard_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let total_products = Products::find().count(&state.orm).await? as i64;
    let total_orders = Orders::find().count(&state.orm).await? as i64;
    let total_users = Users::find().count(&state.orm).await? as i64;

    let today = Utc::now().date_naive();
    let midnight = chrono::TimeZone::from_utc_datetime(
        &Utc,
        &today.and_hms_opt(0, 0, 0).unwrap_or_default(),
    );

    let todays_orders = Orders::find()
        .filter(OrderCol::CreatedAt.gte(midnight))
        .all(&state.orm)
        .await?;
    let today_income: Decimal = todays_orders.iter().map(|o| o.total).sum();

    let recent_orders = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .limit(5)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let stats = DashboardStats {
        total_products,
        total_orders,
        total_users,
        today_income: today_income.round_dp(2),
        recent_orders,
    };

    Ok(ApiResponse::success("Stats", stats, Some(Meta::empty())))
}

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password_hash,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
