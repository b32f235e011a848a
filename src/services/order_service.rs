use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithLines, TransitionOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_lines::{
            ActiveModel as OrderLineActive, Column as OrderLineCol, Entity as OrderLines,
            Model as OrderLineModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderLine, OrderStatus, ProductStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Create an order from an explicit set of lines. Unit prices are taken as
/// given (the snapshot is the caller's), no stock is touched.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    if payload.lines.is_empty() {
        return Err(AppError::Validation(
            "order must contain at least one line".into(),
        ));
    }
    for line in &payload.lines {
        if line.quantity <= 0 {
            return Err(AppError::Validation(
                "line quantity must be positive".into(),
            ));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(AppError::Validation(
                "line unit price must not be negative".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    if Users::find_by_id(user.user_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let mut product_ids: Vec<Uuid> = payload.lines.iter().map(|l| l.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();
    let known = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.clone()))
        .count(&txn)
        .await?;
    if known as usize != product_ids.len() {
        return Err(AppError::Validation(
            "lines reference unknown products".into(),
        ));
    }

    let total: Decimal = payload
        .lines
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum::<Decimal>()
        .round_dp(2);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total: Set(total),
        status: Set(OrderStatus::Pending.as_str().into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<OrderLine> = Vec::with_capacity(payload.lines.len());
    for l in &payload.lines {
        let line = OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(l.product_id)),
            quantity: Set(l.quantity),
            unit_price: Set(l.unit_price.round_dp(2)),
        }
        .insert(&txn)
        .await?;
        lines.push(order_line_from_entity(line));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        OrderWithLines {
            order: order_from_entity(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Turn the acting user's cart into a pending order: snapshot live product
/// prices, check and decrement stock, clear the cart. One transaction.
pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderWithLines>> {
    let txn = state.orm.begin().await?;

    let items = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .all(&txn)
        .await?;

    if items.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }

    let mut total = Decimal::ZERO;
    let mut line_inputs: Vec<(Uuid, i32, Decimal)> = Vec::with_capacity(items.len());
    for item in &items {
        let product = Products::find_by_id(item.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        if product.status != ProductStatus::Active.as_str() {
            return Err(AppError::Validation(format!(
                "product {} is not active",
                product.name
            )));
        }
        if product.stock < item.quantity {
            return Err(AppError::Validation(format!(
                "insufficient stock for product {}",
                product.name
            )));
        }

        total += product.price * Decimal::from(item.quantity);
        line_inputs.push((product.id, item.quantity, product.price));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        total: Set(total.round_dp(2)),
        status: Set(OrderStatus::Pending.as_str().into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<OrderLine> = Vec::with_capacity(line_inputs.len());
    for (product_id, quantity, unit_price) in line_inputs {
        let line = OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product_id)),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
        }
        .insert(&txn)
        .await?;
        lines.push(order_line_from_entity(line));

        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
            .filter(ProdCol::Id.eq(product_id))
            .exec(&txn)
            .await?;
    }

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithLines {
            order: order_from_entity(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Move an order to a new status, validating against the state machine.
pub async fn transition_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: TransitionOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let target = OrderStatus::parse(&payload.status).ok_or_else(|| {
        AppError::Validation(format!("unknown order status '{}'", payload.status))
    })?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = OrderStatus::parse(&order.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("order {} has corrupt status", order.id))
    })?;

    if !current.can_transition_to(target) {
        return Err(AppError::InvalidTransition {
            from: current.as_str().into(),
            to: target.as_str().into(),
        });
    }

    let mut active: OrderActive = order.into();
    active.status = Set(target.as_str().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Overwrite the order total with the sum of its current lines. Idempotent.
pub async fn recompute_total(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let lines = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    let total: Decimal = lines
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum::<Decimal>()
        .round_dp(2);

    let mut active: OrderActive = order.into();
    active.total = Set(total);
    let order = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Total recomputed",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if user.role != "admin" {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }

    let order = Orders::find()
        .filter(condition)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let lines = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_line_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithLines {
            order: order_from_entity(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Delete an order; its lines go with it through the cascade rule.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = Orders::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
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

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total: model.total,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn order_line_from_entity(model: OrderLineModel) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
    }
}
