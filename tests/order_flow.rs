mod common;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use tienda_admin_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, OrderLineInput, TransitionOrderRequest},
    },
    entity::{
        order_lines::{Column as OrderLineCol, Entity as OrderLines},
        products::Entity as Products,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{OrderListQuery, Pagination},
    services::{cart_service, order_service},
};

#[tokio::test]
async fn order_lifecycle_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let admin_id = common::create_user(&state, "admin", "admin@test.dev", "admin").await?;
    let buyer_id = common::create_user(&state, "buyer", "buyer@test.dev", "user").await?;
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };
    let buyer = AuthUser {
        user_id: buyer_id,
        role: "user".into(),
    };

    let category_id = common::create_category(&state, "Shirts").await?;
    let shirt_id =
        common::create_product(&state, category_id, "Plain shirt", Decimal::new(1500, 2), 10)
            .await?;
    let scarf_id =
        common::create_product(&state, category_id, "Wool scarf", Decimal::new(999, 2), 5).await?;

    // Rejected payloads never reach the database.
    let err = order_service::create_order(&state, &buyer, CreateOrderRequest { lines: vec![] })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            lines: vec![OrderLineInput {
                product_id: shirt_id,
                quantity: 0,
                unit_price: Decimal::new(1500, 2),
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // A line naming a product that does not exist is rejected before any
    // write, not surfaced as a foreign key failure.
    let err = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            lines: vec![OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: Decimal::new(100, 2),
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let orders = order_service::list_orders(&state, &buyer, OrderListQuery {
        pagination: Pagination::default(),
        status: None,
        sort_order: None,
    })
    .await?
    .data
    .unwrap();
    assert!(orders.items.is_empty());

    // 2 x 15.00 + 1 x 9.99 = 39.99, to the cent.
    let created = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            lines: vec![
                OrderLineInput {
                    product_id: shirt_id,
                    quantity: 2,
                    unit_price: Decimal::new(1500, 2),
                },
                OrderLineInput {
                    product_id: scarf_id,
                    quantity: 1,
                    unit_price: Decimal::new(999, 2),
                },
            ],
        },
    )
    .await?
    .data.unwrap();
    let order_id = created.order.id;
    assert_eq!(created.order.total, Decimal::new(3999, 2));
    assert_eq!(created.order.status, "pending");
    assert_eq!(created.lines.len(), 2);

    // Status changes are an admin concern.
    let err = order_service::transition_order(
        &state,
        &buyer,
        order_id,
        TransitionOrderRequest {
            status: "paid".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Pending cannot skip straight to shipped.
    let err = order_service::transition_order(
        &state,
        &admin,
        order_id,
        TransitionOrderRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition { ref from, ref to } if from == "pending" && to == "shipped"
    ));

    let err = order_service::transition_order(
        &state,
        &admin,
        order_id,
        TransitionOrderRequest {
            status: "misplaced".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The happy path walks pending -> paid -> shipped -> delivered.
    for status in ["paid", "shipped", "delivered"] {
        let updated = order_service::transition_order(
            &state,
            &admin,
            order_id,
            TransitionOrderRequest {
                status: status.into(),
            },
        )
        .await?
        .data.unwrap();
        assert_eq!(updated.status, status);
    }

    // Delivered is terminal.
    let err = order_service::transition_order(
        &state,
        &admin,
        order_id,
        TransitionOrderRequest {
            status: "cancelled".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    // Recomputing from unchanged lines leaves the total alone, twice.
    for _ in 0..2 {
        let recomputed = order_service::recompute_total(&state, &admin, order_id)
            .await?
            .data.unwrap();
        assert_eq!(recomputed.total, Decimal::new(3999, 2));
    }

    // A buyer only sees their own orders.
    let fetched = order_service::get_order(&state, &buyer, order_id).await?.data.unwrap();
    assert_eq!(fetched.lines.len(), 2);
    let stranger = AuthUser {
        user_id: admin_id,
        role: "user".into(),
    };
    let err = order_service::get_order(&state, &stranger, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Checkout drains the cart, snapshots prices and decrements stock.
    // Adding the same product twice merges onto one row (1 + 2 = 3).
    cart_service::add_to_cart(
        &state.pool,
        &buyer,
        AddToCartRequest {
            product_id: shirt_id,
            quantity: 1,
        },
    )
    .await?;
    cart_service::add_to_cart(
        &state.pool,
        &buyer,
        AddToCartRequest {
            product_id: shirt_id,
            quantity: 2,
        },
    )
    .await?;

    let cart = cart_service::list_cart(&state.pool, &buyer, Pagination::default())
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);

    let checked_out = order_service::checkout(&state, &buyer).await?.data.unwrap();
    assert_eq!(checked_out.order.total, Decimal::new(4500, 2));
    assert_eq!(checked_out.order.status, "pending");

    let shirt = Products::find_by_id(shirt_id)
        .one(&state.orm)
        .await?
        .expect("product still exists");
    assert_eq!(shirt.stock, 7);

    let cart = cart_service::list_cart(&state.pool, &buyer, Pagination::default())
        .await?
        .data
        .unwrap();
    assert!(cart.items.is_empty());

    // An empty cart cannot be checked out again.
    let err = order_service::checkout(&state, &buyer).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Asking for more than is on the shelf aborts the whole checkout.
    cart_service::add_to_cart(
        &state.pool,
        &buyer,
        AddToCartRequest {
            product_id: scarf_id,
            quantity: 100,
        },
    )
    .await?;
    let err = order_service::checkout(&state, &buyer).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let scarf = Products::find_by_id(scarf_id)
        .one(&state.orm)
        .await?
        .expect("product still exists");
    assert_eq!(scarf.stock, 5);
    cart_service::remove_from_cart(&state.pool, &buyer, scarf_id).await?;

    // Deleting the order takes exactly its lines with it.
    let lines_before = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    assert_eq!(lines_before, 2);

    order_service::delete_order(&state, &admin, order_id).await?;

    let lines_after = OrderLines::find()
        .filter(OrderLineCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    assert_eq!(lines_after, 0);

    let err = order_service::delete_order(&state, &admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
