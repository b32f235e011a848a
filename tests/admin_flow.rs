mod common;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use tienda_admin_api::{
    dto::{
        auth::{LoginRequest, RegisterRequest},
        cart::AddToCartRequest,
        categories::{CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CreateOrderRequest, OrderLineInput},
        products::CreateProductRequest,
        reports::GenerateReportRequest,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{Column as OrderCol, Entity as Orders},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        admin_service, auth_service, cart_service, category_service, order_service,
        product_service, report_service,
    },
};

#[tokio::test]
async fn accounts_catalog_and_user_deletion_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    unsafe { std::env::set_var("JWT_SECRET", "test-secret") };

    let admin_id = common::create_user(&state, "admin", "admin@test.dev", "admin").await?;
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Registration gatekeeping.
    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "carla".into(),
            email: "carla@test.dev".into(),
            password: "short".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let carla = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "carla".into(),
            email: "carla@test.dev".into(),
            password: "sup3rsecret".into(),
        },
    )
    .await?
    .data.unwrap();
    assert_eq!(carla.role, "user");

    let err = auth_service::register_user(
        &state.pool,
        RegisterRequest {
            username: "carla".into(),
            email: "other@test.dev".into(),
            password: "sup3rsecret".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Login hands out a bearer token; a bad password gets the same generic
    // rejection as an unknown email.
    let err = auth_service::login_user(
        &state.pool,
        LoginRequest {
            email: "carla@test.dev".into(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let login = auth_service::login_user(
        &state.pool,
        LoginRequest {
            email: "carla@test.dev".into(),
            password: "sup3rsecret".into(),
        },
    )
    .await?
    .data.unwrap();
    assert!(login.token.starts_with("Bearer "));

    let carla_auth = AuthUser {
        user_id: carla.id,
        role: "user".into(),
    };

    // Category names are unique; the first one is untouched by a rejected
    // duplicate.
    let shirts = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Shirts".into(),
        },
    )
    .await?
    .data.unwrap();

    let err = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Shirts".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let listed = category_service::list_categories(&state).await?.data.unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].name, "Shirts");

    let err = category_service::create_category(
        &state,
        &carla_auth,
        CreateCategoryRequest {
            name: "Trousers".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let shoes = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Shoes".into(),
        },
    )
    .await?
    .data.unwrap();

    let err = category_service::update_category(
        &state,
        &admin,
        shoes.id,
        UpdateCategoryRequest {
            name: "Shirts".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = category_service::update_category(
        &state,
        &admin,
        Uuid::new_v4(),
        UpdateCategoryRequest {
            name: "Hats".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Products must name an existing category.
    let err = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Ghost".into(),
            category_id: Uuid::new_v4(),
            description: None,
            price: Decimal::new(100, 2),
            stock: 1,
            image: None,
            status: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let shirt = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: "Linen shirt".into(),
            category_id: shirts.id,
            description: Some("Summer wear".into()),
            price: Decimal::new(2550, 2),
            stock: 8,
            image: None,
            status: None,
        },
    )
    .await?
    .data.unwrap();
    assert_eq!(shirt.status, "active");

    // A category holding products cannot be removed.
    let err = category_service::delete_category(&state, &admin, shirts.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    category_service::delete_category(&state, &admin, shoes.id).await?;

    // History survives product deletion: the line keeps its snapshot with
    // the product reference nulled, while cart rows are simply dropped.
    let order = order_service::create_order(
        &state,
        &carla_auth,
        CreateOrderRequest {
            lines: vec![OrderLineInput {
                product_id: shirt.id,
                quantity: 2,
                unit_price: Decimal::new(2550, 2),
            }],
        },
    )
    .await?
    .data.unwrap();
    cart_service::add_to_cart(
        &state.pool,
        &carla_auth,
        AddToCartRequest {
            product_id: shirt.id,
            quantity: 1,
        },
    )
    .await?;

    product_service::delete_product(&state, &admin, shirt.id).await?;

    let survived = order_service::get_order(&state, &carla_auth, order.order.id)
        .await?
        .data.unwrap();
    assert_eq!(survived.order.total, Decimal::new(5100, 2));
    assert_eq!(survived.lines.len(), 1);
    assert_eq!(survived.lines[0].product_id, None);
    assert_eq!(survived.lines[0].unit_price, Decimal::new(2550, 2));

    let cart_rows = CartItems::find()
        .filter(CartCol::UserId.eq(carla.id))
        .count(&state.orm)
        .await?;
    assert_eq!(cart_rows, 0);

    category_service::delete_category(&state, &admin, shirts.id).await?;

    // A report outlives the admin who generated it.
    let reporter_id = common::create_user(&state, "reporter", "reporter@test.dev", "admin").await?;
    let reporter = AuthUser {
        user_id: reporter_id,
        role: "admin".into(),
    };
    let report = report_service::generate_report(
        &state,
        &reporter,
        GenerateReportRequest {
            report_type: "sales".into(),
            order_ids: Some(vec![order.order.id]),
            start: None,
            end: None,
            notes: None,
        },
    )
    .await?
    .data.unwrap();

    admin_service::delete_user(&state, &admin, reporter_id).await?;

    let listing = report_service::list_reports(&state, &admin).await?.data.unwrap();
    assert_eq!(listing.items.len(), 1);
    assert_eq!(listing.items[0].report.id, report.report.id);
    assert_eq!(listing.items[0].report.user_id, None);
    assert_eq!(listing.items[0].username, None);

    // User deletion guards, then the cascade.
    let err = admin_service::delete_user(&state, &carla_auth, carla.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = admin_service::delete_user(&state, &admin, admin_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = admin_service::delete_user(&state, &admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    admin_service::delete_user(&state, &admin, carla.id).await?;
    let her_orders = Orders::find()
        .filter(OrderCol::UserId.eq(carla.id))
        .count(&state.orm)
        .await?;
    assert_eq!(her_orders, 0);

    // The report line survives the order cascade with its reference nulled.
    let detail = report_service::report_detail(&state, &admin, report.report.id)
        .await?
        .data.unwrap();
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].order_id, None);
    assert_eq!(detail.lines[0].amount, Decimal::new(5100, 2));

    // What is left on the dashboard: one admin, no products, no orders.
    let stats = admin_service::dashboard_stats(&state, &admin).await?.data.unwrap();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_products, 0);
    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.today_income, Decimal::ZERO);
    assert!(stats.recent_orders.is_empty());

    Ok(())
}
