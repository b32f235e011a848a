use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{DashboardStats, UserList},
        cart::{CartItemDto, CartList},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CreateOrderRequest, OrderLineInput, OrderList, OrderWithLines, TransitionOrderRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reports::{
            GenerateReportRequest, ReportList, ReportSummary, ReportSummaryList, ReportWithLines,
        },
    },
    models::{
        CartItem, Category, Order, OrderLine, OrderStatus, Product, ProductStatus, Report,
        ReportLine, User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, categories, health, orders, params, products, reports},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::create_order,
        orders::checkout,
        orders::get_order,
        orders::transition_order,
        orders::recompute_total,
        orders::delete_order,
        reports::list_reports,
        reports::generate_report,
        reports::reports_by_range,
        reports::reports_by_user,
        reports::report_detail,
        reports::delete_report,
        admin::list_users,
        admin::delete_user,
        admin::dashboard_stats,
    ),
    components(
        schemas(
            Category,
            Product,
            User,
            CartItem,
            Order,
            OrderLine,
            Report,
            ReportLine,
            OrderStatus,
            ProductStatus,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CartList,
            CartItemDto,
            CreateOrderRequest,
            OrderLineInput,
            TransitionOrderRequest,
            OrderList,
            OrderWithLines,
            GenerateReportRequest,
            ReportSummary,
            ReportSummaryList,
            ReportWithLines,
            ReportList,
            UserList,
            DashboardStats,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::ReportRangeQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>,
            ApiResponse<ReportWithLines>,
            ApiResponse<ReportList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Reports", description = "Sales report endpoints"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
