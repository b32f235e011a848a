use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_users: i64,
    #[schema(value_type = f64)]
    pub today_income: Decimal,
    pub recent_orders: Vec<Order>,
}
