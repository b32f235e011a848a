pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod order_lines;
pub mod orders;
pub mod report_lines;
pub mod reports;
pub mod users;
pub mod products;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use report_lines::Entity as ReportLines;
pub use reports::Entity as Reports;
pub use users::Entity as Users;
pub use products::Entity as Products;
