pub mod audit_logs;
pub mod cart_items;
pub mod order_items;
pub mod orders;
pub mod producers;
pub mod products;
pub mod subscriptions;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use producers::Entity as Producers;
pub use products::Entity as Products;
pub use subscriptions::Entity as Subscriptions;
pub use users::Entity as Users;
