pub mod admin;
pub mod auth;
pub mod payment_client;
pub mod purchases;
pub mod rescue;
pub mod subscriptions;
