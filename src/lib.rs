pub mod api;
pub mod db;
pub mod docs;
pub mod engine;
pub mod error;
pub mod models;
pub mod tariff;

use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub payment_api_base: String,
    pub payment_api_key: String,
}
