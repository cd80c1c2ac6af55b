use sqlx::{PgPool, Row};
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

use osecours_backend::AppState;

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Drops and recreates the database named in TEST_DATABASE_URL, runs the
/// migrations and hands back a connected pool. Serialised across tests via an
/// in-process mutex plus a Postgres advisory lock.
pub async fn init_test_db() -> TestDb {
    dotenvy::dotenv().ok();
    let test_url = env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let (admin_url, db_name) =
        split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url)
        .await
        .expect("connect admin db");

    let _ = sqlx::query("SELECT pg_advisory_lock(727272)")
        .execute(&admin_pool)
        .await;

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    let create_result = sqlx::query(&create_sql).execute(&admin_pool).await;
    if let Err(e) = create_result {
        eprintln!("create test db error: {e}");
        let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
        sqlx::query(&create_sql)
            .execute(&admin_pool)
            .await
            .expect("create test db retry");
    }

    let _ = sqlx::query("SELECT pg_advisory_unlock(727272)")
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;

    let pool = PgPool::connect(&test_url)
        .await
        .expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    TestDb { pool, _guard: guard }
}

pub fn build_state(pool: PgPool) -> AppState {
    // failure-path tests never reach the payment gateway
    build_state_with_gateway(pool, "http://127.0.0.1:1")
}

pub fn build_state_with_gateway(pool: PgPool, payment_api_base: &str) -> AppState {
    AppState {
        pool,
        payment_api_base: payment_api_base.to_string(),
        payment_api_key: "test-key".to_string(),
    }
}

pub async fn insert_member(pool: &PgPool, email: &str, is_admin: bool) -> i32 {
    sqlx::query(
        r#"INSERT INTO members (username, email, password_hash, is_admin)
           VALUES ($1, $2, 'test-hash', $3)
           RETURNING id"#,
    )
    .bind(format!("user_{email}"))
    .bind(email)
    .bind(is_admin)
    .fetch_one(pool)
    .await
    .expect("insert member")
    .get("id")
}

/// Backdated subscription; the balance starts at zero and is funded through
/// the ledger so the trigger path is exercised.
pub async fn insert_subscription(
    pool: &PgPool,
    member_id: i32,
    service_type: &str,
    age_days: i64,
) -> i32 {
    sqlx::query(
        r#"INSERT INTO subscriptions (member_id, service_type, subscription_date)
           VALUES ($1, $2, NOW() - make_interval(days => $3::int))
           RETURNING id"#,
    )
    .bind(member_id)
    .bind(service_type)
    .bind(age_days as i32)
    .fetch_one(pool)
    .await
    .expect("insert subscription")
    .get("id")
}

pub async fn seed_tokens(pool: &PgPool, subscription_id: i32, token_amount: i32) {
    sqlx::query(
        r#"INSERT INTO token_transactions
               (subscription_id, tx_type, token_amount, token_value_fcfa,
                payment_method, reference, created_at)
           VALUES ($1, 'purchase', $2, 0, 'seed', $3, NOW())"#,
    )
    .bind(subscription_id)
    .bind(token_amount)
    .bind(format!("SEED-{}", uuid::Uuid::new_v4()))
    .execute(pool)
    .await
    .expect("seed tokens");
}
