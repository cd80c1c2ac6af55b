// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use osecours_backend::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // JWT_SECRET is read lazily by the auth middleware; fail fast here instead
    env::var("JWT_SECRET").expect("JWT_SECRET required");

    let payment_api_key = env::var("PAYMENT_API_KEY").expect("PAYMENT_API_KEY required");
    let payment_api_base =
        env::var("PAYMENT_API_BASE").unwrap_or_else(|_| "https://gate.example-pay.africa".to_string());

    let state = web::Data::new(AppState {
        pool,
        payment_api_base,
        payment_api_key,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // public auth routes
            .service(api::auth::register)
            .service(api::auth::login)
            // member routes
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtMiddleware::member())
                    .service(api::subscriptions::list_services)
                    .service(api::subscriptions::create_subscription)
                    .service(api::subscriptions::list_subscriptions)
                    .service(api::subscriptions::eligibility)
                    .service(api::purchases::purchase_tokens)
                    .service(api::rescue::submit_rescue_request)
                    .service(api::rescue::list_rescue_requests),
            )
            // operator routes
            .service(
                web::scope("/admin")
                    .wrap(api::auth::JwtMiddleware::admin())
                    .service(api::admin::review_queue)
                    .service(api::admin::approve)
                    .service(api::admin::reject)
                    .service(api::admin::complete),
            )
    })
    .bind(("0.0.0.0", 8065))?
    .run()
    .await
}
