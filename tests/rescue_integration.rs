use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::Row;
use uuid::Uuid;

use osecours_backend::api;
use osecours_backend::api::auth::{generate_jwt, JwtMiddleware};

mod support;

macro_rules! member_scope {
    () => {
        web::scope("/api")
            .wrap(JwtMiddleware::member())
            .service(api::subscriptions::create_subscription)
            .service(api::subscriptions::eligibility)
            .service(api::rescue::submit_rescue_request)
            .service(api::rescue::list_rescue_requests)
    };
}

macro_rules! admin_scope {
    () => {
        web::scope("/admin")
            .wrap(JwtMiddleware::admin())
            .service(api::admin::review_queue)
            .service(api::admin::approve)
            .service(api::admin::reject)
            .service(api::admin::complete)
    };
}

#[actix_web::test]
async fn empty_description_fails_before_eligibility() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let member_id =
        support::insert_member(pool, &format!("desc_{suffix}@osecours.test"), false).await;
    // deliberately immature: validation must still win
    let sub_id = support::insert_subscription(pool, member_id, "auto", 5).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(member_scope!())).await;

    let token = generate_jwt(member_id, false).expect("jwt");
    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "description": "   " }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM rescue_requests")
        .fetch_one(pool)
        .await
        .expect("count")
        .get("n");
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn immature_subscription_is_rejected_with_days_remaining() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let member_id =
        support::insert_member(pool, &format!("young_{suffix}@osecours.test"), false).await;
    let sub_id = support::insert_subscription(pool, member_id, "school_fees", 10).await;
    support::seed_tokens(pool, sub_id, 35).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(member_scope!())).await;

    let token = generate_jwt(member_id, false).expect("jwt");
    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "description": "broken windshield" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 422);

    let body: Value = test::read_body_json(resp).await;
    let reasons = body["reasons"].as_array().expect("reasons array");
    assert_eq!(reasons.len(), 1);
    assert_eq!(reasons[0]["reason"], "subscription_too_recent");
    assert_eq!(reasons[0]["days_remaining"], 20);
}

#[actix_web::test]
async fn rescue_workflow_end_to_end() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let member_id =
        support::insert_member(pool, &format!("flow_{suffix}@osecours.test"), false).await;
    let admin_id =
        support::insert_member(pool, &format!("admin_{suffix}@osecours.test"), true).await;
    let sub_id = support::insert_subscription(pool, member_id, "auto", 40).await;
    support::seed_tokens(pool, sub_id, 40).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(
        App::new()
            .app_data(state)
            .service(member_scope!())
            .service(admin_scope!()),
    )
    .await;

    let member_token = generate_jwt(member_id, false).expect("jwt");
    let admin_token = generate_jwt(admin_id, true).expect("jwt");

    // estimate and submission must agree
    let req = TestRequest::get()
        .uri(&format!("/api/subscriptions/{sub_id}/eligibility"))
        .insert_header(("Authorization", format!("Bearer {member_token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["eligible"], true);
    assert_eq!(body["rescue_value_fcfa"], 60_000);
    assert_eq!(body["multiplier_percent"], 200);

    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {member_token}")))
        .set_json(json!({ "description": "engine failure on the road to Douala" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["rescue_value_fcfa"], 60_000);
    assert_eq!(body["token_balance_at_request"], 40);
    let request_id = body["id"].as_i64().expect("request id");

    // a second pending request on the same subscription is refused
    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {member_token}")))
        .set_json(json!({ "description": "second attempt" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    // member tokens cannot reach the admin scope
    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/approve"))
        .insert_header(("Authorization", format!("Bearer {member_token}")))
        .set_json(json!({ "admin_notes": null }))
        .to_request();
    match test::try_call_service(&app, req).await {
        Ok(resp) => assert_eq!(resp.status().as_u16(), 403),
        Err(e) => assert_eq!(e.as_response_error().status_code().as_u16(), 403),
    }

    // completing before approving is refused
    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/complete"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/approve"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .set_json(json!({ "admin_notes": "documents verified" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "approved");

    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/complete"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "completed");

    // completion stamps the bonus clock but never debits tokens
    let row = sqlx::query(
        "SELECT token_balance, last_rescue_claim_date FROM subscriptions WHERE id = $1",
    )
    .bind(sub_id)
    .fetch_one(pool)
    .await
    .expect("select subscription");
    let balance: i32 = row.get("token_balance");
    let last_claim: Option<chrono::DateTime<chrono::Utc>> = row.get("last_rescue_claim_date");
    assert_eq!(balance, 40);
    assert!(last_claim.is_some());

    // the next request is within a year of the claim: 150% payout
    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {member_token}")))
        .set_json(json!({ "description": "another breakdown" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["rescue_value_fcfa"], 45_000); // floor(40 * 750 * 1.5)
}

#[actix_web::test]
async fn rejection_requires_admin_notes() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let member_id =
        support::insert_member(pool, &format!("rej_{suffix}@osecours.test"), false).await;
    let admin_id =
        support::insert_member(pool, &format!("radmin_{suffix}@osecours.test"), true).await;
    let sub_id = support::insert_subscription(pool, member_id, "telephone", 45).await;
    support::seed_tokens(pool, sub_id, 32).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(
        App::new()
            .app_data(state)
            .service(member_scope!())
            .service(admin_scope!()),
    )
    .await;

    let member_token = generate_jwt(member_id, false).expect("jwt");
    let admin_token = generate_jwt(admin_id, true).expect("jwt");

    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {member_token}")))
        .set_json(json!({ "description": "phone stolen" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let request_id = body["id"].as_i64().expect("request id");

    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/reject"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .set_json(json!({ "admin_notes": "  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/reject"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .set_json(json!({ "admin_notes": "no supporting documents" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["admin_notes"], "no supporting documents");

    // terminal: a second rejection is refused
    let req = TestRequest::post()
        .uri(&format!("/admin/rescue-requests/{request_id}/reject"))
        .insert_header(("Authorization", format!("Bearer {admin_token}")))
        .set_json(json!({ "admin_notes": "again" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn inactive_subscription_is_refused_by_estimate_and_submit_alike() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let member_id =
        support::insert_member(pool, &format!("idle_{suffix}@osecours.test"), false).await;
    // mature and funded, so only the active flag stands in the way
    let sub_id = support::insert_subscription(pool, member_id, "auto", 40).await;
    support::seed_tokens(pool, sub_id, 40).await;
    sqlx::query("UPDATE subscriptions SET is_active = FALSE WHERE id = $1")
        .bind(sub_id)
        .execute(pool)
        .await
        .expect("deactivate");

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(member_scope!())).await;

    let token = generate_jwt(member_id, false).expect("jwt");

    // no estimate is quoted for a subscription the write path would refuse
    let req = TestRequest::get()
        .uri(&format!("/api/subscriptions/{sub_id}/eligibility"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::post()
        .uri(&format!("/api/subscriptions/{sub_id}/rescue"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "description": "battery died" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM rescue_requests")
        .fetch_one(pool)
        .await
        .expect("count")
        .get("n");
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn one_subscription_per_member_and_service() {
    std::env::set_var("JWT_SECRET", "test-secret");
    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().to_string();

    let member_id =
        support::insert_member(pool, &format!("uniq_{suffix}@osecours.test"), false).await;

    let state = web::Data::new(support::build_state(pool.clone()));
    let app = test::init_service(App::new().app_data(state).service(member_scope!())).await;

    let token = generate_jwt(member_id, false).expect("jwt");

    let req = TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "service_type": "cata_catanis" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = TestRequest::post()
        .uri("/api/subscriptions")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({ "service_type": "cata_catanis" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}
