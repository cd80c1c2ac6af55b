use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::subscriptions::list_services,
        crate::api::subscriptions::create_subscription,
        crate::api::subscriptions::list_subscriptions,
        crate::api::subscriptions::eligibility,
        crate::api::purchases::purchase_tokens,
        crate::api::rescue::submit_rescue_request,
        crate::api::rescue::list_rescue_requests,
        crate::api::admin::review_queue,
        crate::api::admin::approve,
        crate::api::admin::reject,
        crate::api::admin::complete
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AuthResponse,
            crate::api::subscriptions::CreateSubscriptionRequest,
            crate::api::subscriptions::EligibilityResponse,
            crate::api::purchases::PurchaseTokensRequest,
            crate::api::purchases::PurchaseTokensResponse,
            crate::api::rescue::SubmitRescueRequest,
            crate::api::admin::ApproveBody,
            crate::api::admin::RejectBody,
            crate::models::ServiceType,
            crate::models::TxType,
            crate::models::RescueStatus,
            crate::models::Subscription,
            crate::models::TokenTransaction,
            crate::models::RescueRequest,
            crate::tariff::ServiceTariff,
            crate::engine::IneligibilityReason
        )
    ),
    tags(
        (name = "auth", description = "Authentication"),
        (name = "subscriptions", description = "Ô Secours subscriptions and tariffs"),
        (name = "purchases", description = "Token purchases"),
        (name = "rescue", description = "Rescue eligibility and requests"),
        (name = "admin", description = "Rescue workflow operator hooks")
    )
)]
pub struct ApiDoc;
