//! # Server Configuration
//!
//! This module contains the router, shared state and OpenAPI document for
//! the Beacon API.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::admin_auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::sms::TwilioClient;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub sms: TwilioClient,
}

impl AppState {
    /// Build state from loaded configuration and an open connection
    pub fn new(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        let sms = TwilioClient::new(config.twilio.clone())?;
        Ok(Self {
            config: Arc::new(config),
            db,
            sms,
        })
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/surveys/issue", post(handlers::surveys::issue_token))
        .route("/api/export", get(handlers::export::export_responses))
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/api/clients", post(handlers::clients::create_client))
        .route(
            "/api/clients/{id}/thresholds",
            get(handlers::clients::get_thresholds).put(handlers::clients::put_thresholds),
        )
        .route(
            "/api/clients/{id}/hierarchy",
            post(handlers::clients::setup_hierarchy),
        )
        .route(
            "/api/clients/{id}/employees",
            post(handlers::clients::create_employee),
        )
        .route("/api/admin/sms/batch", post(handlers::sms::send_batch))
        .route("/api/sms/status", get(handlers::sms::sms_status))
        .route("/api/sms/test", post(handlers::sms::send_test))
        .route("/api/demo/seed", post(handlers::demo::seed))
        .route("/api/demo/seed-balanced", post(handlers::demo::seed_balanced))
        .route("/api/demo/clear", post(handlers::demo::clear))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            admin_auth_middleware,
        ));

    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/surveys/{token}", get(handlers::surveys::token_status))
        .route("/api/responses", post(handlers::responses::submit_response))
        .route("/api/admin/auth", post(handlers::admin::login))
        .route("/api/admin/logout", post(handlers::admin::logout));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db)?);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Registers the bearer scheme referenced by admin routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health::healthz,
        crate::handlers::health::readyz,
        crate::handlers::surveys::issue_token,
        crate::handlers::surveys::token_status,
        crate::handlers::responses::submit_response,
        crate::handlers::export::export_responses,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_thresholds,
        crate::handlers::clients::put_thresholds,
        crate::handlers::clients::setup_hierarchy,
        crate::handlers::clients::create_employee,
        crate::handlers::admin::login,
        crate::handlers::admin::logout,
        crate::handlers::sms::send_batch,
        crate::handlers::sms::sms_status,
        crate::handlers::sms::send_test,
        crate::handlers::demo::seed,
        crate::handlers::demo::seed_balanced,
        crate::handlers::demo::clear,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::error::ProviderError,
            crate::handlers::health::HealthStatus,
            crate::handlers::surveys::IssueTokenRequest,
            crate::handlers::surveys::IssueTokenResponse,
            crate::handlers::surveys::TokenStatusResponse,
            crate::handlers::responses::SubmitResponseRequest,
            crate::handlers::responses::SubmitResponseResult,
            crate::handlers::dashboard::DashboardResponse,
            crate::handlers::clients::CreateClientRequest,
            crate::handlers::clients::ClientResponse,
            crate::handlers::clients::ThresholdsResponse,
            crate::handlers::clients::CreateEmployeeRequest,
            crate::handlers::clients::EmployeeResponse,
            crate::handlers::admin::LoginRequest,
            crate::handlers::admin::OkResponse,
            crate::handlers::sms::SmsBatchRequest,
            crate::handlers::sms::SmsBatchResponse,
            crate::handlers::sms::SmsDeliveryError,
            crate::handlers::sms::SmsStatusResponse,
            crate::handlers::sms::SmsTestRequest,
            crate::handlers::sms::SmsTestResponse,
            crate::handlers::demo::DemoRequest,
            crate::handlers::demo::DemoSeedResponse,
            crate::handlers::demo::BalancedSeedRequest,
            crate::handlers::demo::BalancedSeedResponse,
            crate::handlers::demo::DemoClearResponse,
            crate::repositories::HierarchyPlan,
            crate::repositories::HierarchyOutcome,
            crate::repositories::LevelOutcome,
            crate::risk::RiskThresholds,
            crate::models::survey_token::TokenChannel,
            crate::models::survey_token::TokenState,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Beacon API",
        description = "Anonymous wellbeing surveys, risk dashboards and survey link delivery",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
