// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        middleware::{authenticate, authorize},
        Role,
    },
    error::{ApiError, NOT_FOUND_MESSAGE},
    state::AppState,
};

pub mod auth;
pub mod dashboards;
pub mod health;
pub mod users;

/// Build the application with the full middleware stack.
///
/// Layers run outermost first: request id, tracing, CORS, then the
/// gatekeeper (`authenticate`) and the policy check (`authorize`). CORS
/// answers preflight requests itself, so they never reach the policy.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors_layer(cors_origins))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), authorize));

    Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(users::get_current_user))
        .route("/api/test", get(dashboards::controller_check))
        .route("/{area}/dashboard", get(dashboards::dashboard))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(middleware)
        .with_state(state)
}

/// CORS for the browser front end.
///
/// Credentials are allowed, so origins are always an explicit list.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([AUTHORIZATION])
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::not_found(NOT_FOUND_MESSAGE)
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::logout,
        users::get_current_user,
        dashboards::dashboard,
        dashboards::controller_check,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MessageResponse,
            users::UserMeResponse,
            dashboards::DashboardResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            Role
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Auth", description = "Login and logout"),
        (name = "Users", description = "Current user"),
        (name = "Dashboards", description = "Role area landing pages"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::InMemoryAccountStore;
    use crate::auth::{AccessPolicy, TokenCodec, DEFAULT_TOKEN_VALIDITY};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest, StatusCode},
        response::Response,
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"router_test_secret_of_at_least_32_bytes";
    const ORIGIN: &str = "http://localhost:5173";

    async fn test_app() -> (Router, AppState) {
        let store = Arc::new(InMemoryAccountStore::new());
        store.create("asha", "hr-pass", Role::Hr).await.unwrap();
        store.create("farah", "fin-pass", Role::Finance).await.unwrap();
        store.create("emma", "emp-pass", Role::Employee).await.unwrap();

        let state = AppState::new(
            TokenCodec::new(SECRET, DEFAULT_TOKEN_VALIDITY),
            store,
            AccessPolicy::hrms_default().unwrap(),
        );
        (router(state.clone(), &[ORIGIN.to_string()]), state)
    }

    fn get_request(path: &str, token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::get(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn login_request(username: &str, password: &str) -> HttpRequest<Body> {
        HttpRequest::post("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn login_issues_verifiable_token_for_username() {
        let (app, state) = test_app().await;
        let response = app.oneshot(login_request("asha", "hr-pass")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["role"], "HR");

        let token = body["token"].as_str().unwrap();
        assert_eq!(state.tokens.extract_subject(token).as_deref(), Some("asha"));
        assert!(state.tokens.verify(token, "asha").is_ok());
    }

    #[tokio::test]
    async fn login_failures_share_one_response() {
        let (app, _state) = test_app().await;

        for (username, password) in [("asha", "wrong"), ("nobody", "hr-pass")] {
            let response = app
                .clone()
                .oneshot(login_request(username, password))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = body_json(response).await;
            assert_eq!(body, json!({ "message": "Invalid username or password" }));
            assert!(body.get("token").is_none());
        }
    }

    #[tokio::test]
    async fn login_with_malformed_body_is_bad_request() {
        let (app, _state) = test_app().await;
        let request = HttpRequest::post("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"asha"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_returns_identity_from_token() {
        let (app, state) = test_app().await;
        let token = state.tokens.issue("farah").unwrap();

        let response = app.oneshot(get_request("/api/me", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "username": "farah", "role": "FINANCE" })
        );
    }

    #[tokio::test]
    async fn role_area_denies_other_roles() {
        let (app, state) = test_app().await;
        let hr_token = state.tokens.issue("asha").unwrap();

        let denied = app
            .clone()
            .oneshot(get_request("/finance/dashboard", Some(&hr_token)))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(denied).await,
            json!({ "message": "Unauthorized access" })
        );

        let allowed = app
            .oneshot(get_request("/hr/dashboard", Some(&hr_token)))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(
            body_json(allowed).await,
            json!({ "area": "hr", "username": "asha", "role": "HR" })
        );
    }

    #[tokio::test]
    async fn payroll_detail_needs_finance_but_summary_does_not() {
        let (app, state) = test_app().await;
        let hr_token = state.tokens.issue("asha").unwrap();
        let finance_token = state.tokens.issue("farah").unwrap();

        // No handler exists under /api/payroll, so passing the policy means 404.
        let summary = app
            .clone()
            .oneshot(get_request("/api/payroll", Some(&hr_token)))
            .await
            .unwrap();
        assert_eq!(summary.status(), StatusCode::NOT_FOUND);

        let detail_hr = app
            .clone()
            .oneshot(get_request("/api/payroll/42", Some(&hr_token)))
            .await
            .unwrap();
        assert_eq!(detail_hr.status(), StatusCode::FORBIDDEN);

        let detail_finance = app
            .oneshot(get_request("/api/payroll/42", Some(&finance_token)))
            .await
            .unwrap();
        assert_eq!(detail_finance.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn expired_token_is_treated_as_anonymous() {
        let (app, state) = test_app().await;
        let expired = state
            .tokens
            .issue_at("asha", Utc::now() - ChronoDuration::hours(11))
            .unwrap();

        let protected = app
            .clone()
            .oneshot(get_request("/api/me", Some(&expired)))
            .await
            .unwrap();
        assert_eq!(protected.status(), StatusCode::FORBIDDEN);

        let public = app
            .oneshot(get_request("/health/live", Some(&expired)))
            .await
            .unwrap();
        assert_eq!(public.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn public_paths_need_no_header() {
        let (app, _state) = test_app().await;

        let health = app.clone().oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        let body = body_json(health).await;
        assert_eq!(body["status"], "ok");

        let logout = app
            .oneshot(
                HttpRequest::post("/api/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::OK);
        assert_eq!(body_json(logout).await, json!({ "message": "Logged out" }));
    }

    #[tokio::test]
    async fn unlisted_path_requires_identity() {
        let (app, state) = test_app().await;

        let anonymous = app
            .clone()
            .oneshot(get_request("/api/leave-requests", None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

        let token = state.tokens.issue("asha").unwrap();
        let signed_in = app
            .oneshot(get_request("/api/leave-requests", Some(&token)))
            .await
            .unwrap();
        assert_eq!(signed_in.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(signed_in).await,
            json!({ "message": "Resource not found" })
        );
    }

    #[tokio::test]
    async fn unknown_dashboard_area_is_not_found() {
        let (app, state) = test_app().await;
        let token = state.tokens.issue("asha").unwrap();

        let response = app
            .oneshot(get_request("/payroll/dashboard", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Resource not found" })
        );
    }

    #[tokio::test]
    async fn encoded_role_area_is_still_guarded() {
        let (app, state) = test_app().await;
        let employee_token = state.tokens.issue("emma").unwrap();

        for path in [
            "/hr/dashboard",
            "/%68r/dashboard",
            "/%66inance/dashboard",
            "/%61dmin/dashboard",
            "/%2e%2e/dashboard",
        ] {
            let response = app
                .clone()
                .oneshot(get_request(path, Some(&employee_token)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{path}");
            assert_eq!(
                body_json(response).await,
                json!({ "message": "Unauthorized access" })
            );
        }

        let own_area = app
            .oneshot(get_request("/%65mployee/dashboard", Some(&employee_token)))
            .await
            .unwrap();
        assert_eq!(own_area.status(), StatusCode::OK);
        assert_eq!(body_json(own_area).await["area"], "employee");
    }

    #[tokio::test]
    async fn preflight_is_answered_without_token() {
        let (app, _state) = test_app().await;
        let request = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/finance/dashboard")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            ORIGIN
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _state) = test_app().await;
        let response = app.oneshot(get_request("/health/live", None)).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn openapi_document_is_public() {
        let (app, _state) = test_app().await;
        let response = app
            .oneshot(get_request("/api-doc/openapi.json", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let doc = body_json(response).await;
        assert!(doc["paths"].get("/api/login").is_some());
        assert!(doc["components"]["securitySchemes"].get("bearer").is_some());
    }
}
