mod health;
mod petitions;
mod shares;
mod stats;
mod stories;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/health", health::router())
        .nest("/petitions", petitions::router())
        .nest("/social-shares", shares::router())
        .nest("/stats", stats::router())
        .nest("/stories", stories::router())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use rallypoint_core::{DualStore, MemoryStore, Store, StoreError, StoreResult};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;

    const FLAGSHIP_SLUG: &str = "hb1481-device-restrictions";
    const FLAGSHIP_ID: &str = "cmeky1irj0000f5yhzgv7ocqu";

    fn app() -> Router {
        app_with(DualStore::in_memory())
    }

    fn app_with(store: DualStore) -> Router {
        router().with_state(AppState::with_store(Arc::new(store), &ServerConfig::default()))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn signer(email: &str, public: bool) -> Value {
        json!({
            "name": "Ada Lovelace",
            "email": email,
            "zipCode": "78701",
            "displayPublic": public,
        })
    }

    async fn sign(app: &Router, petition: &str, email: &str, public: bool) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            &format!("/petitions/{petition}/sign"),
            Some(signer(email, public)),
        )
        .await
    }

    #[tokio::test]
    async fn test_sign_returns_created_receipt() {
        let app = app();
        let (status, body) = sign(&app, FLAGSHIP_SLUG, "x@example.com", true).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["zip_code"], "78701");
        assert_eq!(body["display_public"], true);
        assert!(body["id"].is_string());
        assert!(body["created_at"].is_string());
        assert!(body.get("email_fingerprint").is_none());
        assert!(body.get("email").is_none());
    }

    #[tokio::test]
    async fn test_second_signature_is_rejected() {
        let app = app();
        let (status, _) = sign(&app, FLAGSHIP_SLUG, "x@example.com", true).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = sign(&app, FLAGSHIP_ID, "X@EXAMPLE.COM", false).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "You have already signed this petition");

        let (_, stats) = send(&app, Method::GET, &format!("/petitions/{FLAGSHIP_SLUG}/stats"), None).await;
        assert_eq!(stats["signatureCount"], 1);
    }

    #[tokio::test]
    async fn test_missing_fields_are_a_bad_request() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/petitions/{FLAGSHIP_SLUG}/sign"),
            Some(json!({ "name": "Ada" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: email, zipCode");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_bad_request() {
        let app = app();
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/petitions/{FLAGSHIP_SLUG}/sign"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let app = app();
        let (status, body) = sign(&app, "hb9999-no-such-bill", "x@example.com", true).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("hb9999-no-such-bill"));
    }

    #[tokio::test]
    async fn test_stats_report_progress() {
        let app = app();
        for i in 0..3 {
            sign(&app, FLAGSHIP_SLUG, &format!("s{i}@example.com"), true).await;
        }

        let (status, body) = send(&app, Method::GET, &format!("/petitions/{FLAGSHIP_SLUG}/stats"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "petitionId": FLAGSHIP_ID,
                "signatureCount": 3,
                "goalCount": 10000,
                "progress": 0,
            })
        );
    }

    #[tokio::test]
    async fn test_recent_lists_public_signatures_newest_first() {
        let app = app();
        sign(&app, FLAGSHIP_SLUG, "first@example.com", true).await;
        sign(&app, FLAGSHIP_SLUG, "hidden@example.com", false).await;
        let (_, last) = sign(&app, FLAGSHIP_SLUG, "last@example.com", true).await;

        let (status, body) = send(&app, Method::GET, &format!("/petitions/{FLAGSHIP_SLUG}?limit=10"), None).await;
        assert_eq!(status, StatusCode::OK);
        let signatures = body["signatures"].as_array().unwrap();
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0]["id"], last["id"]);
        assert!(signatures.iter().all(|s| s["display_public"] == true));

        let (_, body) = send(&app, Method::GET, &format!("/petitions/{FLAGSHIP_SLUG}?limit=1"), None).await;
        assert_eq!(body["signatures"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_limit_is_a_bad_request() {
        let app = app();
        let (status, body) = send(&app, Method::GET, &format!("/petitions/{FLAGSHIP_SLUG}?limit=lots"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_petitions_list_includes_flagship() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/petitions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["petitions"][0]["slug"], FLAGSHIP_SLUG);
        assert_eq!(body["petitions"][0]["isMain"], true);
    }

    #[tokio::test]
    async fn test_shares_and_platform_stats() {
        let app = app();
        sign(&app, FLAGSHIP_SLUG, "x@example.com", true).await;
        for platform in ["twitter", "facebook"] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/social-shares",
                Some(json!({ "platform": platform, "entityType": "petition", "entityId": FLAGSHIP_SLUG })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["platform"], platform);
        }

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/social-shares/count?entityType=petition&entityId={FLAGSHIP_SLUG}"),
            None,
        )
        .await;
        assert_eq!(body["count"], 2);

        let (status, body) = send(&app, Method::GET, "/stats/platform", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "signatures": 1, "social_shares": 2, "total_impact": 3 }));
    }

    #[tokio::test]
    async fn test_stories_require_consent() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/stories",
            Some(json!({ "title": "Phones", "story": "Our district banned them." })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Consent is required to submit a story");

        let (status, body) = send(
            &app,
            Method::POST,
            "/stories",
            Some(json!({ "title": "Phones", "story": "Our district banned them.", "consent": true })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["story"]["name"], "Anonymous");

        let (_, body) = send(&app, Method::GET, "/stories", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["story"], "Our district banned them.");
        assert_eq!(body[0]["isApproved"], true);
    }

    #[tokio::test]
    async fn test_health_reports_unconfigured_durable_store() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok", "durable": "unconfigured" }));
    }

    /// A durable store that is always unreachable.
    struct Unreachable;

    #[async_trait::async_trait]
    impl Store for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn ping(&self) -> StoreResult<()> {
            Err(down())
        }

        async fn find_petition_by_slug(&self, _: &str) -> StoreResult<Option<rallypoint_core::Petition>> {
            Err(down())
        }

        async fn get_petition(&self, _: &rallypoint_core::PetitionId) -> StoreResult<Option<rallypoint_core::Petition>> {
            Err(down())
        }

        async fn list_active_petitions(&self) -> StoreResult<Vec<rallypoint_core::Petition>> {
            Err(down())
        }

        async fn insert_signature(
            &self,
            _: rallypoint_core::signature::NewSignature,
        ) -> StoreResult<rallypoint_core::Signature> {
            Err(down())
        }

        async fn count_signatures(&self, _: &rallypoint_core::PetitionId) -> StoreResult<i64> {
            Err(down())
        }

        async fn find_signature(
            &self,
            _: &rallypoint_core::PetitionId,
            _: &rallypoint_core::EmailFingerprint,
        ) -> StoreResult<Option<rallypoint_core::Signature>> {
            Err(down())
        }

        async fn list_recent_public_signatures(
            &self,
            _: &rallypoint_core::PetitionId,
            _: usize,
        ) -> StoreResult<Vec<rallypoint_core::Signature>> {
            Err(down())
        }

        async fn insert_share(&self, _: rallypoint_core::SocialShare) -> StoreResult<rallypoint_core::SocialShare> {
            Err(down())
        }

        async fn count_shares(&self, _: &str, _: Option<&str>) -> StoreResult<i64> {
            Err(down())
        }

        async fn insert_story(&self, _: rallypoint_core::Story) -> StoreResult<rallypoint_core::Story> {
            Err(down())
        }

        async fn list_approved_stories(&self) -> StoreResult<Vec<rallypoint_core::Story>> {
            Err(down())
        }

        async fn totals(&self) -> StoreResult<rallypoint_core::stats::EngagementTotals> {
            Err(down())
        }
    }

    fn down() -> StoreError {
        StoreError::Unavailable("connection refused".to_string())
    }

    #[tokio::test]
    async fn test_signing_fails_over_when_durable_store_is_down() {
        let store = DualStore::new(
            Arc::new(Unreachable),
            Arc::new(MemoryStore::seeded()),
            Duration::from_millis(500),
        );
        let app = app_with(store);

        let (status, _) = sign(&app, FLAGSHIP_SLUG, "x@example.com", true).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, stats) = send(&app, Method::GET, &format!("/petitions/{FLAGSHIP_SLUG}/stats"), None).await;
        assert_eq!(stats["signatureCount"], 1);

        let (_, health) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(health["durable"], "unavailable");
    }

    #[tokio::test]
    async fn test_both_stores_down_is_a_server_error() {
        let store = DualStore::new(Arc::new(Unreachable), Arc::new(Unreachable), Duration::from_millis(500));
        let app = app_with(store);

        let (status, body) = sign(&app, FLAGSHIP_ID, "x@example.com", true).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Storage is temporarily unavailable");
    }
}
