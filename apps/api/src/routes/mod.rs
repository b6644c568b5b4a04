pub mod health;
pub mod public;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::chat::handlers as chat;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Multipart uploads need more than axum's default 2 MB body limit.
    let uploads = Router::new()
        .route("/resume", post(admin::handle_upload_resume))
        .route("/documents", post(admin::handle_upload_document))
        .route("/avatar", post(admin::handle_upload_avatar))
        .layer(DefaultBodyLimit::max(admin::UPLOAD_BODY_LIMIT));

    let admin_api = Router::new()
        .route("/login", post(admin::handle_login))
        .route("/stats", get(admin::handle_stats))
        .route("/users", get(admin::handle_list_users))
        .route("/users/:id", delete(admin::handle_delete_user))
        .route(
            "/users/:id/conversations",
            get(admin::handle_user_conversations),
        )
        .route("/conversations", delete(admin::handle_clear_conversations))
        .route(
            "/knowledge",
            get(admin::handle_knowledge_stats).delete(admin::handle_clear_knowledge),
        )
        .route("/knowledge/crawl", post(admin::handle_crawl))
        .route("/export/users.csv", get(admin::handle_export_users))
        .route(
            "/export/conversations.csv",
            get(admin::handle_export_conversations),
        )
        .route("/export/document.json", get(admin::handle_export_document))
        .merge(uploads);

    Router::new()
        .route("/health", get(health::health_handler))
        // Public profile
        .route("/api/v1/profile", get(public::handle_get_profile))
        .route("/api/v1/avatar", get(public::handle_get_avatar))
        .route("/api/v1/resume", get(public::handle_get_resume))
        // Chat
        .route("/api/v1/chat/sessions", post(chat::handle_create_session))
        .route("/api/v1/chat/sessions/:id", get(chat::handle_get_session))
        .route(
            "/api/v1/chat/sessions/:id/messages",
            post(chat::handle_post_message),
        )
        // Admin dashboard
        .nest("/api/v1/admin", admin_api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::knowledge::ChunkSource;

    const PASSWORD: &str = "letmein";

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn admin_get(uri: &str) -> Request<Body> {
        Request::get(uri)
            .header("x-admin-password", PASSWORD)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_upload(uri: &str, file_name: &str, content_type: &str, content: &str) -> Request<Body> {
        let boundary = "chatfolio-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        Request::post(uri)
            .header("x-admin-password", PASSWORD)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send(app, post_json("/api/v1/chat/sessions", json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["state"], "awaiting_name");
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn say(app: &Router, session: &str, text: &str) -> (StatusCode, Value) {
        send(
            app,
            post_json(
                &format!("/api/v1/chat/sessions/{session}/messages"),
                json!({ "text": text }),
            ),
        )
        .await
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(AppState::for_tests());
        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "chatfolio");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["llm_enabled"], false);
    }

    #[tokio::test]
    async fn test_chat_flow_registers_visitor_and_logs_exchange() {
        let state = AppState::for_tests();
        let app = build_router(state.clone());
        let session = open_session(&app).await;

        let (_, body) = say(&app, &session, "I'm sam").await;
        assert_eq!(body["state"], "awaiting_email_choice");
        assert!(body.get("intent").is_none());

        let (_, body) = say(&app, &session, "no").await;
        assert_eq!(body["state"], "chatting");

        let (status, body) = say(&app, &session, "What are his skills?").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "skills");
        assert_eq!(body["source"], "fallback");
        assert_eq!(
            body["reply"],
            "Alex's core skills include: Rust, Python, PostgreSQL, Kubernetes."
        );

        let doc = state.store.read().await.unwrap();
        assert_eq!(doc.users.len(), 1);
        let user = doc.users.values().next().unwrap();
        assert_eq!(user.name, "Sam");
        assert_eq!(doc.conversations[&user.id][0].intent, "skills");

        let (status, body) = send(
            &app,
            Request::get(format!("/api/v1/chat/sessions/{session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["visitor_name"], "Sam");
        assert_eq!(body["registered"], true);
        // welcome + three visitor/assistant pairs
        assert_eq!(body["transcript"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_deleted_visitor_is_not_logged_again() {
        let state = AppState::for_tests();
        let app = build_router(state.clone());
        let session = open_session(&app).await;
        say(&app, &session, "Sam").await;
        say(&app, &session, "no").await;
        say(&app, &session, "What are his skills?").await;

        let user_id = *state.store.read().await.unwrap().users.keys().next().unwrap();
        let (status, _) = send(
            &app,
            Request::delete(format!("/api/v1/admin/users/{user_id}"))
                .header("x-admin-password", PASSWORD)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert!(status.is_success());

        let (status, _) = say(&app, &session, "Where is he based?").await;
        assert_eq!(status, StatusCode::OK);
        let doc = state.store.read().await.unwrap();
        assert!(doc.users.is_empty());
        assert!(doc.conversations.is_empty());

        let (_, body) = send(
            &app,
            Request::get(format!("/api/v1/chat/sessions/{session}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(body["registered"], false);
    }

    #[tokio::test]
    async fn test_canned_contact_reply() {
        let app = build_router(AppState::for_tests());
        let session = open_session(&app).await;
        say(&app, &session, "Sam").await;
        say(&app, &session, "sam@example.com").await;

        let (_, body) = say(&app, &session, "How do I contact him?").await;
        assert_eq!(body["source"], "canned");
        assert!(body["reply"].as_str().unwrap().contains("alex@example.com"));
    }

    #[tokio::test]
    async fn test_message_too_long_is_rejected() {
        let app = build_router(AppState::for_tests());
        let session = open_session(&app).await;
        let (status, body) = say(&app, &session, &"a".repeat(2001)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = build_router(AppState::for_tests());
        let (status, _) = say(&app, "00000000-0000-0000-0000-000000000000", "hello").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_routes_require_password() {
        let app = build_router(AppState::for_tests());
        let (status, body) = send(
            &app,
            Request::get("/api/v1/admin/stats").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, body) = send(&app, admin_get("/api/v1/admin/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["users"], 0);
        assert_eq!(body["store_backend"], "memory");
    }

    #[tokio::test]
    async fn test_login() {
        let app = build_router(AppState::for_tests());
        let (status, _) = send(
            &app,
            post_json("/api/v1/admin/login", json!({ "password": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            post_json("/api/v1/admin/login", json!({ "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_document_upload_is_searchable() {
        let state = AppState::for_tests();
        let app = build_router(state.clone());

        let (status, body) = send(
            &app,
            multipart_upload(
                "/api/v1/admin/documents",
                "mentoring.txt",
                "text/plain",
                "Alex mentors junior engineers on distributed systems.",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["file_name"], "mentoring.txt");
        assert_eq!(body["chunks"], 1);

        let hits = state.knowledge.read().await.search("distributed systems", 3);
        assert_eq!(hits[0].source, ChunkSource::Document);

        let (_, body) = send(&app, admin_get("/api/v1/admin/knowledge")).await;
        assert_eq!(body["chunks_by_source"]["document"], 1);

        let (status, _) = send(
            &app,
            multipart_upload(
                "/api/v1/admin/documents",
                "mentoring.txt",
                "text/plain",
                "Alex now mentors staff engineers on distributed systems.",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, admin_get("/api/v1/admin/knowledge")).await;
        assert_eq!(body["chunks_by_source"]["document"], 1);
        let hits = state.knowledge.read().await.search("distributed systems", 3);
        assert!(hits.iter().all(|h| !h.text.contains("junior")));
    }

    #[tokio::test]
    async fn test_resume_upload_enables_download() {
        let app = build_router(AppState::for_tests());
        let (status, _) = send(
            &app,
            Request::get("/api/v1/resume").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            multipart_upload(
                "/api/v1/admin/resume",
                "alex_cv.md",
                "text/markdown",
                "# Alex Morgan\n\n**Staff Engineer** at Initech",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["word_count"], 6);

        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/resume").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"alex_cv.md\""
        );

        let (_, body) = send(
            &app,
            Request::get("/api/v1/profile").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(body["has_resume"], true);
        assert_eq!(body["name"], "Alex Morgan");
    }

    #[tokio::test]
    async fn test_avatar_rejects_non_images() {
        let app = build_router(AppState::for_tests());
        let (status, _) = send(
            &app,
            multipart_upload("/api/v1/admin/avatar", "me.txt", "text/plain", "hello"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Request::get("/api/v1/avatar").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_knowledge_reindexes_profile() {
        let state = AppState::for_tests();
        let app = build_router(state.clone());
        state
            .knowledge
            .write()
            .await
            .add_text(ChunkSource::Website, "https://alex.dev", "Blog posts about Rust");

        let (status, body) = send(
            &app,
            Request::delete("/api/v1/admin/knowledge")
                .header("x-admin-password", PASSWORD)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 1);

        let kb = state.knowledge.read().await;
        assert!(kb.has_source(ChunkSource::Profile));
        assert!(!kb.has_source(ChunkSource::Website));
    }

    #[tokio::test]
    async fn test_exports_are_attachments() {
        let app = build_router(AppState::for_tests());
        for path in [
            "/api/v1/admin/export/users.csv",
            "/api/v1/admin/export/conversations.csv",
            "/api/v1/admin/export/document.json",
        ] {
            let response = app.clone().oneshot(admin_get(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{path}");
            let disposition = response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap();
            assert!(disposition.starts_with("attachment; filename=\"chatfolio_"));
        }
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_404() {
        let app = build_router(AppState::for_tests());
        let (status, _) = send(
            &app,
            Request::delete(format!("/api/v1/admin/users/{}", uuid::Uuid::new_v4()))
                .header("x-admin-password", PASSWORD)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
