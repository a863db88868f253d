/// Moderation API Endpoints
///
/// Distro editing, project/mapping/version deletion, audit log and flag
/// browsing. Deletion routes answer GET with the confirmation prompt and
/// POST with the action itself.
use crate::{
    admin::{
        moderation::{DistroForm, MappingDeletePrompt, ProjectDeletePrompt, VersionDeletePrompt},
        ActionOutcome, AuditLogEntry, BrowseParams, BrowseResult, ProjectFlag,
    },
    auth::AuthContext,
    context::AppContext,
    db::models::Distro,
    error::RelmonResult,
};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

/// Build moderation API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Distros
        .route("/distro/add", post(add_distro))
        .route("/distro/:distro_name/edit", post(edit_distro))
        .route(
            "/distro/:distro_name/delete",
            get(delete_distro_prompt).post(delete_distro),
        )
        // Projects
        .route(
            "/project/:project_id/delete",
            get(delete_project_prompt).post(delete_project),
        )
        .route(
            "/project/:project_id/delete/:distro_name/:pkg_name",
            get(delete_mapping_prompt).post(delete_mapping),
        )
        .route(
            "/project/:project_id/delete/:version",
            get(delete_version_prompt).post(delete_version),
        )
        // Browsing
        .route("/logs", get(browse_logs))
        .route("/flags", get(browse_flags))
        .route("/flags/:flag_id/set/:state", post(set_flag_state))
}

/// Confirmation body for destructive actions. A missing body is a cancel.
#[derive(Debug, Default, Deserialize)]
struct ConfirmForm {
    #[serde(default)]
    confirm: Option<bool>,
}

fn confirmed(body: Option<Json<ConfirmForm>>) -> bool {
    body.and_then(|Json(form)| form.confirm).unwrap_or(false)
}

// ============================================================================
// Distros
// ============================================================================

async fn add_distro(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Json(form): Json<DistroForm>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx.moderation_manager.add_distro(&auth.actor, &form).await?;
    Ok(Json(outcome))
}

async fn edit_distro(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(distro_name): Path<String>,
    Json(form): Json<DistroForm>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx
        .moderation_manager
        .edit_distro(&auth.actor, &distro_name, &form)
        .await?;
    Ok(Json(outcome))
}

async fn delete_distro_prompt(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(distro_name): Path<String>,
) -> RelmonResult<Json<Distro>> {
    let distro = ctx
        .moderation_manager
        .distro_delete_prompt(&auth.actor, &distro_name)
        .await?;
    Ok(Json(distro))
}

async fn delete_distro(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(distro_name): Path<String>,
    body: Option<Json<ConfirmForm>>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx
        .moderation_manager
        .delete_distro(&auth.actor, &distro_name, confirmed(body))
        .await?;
    Ok(Json(outcome))
}

// ============================================================================
// Projects
// ============================================================================

async fn delete_project_prompt(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(project_id): Path<i64>,
) -> RelmonResult<Json<ProjectDeletePrompt>> {
    let prompt = ctx
        .moderation_manager
        .project_delete_prompt(&auth.actor, project_id)
        .await?;
    Ok(Json(prompt))
}

async fn delete_project(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(project_id): Path<i64>,
    body: Option<Json<ConfirmForm>>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx
        .moderation_manager
        .delete_project(&auth.actor, project_id, confirmed(body))
        .await?;
    Ok(Json(outcome))
}

async fn delete_mapping_prompt(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((project_id, distro_name, pkg_name)): Path<(i64, String, String)>,
) -> RelmonResult<Json<MappingDeletePrompt>> {
    let prompt = ctx
        .moderation_manager
        .mapping_delete_prompt(&auth.actor, project_id, &distro_name, &pkg_name)
        .await?;
    Ok(Json(prompt))
}

async fn delete_mapping(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((project_id, distro_name, pkg_name)): Path<(i64, String, String)>,
    body: Option<Json<ConfirmForm>>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx
        .moderation_manager
        .delete_project_mapping(&auth.actor, project_id, &distro_name, &pkg_name, confirmed(body))
        .await?;
    Ok(Json(outcome))
}

async fn delete_version_prompt(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((project_id, version)): Path<(i64, String)>,
) -> RelmonResult<Json<VersionDeletePrompt>> {
    let prompt = ctx
        .moderation_manager
        .version_delete_prompt(&auth.actor, project_id, &version)
        .await?;
    Ok(Json(prompt))
}

async fn delete_version(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((project_id, version)): Path<(i64, String)>,
    body: Option<Json<ConfirmForm>>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx
        .moderation_manager
        .delete_project_version(&auth.actor, project_id, &version, confirmed(body))
        .await?;
    Ok(Json(outcome))
}

// ============================================================================
// Audit log and flags
// ============================================================================

async fn browse_logs(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Query(params): Query<BrowseParams>,
) -> Json<BrowseResult<AuditLogEntry>> {
    Json(ctx.audit_log_manager.browse(&auth.actor, &params).await)
}

async fn browse_flags(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Query(params): Query<BrowseParams>,
) -> RelmonResult<Json<BrowseResult<ProjectFlag>>> {
    let result = ctx.flag_manager.browse(&auth.actor, &params).await?;
    Ok(Json(result))
}

async fn set_flag_state(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path((flag_id, state)): Path<(i64, String)>,
) -> RelmonResult<Json<ActionOutcome>> {
    let outcome = ctx.flag_manager.set_state(&auth.actor, flag_id, &state).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use crate::auth::test_token;
    use crate::config::test_config;
    use crate::context::AppContext;
    use crate::db::test_support::*;
    use crate::server::build_router;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    async fn app() -> (Router, SqlitePool) {
        let pool = test_pool().await;
        let ctx = AppContext::with_pool(test_config(), pool.clone());
        (build_router(ctx), pool)
    }

    fn token(user: &str) -> String {
        test_token(&test_config().authentication.jwt_secret, user, None)
    }

    fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _pool) = app().await;

        let (status, body) = send(&app, request(Method::GET, "/logs", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "AuthenticationRequired");
    }

    #[tokio::test]
    async fn test_add_and_duplicate_distro() {
        let (app, pool) = app().await;

        let (status, body) = send(
            &app,
            request(Method::POST, "/distro/add", Some("admin"), Some(json!({"name": "Fedora"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (status, body) = send(
            &app,
            request(Method::POST, "/distro/add", Some("admin"), Some(json!({"name": "Fedora"}))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Conflict");
        assert_eq!(count_rows(&pool, "logs").await, 1);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_add_distro() {
        let (app, pool) = app().await;

        let (status, _) = send(
            &app,
            request(Method::POST, "/distro/add", Some("alice"), Some(json!({"name": "Arch"}))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(count_rows(&pool, "distros").await, 0);
    }

    #[tokio::test]
    async fn test_delete_project_prompt_then_confirm() {
        let (app, pool) = app().await;
        let project = seed_project(&pool, "foo", &["1.0", "2.0"], Some("2.0")).await;
        let uri = format!("/project/{}/delete", project.id);

        let (status, body) = send(&app, request(Method::GET, &uri, Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"]["name"], "foo");
        assert_eq!(body["versions"].as_array().map(Vec::len), Some(2));

        let (status, body) = send(&app, request(Method::POST, &uri, Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "cancelled");
        assert_eq!(count_rows(&pool, "projects").await, 1);

        let (status, body) = send(
            &app,
            request(Method::POST, &uri, Some("admin"), Some(json!({"confirm": true}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(count_rows(&pool, "projects").await, 0);
        assert_eq!(count_rows(&pool, "project_versions").await, 0);
    }

    #[tokio::test]
    async fn test_version_and_mapping_routes() {
        let (app, pool) = app().await;
        seed_distro(&pool, "Debian").await;
        let project = seed_project(&pool, "foo", &["1.0", "2.0"], Some("2.0")).await;
        seed_package(&pool, project.id, "Debian", "python-foo").await;

        let (status, body) = send(
            &app,
            request(
                Method::POST,
                &format!("/project/{}/delete/2.0", project.id),
                Some("admin"),
                Some(json!({"confirm": true})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (status, _) = send(
            &app,
            request(
                Method::GET,
                &format!("/project/{}/delete/9.9", project.id),
                Some("admin"),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            request(
                Method::POST,
                &format!("/project/{}/delete/Debian/python-foo", project.id),
                Some("admin"),
                Some(json!({"confirm": true})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count_rows(&pool, "packages").await, 0);
        assert_eq!(count_rows(&pool, "logs").await, 2);
    }

    #[tokio::test]
    async fn test_logs_are_scoped_for_non_admins() {
        let (app, _pool) = app().await;

        send(
            &app,
            request(Method::POST, "/distro/add", Some("admin"), Some(json!({"name": "Fedora"}))),
        )
        .await;

        let (status, body) = send(&app, request(Method::GET, "/logs", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["topic"], "distro.add");

        let (status, body) = send(
            &app,
            request(Method::GET, "/logs?user=admin", Some("alice"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_logs_coerce_bad_parameters() {
        let (app, _pool) = app().await;

        let (status, body) = send(
            &app,
            request(Method::GET, "/logs?limit=abc&from_date=yesterday", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limit"], 50);
        let notices = body["notices"].as_array().cloned().unwrap_or_default();
        assert_eq!(notices.len(), 2);
    }

    #[tokio::test]
    async fn test_logs_extreme_and_unbounded_pages() {
        let (app, _pool) = app().await;

        send(
            &app,
            request(Method::POST, "/distro/add", Some("admin"), Some(json!({"name": "Fedora"}))),
        )
        .await;

        let (status, body) = send(
            &app,
            request(Method::GET, "/logs?page=9223372036854775807", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["total"], 1);

        let (status, body) = send(
            &app,
            request(Method::GET, "/logs?limit=0&page=5", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], 1);
        assert_eq!(body["total_pages"], 1);
        assert_eq!(body["items"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_flag_routes() {
        let (app, pool) = app().await;
        let project = seed_project(&pool, "foo", &[], None).await;
        let flag_id = seed_flag(&pool, Some(project.id), "alice", "open", chrono::Utc::now()).await;

        let (status, body) = send(&app, request(Method::GET, "/flags", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let (status, _) = send(&app, request(Method::GET, "/flags", Some("alice"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            request(Method::POST, &format!("/flags/{}/set/bogus", flag_id), Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(
            &app,
            request(Method::POST, &format!("/flags/{}/set/closed", flag_id), Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (status, body) = send(&app, request(Method::GET, "/flags", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, _) = send(
            &app,
            request(Method::POST, "/flags/9999/set/open", Some("admin"), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
