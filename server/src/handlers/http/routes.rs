use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, StatusCode};
use tracing::warn;

use crate::AppState;
use crate::database::accounts::Account;
use crate::handlers::http::utils::headers::{AuthError, authorize, get_header_value};
use crate::handlers::http::utils::json_response::{deliver_error_json, full};
use crate::handlers::http::{admin, auth, jobs, users};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two security tiers:
//
//   RouteHandler — no auth.  Receives (req, state).
//                  Use for: signup, login, verify, public reads.
//
//   GateHandler  — token cookie decoded + account row loaded.
//                  Receives (req, state, account).
//                  Use for: anything that needs the caller's identity.

type RouteHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

type GateHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
            Account, // resolved by the router before the handler runs
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

enum RouteKind {
    /// No authentication check.
    Open(RouteHandler),

    /// Gate auth: token decoded and the account looked up in the DB.
    /// Handler receives the resolved `Account`.
    Gate(GateHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    /// GET with no authentication — public profile and listing reads.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    /// POST with no authentication — signup / login / password-confirmed
    /// mutations that carry their own credential in the body.
    pub fn post<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    /// PUT with no router-level auth — the handler confirms the password
    /// itself (multipart edits).
    pub fn put<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::PUT,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    // ── Gate auth (token decode + DB account lookup) ─────────────────────────
    //
    // The router runs `authorize` before the handler is called.  Handlers
    // receive the resolved `Account` and must NOT repeat the auth call.

    /// GET guarded by the authorization gate.
    pub fn get_gate<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Account) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Gate(Box::new(move |req, state, account| {
                Box::pin(handler(req, state, account))
            })),
        });
        self
    }

    /// POST guarded by the authorization gate.
    pub fn post_gate<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, Account) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Gate(Box::new(move |req, state, account| {
                Box::pin(handler(req, state, account))
            })),
        });
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let origin = get_header_value(req.headers(), "origin");

        // Preflight is answered here; no handler sees OPTIONS.
        if method == Method::OPTIONS {
            return Ok(apply_cors(preflight_response()?, origin.as_deref(), &state));
        }

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            let response = match &route.kind {
                RouteKind::Open(h) => h(req, state.clone()).await?,

                RouteKind::Gate(h) => match authorize(&req, &state).await {
                    Ok(account) => h(req, state.clone(), account).await?,
                    Err(reason) => {
                        warn!("Gate rejected {} {}: {}", method, path, reason);
                        gate_rejection(&reason)?
                    }
                },
            };

            return Ok(apply_cors(response, origin.as_deref(), &state));
        }

        let not_found =
            deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
                .context("Failed to deliver 404 response")?;
        Ok(apply_cors(not_found, origin.as_deref(), &state))
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        // Exact match.
        if route_path == clean {
            return true;
        }

        // Segment-by-segment matching for `:param` wildcards.
        // e.g.  "/auth/verify/:reg_id"  matches  "/auth/verify/S101"
        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return false;
        }

        route_segs
            .iter()
            .zip(path_segs.iter())
            .all(|(r, p)| r.starts_with(':') || r == p)
    }
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// Attach CORS headers when the request's origin is on the config allowlist.
/// Exact string match only.
fn apply_cors<T>(
    mut res: Response<T>,
    origin: Option<&str>,
    state: &AppState,
) -> Response<T> {
    let Some(origin) = origin else { return res };
    if !state.config.server.origin_allowed(origin) {
        return res;
    }

    let headers = res.headers_mut();
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert("access-control-allow-origin", value);
        headers.insert(
            "access-control-allow-credentials",
            HeaderValue::from_static("true"),
        );
        headers.insert("vary", HeaderValue::from_static("Origin"));
    }
    res
}

fn preflight_response() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(
            "access-control-allow-methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .header("access-control-allow-headers", "content-type")
        .header("access-control-max-age", "600")
        .body(full(Bytes::new()))
        .context("Failed to build preflight response")
}

/// A missing or bad token is 401; a token whose account no longer exists
/// resolves and then 404s, the same answer a lookup of that account would
/// give.
fn gate_rejection(err: &AuthError) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match err {
        AuthError::AccountGone => deliver_error_json(
            "NOT_FOUND",
            "Account no longer exists",
            StatusCode::NOT_FOUND,
        ),
        AuthError::Database(_) => deliver_error_json(
            "DATABASE_ERROR",
            "Database error occurred",
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        AuthError::Token(_) => deliver_error_json(
            "UNAUTHORIZED",
            "Authentication required",
            StatusCode::UNAUTHORIZED,
        ),
    }
    .context("Failed to deliver gate rejection")
}

// ---------------------------------------------------------------------------
// API router
//
// Auth tier is enforced here at the routing level — handlers MUST NOT repeat
// the auth call.  Password-confirmed routes stay on the Open tier because
// the credential travels in the body, not the cookie.
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Auth ─────────────────────────────────────────────────────────────
        .post("/auth/signup", |req, state| async move {
            auth::handle_signup(req, state).await.context("Signup failed")
        })
        .post("/auth/adminsignup", |req, state| async move {
            auth::handle_admin_signup(req, state)
                .await
                .context("Admin signup failed")
        })
        .post("/auth/login", |req, state| async move {
            auth::handle_login(req, state).await.context("Login failed")
        })
        .post("/auth/adminlogin", |req, state| async move {
            auth::handle_admin_login(req, state)
                .await
                .context("Admin login failed")
        })
        .post("/auth/logout", |req, state| async move {
            auth::handle_logout(req, state).await.context("Logout failed")
        })
        .post("/auth/verify/:reg_id", |req, state| async move {
            auth::handle_verify(req, state).await.context("Verify failed")
        })
        .get_gate("/auth/check", |req, state, account| async move {
            auth::handle_check(req, state, account)
                .await
                .context("Auth check failed")
        })
        // ── Users ────────────────────────────────────────────────────────────
        .get("/users", |req, state| async move {
            users::handle_get_profile(req, state)
                .await
                .context("Profile get failed")
        })
        .post("/users", |req, state| async move {
            users::handle_update_profile(req, state)
                .await
                .context("Profile update failed")
        })
        .get("/users/details", |req, state| async move {
            users::handle_get_details(req, state)
                .await
                .context("Details get failed")
        })
        .post("/users/details", |req, state| async move {
            users::handle_upsert_details(req, state)
                .await
                .context("Details upsert failed")
        })
        .post("/users/loadData", |req, state| async move {
            users::handle_load_data(req, state)
                .await
                .context("Load data failed")
        })
        .put("/users/editProfile/:reg_id", |req, state| async move {
            users::handle_edit_profile(req, state)
                .await
                .context("Profile edit failed")
        })
        // ── Admin ────────────────────────────────────────────────────────────
        .get("/admin", |req, state| async move {
            admin::handle_get_admin(req, state)
                .await
                .context("Admin get failed")
        })
        .get("/admin/details", |req, state| async move {
            admin::handle_get_admin_details(req, state)
                .await
                .context("Admin details get failed")
        })
        .post("/admin", |req, state| async move {
            admin::handle_upsert_admin_details(req, state)
                .await
                .context("Admin details upsert failed")
        })
        // ── Jobs ─────────────────────────────────────────────────────────────
        .get("/jobs", |req, state| async move {
            jobs::handle_list_jobs(req, state)
                .await
                .context("Job list failed")
        })
        .post("/jobs/apply", |req, state| async move {
            jobs::handle_apply(req, state).await.context("Job apply failed")
        })
        .post("/jobs/add", |req, state| async move {
            jobs::handle_add_job(req, state).await.context("Job add failed")
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_path_matches() {
        assert!(Router::path_matches("/auth/login", "/auth/login"));
    }

    #[test]
    fn different_paths_do_not_match() {
        assert!(!Router::path_matches("/auth/login", "/auth/logout"));
    }

    #[test]
    fn trailing_slash_does_not_match_without_slash() {
        assert!(!Router::path_matches("/users", "/users/"));
    }

    #[test]
    fn wildcard_segment_matches_reg_id() {
        assert!(Router::path_matches(
            "/auth/verify/:reg_id",
            "/auth/verify/S101"
        ));
        assert!(Router::path_matches(
            "/users/editProfile/:reg_id",
            "/users/editProfile/S101"
        ));
    }

    #[test]
    fn wildcard_does_not_match_extra_segments() {
        assert!(!Router::path_matches(
            "/auth/verify/:reg_id",
            "/auth/verify/S101/extra"
        ));
    }

    #[test]
    fn query_string_stripped_before_match() {
        assert!(Router::path_matches("/users", "/users?reg_id=S101"));
        assert!(Router::path_matches(
            "/users/details",
            "/users/details?reg_id=S101"
        ));
    }

    #[test]
    fn router_new_has_no_routes() {
        let r = Router::new();
        assert!(r.routes.is_empty());
    }

    #[test]
    fn gate_rejection_distinguishes_gone_account_from_bad_token() {
        use crate::handlers::http::utils::headers::TokenError;

        let gone = gate_rejection(&AuthError::AccountGone).unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);

        let bad = gate_rejection(&AuthError::Token(TokenError::Invalid)).unwrap();
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

        let missing = gate_rejection(&AuthError::Token(TokenError::Missing)).unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn api_router_registers_all_routes() {
        let r = build_api_router();
        assert_eq!(r.routes.len(), 19);
    }

    #[tokio::test]
    async fn router_get_adds_open_route() {
        let r = Router::new().get("/ping", |_req, _state| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(full("pong"))
                .unwrap())
        });
        assert_eq!(r.routes.len(), 1);
        assert_eq!(r.routes[0].path, "/ping");
        assert!(matches!(r.routes[0].kind, RouteKind::Open(_)));
    }

    #[tokio::test]
    async fn router_get_gate_adds_gate_route() {
        let r = Router::new().get_gate("/auth/check", |_req, _state, _account| async move {
            Ok(Response::builder()
                .status(StatusCode::OK)
                .body(full("ok"))
                .unwrap())
        });
        assert_eq!(r.routes.len(), 1);
        assert!(matches!(r.routes[0].kind, RouteKind::Gate(_)));
    }
}
