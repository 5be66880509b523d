use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Name of the cookie carrying the cart session id.
pub const SESSION_COOKIE: &str = "flowershop_session";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Who is calling, as far as public routes care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Caller {
    pub is_staff: bool,
}

/// Cart session id resolved from (or minted for) the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSession(pub Uuid);

/// API key auth settings used by middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Builds auth config from `FLOWERSHOP_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("FLOWERSHOP_API_KEYS").unwrap_or_default();
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() {
            if is_development {
                tracing::warn!(
                    "FLOWERSHOP_API_KEYS not set; staff bearer auth disabled in development environment"
                );
                return Ok(Self {
                    api_keys: Arc::new(HashSet::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "FLOWERSHOP_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self::from_keys(keys))
    }

    /// Auth enabled with exactly these keys.
    #[must_use]
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            api_keys: Arc::new(keys.into_iter().map(Into::into).collect()),
            enabled: true,
        }
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }

    fn is_staff(&self, headers: &HeaderMap) -> bool {
        extract_bearer_token(headers.get(AUTHORIZATION)).is_some_and(|token| self.allows(token))
    }
}

/// Shared secret the Telegram bot presents in `X-Bot-Token`.
#[derive(Debug, Clone)]
pub struct BotAuth {
    secret: Option<Arc<str>>,
}

impl BotAuth {
    #[must_use]
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }

    fn accepts(&self, presented: &str) -> bool {
        match &self.secret {
            Some(expected) if !presented.is_empty() => {
                bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn middleware_error(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Tags the request with a [`Caller`]. Never rejects; public routes use it to
/// decide whether unpublished rows are visible.
pub async fn identify_caller(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let caller = Caller {
        is_staff: auth.is_staff(req.headers()),
    };
    req.extensions_mut().insert(caller);
    next.run(req).await
}

/// Middleware enforcing Bearer token auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled || auth.is_staff(req.headers()) {
        return next.run(req).await;
    }

    middleware_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "missing or invalid bearer token",
    )
}

/// Middleware admitting only requests carrying the bot's shared secret.
pub async fn require_bot_token(
    State(bot): State<BotAuth>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get("x-bot-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if bot.accepts(presented) {
        return next.run(req).await;
    }

    tracing::warn!("rejected bot request with missing or invalid X-Bot-Token");
    middleware_error(StatusCode::FORBIDDEN, "forbidden", "invalid bot token")
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return middleware_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

/// Resolves the cart session from the `flowershop_session` cookie, minting a
/// new id (and setting the cookie on the response) when it is absent or
/// malformed.
pub async fn cart_session(mut req: Request, next: Next) -> Response {
    let existing = session_from_cookies(req.headers());
    let session = existing.unwrap_or_else(Uuid::new_v4);

    req.extensions_mut().insert(CartSession(session));
    let mut res = next.run(req).await;

    if existing.is_none() {
        let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(val) = HeaderValue::from_str(&cookie) {
            res.headers_mut().append(SET_COOKIE, val);
        }
    }

    res
}

fn session_from_cookies(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
