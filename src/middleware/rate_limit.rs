use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::handlers::ApiError;

#[derive(Clone)]
struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter per client key.
#[derive(Clone)]
pub struct RateLimiter {
    // Map of client key -> rate limit entry
    limits: Arc<RwLock<HashMap<String, RateLimitEntry>>>,
    max_requests: u32,
    window_seconds: u64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_seconds,
        }
    }

    /// When 0, rate limiting is disabled (useful for local dev/testing).
    pub fn is_disabled(&self) -> bool {
        self.max_requests == 0
    }

    pub async fn check_limit(&self, key: &str) -> Result<(), ApiError> {
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        // Clean up old entries periodically (simple cleanup)
        if limits.len() > 10000 {
            limits.retain(|_, entry| entry.reset_at > now);
        }

        match limits.get_mut(key) {
            Some(entry) => {
                // Window expired: start a new one
                if entry.reset_at <= now {
                    entry.count = 1;
                    entry.reset_at = now + Duration::from_secs(self.window_seconds);
                    return Ok(());
                }

                if entry.count >= self.max_requests {
                    return Err(ApiError::too_many_requests());
                }

                entry.count += 1;
                Ok(())
            }
            None => {
                limits.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        reset_at: now + Duration::from_secs(self.window_seconds),
                    },
                );
                Ok(())
            }
        }
    }
}

// Client key: proxy headers first, then the peer address when the server was started with connect info
fn client_key(req: &Request) -> String {
    if let Some(forwarded_for) = req.headers().get("x-forwarded-for") {
        if let Ok(ip) = forwarded_for.to_str() {
            // Take the first IP if there are multiple
            return ip.split(',').next().unwrap_or("unknown").trim().to_string();
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            return ip.trim().to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if rate_limiter.is_disabled() || req.uri().path() == "/health" {
        return next.run(req).await;
    }

    let key = client_key(&req);
    if let Err(err) = rate_limiter.check_limit(&key).await {
        tracing::warn!("Rate limit exceeded for client {}", key);
        return err.at(req.uri()).into_response();
    }

    next.run(req).await
}
