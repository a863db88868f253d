/// Rate Limiting System
use crate::{
    api::middleware::is_admin_request,
    config::RateLimitSettings,
    context::AppContext,
    error::{RelmonError, RelmonResult},
};
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per second for administrators
    pub admin_rps: u32,
    /// Requests per second for everyone else
    pub user_rps: u32,
    /// Burst size for the user quota; admins get twice this
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_rps: 100,
            user_rps: 10,
            burst_size: 20,
        }
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            enabled: settings.enabled,
            admin_rps: settings.admin_rps,
            user_rps: settings.user_rps,
            ..Default::default()
        }
    }
}

fn non_zero(value: u32, fallback: NonZeroU32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(fallback)
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    user_limit: u32,
    admin_limit: u32,
    user: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    admin: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let user_rps = non_zero(config.user_rps, NonZeroU32::MIN);
        let admin_rps = non_zero(config.admin_rps, NonZeroU32::MIN);
        let burst = non_zero(config.burst_size, NonZeroU32::MIN);
        let admin_burst = non_zero(config.burst_size.saturating_mul(2), NonZeroU32::MIN);

        let user_quota = Quota::per_second(user_rps).allow_burst(burst);
        let admin_quota = Quota::per_second(admin_rps).allow_burst(admin_burst);

        Self {
            enabled: config.enabled,
            user_limit: user_rps.get(),
            admin_limit: admin_rps.get(),
            user: Arc::new(GovernorLimiter::direct(user_quota)),
            admin: Arc::new(GovernorLimiter::direct(admin_quota)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check rate limit for non-admin traffic
    pub fn check_user(&self) -> RelmonResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.user.check().map_err(|_| RelmonError::RateLimitExceeded {
            retry_after: Duration::from_secs(1),
        })
    }

    /// Check rate limit for admin traffic
    pub fn check_admin(&self) -> RelmonResult<()> {
        if !self.enabled {
            return Ok(());
        }
        self.admin.check().map_err(|_| RelmonError::RateLimitExceeded {
            retry_after: Duration::from_secs(1),
        })
    }

    fn limit_for(&self, admin: bool) -> u32 {
        if admin {
            self.admin_limit
        } else {
            self.user_limit
        }
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Response {
    if !ctx.rate_limiter.is_enabled() {
        return next.run(request).await;
    }

    let admin = is_admin_request(&ctx, request.headers());
    let result = if admin {
        ctx.rate_limiter.check_admin()
    } else {
        ctx.rate_limiter.check_user()
    };

    match result {
        Ok(()) => {
            let mut response = next.run(request).await;
            response.headers_mut().insert(
                "X-RateLimit-Limit",
                HeaderValue::from(ctx.rate_limiter.limit_for(admin)),
            );
            response
        }
        Err(e) => {
            tracing::warn!("Rate limit exceeded for {} traffic", if admin { "admin" } else { "user" });
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(RateLimitConfig::default());

        assert!(limiter.check_user().is_ok());
        assert!(limiter.check_admin().is_ok());
    }

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: true,
            admin_rps: 100,
            user_rps: 1,
            burst_size: 5,
        });

        for _ in 0..5 {
            assert!(limiter.check_user().is_ok());
        }
        assert!(matches!(
            limiter.check_user(),
            Err(RelmonError::RateLimitExceeded { .. })
        ));

        // admin quota is separate
        assert!(limiter.check_admin().is_ok());
    }

    #[test]
    fn test_disabled_limiter_never_rejects() {
        let limiter = RateLimiter::new(RateLimitConfig {
            enabled: false,
            admin_rps: 1,
            user_rps: 1,
            burst_size: 1,
        });

        for _ in 0..10 {
            assert!(limiter.check_user().is_ok());
        }
    }
}
