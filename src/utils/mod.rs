use crate::models::{Claims, ServiceError};
use actix_web::http::header;
use actix_web::{dev::ServiceRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};

pub mod directory_storage;
pub mod team_directory;

// Email resolved by the identity provider for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEmail(pub String);

// Read the verified email placed on the request by the auth middleware
pub fn get_email_from_request(req: &HttpRequest) -> Result<String, ServiceError> {
    req.extensions()
        .get::<VerifiedEmail>()
        .map(|verified| verified.0.clone())
        .ok_or(ServiceError::Unauthorized)
}

// JWT utility functions
pub mod jwt {
    use super::*;

    // Generate a new JWT token for an email address
    pub fn generate_token(email: &str, secret: &str, ttl: Duration) -> Result<String, ServiceError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or(ServiceError::InternalServerError)?
            .timestamp() as usize;

        let claims = Claims {
            sub: email.to_string(),
            email: email.to_string(),
            exp: expiration,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
            .map_err(|_| ServiceError::InternalServerError)
    }

    // Validate and decode a JWT token
    pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::default(),
        )
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Unauthorized)
    }

    // Extract JWT from Authorization header
    pub fn extract_token_from_header(auth_header: &str) -> Result<String, ServiceError> {
        if !auth_header.starts_with("Bearer ") {
            return Err(ServiceError::Unauthorized);
        }

        Ok(auth_header.trim_start_matches("Bearer ").trim().to_string())
    }
}

// Identity provider adapter: request credentials in, verified email out
pub mod identity {
    use super::*;
    use regex::Regex;

    lazy_static::lazy_static! {
        static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum IdentityOutcome {
        Authenticated(String),
        Unauthenticated,
    }

    // Trim and lower-case an address, rejecting anything that isn't shaped like one
    pub fn normalize_email(raw: &str) -> Option<String> {
        let email = crate::models::normalize_email(raw);
        if EMAIL_PATTERN.is_match(&email) {
            Some(email)
        } else {
            None
        }
    }

    pub fn resolve(auth_header: Option<&str>, secret: &str) -> IdentityOutcome {
        let claims = auth_header
            .ok_or(ServiceError::Unauthorized)
            .and_then(jwt::extract_token_from_header)
            .and_then(|token| jwt::decode_token(&token, secret));

        match claims {
            Ok(claims) => match normalize_email(&claims.email) {
                Some(email) => IdentityOutcome::Authenticated(email),
                None => {
                    warn!("Token carried a malformed email claim");
                    IdentityOutcome::Unauthenticated
                }
            },
            Err(_) => IdentityOutcome::Unauthenticated,
        }
    }

}

// Middleware for JWT authentication
pub mod auth_middleware {
    use super::identity::{self, IdentityOutcome};
    use super::*;
    use actix_web::dev::{forward_ready, Service, ServiceResponse, Transform};
    use actix_web::Error;
    use futures::future::{ready, Ready};
    use std::future::Future;
    use std::pin::Pin;

    // Routes reachable without a token
    const PUBLIC_PATHS: [&str; 2] = ["/", "/health"];

    pub struct Authentication {
        secret: String,
    }

    impl Authentication {
        pub fn new(secret: impl Into<String>) -> Self {
            Self { secret: secret.into() }
        }
    }

    impl<S, B> Transform<S, ServiceRequest> for Authentication
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        S::Future: 'static,
        B: 'static,
    {
        type Response = ServiceResponse<B>;
        type Error = Error;
        type Transform = AuthenticationMiddleware<S>;
        type InitError = ();
        type Future = Ready<Result<Self::Transform, Self::InitError>>;

        fn new_transform(&self, service: S) -> Self::Future {
            ready(Ok(AuthenticationMiddleware {
                service,
                secret: self.secret.clone(),
            }))
        }
    }

    pub struct AuthenticationMiddleware<S> {
        service: S,
        secret: String,
    }

    impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
        S::Future: 'static,
        B: 'static,
    {
        type Response = ServiceResponse<B>;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

        forward_ready!(service);

        fn call(&self, req: ServiceRequest) -> Self::Future {
            if PUBLIC_PATHS.contains(&req.path()) {
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await });
            }

            let outcome = {
                let auth_header = req
                    .headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                identity::resolve(auth_header, &self.secret)
            };

            match outcome {
                IdentityOutcome::Authenticated(email) => {
                    debug!("Authenticated request for {}", email);
                    req.extensions_mut().insert(VerifiedEmail(email));
                    let fut = self.service.call(req);
                    Box::pin(async move { fut.await })
                }
                IdentityOutcome::Unauthenticated => {
                    debug!("Rejected unauthenticated request to {}", req.path());
                    Box::pin(async move { Err(ServiceError::Unauthorized.into()) })
                }
            }
        }
    }
}

// Time source used by every handler
pub mod clock {
    use super::*;
    use std::sync::Mutex;

    pub trait Clock: Send + Sync {
        fn now(&self) -> DateTime<Utc>;
    }

    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Manually driven clock for tests and replays.
    pub struct FixedClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl FixedClock {
        pub fn new(now: DateTime<Utc>) -> Self {
            Self { now: Mutex::new(now) }
        }

        pub fn set(&self, now: DateTime<Utc>) {
            if let Ok(mut current) = self.now.lock() {
                *current = now;
            }
        }

        pub fn advance(&self, by: Duration) {
            if let Ok(mut current) = self.now.lock() {
                *current = *current + by;
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            match self.now.lock() {
                Ok(now) => *now,
                Err(poisoned) => *poisoned.into_inner(),
            }
        }
    }
}

// Human-readable timestamps. Display only, never parsed back.
pub mod display_time {
    use super::*;
    use chrono::{Datelike, FixedOffset, Offset};

    #[derive(Debug, Clone, Copy)]
    pub struct DisplayFormat {
        offset: FixedOffset,
    }

    impl DisplayFormat {
        pub fn from_offset_minutes(minutes: i32) -> Self {
            let offset = minutes.checked_mul(60).and_then(FixedOffset::east_opt).unwrap_or_else(|| {
                warn!("Display offset of {} minutes is out of range, using UTC", minutes);
                Utc.fix()
            });
            Self { offset }
        }

        // e.g. "5:30 AM, 9th Jan 2026"
        pub fn format(&self, instant: DateTime<Utc>) -> String {
            let local = instant.with_timezone(&self.offset);
            let day = local.day();
            format!(
                "{}, {}{} {}",
                local.format("%-I:%M %p"),
                day,
                day_suffix(day),
                local.format("%b %Y")
            )
        }
    }

    fn day_suffix(day: u32) -> &'static str {
        if (4..=20).contains(&day) {
            return "th";
        }
        match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    }

}
