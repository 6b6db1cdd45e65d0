//! Request screening and throttling for the answer endpoint.

pub mod guardrails;
pub mod rate_limit;

pub use guardrails::{GuardrailViolation, Guardrails};
pub use rate_limit::{ClientRateLimiter, rate_limit_middleware};
