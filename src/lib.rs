//! Guarded Q&A
//!
//! A chat widget that posts questions to a single answer endpoint and keeps
//! a bounded audit log of every attempt, together with the guarded answer
//! server it talks to.
//!
//! # Architecture
//!
//! - **Widget**: platform-neutral controller driving a view and an HTTP transport
//! - **Server**: Axum answer endpoint with input/output guardrails and per-client rate limiting
//! - **LLM**: OpenAI-compatible Chat Completions generator
//!
//! # Modules
//!
//! - [`widget`]: chat widget controller, views and transport
//! - [`server`]: HTTP routes and server startup
//! - [`security`]: guardrails and rate limiting
//! - [`llm`]: answer generation
//! - [`config`]: layered configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod chat;
pub mod config;
pub mod llm;
pub mod security;
pub mod server;
pub mod widget;

use crate::config::AppConfig;
use crate::llm::AnswerGenerator;
use crate::security::{ClientRateLimiter, Guardrails};

use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Produces answers for accepted queries.
    pub generator: Arc<dyn AnswerGenerator>,
    /// Compiled input/output screening rules.
    pub guardrails: Arc<Guardrails>,
    /// Per-client rate limiter for the answer endpoint.
    pub rate_limiter: Arc<ClientRateLimiter>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("rate_limiter", &self.rate_limiter)
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// Build state around `generator`, compiling guardrails and sizing the
    /// rate limiter from `config`.
    pub fn new(
        config: Arc<AppConfig>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            generator,
            guardrails: Arc::new(Guardrails::new()?),
            rate_limiter: Arc::new(ClientRateLimiter::per_minute(
                config.resilience.requests_per_minute,
            )),
            config,
        })
    }
}
