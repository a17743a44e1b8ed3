//! Embeddable HTTP route-matching and dispatch core.
//!
//! Maps an incoming (method, path) pair to a registered handler, extracts
//! typed path parameters, runs before/after interceptors around the
//! handler, and normalizes every outcome — success, no-match, unhandled
//! failure — into a finalized response state for the host transport to
//! flush.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                 DISPATCH CORE                 │
//!   Request        │  ┌─────────┐   ┌──────────┐   ┌────────────┐ │
//!   ───────────────┼─▶│  http   │──▶│ dispatch │──▶│  routing   │ │
//!   (adapter/host) │  │ request │   │  engine  │   │  table +   │ │
//!                  │  └─────────┘   └────┬─────┘   │  patterns  │ │
//!                  │                     │         └────────────┘ │
//!                  │                     ▼                        │
//!                  │              ┌─────────────┐                 │
//!                  │              │ interceptor │                 │
//!                  │              │  registry   │                 │
//!                  │              └──────┬──────┘                 │
//!   Response       │  ┌─────────┐        │                        │
//!   ◀──────────────┼──│  http   │◀───────┘                        │
//!                  │  │response │   (errors → correlated 500)     │
//!                  │  └─────────┘                                 │
//!                  └──────────────────────────────────────────────┘
//! ```
//!
//! Registration is a startup-only phase; the built [`App`] is immutable and
//! safe to share across concurrent requests.

// Core subsystems
pub mod dispatch;
pub mod http;
pub mod interceptor;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod errors;
pub mod observability;

pub use config::AppConfig;
pub use dispatch::App;
pub use errors::{BoxError, RegistrationError};
pub use http::{Filter, HttpServer, RequestContext, ResponseState, Source};
pub use interceptor::{Flow, InterceptContext, Interceptor, InterceptorRegistry};
pub use routing::table::Handler;
pub use routing::{Pattern, RouteTable};
