//! Interceptor subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup only):
//!     name → instance pairs (resolved by the host's discovery step)
//!     → registry.rs (case-insensitive name map)
//!     global/scoped queues
//!     → merged into each route's before/after lists at route registration
//!
//! Dispatch (per request):
//!     route.before names → run_before (halt stops dispatch)
//!     handler
//!     route.after names  → run_after (failures reported, never unwound)
//! ```
//!
//! # Design Decisions
//! - The registry owns the instances; the dispatcher only resolves by name
//! - Merge order: before = global ++ scoped ++ explicit,
//!   after = scoped ++ explicit ++ global; dedupe keeps first occurrence
//! - Names compare case-insensitively and are stored lowercased

pub mod registry;

pub use registry::{Flow, InterceptContext, Interceptor, InterceptorRegistry};
