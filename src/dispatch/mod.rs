//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup only):
//!     get/post/put/delete/patch + interceptor queues
//!     → routing::RouteTable + interceptor::InterceptorRegistry
//!
//! Dispatch (per request):
//!     MATCHING  normalize path, scan routes in registration order
//!     BEFORE    run before-interceptors (halt ends dispatch)
//!     HANDLING  invoke the matched handler
//!     AFTER     run after-interceptors (failures logged only)
//!     DONE      return the finalized ResponseState to the transport
//!     ERROR     reachable from anywhere: 404 no-match or correlated 500
//! ```
//!
//! # Design Decisions
//! - At most one handler runs per request; the first matching route wins
//! - The app is immutable after startup and shared via Arc across workers
//! - Unhandled failures never cross the dispatch boundary as errors

pub mod dispatcher;

pub use dispatcher::App;
