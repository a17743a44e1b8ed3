//! HTTP request/response surface of the dispatch core.
//!
//! # Data Flow
//! ```text
//! Transport (Axum adapter, or any embedding host)
//!     → request.rs (pre-parsed method/path/query/form/headers/body)
//!     → [dispatch layer matches route, runs interceptors + handler]
//!     → response.rs (status, headers, body behind the finalized flag)
//!     → server.rs flushes the state back to the wire
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Filter, RequestContext, Source};
pub use response::ResponseState;
pub use server::HttpServer;
