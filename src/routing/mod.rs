//! Demo routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (target)
//!     → matcher.rs (resolve target to a Route)
//!     → router.rs (DemoRouter: fixed HTML pages)
//!     → proxy.rs (upstream relay as chunked body + trailers)
//! ```
//!
//! # Design Decisions
//! - Routes are fixed at compile time; only the upstream is configurable
//! - Path matching is case-sensitive, exact or prefix, no regex

pub mod matcher;
pub mod proxy;
pub mod router;

pub use matcher::Route;
pub use proxy::UpstreamProxy;
pub use router::DemoRouter;
