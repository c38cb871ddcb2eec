//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limit)
//!     → connection.rs (id assignment, active count)
//!     → Hand off to HTTP layer (one request, then close)
//! ```
//!
//! # Design Decisions
//! - Bounded accept: a slot is taken before `accept`, so excess clients
//!   wait in the kernel backlog instead of consuming tasks
//! - Each connection is tracked until its task finishes

pub mod connection;
pub mod listener;
