//! Placement Pitcher: campus-placement outreach with reply tracking.

pub mod config;
pub mod error;
pub mod mailbox;
pub mod outbound;
pub mod replies;
pub mod routes;
pub mod store;
