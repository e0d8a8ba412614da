//! Reply ingestion: quote stripping, contact correlation, and the
//! check that ties the poller to the store.

pub mod correlate;
pub mod quote;
pub mod thread;
pub mod tracker;

pub use correlate::{CheckSummary, ContactIndex, Correlation, correlate};
pub use quote::strip_quoted_text;
pub use thread::{Direction, ThreadEntry, build_thread};
pub use tracker::ReplyTracker;
