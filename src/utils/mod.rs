//! Utility modules
//!
//! Contains timeout handling and string helpers.

pub mod string;
pub mod timeout;

pub use string::{mask_secret, summarize_body, truncate_str};
pub use timeout::{within_deadline, Deadline, TimeoutConfig};
