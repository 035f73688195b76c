#![forbid(unsafe_code)]

pub use check::{check, CheckResponse, DeprecatedMember};
pub use metrics::Metrics;
pub use request::Request;
pub use usage::{MemberUsage, UsageTracker};

mod check;
mod metrics;
mod request;
mod usage;

pub mod handler;
