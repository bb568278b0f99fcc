//! Per-client admission control.
//!
//! One token bucket per client key, held in a single map behind one mutex. The
//! lock is only taken for a single lookup/refill/take (or one sweep pass) and is
//! never held across an await.

mod bucket;
mod config;
mod registry;

pub use bucket::ClientBucket;
pub use config::{AdmissionConfig, Quota, QuotaError};
pub use registry::{Admission, RateLimiter};
