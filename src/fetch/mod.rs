//! Rate-limited retrieval from the archive's replay endpoint
//!
//! Every outbound request shares one token bucket: the whole crawl is a
//! single politeness budget toward the archive, with no per-host split.

mod client;
mod limiter;

pub use client::{build_http_client, FetchedCapture, Fetcher};
pub use limiter::TokenBucket;
