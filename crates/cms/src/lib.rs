pub mod client;
pub mod fetch;
pub mod signature;

pub use client::{CmsClient, Credentials};
pub use fetch::{CmsFetcher, MetricFetcher};
