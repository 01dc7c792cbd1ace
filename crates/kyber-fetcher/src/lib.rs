//! `kyber-fetcher`: retrieval of raw market and chain data.
//!
//! [`Fetcher`] is the seam the scheduler's jobs call through. [`HttpFetcher`]
//! implements it against an Ethereum JSON-RPC node plus two plain HTTP
//! endpoints. Every call is a single attempt; there is no retry here.

pub mod fetcher;
pub mod http;
pub mod rpc;

pub use fetcher::{FetchError, Fetcher};
pub use http::HttpFetcher;
