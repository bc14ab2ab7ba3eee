//! Remote fetch worker: a tiny one-shot RPC over TCP.
//!
//! A client connects, writes one protobuf-encoded [`proto::Request`], closes its
//! write half, then reads one [`proto::Response`] until the worker closes the
//! connection. There is exactly one exchange per connection.

pub mod client;
pub mod proto;
pub mod server;

pub use client::WorkerClient;
pub use server::{LeanAndMeanHandler, RequestHandler, WorkerServer};

pub const LEAN_AND_MEAN: &str = "lean_and_mean";

/// Fixed endpoint of each known worker.
pub fn endpoint(worker: &str) -> Option<&'static str> {
    match worker {
        LEAN_AND_MEAN => Some(crate::config::DEFAULT_WORKER_ADDR),
        _ => None,
    }
}
