//! Internet radio control plane: catalog search, rate-limited song requests
//! and a now-playing view kept in sync with the stream server.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod playback;
pub mod ratelimit;
pub mod request;
pub mod station;
pub mod stream;
pub mod sync;
