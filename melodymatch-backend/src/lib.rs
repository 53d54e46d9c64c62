//! HTTP transport for the MelodyMatch backend.

mod client;

pub use client::HttpBackend;
