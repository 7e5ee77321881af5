//! HTTP access to the fable backend.

pub mod client;
pub mod config;
pub mod wire;

pub use client::*;
pub use config::*;
pub use wire::*;
