//! Shared helpers for integration tests.
#![allow(dead_code)]

pub mod chunked;
pub mod fixtures;
pub mod socket_guard;
