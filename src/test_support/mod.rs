//! Helpers shared by unit tests.

pub(crate) mod scripted;
pub(crate) mod socket_guard;
