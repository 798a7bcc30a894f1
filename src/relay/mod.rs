//! The relay engine: per-path fan-out of a publisher's byte stream to its
//! live subscribers.

pub mod publisher;
pub mod subscriber;
