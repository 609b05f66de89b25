//! # sealfs Testkit
//!
//! Test utilities for sealfs.
//!
//! This crate provides:
//! - `InMemoryServer`, a fake of the remote collaborators: a versioned
//!   object store gated on expected versions, a write-once block store and
//!   a device directory
//! - `DeviceSession`, an authenticated per-device handle implementing the
//!   client's backend traits
//! - Fixtures wiring devices, storage and syncer together

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixtures;
mod server;

pub use fixtures::{wired_client, TestClient, TestDevice};
pub use server::{DeviceSession, InMemoryServer};
