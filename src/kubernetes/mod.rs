// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent, ownership-aware operations on the Kubernetes API and a readiness waiter.

pub mod accessors;
pub mod delete;
pub mod mutate;
pub mod owner;
pub mod store;
pub mod wait;

pub use owner::bind_controller;
pub use store::{ManagedObject, ObjectStore};
pub use wait::{FetchErrorPolicy, Readiness, ReadinessWaiter, WaitConfig, WaitOutcome};
