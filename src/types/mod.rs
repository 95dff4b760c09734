// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource identity and the custom resource owned by the controller.

pub mod key;
pub mod storage_cluster;

pub use key::{LabelSelector, ResourceKey};
pub use storage_cluster::{StorageCluster, StorageClusterSpec, StorageClusterStatus};
