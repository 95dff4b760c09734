// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label keys put on objects created for a StorageCluster
pub mod labels {
    /// Name of the owning StorageCluster
    pub const CLUSTER: &str = "steward.geeko.me/cluster";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}

/// The operator name, used as the managed-by label value
pub const OPERATOR_NAME: &str = "steward";

/// Readiness polling configuration
pub mod readiness {
    /// Interval between two readiness checks in seconds
    pub const POLL_INTERVAL_SECS: u64 = 3;
    /// Default overall timeout in seconds
    pub const TIMEOUT_SECS: u64 = 300;
    /// Pod phase that counts as ready
    pub const POD_RUNNING: &str = "Running";
}

/// Replica count the API server assumes when a StatefulSet leaves it unset
pub const DEFAULT_REPLICAS: i32 = 1;
