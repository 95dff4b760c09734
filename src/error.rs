// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use thiserror::Error;

use crate::types::ResourceKey;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("failed to delete {kind}: {name:?} (namespace {namespace:?}): {source}")]
    Delete {
        kind: String,
        name: String,
        namespace: String,
        #[source]
        source: kube::Error,
    },

    #[error("Cannot build owner reference: {0}")]
    OwnerReference(String),

    #[error("{kind} {key} is already controlled by {owner_kind} {owner_name}")]
    AlreadyOwned {
        kind: String,
        key: String,
        owner_kind: String,
        owner_name: String,
    },

    #[error("Container index {index} out of range for pod template with {len} containers")]
    ContainerIndexOutOfRange { index: usize, len: usize },

    #[error("Invalid workload: {0}")]
    InvalidWorkload(String),

    #[error("Deadline exceeded after {timeout:?} waiting for {key} to become ready")]
    DeadlineExceeded { key: ResourceKey, timeout: Duration },

    #[error("Cancelled while waiting for {key} to become ready")]
    Cancelled { key: ResourceKey },
}

impl Error {
    /// True when the underlying store error reports a missing object
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::KubeError(e) | Error::Delete { source: e, .. } => is_not_found(e),
            _ => false,
        }
    }

    /// True for optimistic-concurrency rejections on update
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::KubeError(e) | Error::Delete { source: e, .. } => is_conflict(e),
            _ => false,
        }
    }
}

pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "AlreadyExists")
}

pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409 && ae.reason == "Conflict")
}

pub type Result<T> = std::result::Result<T, Error>;
