// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed lookups for the kinds the controller manages

use crate::error::{Error, Result};
use crate::kubernetes::store::ObjectStore;
use crate::types::{ResourceKey, StorageCluster};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Service};
use k8s_openapi::api::rbac::v1::Role;
use kube::Api;
use tracing::{debug, instrument};

impl ObjectStore {
    pub async fn get_storage_cluster(&self, key: &ResourceKey) -> Result<StorageCluster> {
        self.get(key).await
    }

    pub async fn list_storage_clusters(&self, namespace: &str) -> Result<Vec<StorageCluster>> {
        self.list(namespace, None).await
    }

    pub async fn get_stateful_set(&self, key: &ResourceKey) -> Result<StatefulSet> {
        self.get(key).await
    }

    pub async fn stateful_set_exists(&self, key: &ResourceKey) -> Result<bool> {
        match self.get_stateful_set(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn get_service(&self, key: &ResourceKey) -> Result<Service> {
        self.get(key).await
    }

    pub async fn get_config_map(&self, key: &ResourceKey) -> Result<ConfigMap> {
        self.get(key).await
    }

    pub async fn get_pod(&self, key: &ResourceKey) -> Result<Pod> {
        self.get(key).await
    }

    pub async fn get_role(&self, key: &ResourceKey) -> Result<Role> {
        self.get(key).await
    }

    /// Check whether a namespace exists in the cluster
    #[instrument(skip(self))]
    pub async fn namespace_exists(&self, name: &str) -> Result<bool> {
        let namespaces: Api<Namespace> = Api::all(self.client().clone());

        match namespaces.get(name).await {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("Namespace {} does not exist", name);
                Ok(false)
            }
            Err(e) => Err(Error::KubeError(e)),
        }
    }
}
