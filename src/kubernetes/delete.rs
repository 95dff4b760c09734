// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Delete by key and delete-all-by-selector, both tolerant of absent objects

use crate::error::{is_not_found, Error, Result};
use crate::kubernetes::store::{ManagedObject, ObjectStore};
use crate::types::{LabelSelector, ResourceKey};
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Service};
use tracing::{debug, info, instrument};

impl ObjectStore {
    /// Delete the object of kind `K` at `key`. Returns whether it existed.
    ///
    /// Failures other than not-found are wrapped with kind, name and namespace.
    #[instrument(skip(self), fields(kind = %K::kind_name()))]
    pub async fn delete_if_exists<K: ManagedObject>(&self, key: &ResourceKey) -> Result<bool> {
        match self.delete::<K>(key).await {
            Ok(()) => {
                info!("Deleted {} {}", K::kind_name(), key);
                Ok(true)
            }
            Err(e) if is_not_found(&e) => {
                debug!("{} {} does not exist", K::kind_name(), key);
                Ok(false)
            }
            Err(source) => Err(Error::Delete {
                kind: K::kind_name(),
                name: key.name().to_string(),
                namespace: key.namespace().to_string(),
                source,
            }),
        }
    }

    /// Delete a fetched object by its key
    pub async fn delete_object_if_exists<K: ManagedObject>(&self, obj: &K) -> Result<bool> {
        self.delete_if_exists::<K>(&obj.key()).await
    }

    pub async fn delete_service_if_exists(&self, key: &ResourceKey) -> Result<bool> {
        self.delete_if_exists::<Service>(key).await
    }

    pub async fn delete_stateful_set_if_exists(&self, key: &ResourceKey) -> Result<bool> {
        self.delete_if_exists::<StatefulSet>(key).await
    }

    pub async fn delete_config_map_if_exists(&self, key: &ResourceKey) -> Result<bool> {
        self.delete_if_exists::<ConfigMap>(key).await
    }

    /// Delete a pod; callers only care that it is gone afterwards
    pub async fn delete_pod_if_exists(&self, key: &ResourceKey) -> Result<()> {
        self.delete_if_exists::<Pod>(key).await.map(|_| ())
    }

    /// Delete every `K` in `namespace` matching `selector`. Returns whether any existed.
    ///
    /// Stops at the first failed delete; objects deleted before it stay deleted
    /// and later ones are left in place.
    #[instrument(skip(self, selector), fields(kind = %K::kind_name(), selector = %selector.to_query()))]
    pub async fn delete_all_matching<K: ManagedObject>(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<bool> {
        let items = match self.list::<K>(namespace, Some(selector)).await {
            Ok(items) => items,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };

        let mut any_existed = false;
        for obj in &items {
            any_existed |= self.delete_object_if_exists(obj).await?;
        }
        Ok(any_existed)
    }

    pub async fn delete_all_services_if_exist(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<bool> {
        self.delete_all_matching::<Service>(namespace, selector).await
    }

    pub async fn delete_all_pvcs_if_exist(
        &self,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<bool> {
        self.delete_all_matching::<PersistentVolumeClaim>(namespace, selector).await
    }
}
