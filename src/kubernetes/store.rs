// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed get/list/create/update/delete over an explicit client handle

use crate::error::Result;
use crate::types::{LabelSelector, ResourceKey};
use kube::{
    api::{DeleteParams, ListParams, PostParams},
    core::NamespaceResourceScope,
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Any namespaced record the store can get, list, create, update and delete
pub trait ManagedObject:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Kind name used in logs and error context
    fn kind_name() -> String {
        Self::kind(&()).to_string()
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::of(self)
    }
}

impl<K> ManagedObject for K where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Façade over the Kubernetes API. Holds no state besides the client handle;
/// every call is a single round-trip.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
}

impl ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn api<K: ManagedObject>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    #[instrument(skip(self), fields(kind = %K::kind_name()))]
    pub async fn get<K: ManagedObject>(&self, key: &ResourceKey) -> Result<K> {
        let obj = self.api::<K>(key.namespace()).get(key.name()).await?;
        Ok(obj)
    }

    #[instrument(skip(self, selector), fields(kind = %K::kind_name()))]
    pub async fn list<K: ManagedObject>(
        &self,
        namespace: &str,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<K>> {
        let mut lp = ListParams::default();
        if let Some(selector) = selector.filter(|s| !s.is_empty()) {
            lp = lp.labels(&selector.to_query());
        }

        let list = self.api::<K>(namespace).list(&lp).await?;
        debug!("Listed {} {} in {}", list.items.len(), K::kind_name(), namespace);
        Ok(list.items)
    }

    #[instrument(skip(self, obj), fields(kind = %K::kind_name(), key = %obj.key()))]
    pub async fn create<K: ManagedObject>(&self, obj: &K) -> Result<K> {
        let namespace = obj.namespace().unwrap_or_default();
        let created = self
            .api::<K>(&namespace)
            .create(&PostParams::default(), obj)
            .await?;
        Ok(created)
    }

    /// Replace the stored object. The submitted resourceVersion is checked by the API server.
    #[instrument(skip(self, obj), fields(kind = %K::kind_name(), key = %obj.key()))]
    pub async fn update<K: ManagedObject>(&self, obj: &K) -> Result<K> {
        let namespace = obj.namespace().unwrap_or_default();
        let updated = self
            .api::<K>(&namespace)
            .replace(&obj.name_any(), &PostParams::default(), obj)
            .await?;
        Ok(updated)
    }

    /// Returns the bare `kube::Error` so `delete_if_exists` can tell
    /// not-found apart before adding kind and key to other failures.
    #[instrument(skip(self), fields(kind = %K::kind_name()))]
    pub async fn delete<K: ManagedObject>(
        &self,
        key: &ResourceKey,
    ) -> std::result::Result<(), kube::Error> {
        self.api::<K>(key.namespace())
            .delete(key.name(), &DeleteParams::default())
            .await?;
        Ok(())
    }
}
