// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Existence-aware create and update.
//!
//! These run on every reconcile, so an object that already exists (on create)
//! or has vanished (on update) is an expected outcome rather than a failure,
//! and unchanged fields never cause a write.

use crate::constants::DEFAULT_REPLICAS;
use crate::error::{is_already_exists, is_not_found, Error, Result};
use crate::kubernetes::owner::bind_controller;
use crate::kubernetes::store::{ManagedObject, ObjectStore};
use crate::types::ResourceKey;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Container;
use kube::Resource;
use tracing::{debug, info, instrument};

impl ObjectStore {
    /// Create `obj`, optionally as a controlled child of `owner`.
    ///
    /// Returns `true` when the object already existed; the stored object is
    /// left untouched in that case.
    #[instrument(skip(self, owner, obj), fields(kind = %K::kind_name(), key = %obj.key()))]
    pub async fn create_if_absent<O, K>(&self, owner: Option<&O>, mut obj: K) -> Result<bool>
    where
        O: Resource<DynamicType = ()>,
        K: ManagedObject,
    {
        if let Some(owner) = owner {
            bind_controller(owner, &mut obj)?;
        }

        match self.create(&obj).await {
            Ok(_) => {
                info!("Created {} {}", K::kind_name(), obj.key());
                Ok(false)
            }
            Err(Error::KubeError(e)) if is_already_exists(&e) => {
                debug!("{} {} already exists", K::kind_name(), obj.key());
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace `obj` if it is still stored; a vanished object is nothing to update
    #[instrument(skip(self, obj), fields(kind = %K::kind_name(), key = %obj.key()))]
    pub async fn update_if_present<K: ManagedObject>(&self, obj: &K) -> Result<()> {
        match self.update(obj).await {
            Ok(_) => Ok(()),
            Err(Error::KubeError(e)) if is_not_found(&e) => {
                debug!("{} {} is gone, skipping update", K::kind_name(), obj.key());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Scale a StatefulSet. Returns whether a write was made.
    #[instrument(skip(self))]
    pub async fn update_replicas_if_changed(&self, key: &ResourceKey, replicas: i32) -> Result<bool> {
        let mut sts: StatefulSet = self.get(key).await?;
        let spec = sts
            .spec
            .as_mut()
            .ok_or_else(|| Error::InvalidWorkload(format!("StatefulSet {} has no spec", key)))?;

        let current = spec.replicas.unwrap_or(DEFAULT_REPLICAS);
        if current == replicas {
            return Ok(false);
        }

        spec.replicas = Some(replicas);
        self.update(&sts).await?;
        info!("Scaled StatefulSet {} from {} to {} replicas", key, current, replicas);
        Ok(true)
    }

    /// Set the image of one container in a StatefulSet's pod template. Returns whether a write was made.
    #[instrument(skip(self))]
    pub async fn update_image_if_changed(
        &self,
        key: &ResourceKey,
        container_index: usize,
        image: &str,
    ) -> Result<bool> {
        let mut sts: StatefulSet = self.get(key).await?;
        let container = template_container(&mut sts, key, container_index)?;

        if container.image.as_deref() == Some(image) {
            return Ok(false);
        }

        let previous = container.image.replace(image.to_string());
        self.update(&sts).await?;
        info!(
            "Changed image of container {} in StatefulSet {} from {:?} to {}",
            container_index, key, previous, image
        );
        Ok(true)
    }
}

fn template_container<'a>(
    sts: &'a mut StatefulSet,
    key: &ResourceKey,
    index: usize,
) -> Result<&'a mut Container> {
    let containers = sts
        .spec
        .as_mut()
        .and_then(|s| s.template.spec.as_mut())
        .map(|p| &mut p.containers)
        .ok_or_else(|| Error::InvalidWorkload(format!("StatefulSet {} has no pod template", key)))?;

    let len = containers.len();
    containers
        .get_mut(index)
        .ok_or(Error::ContainerIndexOutOfRange { index, len })
}
