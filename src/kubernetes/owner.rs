// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controller owner references, so the API server garbage-collects children with their owner

use crate::error::{Error, Result};
use kube::{Resource, ResourceExt};

/// Move `child` into the owner's namespace and make `owner` its controller.
///
/// An existing reference to the same owner (matched by uid) is replaced. A
/// child already controlled by a different owner is rejected.
pub fn bind_controller<O, K>(owner: &O, child: &mut K) -> Result<()>
where
    O: Resource<DynamicType = ()>,
    K: Resource<DynamicType = ()>,
{
    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        Error::OwnerReference(format!(
            "{} {:?} has no name or uid",
            O::kind(&()),
            owner.meta().name
        ))
    })?;

    if let Some(other) = child
        .owner_references()
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(Error::AlreadyOwned {
            kind: K::kind(&()).to_string(),
            key: format!("{}/{}", child.namespace().unwrap_or_default(), child.name_any()),
            owner_kind: other.kind.clone(),
            owner_name: other.name.clone(),
        });
    }

    if let Some(namespace) = owner.namespace() {
        child.meta_mut().namespace = Some(namespace);
    }

    let refs = child.owner_references_mut();
    refs.retain(|r| r.uid != owner_ref.uid);
    refs.push(owner_ref);
    Ok(())
}
