// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory Kubernetes API server and object builders.

use crate::kubernetes::ManagedObject;
use crate::types::{ResourceKey, StorageCluster, StorageClusterSpec};
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, Namespace, PersistentVolumeClaim, Pod, PodSpec, PodStatus,
    PodTemplateSpec, Service,
};
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service as TowerService;

type Collection = BTreeMap<String, Value>;

/// Route tracing output to the test harness; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct State {
    /// collection path -> object name -> object
    objects: BTreeMap<String, Collection>,
    /// (method, path prefix) -> (status, reason)
    failures: Vec<(String, String, u16, String)>,
    next_version: u64,
}

/// A stateful fake of the API server, served through a tower `Service`.
///
/// Objects live under their collection path (for example
/// `/api/v1/namespaces/ns/pods`). Create answers 409 `AlreadyExists` for a
/// taken name, replace answers 404 for a missing object and 409 `Conflict`
/// for a stale resourceVersion, and list honours `labelSelector`.
#[derive(Clone, Default)]
pub struct FakeApiServer {
    state: Arc<Mutex<State>>,
    requests: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl FakeApiServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests whose method matches and whose path starts with `path_prefix` with an error
    pub fn fail_on(self, method: &str, path_prefix: &str, status: u16, reason: &str) -> Self {
        self.state.lock().unwrap().failures.push((
            method.to_string(),
            path_prefix.to_string(),
            status,
            reason.to_string(),
        ));
        self
    }

    /// Build a kube Client from this fake
    pub fn client(&self) -> Client {
        Client::new(self.clone(), "default")
    }

    /// Store `obj` directly, replacing any previous version
    pub fn insert<K: ManagedObject>(&self, obj: &K) {
        let collection = K::url_path(&(), obj.namespace().as_deref());
        self.put(collection, obj);
    }

    pub fn insert_cluster_scoped<K>(&self, obj: &K)
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        self.put(K::url_path(&(), None), obj);
    }

    fn put<K: Resource + Serialize>(&self, collection: String, obj: &K) {
        let mut state = self.state.lock().unwrap();
        let mut value = serde_json::to_value(obj).unwrap();
        state.next_version += 1;
        value["metadata"]["resourceVersion"] = json!(state.next_version.to_string());
        state
            .objects
            .entry(collection)
            .or_default()
            .insert(obj.name_any(), value);
    }

    /// Read back a stored object
    pub fn stored<K: ManagedObject>(&self, key: &ResourceKey) -> Option<K> {
        let collection = K::url_path(&(), Some(key.namespace()));
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&collection)
            .and_then(|c| c.get(key.name()))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    /// Number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of POST, PUT, PATCH and DELETE requests received
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn handle(&self, method: &Method, path: &str, query: Option<&str>, body: &[u8]) -> (u16, Value) {
        let mut state = self.state.lock().unwrap();

        if let Some((_, _, status, reason)) = state
            .failures
            .iter()
            .find(|(m, p, _, _)| m == method.as_str() && path.starts_with(p.as_str()))
        {
            return status_response(*status, reason, &format!("injected failure for {}", path));
        }

        let (collection, name) = split_path(path);
        match (method.as_str(), name) {
            ("GET", Some(name)) => match lookup(&state, &collection, &name) {
                Some(obj) => (200, obj.clone()),
                None => not_found(&name),
            },
            ("GET", None) => {
                let selector = query.map(label_selector).unwrap_or_default();
                let items: Vec<Value> = state
                    .objects
                    .get(&collection)
                    .map(|c| c.values().filter(|o| labels_match(o, &selector)).cloned().collect())
                    .unwrap_or_default();
                (
                    200,
                    json!({
                        "apiVersion": "v1",
                        "kind": "List",
                        "metadata": { "resourceVersion": state.next_version.to_string() },
                        "items": items,
                    }),
                )
            }
            ("POST", None) => {
                let mut obj: Value = match serde_json::from_slice(body) {
                    Ok(v) => v,
                    Err(e) => return status_response(400, "BadRequest", &e.to_string()),
                };
                let name = obj["metadata"]["name"].as_str().unwrap_or_default().to_string();
                if lookup(&state, &collection, &name).is_some() {
                    return status_response(409, "AlreadyExists", &format!("{:?} already exists", name));
                }
                state.next_version += 1;
                obj["metadata"]["resourceVersion"] = json!(state.next_version.to_string());
                obj["metadata"]["uid"] = json!(format!("uid-{}", name));
                state.objects.entry(collection).or_default().insert(name, obj.clone());
                (201, obj)
            }
            ("PUT", Some(name)) => {
                let mut obj: Value = match serde_json::from_slice(body) {
                    Ok(v) => v,
                    Err(e) => return status_response(400, "BadRequest", &e.to_string()),
                };
                let Some(current) = lookup(&state, &collection, &name).cloned() else {
                    return not_found(&name);
                };
                let submitted = obj["metadata"]["resourceVersion"].clone();
                if !submitted.is_null() && submitted != current["metadata"]["resourceVersion"] {
                    return status_response(409, "Conflict", "the object has been modified");
                }
                if without_version(&obj) == without_version(&current) {
                    return (200, current);
                }
                state.next_version += 1;
                obj["metadata"]["resourceVersion"] = json!(state.next_version.to_string());
                state.objects.entry(collection).or_default().insert(name, obj.clone());
                (200, obj)
            }
            ("DELETE", Some(name)) => {
                match state.objects.get_mut(&collection).and_then(|c| c.remove(&name)) {
                    Some(obj) => (200, obj),
                    None => not_found(&name),
                }
            }
            _ => status_response(405, "MethodNotAllowed", "unsupported request"),
        }
    }
}

impl TowerService<Request<Body>> for FakeApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let server = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body: Bytes = body.collect().await?.to_bytes();

            server.requests.fetch_add(1, Ordering::SeqCst);
            if parts.method != Method::GET {
                server.writes.fetch_add(1, Ordering::SeqCst);
            }

            let (status, value) =
                server.handle(&parts.method, parts.uri.path(), parts.uri.query(), &body);

            Ok(Response::builder()
                .status(StatusCode::from_u16(status)?)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&value)?))?)
        })
    }
}

/// API server that accepts every request and never answers it
#[derive(Clone, Copy, Default)]
pub struct StalledApiServer;

impl StalledApiServer {
    pub fn client(self) -> Client {
        Client::new(self, "default")
    }
}

impl TowerService<Request<Body>> for StalledApiServer {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Request<Body>) -> Self::Future {
        Box::pin(std::future::pending())
    }
}

/// Split a request path into its collection path and, for item paths, the object name.
/// Below the API root, item paths have an even number of segments.
fn split_path(path: &str) -> (String, Option<String>) {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let root = if segments.first() == Some(&"apis") { 3 } else { 2 };
    let rest = segments.len().saturating_sub(root);

    if rest > 0 && rest % 2 == 0 {
        let (collection, name) = segments.split_at(segments.len() - 1);
        (format!("/{}", collection.join("/")), Some(name[0].to_string()))
    } else {
        (format!("/{}", segments.join("/")), None)
    }
}

fn lookup<'a>(state: &'a State, collection: &str, name: &str) -> Option<&'a Value> {
    state.objects.get(collection).and_then(|c| c.get(name))
}

fn label_selector(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == "labelSelector")
        .flat_map(|(_, v)| {
            v.split(',')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn labels_match(obj: &Value, selector: &BTreeMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| obj["metadata"]["labels"][k].as_str() == Some(v.as_str()))
}

fn without_version(obj: &Value) -> Value {
    let mut obj = obj.clone();
    if let Some(meta) = obj.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.remove("resourceVersion");
    }
    obj
}

fn not_found(name: &str) -> (u16, Value) {
    status_response(404, "NotFound", &format!("{:?} not found", name))
}

fn status_response(code: u16, reason: &str, message: &str) -> (u16, Value) {
    (
        code,
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "status": "Failure",
            "message": message,
            "reason": reason,
            "code": code
        }),
    )
}

fn meta(namespace: &str, name: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

pub fn config_map(namespace: &str, name: &str, data: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: meta(namespace, name),
        data: (!data.is_empty()).then(|| {
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        }),
        ..Default::default()
    }
}

pub fn service(namespace: &str, name: &str) -> Service {
    Service {
        metadata: meta(namespace, name),
        ..Default::default()
    }
}

pub fn pvc(namespace: &str, name: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: meta(namespace, name),
        ..Default::default()
    }
}

pub fn pod(namespace: &str, name: &str, phase: Option<&str>) -> Pod {
    Pod {
        metadata: meta(namespace, name),
        status: phase.map(|p| PodStatus {
            phase: Some(p.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn stateful_set(namespace: &str, name: &str, replicas: Option<i32>, images: &[&str]) -> StatefulSet {
    StatefulSet {
        metadata: meta(namespace, name),
        spec: Some(StatefulSetSpec {
            replicas,
            service_name: name.to_string(),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    containers: images
                        .iter()
                        .enumerate()
                        .map(|(i, image)| Container {
                            name: format!("c{}", i),
                            image: Some(image.to_string()),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        status: None,
    }
}

pub fn storage_cluster(namespace: &str, name: &str, uid: &str) -> StorageCluster {
    StorageCluster {
        metadata: ObjectMeta {
            uid: Some(uid.to_string()),
            ..meta(namespace, name)
        },
        spec: StorageClusterSpec {
            size: 3,
            node_image: "registry.local/storage:1.0".to_string(),
            display_name: None,
        },
        status: None,
    }
}

pub fn namespace(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Add labels to an object
pub fn labeled<K: Resource>(mut obj: K, labels: &[(&str, &str)]) -> K {
    obj.labels_mut()
        .extend(labels.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    obj
}
