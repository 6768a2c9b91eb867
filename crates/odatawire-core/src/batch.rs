//! Batch coordination: sub-message creation, content-id issue and lookup,
//! and the in-memory `multipart/mixed` batch writer.

use crate::{
    error::{BatchError, InternalError},
    message::{RequestBody, RequestMessage},
    obs::sink::{self, MetricsEvent},
    request::Method,
    value::EntityData,
};
use derive_more::Display;
use std::{
    fmt::Write as _,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use uuid::Uuid;

///
/// ContentId
///
/// Batch-scoped token naming an operation before it has a resolvable key.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{_0}")]
pub struct ContentId(u64);

impl ContentId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Same-batch reference token (`$<id>`).
    #[must_use]
    pub fn reference(self) -> String {
        format!("${}", self.0)
    }
}

///
/// OperationRequest
///

#[derive(Clone, Debug)]
pub struct OperationRequest {
    pub method: Method,
    pub uri: String,
    pub collection: Option<String>,
    pub entry_data: Option<EntityData>,
    pub result_required: bool,
}

///
/// BatchCoordinator
///
/// Supplies the sub-message each batched operation is written into, and
/// resolves payloads created earlier in the batch to their content-ids.
///

pub trait BatchCoordinator: Sync {
    type Message: RequestMessage;

    fn create_operation_message(
        &self,
        request: OperationRequest,
    ) -> impl Future<Output = Result<Self::Message, InternalError>> + Send;

    fn content_id_for(&self, data: &EntityData) -> Option<ContentId>;
}

///
/// BatchWriter
///
/// In-memory coordinator. One mutex guards the whole registry, so
/// content-ids come out `1, 2, 3, …` in call order and operations are
/// appended in the same order.
///

#[derive(Clone, Debug)]
pub struct BatchWriter {
    registry: Arc<Mutex<Registry>>,
    boundary: String,
}

#[derive(Debug, Default)]
struct Registry {
    last_id: u64,
    operations: Vec<BatchOperation>,
}

impl Registry {
    fn operation_mut(&mut self, content_id: ContentId) -> Result<&mut BatchOperation, BatchError> {
        self.operations
            .iter_mut()
            .find(|op| op.content_id == content_id)
            .ok_or(BatchError::UnknownOperation {
                content_id: content_id.get(),
            })
    }
}

#[derive(Debug)]
struct BatchOperation {
    content_id: ContentId,
    method: Method,
    uri: String,
    entry_data: Option<EntityData>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl BatchWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("batch_{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            boundary: boundary.into(),
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/mixed;boundary={}", self.boundary)
    }

    /// Number of operations registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content-ids in append order.
    #[must_use]
    pub fn content_ids(&self) -> Vec<ContentId> {
        self.lock()
            .operations
            .iter()
            .map(|op| op.content_id)
            .collect()
    }

    /// Render every operation into one `multipart/mixed` body. Operations
    /// whose body was never committed are rendered bodyless.
    #[must_use]
    pub fn finish(&self) -> RequestBody {
        let registry = self.lock();
        let mut out = String::new();

        for op in &registry.operations {
            let _ = write!(
                out,
                "--{}\r\nContent-Type: application/http\r\nContent-Transfer-Encoding: binary\r\nContent-ID: {}\r\n\r\n{} {} HTTP/1.1\r\n",
                self.boundary, op.content_id, op.method, op.uri
            );
            for (name, value) in &op.headers {
                let _ = write!(out, "{name}: {value}\r\n");
            }
            out.push_str("\r\n");
            if let Some(body) = &op.body {
                out.push_str(&String::from_utf8_lossy(body));
                out.push_str("\r\n");
            }
        }
        let _ = write!(out, "--{}--\r\n", self.boundary);

        tracing::debug!(
            operations = registry.operations.len(),
            bytes = out.len(),
            "batch rendered"
        );

        RequestBody {
            headers: vec![("Content-Type".to_string(), self.content_type())],
            content: out.into_bytes(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BatchWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchCoordinator for BatchWriter {
    type Message = BatchOperationMessage;

    async fn create_operation_message(
        &self,
        request: OperationRequest,
    ) -> Result<BatchOperationMessage, InternalError> {
        let content_id = {
            let mut registry = self.lock();
            registry.last_id += 1;
            let content_id = ContentId::new(registry.last_id);

            registry.operations.push(BatchOperation {
                content_id,
                method: request.method,
                uri: request.uri,
                entry_data: request.entry_data,
                headers: Vec::new(),
                body: None,
            });

            content_id
        };

        sink::record(MetricsEvent::BatchOperation {
            content_id: content_id.get(),
        });
        tracing::trace!(%content_id, "batch operation registered");

        Ok(BatchOperationMessage {
            registry: Arc::clone(&self.registry),
            content_id,
        })
    }

    fn content_id_for(&self, data: &EntityData) -> Option<ContentId> {
        self.lock()
            .operations
            .iter()
            .find(|op| op.entry_data.as_ref() == Some(data))
            .map(|op| op.content_id)
    }
}

///
/// BatchOperationMessage
///
/// Sub-message of one batched operation. Headers and body land directly in
/// the shared registry; the batch owns flushing.
///

#[derive(Debug)]
pub struct BatchOperationMessage {
    registry: Arc<Mutex<Registry>>,
    content_id: ContentId,
}

impl BatchOperationMessage {
    #[must_use]
    pub const fn content_id(&self) -> ContentId {
        self.content_id
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RequestMessage for BatchOperationMessage {
    fn set_header(&mut self, name: &str, value: &str) {
        let mut registry = self.lock();
        match registry.operation_mut(self.content_id) {
            Ok(op) => op.headers.push((name.to_string(), value.to_string())),
            Err(err) => tracing::warn!(%err, header = name, "header dropped"),
        }
    }

    async fn commit_body(&mut self, body: Vec<u8>) -> Result<(), InternalError> {
        let mut registry = self.lock();
        let op = registry.operation_mut(self.content_id)?;
        if op.body.is_some() {
            return Err(BatchError::BodyAlreadyCommitted {
                content_id: self.content_id.get(),
            }
            .into());
        }
        op.body = Some(body);

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorDetail, ErrorOrigin};

    fn post(uri: &str, data: Option<EntityData>) -> OperationRequest {
        OperationRequest {
            method: Method::Post,
            uri: uri.to_string(),
            collection: Some("Orders".to_string()),
            entry_data: data,
            result_required: false,
        }
    }

    #[tokio::test]
    async fn content_ids_are_issued_in_call_order() {
        let batch = BatchWriter::with_boundary("batch_test");
        let first = batch.create_operation_message(post("Orders", None)).await.unwrap();
        let second = batch.create_operation_message(post("Orders", None)).await.unwrap();

        assert_eq!(first.content_id(), ContentId::new(1));
        assert_eq!(second.content_id(), ContentId::new(2));
        assert_eq!(second.content_id().reference(), "$2");
    }

    #[tokio::test]
    async fn registered_payloads_resolve_to_their_content_id() {
        let batch = BatchWriter::new();
        let order = EntityData::new().with("Total", 10);
        batch
            .create_operation_message(post("Orders", Some(order.clone())))
            .await
            .unwrap();

        assert_eq!(batch.content_id_for(&order), Some(ContentId::new(1)));
        assert_eq!(batch.content_id_for(&EntityData::new().with("Total", 11)), None);
    }

    #[tokio::test]
    async fn finish_renders_every_operation() {
        let batch = BatchWriter::with_boundary("batch_test");
        let mut message = batch.create_operation_message(post("Orders", None)).await.unwrap();
        message.set_header("Content-Type", "application/json");
        message.commit_body(b"{\"Total\":10}".to_vec()).await.unwrap();
        batch
            .create_operation_message(OperationRequest {
                method: Method::Get,
                ..post("Orders(1)", None)
            })
            .await
            .unwrap();

        let body = batch.finish();
        let text = body.text().unwrap();

        assert_eq!(
            body.header("content-type"),
            Some("multipart/mixed;boundary=batch_test")
        );
        assert!(text.contains("Content-ID: 1\r\n\r\nPOST Orders HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{\"Total\":10}\r\n"));
        assert!(text.contains("Content-ID: 2\r\n\r\nGET Orders(1) HTTP/1.1\r\n\r\n--batch_test--"));
    }

    #[tokio::test]
    async fn bodies_commit_once() {
        let batch = BatchWriter::new();
        let mut message = batch.create_operation_message(post("Orders", None)).await.unwrap();
        message.commit_body(Vec::new()).await.unwrap();

        let err = message.commit_body(Vec::new()).await.unwrap_err();
        assert_eq!(err.origin, ErrorOrigin::Batch);
        assert!(matches!(
            err.detail,
            Some(ErrorDetail::Batch(BatchError::BodyAlreadyCommitted { content_id: 1 }))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_operations_get_unique_monotonic_ids() {
        let batch = BatchWriter::new();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let batch = batch.clone();
                tokio::spawn(async move {
                    batch
                        .create_operation_message(post(&format!("Orders({i})"), None))
                        .await
                        .map(|message| message.content_id())
                })
            })
            .collect();

        let mut issued = Vec::new();
        for task in tasks {
            issued.push(task.await.unwrap().unwrap());
        }
        issued.sort();

        let expected: Vec<_> = (1..=32).map(ContentId::new).collect();
        assert_eq!(issued, expected);
        assert_eq!(batch.content_ids(), expected);
    }
}
