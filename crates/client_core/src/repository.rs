use std::{collections::HashSet, sync::Arc};

use shared::records::Identified;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, FetchError},
    resource::{IdOf, PayloadOf, Resource},
    session::Credential,
    transport::HttpTransport,
};

/// How the collection catches up with the server after a successful mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Re-list the whole collection.
    #[default]
    Refetch,
    /// Patch the cached collection where the resource allows it, refetch otherwise.
    Optimistic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// Nothing was sent; the record was already in its removed state.
    AlreadyRemoved(String),
}

/// Owns the last-known server state of one resource type.
pub struct Repository<R: Resource> {
    resource: R,
    transport: Arc<HttpTransport>,
    policy: ReconcilePolicy,
    collection: RwLock<Vec<R::Record>>,
}

impl<R: Resource> Repository<R> {
    pub fn new(transport: Arc<HttpTransport>, resource: R) -> Self {
        Self {
            resource,
            transport,
            policy: ReconcilePolicy::default(),
            collection: RwLock::new(Vec::new()),
        }
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub(crate) fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub async fn snapshot(&self) -> Vec<R::Record> {
        self.collection.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.collection.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.collection.read().await.is_empty()
    }

    pub async fn find(&self, id: &IdOf<R>) -> Option<R::Record> {
        self.collection
            .read()
            .await
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Replaces the collection wholesale. On failure the collection is untouched.
    pub async fn list(&self, credential: Option<&Credential>) -> Result<Vec<R::Record>, FetchError> {
        let records: Vec<R::Record> = self
            .transport
            .fetch_json(self.resource.list_request(), credential)
            .await
            .map_err(|err| FetchError::new(R::NAME, err))?;

        let mut records = dedupe_by_id(records);
        self.resource.arrange(&mut records);
        debug!(resource = R::NAME, count = records.len(), "repository: collection replaced");
        *self.collection.write().await = records.clone();
        Ok(records)
    }

    pub async fn create(
        &self,
        credential: Option<&Credential>,
        payload: &PayloadOf<R>,
    ) -> Result<Option<R::Record>, ClientError> {
        let request = self.resource.create_request(payload)?;
        let body = self.transport.execute(request, credential).await?;
        let created = decode_record::<R>(&body);
        info!(
            resource = R::NAME,
            id = ?created.as_ref().map(|r| r.id()),
            "repository: record created"
        );

        let patched = match (&created, self.policy) {
            (Some(record), ReconcilePolicy::Optimistic) => {
                let mut collection = self.collection.write().await;
                if !collection.iter().any(|r| r.id() == record.id()) {
                    collection.push(record.clone());
                }
                true
            }
            _ => false,
        };
        if !patched {
            self.refresh(credential).await;
        }
        Ok(created)
    }

    pub async fn update(
        &self,
        credential: Option<&Credential>,
        id: &IdOf<R>,
        payload: &PayloadOf<R>,
    ) -> Result<Option<R::Record>, ClientError> {
        let request = self.resource.update_request(id, payload)?;
        let body = self.transport.execute(request, credential).await?;
        info!(resource = R::NAME, %id, "repository: record updated");

        let patched = self.policy == ReconcilePolicy::Optimistic && {
            let mut collection = self.collection.write().await;
            let applied = collection
                .iter_mut()
                .find(|record| record.id() == id)
                .is_some_and(|record| self.resource.patch_local(record, payload));
            applied
        };
        if !patched {
            self.refresh(credential).await;
        }
        Ok(decode_record::<R>(&body))
    }

    pub async fn remove(
        &self,
        credential: Option<&Credential>,
        id: &IdOf<R>,
    ) -> Result<RemoveOutcome, ClientError> {
        if let Some(reason) = self
            .find(id)
            .await
            .and_then(|record| self.resource.already_removed(&record))
        {
            info!(resource = R::NAME, %id, "repository: remove skipped, {reason}");
            return Ok(RemoveOutcome::AlreadyRemoved(reason));
        }

        let request = self.resource.remove_request(id)?;
        self.transport.execute(request, credential).await?;
        info!(resource = R::NAME, %id, "repository: record removed");

        match self.policy {
            ReconcilePolicy::Optimistic => {
                let mut collection = self.collection.write().await;
                let kept = collection
                    .iter_mut()
                    .find(|record| record.id() == id)
                    .is_some_and(|record| self.resource.patch_removed(record));
                if !kept {
                    collection.retain(|record| record.id() != id);
                }
            }
            ReconcilePolicy::Refetch => self.refresh(credential).await,
        }
        Ok(RemoveOutcome::Removed)
    }

    async fn refresh(&self, credential: Option<&Credential>) {
        if let Err(err) = self.list(credential).await {
            warn!(
                resource = R::NAME,
                "repository: refresh after mutation failed, keeping previous collection: {err}"
            );
        }
    }
}

fn dedupe_by_id<T: Identified>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.id().clone()))
        .collect()
}

/// Mutation responses are either the affected record or something else entirely.
fn decode_record<R: Resource>(body: &str) -> Option<R::Record> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body).ok()
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
