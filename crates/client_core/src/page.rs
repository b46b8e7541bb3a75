//! One resource screen: a repository, its dialog and the transaction gate
//! that sits between them.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::error::extract_message;
use tracing::{info, warn};

use crate::{
    error::{ClientError, FetchError},
    modal::{ModalError, ModalMode, ModalWorkflow, SubmitPlan},
    notify::{NoticeKind, Notifier},
    repository::{RemoveOutcome, Repository},
    resource::{IdOf, Operation, Resource},
    session::Credential,
    transaction::{Completion, TransactionController, TransactionOutcome, TransactionState},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Read-only view of a page for rendering.
pub struct PageSnapshot<R: Resource> {
    pub load: LoadState,
    pub records: Vec<R::Record>,
    pub mode: ModalMode,
    pub subject: Option<R::Record>,
    pub draft: Option<R::Form>,
    pub transaction: TransactionState,
}

/// What a successful submit did.
pub enum Submitted<R: Resource> {
    /// The created record, when the service echoed it back.
    Created(Option<R::Record>),
    Updated(IdOf<R>),
    Removed(IdOf<R>),
    AlreadyRemoved(IdOf<R>),
}

pub enum SubmitOutcome<R: Resource> {
    /// No dialog was open.
    Ignored,
    /// Another submit was still running.
    Skipped,
    Succeeded(Submitted<R>),
    Failed(ClientError),
}

impl<R: Resource> SubmitOutcome<R> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            SubmitOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

pub struct EntityPage<R: Resource> {
    repository: Arc<Repository<R>>,
    modal: Mutex<ModalWorkflow<R>>,
    controller: TransactionController,
    load: Mutex<LoadState>,
    credential: Option<Credential>,
}

impl<R: Resource> EntityPage<R> {
    pub fn new(
        repository: Arc<Repository<R>>,
        notifier: Arc<dyn Notifier>,
        credential: Option<Credential>,
    ) -> Self {
        let modal = ModalWorkflow::for_resource(repository.resource());
        Self {
            repository,
            modal: Mutex::new(modal),
            controller: TransactionController::new(notifier),
            load: Mutex::new(LoadState::Idle),
            credential,
        }
    }

    pub fn with_notice_duration(mut self, notice_duration: Duration) -> Self {
        self.controller = self.controller.with_notice_duration(notice_duration);
        self
    }

    pub fn repository(&self) -> &Arc<Repository<R>> {
        &self.repository
    }

    pub fn load_state(&self) -> LoadState {
        lock(&self.load).clone()
    }

    pub fn mode(&self) -> ModalMode {
        self.modal().mode()
    }

    pub fn transaction(&self) -> TransactionState {
        self.controller.state()
    }

    pub async fn find(&self, id: &IdOf<R>) -> Option<R::Record> {
        self.repository.find(id).await
    }

    /// Lists the collection. Read access is checked before anything is sent.
    pub async fn load(&self) -> Result<usize, FetchError> {
        *lock(&self.load) = LoadState::Loading;
        let result = match self
            .repository
            .resource()
            .access()
            .authorize(false, self.credential.as_ref())
        {
            Ok(credential) => self.repository.list(credential).await,
            Err(err) => Err(FetchError::new(R::NAME, err)),
        };

        match result {
            Ok(records) => {
                info!(resource = R::NAME, count = records.len(), "page: loaded");
                *lock(&self.load) = LoadState::Loaded;
                Ok(records.len())
            }
            Err(err) => {
                warn!(resource = R::NAME, kind = ?err.kind(), "page: load failed: {err}");
                *lock(&self.load) = LoadState::Failed(err.user_message());
                Err(err)
            }
        }
    }

    pub fn open_add(&self) -> Result<(), ModalError> {
        self.modal().open_add()
    }

    pub fn open_edit(&self, record: R::Record) -> Result<(), ModalError> {
        self.modal().open_edit(record)
    }

    pub fn open_delete(&self, record: R::Record) -> Result<(), ModalError> {
        self.modal().open_delete(record)
    }

    pub fn cancel(&self) {
        self.modal().cancel();
    }

    pub fn edit_draft(&self, edit: impl FnOnce(&mut R::Form)) -> Result<(), ModalError> {
        self.modal().edit_draft(edit)
    }

    /// Validates the open dialog and hands it to the transaction controller.
    ///
    /// The dialog closes only on success; on failure it keeps its mode,
    /// subject and draft so the operator can retry.
    pub async fn submit(&self) -> SubmitOutcome<R> {
        if self.mode() == ModalMode::Closed {
            return SubmitOutcome::Ignored;
        }

        match self.controller.run(|| self.perform_submit()).await {
            TransactionOutcome::Skipped => SubmitOutcome::Skipped,
            TransactionOutcome::Failed(err) => SubmitOutcome::Failed(err),
            TransactionOutcome::Succeeded(submitted) => {
                self.run_follow_up(&submitted).await;
                SubmitOutcome::Succeeded(submitted)
            }
        }
    }

    pub async fn snapshot(&self) -> PageSnapshot<R> {
        let load = self.load_state();
        let records = match load {
            LoadState::Failed(_) => Vec::new(),
            _ => self.repository.snapshot().await,
        };
        let modal = self.modal();
        PageSnapshot {
            load,
            records,
            mode: modal.mode(),
            subject: modal.subject().cloned(),
            draft: modal.draft().cloned(),
            transaction: self.controller.state(),
        }
    }

    async fn perform_submit(&self) -> Result<(Submitted<R>, Completion), ClientError> {
        let (generation, plan) = {
            let modal = self.modal();
            (modal.generation(), modal.prepare_submit()?)
        };
        let resource = self.repository.resource();
        let credential = resource
            .access()
            .authorize(true, self.credential.as_ref())?;

        let (submitted, completion) = match plan {
            SubmitPlan::Create { payload } => {
                let created = self.repository.create(credential, &payload).await?;
                let message =
                    resource.success_message(Operation::Create, created.as_ref(), Some(&payload));
                (Submitted::Created(created), Completion::success(message))
            }
            SubmitPlan::Update {
                id,
                subject,
                payload,
            } => {
                self.repository.update(credential, &id, &payload).await?;
                let message =
                    resource.success_message(Operation::Update, Some(&subject), Some(&payload));
                (Submitted::Updated(id), Completion::success(message))
            }
            SubmitPlan::Remove { id, subject } => {
                match self.repository.remove(credential, &id).await? {
                    RemoveOutcome::Removed => {
                        let message =
                            resource.success_message(Operation::Remove, Some(&subject), None);
                        (Submitted::Removed(id), Completion::success(message))
                    }
                    RemoveOutcome::AlreadyRemoved(reason) => {
                        (Submitted::AlreadyRemoved(id), Completion::info(reason))
                    }
                }
            }
        };

        if !self.modal().complete(generation) {
            info!(resource = R::NAME, "page: dialog was reopened during submit, leaving it open");
        }
        Ok((submitted, completion))
    }

    async fn run_follow_up(&self, submitted: &Submitted<R>) {
        let (operation, id) = match submitted {
            Submitted::Updated(id) => (Operation::Update, id),
            Submitted::Removed(id) => (Operation::Remove, id),
            Submitted::Created(_) | Submitted::AlreadyRemoved(_) => return,
        };
        let Some(request) = self.repository.resource().follow_up(operation, id) else {
            return;
        };

        match self
            .repository
            .transport()
            .execute(request, self.credential.as_ref())
            .await
        {
            Ok(body) => {
                if let Some(message) = extract_message(&body) {
                    self.controller.notify(&message, NoticeKind::Success);
                }
            }
            Err(err) => warn!(resource = R::NAME, %id, "page: follow-up request failed: {err}"),
        }
    }

    fn modal(&self) -> MutexGuard<'_, ModalWorkflow<R>> {
        lock(&self.modal)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
