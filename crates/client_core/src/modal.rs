//! Presentation-agnostic add/edit/delete dialog state.

use shared::records::Identified;
use thiserror::Error;

use crate::{
    error::ClientError,
    resource::{Capabilities, DraftForm, IdOf, Operation, PayloadOf, Resource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Closed,
    Add,
    Edit,
    DeleteConfirm,
}

pub enum ModalState<R: Resource> {
    Closed,
    Add { draft: R::Form },
    Edit { subject: R::Record, draft: R::Form },
    DeleteConfirm { subject: R::Record },
}

impl<R: Resource> ModalState<R> {
    pub fn mode(&self) -> ModalMode {
        match self {
            ModalState::Closed => ModalMode::Closed,
            ModalState::Add { .. } => ModalMode::Add,
            ModalState::Edit { .. } => ModalMode::Edit,
            ModalState::DeleteConfirm { .. } => ModalMode::DeleteConfirm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModalError {
    #[error("a {0:?} dialog is already open")]
    AlreadyOpen(ModalMode),
    #[error("{0} is not available for this resource")]
    Unsupported(&'static str),
    #[error("no dialog is open")]
    NotOpen,
}

/// What a validated submit asks the repository to do.
pub enum SubmitPlan<R: Resource> {
    Create {
        payload: PayloadOf<R>,
    },
    Update {
        id: IdOf<R>,
        subject: R::Record,
        payload: PayloadOf<R>,
    },
    Remove {
        id: IdOf<R>,
        subject: R::Record,
    },
}

impl<R: Resource> SubmitPlan<R> {
    pub fn operation(&self) -> Operation {
        match self {
            SubmitPlan::Create { .. } => Operation::Create,
            SubmitPlan::Update { .. } => Operation::Update,
            SubmitPlan::Remove { .. } => Operation::Remove,
        }
    }
}

/// `Closed -> {Add, Edit, DeleteConfirm} -> Closed`.
///
/// Every open bumps a generation counter so that a submit which finishes
/// after the operator cancelled and reopened does not close the new dialog.
pub struct ModalWorkflow<R: Resource> {
    state: ModalState<R>,
    capabilities: Capabilities,
    blank: R::Form,
    generation: u64,
}

impl<R: Resource> ModalWorkflow<R> {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            state: ModalState::Closed,
            capabilities,
            blank: R::Form::default(),
            generation: 0,
        }
    }

    /// Takes capabilities and the Add draft from `resource`, so a scoped
    /// resource starts its drafts inside its scope.
    pub fn for_resource(resource: &R) -> Self {
        Self {
            blank: resource.new_form(),
            ..Self::new(resource.capabilities())
        }
    }

    pub fn state(&self) -> &ModalState<R> {
        &self.state
    }

    pub fn mode(&self) -> ModalMode {
        self.state.mode()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn subject(&self) -> Option<&R::Record> {
        match &self.state {
            ModalState::Edit { subject, .. } | ModalState::DeleteConfirm { subject } => {
                Some(subject)
            }
            ModalState::Closed | ModalState::Add { .. } => None,
        }
    }

    pub fn draft(&self) -> Option<&R::Form> {
        match &self.state {
            ModalState::Add { draft } | ModalState::Edit { draft, .. } => Some(draft),
            ModalState::Closed | ModalState::DeleteConfirm { .. } => None,
        }
    }

    pub fn open_add(&mut self) -> Result<(), ModalError> {
        self.open(Operation::Create, ModalState::Add {
            draft: self.blank.clone(),
        })
    }

    pub fn open_edit(&mut self, record: R::Record) -> Result<(), ModalError> {
        let draft = R::Form::from_record(&record);
        self.open(Operation::Update, ModalState::Edit {
            subject: record,
            draft,
        })
    }

    pub fn open_delete(&mut self, record: R::Record) -> Result<(), ModalError> {
        self.open(Operation::Remove, ModalState::DeleteConfirm { subject: record })
    }

    /// Discards the draft and subject. Never touches the repository.
    pub fn cancel(&mut self) {
        self.state = ModalState::Closed;
    }

    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut R::Form)) -> Result<(), ModalError> {
        match &mut self.state {
            ModalState::Add { draft } | ModalState::Edit { draft, .. } => {
                edit(draft);
                Ok(())
            }
            ModalState::Closed | ModalState::DeleteConfirm { .. } => Err(ModalError::NotOpen),
        }
    }

    /// Runs client-side checks and turns the open dialog into a plan.
    pub fn prepare_submit(&self) -> Result<SubmitPlan<R>, ClientError> {
        match &self.state {
            ModalState::Closed => Err(ClientError::unsupported(R::NAME, "submit")),
            ModalState::Add { draft } => Ok(SubmitPlan::Create {
                payload: draft.validate()?,
            }),
            ModalState::Edit { subject, draft } => Ok(SubmitPlan::Update {
                id: subject.id().clone(),
                subject: subject.clone(),
                payload: draft.validate()?,
            }),
            ModalState::DeleteConfirm { subject } => Ok(SubmitPlan::Remove {
                id: subject.id().clone(),
                subject: subject.clone(),
            }),
        }
    }

    /// Closes the dialog after a successful submit, if it is still the one
    /// that was submitted.
    pub fn complete(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.state = ModalState::Closed;
        true
    }

    fn open(&mut self, operation: Operation, state: ModalState<R>) -> Result<(), ModalError> {
        if !self.capabilities.allows(operation) {
            return Err(ModalError::Unsupported(operation.as_str()));
        }
        if self.mode() != ModalMode::Closed {
            return Err(ModalError::AlreadyOpen(self.mode()));
        }
        self.generation += 1;
        self.state = state;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/modal_tests.rs"]
mod tests;
