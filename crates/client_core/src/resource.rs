//! Describes one remote resource type: its record shape, draft form, endpoints,
//! access policy and the reconciliation hooks the repository may use.

use serde::de::DeserializeOwned;
use shared::{error::ValidationError, records::Identified};

use crate::{error::ClientError, session::Credential, transport::ResourceRequest};

pub type IdOf<R> = <<R as Resource>::Record as Identified>::Id;
pub type PayloadOf<R> = <<R as Resource>::Form as DraftForm<<R as Resource>::Record>>::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Remove,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub create: bool,
    pub update: bool,
    pub remove: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        create: true,
        update: true,
        remove: true,
    };

    pub fn allows(self, operation: Operation) -> bool {
        match operation {
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Remove => self.remove,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    Public,
    /// Reads are open, mutations need a credential.
    ProtectedMutations,
    Protected,
}

impl AccessPolicy {
    /// Refuses protected calls without a credential, before anything hits the network.
    pub fn authorize<'a>(
        self,
        mutation: bool,
        credential: Option<&'a Credential>,
    ) -> Result<Option<&'a Credential>, ClientError> {
        let required = match self {
            AccessPolicy::Public => false,
            AccessPolicy::ProtectedMutations => mutation,
            AccessPolicy::Protected => true,
        };
        if required && credential.is_none() {
            return Err(ClientError::Unauthorized);
        }
        Ok(credential)
    }
}

/// Mutable working copy of a record while a dialog is open.
pub trait DraftForm<R>: Clone + Default + Send + 'static {
    type Payload: Send + Sync + 'static;

    fn from_record(record: &R) -> Self;

    /// Required-field and numeric checks; runs before anything is sent.
    fn validate(&self) -> Result<Self::Payload, ValidationError>;
}

/// Form for resources that are never edited field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDraft;

impl<R> DraftForm<R> for NoDraft {
    type Payload = ();

    fn from_record(_record: &R) -> Self {
        NoDraft
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

pub trait Resource: Sized + Send + Sync + 'static {
    type Record: Identified + Clone + DeserializeOwned + Send + Sync + 'static;
    type Form: DraftForm<Self::Record>;

    /// Lower-case name used in logs.
    const NAME: &'static str;
    /// Title-case name used in notices.
    const LABEL: &'static str;

    fn capabilities(&self) -> Capabilities;

    fn access(&self) -> AccessPolicy {
        AccessPolicy::Public
    }

    fn list_request(&self) -> ResourceRequest;

    /// Draft an Add dialog starts from.
    fn new_form(&self) -> Self::Form {
        Self::Form::default()
    }

    /// Puts a fresh listing in display order. Server order by default.
    fn arrange(&self, _records: &mut [Self::Record]) {}

    fn create_request(&self, _payload: &PayloadOf<Self>) -> Result<ResourceRequest, ClientError> {
        Err(ClientError::unsupported(Self::NAME, Operation::Create.as_str()))
    }

    fn update_request(
        &self,
        _id: &IdOf<Self>,
        _payload: &PayloadOf<Self>,
    ) -> Result<ResourceRequest, ClientError> {
        Err(ClientError::unsupported(Self::NAME, Operation::Update.as_str()))
    }

    fn remove_request(&self, _id: &IdOf<Self>) -> Result<ResourceRequest, ClientError> {
        Err(ClientError::unsupported(Self::NAME, Operation::Remove.as_str()))
    }

    /// A benign message when `record` is already in its removed state and
    /// removing it again must not touch the network.
    fn already_removed(&self, _record: &Self::Record) -> Option<String> {
        None
    }

    /// Applies `payload` to the cached record. Only fields the client fully
    /// controls may be patched; returning `false` forces a refetch.
    fn patch_local(&self, _record: &mut Self::Record, _payload: &PayloadOf<Self>) -> bool {
        false
    }

    /// Marks `record` as removed in place when the service keeps it after a
    /// remove (a cancel, for instance). Returning `false` drops it from the
    /// collection.
    fn patch_removed(&self, _record: &mut Self::Record) -> bool {
        false
    }

    /// Request whose response is a status message worth showing after a
    /// successful operation.
    fn follow_up(&self, _operation: Operation, _id: &IdOf<Self>) -> Option<ResourceRequest> {
        None
    }

    fn success_message(
        &self,
        operation: Operation,
        _subject: Option<&Self::Record>,
        _payload: Option<&PayloadOf<Self>>,
    ) -> String {
        let verb = match operation {
            Operation::Create => "added",
            Operation::Update => "updated",
            Operation::Remove => "deleted",
        };
        format!("{} {verb} successfully", Self::LABEL)
    }
}
