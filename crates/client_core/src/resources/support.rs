use shared::{
    error::ValidationError,
    records::{SupportReplyPayload, SupportTicket},
};

use super::{required, timestamp};
use crate::{
    error::ClientError,
    resource::{AccessPolicy, Capabilities, DraftForm, IdOf, Operation, Resource},
    transport::ResourceRequest,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SupportTickets;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportReplyForm {
    pub response: String,
}

impl DraftForm<SupportTicket> for SupportReplyForm {
    type Payload = SupportReplyPayload;

    fn from_record(record: &SupportTicket) -> Self {
        Self {
            response: record.response.clone().unwrap_or_default(),
        }
    }

    fn validate(&self) -> Result<SupportReplyPayload, ValidationError> {
        Ok(SupportReplyPayload {
            response: required("response", &self.response)?,
        })
    }
}

impl Resource for SupportTickets {
    type Record = SupportTicket;
    type Form = SupportReplyForm;

    const NAME: &'static str = "support";
    const LABEL: &'static str = "Support message";

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            create: false,
            update: true,
            remove: false,
        }
    }

    fn access(&self) -> AccessPolicy {
        AccessPolicy::ProtectedMutations
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get("Support/all")
    }

    /// Newest last; unparsable timestamps go first.
    fn arrange(&self, records: &mut [SupportTicket]) {
        records.sort_by_key(|ticket| timestamp(&ticket.created_at));
    }

    fn update_request(
        &self,
        id: &IdOf<Self>,
        payload: &SupportReplyPayload,
    ) -> Result<ResourceRequest, ClientError> {
        ResourceRequest::post(format!("Support/respond/{id}")).json(payload)
    }

    fn success_message(
        &self,
        _operation: Operation,
        _subject: Option<&SupportTicket>,
        _payload: Option<&SupportReplyPayload>,
    ) -> String {
        "Message sent successfully!".to_string()
    }
}
