use shared::records::Customer;

use crate::{
    error::ClientError,
    resource::{AccessPolicy, Capabilities, IdOf, NoDraft, Operation, Resource},
    transport::ResourceRequest,
};

/// Registered shop users. Accounts are created by customers themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct Customers;

impl Resource for Customers {
    type Record = Customer;
    type Form = NoDraft;

    const NAME: &'static str = "customer";
    const LABEL: &'static str = "Customer";

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            create: false,
            update: false,
            remove: true,
        }
    }

    fn access(&self) -> AccessPolicy {
        AccessPolicy::Protected
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get("Users/All Users")
    }

    fn remove_request(&self, id: &IdOf<Self>) -> Result<ResourceRequest, ClientError> {
        Ok(ResourceRequest::delete(format!("Users/{id}")).query("confirm", "true"))
    }

    fn success_message(
        &self,
        _operation: Operation,
        subject: Option<&Customer>,
        _payload: Option<&()>,
    ) -> String {
        match subject {
            Some(customer) => format!(
                "Customer {} {} removed",
                customer.first_name, customer.last_name
            ),
            None => "Customer removed".to_string(),
        }
    }
}
