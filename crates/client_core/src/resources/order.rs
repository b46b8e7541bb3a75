use shared::{
    domain::OrderStatus,
    error::ValidationError,
    records::{Order, OrderStatusPayload},
};

use crate::{
    error::ClientError,
    resource::{AccessPolicy, Capabilities, DraftForm, IdOf, Operation, Resource},
    transport::ResourceRequest,
};

/// Orders are placed by customers; the console only moves them between
/// statuses or cancels them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Orders;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub status: String,
}

impl DraftForm<Order> for OrderForm {
    type Payload = OrderStatusPayload;

    fn from_record(record: &Order) -> Self {
        Self {
            status: record.status.to_string(),
        }
    }

    fn validate(&self) -> Result<OrderStatusPayload, ValidationError> {
        if self.status.trim().is_empty() {
            return Err(ValidationError::required("status"));
        }
        match OrderStatus::parse(&self.status) {
            Some(status) if OrderStatus::EDITABLE.contains(&status) => {
                Ok(OrderStatusPayload { status })
            }
            _ => Err(ValidationError::new(
                "status",
                "must be Pending, Shipped or Delivered",
            )),
        }
    }
}

impl Resource for Orders {
    type Record = Order;
    type Form = OrderForm;

    const NAME: &'static str = "order";
    const LABEL: &'static str = "Order";

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            create: false,
            update: true,
            remove: true,
        }
    }

    fn access(&self) -> AccessPolicy {
        AccessPolicy::Protected
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get("order/all")
    }

    fn update_request(
        &self,
        id: &IdOf<Self>,
        payload: &OrderStatusPayload,
    ) -> Result<ResourceRequest, ClientError> {
        ResourceRequest::put(format!("order/{id}")).json(payload)
    }

    fn remove_request(&self, id: &IdOf<Self>) -> Result<ResourceRequest, ClientError> {
        Ok(ResourceRequest::delete(format!("order/{id}")))
    }

    fn already_removed(&self, record: &Order) -> Option<String> {
        (record.status == OrderStatus::Canceled).then(|| format!("Order {} is already canceled", record.id))
    }

    fn patch_local(&self, record: &mut Order, payload: &OrderStatusPayload) -> bool {
        record.status = payload.status;
        true
    }

    /// A removed order is a canceled one; the service keeps it.
    fn patch_removed(&self, record: &mut Order) -> bool {
        record.status = OrderStatus::Canceled;
        true
    }

    fn follow_up(&self, operation: Operation, id: &IdOf<Self>) -> Option<ResourceRequest> {
        (operation == Operation::Update)
            .then(|| ResourceRequest::post("order/track-status").query("orderId", id))
    }

    fn success_message(
        &self,
        operation: Operation,
        subject: Option<&Order>,
        payload: Option<&OrderStatusPayload>,
    ) -> String {
        let id = subject.map(|order| order.id.to_string()).unwrap_or_default();
        match (operation, payload) {
            (Operation::Update, Some(payload)) => {
                format!("Order {id} marked as {}", payload.status)
            }
            (Operation::Remove, _) => format!("Order {id} has been cancelled"),
            _ => format!("Order {id} updated"),
        }
    }
}
