use shared::{
    error::ValidationError,
    records::{Category, CategoryPayload},
};

use super::required;
use crate::{
    error::ClientError,
    resource::{Capabilities, DraftForm, IdOf, Operation, Resource},
    transport::ResourceRequest,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Categories;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub name: String,
}

impl DraftForm<Category> for CategoryForm {
    type Payload = CategoryPayload;

    fn from_record(record: &Category) -> Self {
        Self {
            name: record.name.clone(),
        }
    }

    fn validate(&self) -> Result<CategoryPayload, ValidationError> {
        Ok(CategoryPayload {
            name: required("name", &self.name)?,
        })
    }
}

impl Resource for Categories {
    type Record = Category;
    type Form = CategoryForm;

    const NAME: &'static str = "category";
    const LABEL: &'static str = "Category";

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get("Category/AllCategories")
    }

    fn create_request(&self, payload: &CategoryPayload) -> Result<ResourceRequest, ClientError> {
        ResourceRequest::post("Category/Add").json(payload)
    }

    fn update_request(
        &self,
        id: &IdOf<Self>,
        payload: &CategoryPayload,
    ) -> Result<ResourceRequest, ClientError> {
        ResourceRequest::put(format!("Category/update/{id}")).json(payload)
    }

    fn remove_request(&self, id: &IdOf<Self>) -> Result<ResourceRequest, ClientError> {
        Ok(ResourceRequest::delete(format!("Category/{id}")))
    }

    fn success_message(
        &self,
        operation: Operation,
        subject: Option<&Category>,
        payload: Option<&CategoryPayload>,
    ) -> String {
        let name = payload
            .map(|p| p.name.as_str())
            .or(subject.map(|s| s.name.as_str()))
            .unwrap_or_default();
        let verb = match operation {
            Operation::Create => "added",
            Operation::Update => "updated",
            Operation::Remove => "deleted",
        };
        format!("{name} category {verb} successfully")
    }
}
