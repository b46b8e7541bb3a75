use shared::{domain::CategoryId, error::ValidationError, records::Product};
use tracing::debug;

use super::{category_id, number, required};
use crate::{
    error::ClientError,
    resource::{AccessPolicy, Capabilities, DraftForm, IdOf, Resource},
    transport::{ImageAttachment, MultipartBody, ResourceRequest},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Products;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub stock: String,
    pub description: String,
    pub category_id: String,
    /// New image picked in the dialog. Only uploaded on create.
    pub image: Option<ImageAttachment>,
    /// Reference to the image already stored with the product.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub category_id: CategoryId,
    pub image: Option<ImageAttachment>,
    pub image_url: Option<String>,
}

impl ProductPayload {
    fn fields(&self) -> MultipartBody {
        MultipartBody::default()
            .text("Name", self.name.as_str())
            .text("Description", self.description.as_str())
            .text("Price", self.price.to_string())
            .text("Stock", self.stock.to_string())
            .text("CategoryId", self.category_id.to_string())
    }
}

impl DraftForm<Product> for ProductForm {
    type Payload = ProductPayload;

    fn from_record(record: &Product) -> Self {
        Self {
            name: record.name.clone(),
            price: record.price.to_string(),
            stock: record.stock.to_string(),
            description: record.description.clone().unwrap_or_default(),
            category_id: record.category_id.to_string(),
            image: None,
            image_url: record.image_url.clone(),
        }
    }

    fn validate(&self) -> Result<ProductPayload, ValidationError> {
        let name = required("name", &self.name)?;
        let price = number::<f64>("price", &self.price)?;
        if !price.is_finite() || price < 0.0 {
            return Err(ValidationError::new("price", "must not be negative"));
        }
        let stock = number::<i64>("stock", &self.stock)?;
        if stock < 0 {
            return Err(ValidationError::new("stock", "must not be negative"));
        }
        Ok(ProductPayload {
            name,
            description: self.description.trim().to_string(),
            price,
            stock,
            category_id: category_id(&self.category_id)?,
            image: self.image.clone(),
            image_url: self.image_url.clone().filter(|url| !url.trim().is_empty()),
        })
    }
}

impl Resource for Products {
    type Record = Product;
    type Form = ProductForm;

    const NAME: &'static str = "product";
    const LABEL: &'static str = "Product";

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn access(&self) -> AccessPolicy {
        AccessPolicy::ProtectedMutations
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get("Product")
    }

    fn create_request(&self, payload: &ProductPayload) -> Result<ResourceRequest, ClientError> {
        let mut body = payload.fields();
        if let Some(image) = payload.image.clone() {
            body = body.file("imageFile", image);
        }
        Ok(ResourceRequest::post("Product").multipart(body))
    }

    fn update_request(
        &self,
        id: &IdOf<Self>,
        payload: &ProductPayload,
    ) -> Result<ResourceRequest, ClientError> {
        // Updates reference the stored image; binary data is never re-uploaded.
        if payload.image.is_some() {
            debug!(product_id = %id, "product: ignoring attached file on update");
        }
        let mut body = payload.fields();
        if let Some(url) = payload.image_url.as_deref() {
            body = body.text("ImageUrl", url);
        }
        Ok(ResourceRequest::put(format!("Product/{id}")).multipart(body))
    }

    fn remove_request(&self, id: &IdOf<Self>) -> Result<ResourceRequest, ClientError> {
        Ok(ResourceRequest::delete(format!("Product/{id}")))
    }
}
