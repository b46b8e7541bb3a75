use shared::{
    error::ValidationError,
    records::{Offer, OfferPayload},
};

use super::{category_id, date_only, date_start, number, required};
use crate::{
    error::ClientError,
    resource::{Capabilities, DraftForm, IdOf, Resource},
    transport::ResourceRequest,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Offers;

/// Dates are held as `YYYY-MM-DD` while editing and sent as full timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferForm {
    pub name: String,
    pub category_id: String,
    pub min_quantity: String,
    pub discount_percentage: String,
    pub start_date: String,
    pub end_date: String,
}

impl DraftForm<Offer> for OfferForm {
    type Payload = OfferPayload;

    fn from_record(record: &Offer) -> Self {
        Self {
            name: record.name.clone(),
            category_id: record.category_id.to_string(),
            min_quantity: record.min_quantity.to_string(),
            discount_percentage: record.discount_percentage.to_string(),
            start_date: date_only(&record.start_date),
            end_date: date_only(&record.end_date),
        }
    }

    fn validate(&self) -> Result<OfferPayload, ValidationError> {
        let name = required("name", &self.name)?;
        let category_id = category_id(&self.category_id)?;
        let min_quantity = number::<i64>("minQuantity", &self.min_quantity)?;
        if min_quantity < 1 {
            return Err(ValidationError::new("minQuantity", "must be at least 1"));
        }
        let discount_percentage = number::<f64>("discountPercentage", &self.discount_percentage)?;
        if !(0.0..=100.0).contains(&discount_percentage) {
            return Err(ValidationError::new(
                "discountPercentage",
                "must be between 0 and 100",
            ));
        }
        let start_date = date_start("startDate", &self.start_date)?;
        let end_date = date_start("endDate", &self.end_date)?;
        if end_date < start_date {
            return Err(ValidationError::new("endDate", "must not be before the start date"));
        }

        Ok(OfferPayload {
            name,
            category_id,
            min_quantity,
            discount_percentage,
            start_date,
            end_date,
        })
    }
}

impl Resource for Offers {
    type Record = Offer;
    type Form = OfferForm;

    const NAME: &'static str = "offer";
    const LABEL: &'static str = "Offer";

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn list_request(&self) -> ResourceRequest {
        ResourceRequest::get("Offer")
    }

    fn create_request(&self, payload: &OfferPayload) -> Result<ResourceRequest, ClientError> {
        ResourceRequest::post("offer").json(payload)
    }

    fn update_request(
        &self,
        id: &IdOf<Self>,
        payload: &OfferPayload,
    ) -> Result<ResourceRequest, ClientError> {
        ResourceRequest::put(format!("offer/{id}")).json(payload)
    }

    fn remove_request(&self, id: &IdOf<Self>) -> Result<ResourceRequest, ClientError> {
        Ok(ResourceRequest::delete(format!("offer/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{CategoryId, OfferId};

    use super::*;

    fn offer() -> Offer {
        Offer {
            id: OfferId(3),
            name: "Winter".into(),
            category_id: CategoryId(2),
            min_quantity: 2,
            discount_percentage: 15.0,
            start_date: "2024-01-01T00:00:00".into(),
            end_date: "2024-02-01T00:00:00".into(),
        }
    }

    #[test]
    fn edit_form_is_seeded_with_date_only_values() {
        let form = OfferForm::from_record(&offer());
        assert_eq!(form.start_date, "2024-01-01");
        assert_eq!(form.end_date, "2024-02-01");
    }

    #[test]
    fn submitted_dates_serialize_as_full_iso_timestamps() {
        let payload = OfferForm::from_record(&offer()).validate().expect("valid");
        let value = serde_json::to_value(&payload).expect("json");
        assert_eq!(value["startDate"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["endDate"], "2024-02-01T00:00:00.000Z");
        assert_eq!(value["minQuantity"], 2);
        assert_eq!(value["categoryId"], 2);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut form = OfferForm::from_record(&offer());
        form.end_date = "2023-12-31".into();
        assert_eq!(form.validate().expect_err("range").field, "endDate");
    }
}
