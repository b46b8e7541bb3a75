//! The concrete resource types managed from the console.

use std::{collections::HashMap, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shared::{
    domain::CategoryId,
    error::ValidationError,
    records::Category,
};

mod category;
mod customer;
mod offer;
mod order;
mod product;
mod question;
mod support;

pub use category::{CategoryForm, Categories};
pub use customer::Customers;
pub use offer::{OfferForm, Offers};
pub use order::{OrderForm, Orders};
pub use product::{ProductForm, ProductPayload, Products};
pub use question::{QuestionForm, Questions};
pub use support::{SupportReplyForm, SupportTickets};

const UNKNOWN_CATEGORY: &str = "Unknown Category";

pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_string())
}

pub(crate) fn number<T: FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    required(field, value)?
        .parse::<T>()
        .map_err(|_| ValidationError::new(field, "must be a number"))
}

pub(crate) fn category_id(value: &str) -> Result<CategoryId, ValidationError> {
    number::<i64>("categoryId", value).map(CategoryId)
}

/// Trims a server timestamp to the `YYYY-MM-DD` a date input edits.
pub fn date_only(raw: &str) -> String {
    raw.split('T').next().unwrap_or_default().trim().to_string()
}

/// Server timestamps come with or without an offset.
pub(crate) fn timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|stamp| stamp.naive_utc())
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok())
}

/// Parses an edited `YYYY-MM-DD` into midnight UTC of that day.
pub(crate) fn date_start(field: &'static str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = required(field, value)?;
    NaiveDate::parse_from_str(&date_only(&value), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, "must be a date (YYYY-MM-DD)"))
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Resolves category ids to names for pages that only store the id.
#[derive(Debug, Clone, Default)]
pub struct CategoryNames {
    names: HashMap<CategoryId, String>,
}

impl CategoryNames {
    pub fn from_categories(categories: &[Category]) -> Self {
        Self {
            names: categories
                .iter()
                .map(|category| (category.id, category.name.clone()))
                .collect(),
        }
    }

    pub fn name_of(&self, id: CategoryId) -> &str {
        self.names
            .get(&id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_CATEGORY)
    }
}
