//! Plain-text rendering of page snapshots.

use std::time::Duration;

use client_core::{
    resource::Resource, resources::CategoryNames, DashboardCounters, LoadState, NoticeKind,
    Notifier, PageSnapshot,
};
use shared::records::{Category, Customer, Offer, Order, Product, Question, SupportTicket};

/// One line of a listing.
pub trait Row {
    fn row(&self, names: &CategoryNames) -> String;
}

impl Row for Category {
    fn row(&self, _names: &CategoryNames) -> String {
        format!("#{:<6} {}", self.id, self.name)
    }
}

impl Row for Product {
    fn row(&self, names: &CategoryNames) -> String {
        format!(
            "#{:<6} {:<24} {:>9.2} stock {:<5} {}",
            self.id,
            self.name,
            self.price,
            self.stock,
            names.name_of(self.category_id)
        )
    }
}

impl Row for Order {
    fn row(&self, _names: &CategoryNames) -> String {
        format!(
            "#{:<6} {:<20} {:>9.2} {}",
            self.id, self.user_name, self.total_amount, self.status
        )
    }
}

impl Row for Offer {
    fn row(&self, names: &CategoryNames) -> String {
        format!(
            "#{:<6} {:<20} {} min {} -{}% {} .. {}",
            self.id,
            self.name,
            names.name_of(self.category_id),
            self.min_quantity,
            self.discount_percentage,
            client_core::resources::date_only(&self.start_date),
            client_core::resources::date_only(&self.end_date)
        )
    }
}

impl Row for Customer {
    fn row(&self, _names: &CategoryNames) -> String {
        format!(
            "{:<38} {} {} <{}> {}",
            self.id,
            self.first_name,
            self.last_name,
            self.email,
            self.phone_number.as_deref().unwrap_or("-")
        )
    }
}

impl Row for Question {
    fn row(&self, names: &CategoryNames) -> String {
        format!(
            "#{:<6} [{}] {} ({}) {}",
            self.id,
            self.question_type,
            self.text,
            names.name_of(self.category_id),
            self.possible_answers.join(" | ")
        )
    }
}

impl Row for SupportTicket {
    fn row(&self, _names: &CategoryNames) -> String {
        let reply = match &self.response {
            Some(response) => format!("replied: {response}"),
            None => "awaiting reply".to_string(),
        };
        format!("#{:<6} {} {} ({reply})", self.id, self.created_at, self.message)
    }
}

pub fn print_page<R>(title: &str, snapshot: &PageSnapshot<R>, names: &CategoryNames)
where
    R: Resource,
    R::Record: Row,
{
    println!("== {title} ==");
    match &snapshot.load {
        LoadState::Failed(message) => {
            println!("  could not load: {message}");
            return;
        }
        LoadState::Idle | LoadState::Loading => {
            println!("  (not loaded)");
            return;
        }
        LoadState::Loaded => {}
    }
    if snapshot.records.is_empty() {
        println!("  (no records)");
    }
    for record in &snapshot.records {
        println!("  {}", record.row(names));
    }
}

pub fn print_dashboard(counters: &DashboardCounters) {
    println!("== Dashboard ==");
    println!("  categories {:>6}", counters.categories);
    println!("  products   {:>6}", counters.products);
    println!("  customers  {:>6}", counters.customers);
    println!("  orders     {:>6}", counters.orders);
}

/// Prints notices to stderr so listings on stdout stay pipeable.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, kind: NoticeKind, _duration: Duration) {
        let tag = match kind {
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        };
        eprintln!("[{tag}] {message}");
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::{CategoryId, OrderId, OrderStatus, ProductId};

    use super::*;

    #[test]
    fn product_rows_resolve_category_names() {
        let names = CategoryNames::from_categories(&[Category {
            id: CategoryId(1),
            name: "Shoes".into(),
        }]);
        let product = Product {
            id: ProductId(10),
            name: "Runner".into(),
            price: 59.5,
            stock: 12,
            description: None,
            category_id: CategoryId(1),
            image_url: None,
        };
        assert!(product.row(&names).ends_with("Shoes"));

        let orphan = Product {
            category_id: CategoryId(9),
            ..product
        };
        assert!(orphan.row(&names).ends_with("Unknown Category"));
    }

    #[test]
    fn order_rows_show_status() {
        let order = Order {
            id: OrderId(100),
            user_name: "dana".into(),
            total_amount: 120.0,
            status: OrderStatus::Shipped,
        };
        let row = order.row(&CategoryNames::default());
        assert!(row.contains("120.00"));
        assert!(row.ends_with("Shipped"));
    }
}
