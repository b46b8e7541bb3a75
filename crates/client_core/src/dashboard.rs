//! Summary counters for the landing screen.

use std::sync::Arc;

use futures::join;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    error::FetchError,
    repository::Repository,
    resource::Resource,
    resources::{Categories, Customers, Orders, Products},
    session::Credential,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounters {
    pub categories: usize,
    pub products: usize,
    pub customers: usize,
    pub orders: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub counters: DashboardCounters,
    /// `true` while any sub-request is outstanding. Counters that have not
    /// arrived yet read as zero.
    pub loading: bool,
}

pub struct DashboardAggregator {
    categories: Arc<Repository<Categories>>,
    products: Arc<Repository<Products>>,
    customers: Arc<Repository<Customers>>,
    orders: Arc<Repository<Orders>>,
    credential: Option<Credential>,
    state: watch::Sender<DashboardSnapshot>,
}

impl DashboardAggregator {
    pub fn new(
        categories: Arc<Repository<Categories>>,
        products: Arc<Repository<Products>>,
        customers: Arc<Repository<Customers>>,
        orders: Arc<Repository<Orders>>,
        credential: Option<Credential>,
    ) -> Self {
        let (state, _) = watch::channel(DashboardSnapshot::default());
        Self {
            categories,
            products,
            customers,
            orders,
            credential,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        *self.state.borrow()
    }

    /// Lists all four collections concurrently and reduces each to its size.
    /// A failed sub-request counts as zero; it never fails the whole refresh.
    pub async fn refresh(&self) -> DashboardCounters {
        self.state.send_replace(DashboardSnapshot {
            counters: DashboardCounters::default(),
            loading: true,
        });

        let (categories, products, customers, orders) = join!(
            self.count(&self.categories, |c, n| c.categories = n),
            self.count(&self.products, |c, n| c.products = n),
            self.count(&self.customers, |c, n| c.customers = n),
            self.count(&self.orders, |c, n| c.orders = n),
        );
        let counters = DashboardCounters {
            categories,
            products,
            customers,
            orders,
        };

        self.state.send_replace(DashboardSnapshot {
            counters,
            loading: false,
        });
        info!(
            categories,
            products, customers, orders, "dashboard: counters refreshed"
        );
        counters
    }

    async fn count<R: Resource>(
        &self,
        repository: &Repository<R>,
        apply: impl FnOnce(&mut DashboardCounters, usize),
    ) -> usize {
        let result = match repository
            .resource()
            .access()
            .authorize(false, self.credential.as_ref())
        {
            Ok(credential) => repository.list(credential).await.map(|records| records.len()),
            Err(err) => Err(FetchError::new(R::NAME, err)),
        };
        let count = result.unwrap_or_else(|err| {
            warn!(resource = R::NAME, kind = ?err.kind(), "dashboard: counting failed, reporting 0: {err}");
            0
        });
        self.state
            .send_modify(|snapshot| apply(&mut snapshot.counters, count));
        count
    }
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
