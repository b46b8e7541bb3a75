use std::{sync::Arc, time::Duration};

use shared::domain::CategoryId;
use tracing::{info, warn};

pub mod dashboard;
pub mod error;
pub mod modal;
pub mod notify;
pub mod page;
pub mod repository;
pub mod resource;
pub mod resources;
pub mod session;
pub mod transaction;
pub mod transport;

pub use dashboard::{DashboardAggregator, DashboardCounters, DashboardSnapshot};
pub use error::{ClientError, FetchError};
pub use modal::{ModalError, ModalMode};
pub use notify::{BroadcastNotifier, Notice, NoticeKind, Notifier, TracingNotifier};
pub use page::{EntityPage, LoadState, PageSnapshot, SubmitOutcome, Submitted};
pub use repository::{ReconcilePolicy, Repository};
pub use session::{Credential, LoginForm, PasswordLogin, Session, SessionSource, StaticToken};
pub use transport::{HttpTransport, TransportConfig};

use notify::DEFAULT_NOTICE_DURATION;
use resource::Resource;
use resources::{
    Categories, CategoryNames, Customers, Offers, Orders, Products, Questions, SupportTickets,
};

/// Entry point for a management console: one transport, one session and a
/// shared repository per resource type.
pub struct AdminClient {
    transport: Arc<HttpTransport>,
    session: Session,
    notifier: Arc<dyn Notifier>,
    notice_duration: Duration,
    policy: ReconcilePolicy,
    categories: Arc<Repository<Categories>>,
    products: Arc<Repository<Products>>,
    orders: Arc<Repository<Orders>>,
    offers: Arc<Repository<Offers>>,
    customers: Arc<Repository<Customers>>,
    support: Arc<Repository<SupportTickets>>,
}

impl AdminClient {
    pub fn new(transport: Arc<HttpTransport>, session: Session, notifier: Arc<dyn Notifier>) -> Self {
        Self::new_with_policy(transport, session, notifier, ReconcilePolicy::default())
    }

    pub fn new_with_policy(
        transport: Arc<HttpTransport>,
        session: Session,
        notifier: Arc<dyn Notifier>,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            categories: shared_repository(&transport, Categories, policy),
            products: shared_repository(&transport, Products, policy),
            orders: shared_repository(&transport, Orders, policy),
            offers: shared_repository(&transport, Offers, policy),
            customers: shared_repository(&transport, Customers, policy),
            support: shared_repository(&transport, SupportTickets, policy),
            transport,
            session,
            notifier,
            notice_duration: DEFAULT_NOTICE_DURATION,
            policy,
        }
    }

    /// Builds the transport and opens a session from `source`.
    pub async fn connect(
        config: TransportConfig,
        source: &dyn SessionSource,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        let session = source.open(&transport).await?;
        info!(
            base_url = transport.base_url(),
            authenticated = session.is_authenticated(),
            "client: session opened"
        );
        Ok(Self::new(transport, session, notifier))
    }

    pub fn with_notice_duration(mut self, notice_duration: Duration) -> Self {
        self.notice_duration = notice_duration;
        self
    }

    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn logout(&mut self) {
        self.session.logout();
        info!("client: logged out");
    }

    pub fn categories(&self) -> EntityPage<Categories> {
        self.page(&self.categories)
    }

    pub fn products(&self) -> EntityPage<Products> {
        self.page(&self.products)
    }

    pub fn orders(&self) -> EntityPage<Orders> {
        self.page(&self.orders)
    }

    pub fn offers(&self) -> EntityPage<Offers> {
        self.page(&self.offers)
    }

    pub fn customers(&self) -> EntityPage<Customers> {
        self.page(&self.customers)
    }

    pub fn support(&self) -> EntityPage<SupportTickets> {
        self.page(&self.support)
    }

    /// Questions are scoped to one category, so each call gets its own collection.
    pub fn questions(&self, category_id: CategoryId) -> EntityPage<Questions> {
        let repository = shared_repository(
            &self.transport,
            Questions::for_category(category_id),
            self.policy,
        );
        self.page(&repository)
    }

    pub fn dashboard(&self) -> DashboardAggregator {
        DashboardAggregator::new(
            self.categories.clone(),
            self.products.clone(),
            self.customers.clone(),
            self.orders.clone(),
            self.session.credential.clone(),
        )
    }

    /// Category names for pages that only carry a category id. Lists the
    /// categories first when nothing has been loaded yet.
    pub async fn category_names(&self) -> CategoryNames {
        if self.categories.is_empty().await {
            if let Err(err) = self.categories.list(self.session.credential()).await {
                warn!("client: category lookup unavailable: {err}");
            }
        }
        CategoryNames::from_categories(&self.categories.snapshot().await)
    }

    fn page<R: Resource>(&self, repository: &Arc<Repository<R>>) -> EntityPage<R> {
        EntityPage::new(
            repository.clone(),
            self.notifier.clone(),
            self.session.credential.clone(),
        )
        .with_notice_duration(self.notice_duration)
    }
}

fn shared_repository<R: Resource>(
    transport: &Arc<HttpTransport>,
    resource: R,
    policy: ReconcilePolicy,
) -> Arc<Repository<R>> {
    Arc::new(Repository::new(transport.clone(), resource).with_policy(policy))
}

#[cfg(test)]
#[path = "tests/mock_service.rs"]
mod mock_service;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
