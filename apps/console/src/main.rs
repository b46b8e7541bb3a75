use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    resource::{IdOf, Resource},
    resources::{
        Categories, CategoryForm, CategoryNames, Customers, OfferForm, Offers, OrderForm, Orders,
        ProductForm, Products, QuestionForm, Questions, SupportReplyForm, SupportTickets,
    },
    transport::ImageAttachment,
    AdminClient, EntityPage, LoginForm, PasswordLogin, SessionSource, StaticToken, SubmitOutcome,
};
use shared::domain::{CategoryId, CustomerId, OfferId, OrderId, ProductId, TicketId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;
use render::{print_dashboard, print_page, ConsoleNotifier, Row};

#[derive(Parser, Debug)]
#[command(name = "admin-console", about = "Manage the shop catalogue from a terminal")]
struct Cli {
    /// Overrides the configured API base URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Bearer token; overrides the configured one.
    #[arg(long)]
    token: Option<String>,
    /// Log in with a password instead of a token.
    #[arg(long, requires = "password")]
    email: Option<String>,
    #[arg(long, requires = "email")]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchanges credentials for a token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Dashboard,
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },
    Products {
        #[command(subcommand)]
        action: Option<ProductAction>,
    },
    Orders {
        #[command(subcommand)]
        action: Option<OrderAction>,
    },
    Offers {
        #[command(subcommand)]
        action: Option<OfferAction>,
    },
    Customers {
        #[command(subcommand)]
        action: Option<CustomerAction>,
    },
    Questions {
        category_id: i64,
        #[command(subcommand)]
        action: Option<QuestionAction>,
    },
    Support {
        #[command(subcommand)]
        action: Option<SupportAction>,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryAction {
    Add { name: String },
    Rename { id: i64, name: String },
    Delete { id: i64 },
}

#[derive(Args, Debug, Default)]
struct ProductFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    stock: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category_id: Option<String>,
}

impl ProductFields {
    fn apply(self, draft: &mut ProductForm) {
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.price {
            draft.price = v;
        }
        if let Some(v) = self.stock {
            draft.stock = v;
        }
        if let Some(v) = self.description {
            draft.description = v;
        }
        if let Some(v) = self.category_id {
            draft.category_id = v;
        }
    }
}

#[derive(Subcommand, Debug)]
enum ProductAction {
    Add {
        #[command(flatten)]
        fields: ProductFields,
        /// Image file uploaded with the new product.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Edit {
        id: i64,
        #[command(flatten)]
        fields: ProductFields,
        /// Reference to an already stored image.
        #[arg(long)]
        image_url: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum OrderAction {
    /// Pending, Shipped or Delivered.
    Status { id: i64, status: String },
    Cancel { id: i64 },
}

#[derive(Args, Debug, Default)]
struct OfferFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    category_id: Option<String>,
    #[arg(long)]
    min_quantity: Option<String>,
    #[arg(long)]
    discount: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    start: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    end: Option<String>,
}

impl OfferFields {
    fn apply(self, draft: &mut OfferForm) {
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.category_id {
            draft.category_id = v;
        }
        if let Some(v) = self.min_quantity {
            draft.min_quantity = v;
        }
        if let Some(v) = self.discount {
            draft.discount_percentage = v;
        }
        if let Some(v) = self.start {
            draft.start_date = v;
        }
        if let Some(v) = self.end {
            draft.end_date = v;
        }
    }
}

#[derive(Subcommand, Debug)]
enum OfferAction {
    Add {
        #[command(flatten)]
        fields: OfferFields,
    },
    Edit {
        id: i64,
        #[command(flatten)]
        fields: OfferFields,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum CustomerAction {
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum QuestionAction {
    Add {
        text: String,
        #[arg(long, default_value = "choice")]
        question_type: String,
        /// Repeat for every possible answer.
        #[arg(long = "answer")]
        answers: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SupportAction {
    Reply { id: i64, response: String },
}

/// What the operator asked a page to do, expressed as dialog steps.
enum Intent<R: Resource> {
    List,
    Add(Box<dyn FnOnce(&mut R::Form)>),
    Edit(IdOf<R>, Box<dyn FnOnce(&mut R::Form)>),
    Delete(IdOf<R>),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(base_url) = cli.base_url.clone() {
        settings.api_base_url = base_url;
    }
    if let Some(token) = cli.token.clone() {
        settings.token = Some(token);
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source: Box<dyn SessionSource> = match (&cli.command, cli.email, cli.password) {
        (Command::Login { email, password }, _, _) => Box::new(PasswordLogin(LoginForm {
            email: email.clone(),
            password: password.clone(),
        })),
        (_, Some(email), Some(password)) => {
            Box::new(PasswordLogin(LoginForm { email, password }))
        }
        _ => Box::new(StaticToken(settings.token.clone())),
    };

    let config = settings.transport_config()?;
    info!(base_url = %config.base_url, "console: starting");
    let client = AdminClient::connect(config, source.as_ref(), Arc::new(ConsoleNotifier))
        .await
        .map_err(|err| anyhow!(err.user_message()))
        .context("failed to open a session")?
        .with_notice_duration(settings.notice_duration());

    match cli.command {
        Command::Login { .. } => {
            let session = client.session();
            let token = session
                .credential()
                .map(|credential| credential.expose().to_string())
                .context("login returned no token")?;
            println!("user id: {}", session.user_id.as_deref().unwrap_or("-"));
            println!("token:   {token}");
        }
        Command::Dashboard => {
            let counters = client.dashboard().refresh().await;
            print_dashboard(&counters);
        }
        Command::Categories { action } => {
            let intent: Intent<Categories> = match action {
                None => Intent::List,
                Some(CategoryAction::Add { name }) => {
                    Intent::Add(Box::new(move |draft: &mut CategoryForm| draft.name = name))
                }
                Some(CategoryAction::Rename { id, name }) => Intent::Edit(
                    CategoryId(id),
                    Box::new(move |draft: &mut CategoryForm| draft.name = name),
                ),
                Some(CategoryAction::Delete { id }) => Intent::Delete(CategoryId(id)),
            };
            drive("Categories", &client.categories(), intent, &CategoryNames::default()).await?;
        }
        Command::Products { action } => {
            let intent: Intent<Products> = match action {
                None => Intent::List,
                Some(ProductAction::Add { fields, image }) => {
                    let image = match image {
                        Some(path) => Some(read_image(path).await?),
                        None => None,
                    };
                    Intent::Add(Box::new(move |draft: &mut ProductForm| {
                        fields.apply(draft);
                        draft.image = image;
                    }))
                }
                Some(ProductAction::Edit {
                    id,
                    fields,
                    image_url,
                }) => Intent::Edit(
                    ProductId(id),
                    Box::new(move |draft: &mut ProductForm| {
                        fields.apply(draft);
                        if image_url.is_some() {
                            draft.image_url = image_url;
                        }
                    }),
                ),
                Some(ProductAction::Delete { id }) => Intent::Delete(ProductId(id)),
            };
            let names = client.category_names().await;
            drive("Products", &client.products(), intent, &names).await?;
        }
        Command::Orders { action } => {
            let intent: Intent<Orders> = match action {
                None => Intent::List,
                Some(OrderAction::Status { id, status }) => Intent::Edit(
                    OrderId(id),
                    Box::new(move |draft: &mut OrderForm| draft.status = status),
                ),
                Some(OrderAction::Cancel { id }) => Intent::Delete(OrderId(id)),
            };
            drive("Orders", &client.orders(), intent, &CategoryNames::default()).await?;
        }
        Command::Offers { action } => {
            let intent: Intent<Offers> = match action {
                None => Intent::List,
                Some(OfferAction::Add { fields }) => {
                    Intent::Add(Box::new(move |draft: &mut OfferForm| fields.apply(draft)))
                }
                Some(OfferAction::Edit { id, fields }) => Intent::Edit(
                    OfferId(id),
                    Box::new(move |draft: &mut OfferForm| fields.apply(draft)),
                ),
                Some(OfferAction::Delete { id }) => Intent::Delete(OfferId(id)),
            };
            let names = client.category_names().await;
            drive("Offers", &client.offers(), intent, &names).await?;
        }
        Command::Customers { action } => {
            let intent: Intent<Customers> = match action {
                None => Intent::List,
                Some(CustomerAction::Delete { id }) => Intent::Delete(CustomerId(id)),
            };
            drive("Customers", &client.customers(), intent, &CategoryNames::default()).await?;
        }
        Command::Questions {
            category_id,
            action,
        } => {
            let intent: Intent<Questions> = match action {
                None => Intent::List,
                Some(QuestionAction::Add {
                    text,
                    question_type,
                    answers,
                }) => Intent::Add(Box::new(move |draft: &mut QuestionForm| {
                    draft.text = text;
                    draft.question_type = question_type;
                    draft.possible_answers = answers;
                })),
            };
            let names = client.category_names().await;
            let page = client.questions(CategoryId(category_id));
            drive("Questions", &page, intent, &names).await?;
        }
        Command::Support { action } => {
            let intent: Intent<SupportTickets> = match action {
                None => Intent::List,
                Some(SupportAction::Reply { id, response }) => Intent::Edit(
                    TicketId(id),
                    Box::new(move |draft: &mut SupportReplyForm| draft.response = response),
                ),
            };
            drive("Support", &client.support(), intent, &CategoryNames::default()).await?;
        }
    }

    Ok(())
}

/// Loads the page, walks the dialog the way an operator would and prints
/// the resulting listing.
async fn drive<R>(
    title: &str,
    page: &EntityPage<R>,
    intent: Intent<R>,
    names: &CategoryNames,
) -> Result<()>
where
    R: Resource,
    R::Record: Row,
{
    let loaded = page.load().await;
    if let Intent::List = intent {
        print_page(title, &page.snapshot().await, names);
        return loaded.map(|_| ()).map_err(|err| anyhow!(err.user_message()));
    }
    loaded.map_err(|err| anyhow!(err.user_message()))?;

    match intent {
        Intent::List => {}
        Intent::Add(edit) => {
            page.open_add()?;
            page.edit_draft(edit)?;
            submit(page).await?;
        }
        Intent::Edit(id, edit) => {
            let record = find(page, &id).await?;
            page.open_edit(record)?;
            page.edit_draft(edit)?;
            submit(page).await?;
        }
        Intent::Delete(id) => {
            let record = find(page, &id).await?;
            page.open_delete(record)?;
            submit(page).await?;
        }
    }

    print_page(title, &page.snapshot().await, names);
    Ok(())
}

async fn find<R: Resource>(page: &EntityPage<R>, id: &IdOf<R>) -> Result<R::Record> {
    page.find(id)
        .await
        .with_context(|| format!("no {} with id {id}", R::NAME))
}

async fn submit<R: Resource>(page: &EntityPage<R>) -> Result<()> {
    match page.submit().await {
        SubmitOutcome::Succeeded(_) => Ok(()),
        SubmitOutcome::Failed(err) => bail!(err.user_message()),
        SubmitOutcome::Skipped | SubmitOutcome::Ignored => {
            bail!("{} dialog was not submitted", R::NAME)
        }
    }
}

async fn read_image(path: PathBuf) -> Result<ImageAttachment> {
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .context("image path has no file name")?;
    let mime_type = mime_guess::from_path(&path).first_raw().map(str::to_string);
    Ok(ImageAttachment {
        filename,
        mime_type,
        bytes,
    })
}
