use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{Mutex, MutexGuard},
};

use crate::{
    notify::{Notice, NoticeKind, Notifier},
    session::Session,
    transport::{HttpTransport, TransportConfig},
};

pub(crate) const TEST_TOKEN: &str = "test-token";
pub(crate) const ADMIN_EMAIL: &str = "admin@shop.test";
pub(crate) const ADMIN_PASSWORD: &str = "secret123";

/// In-memory state of the fake shop backend.
pub(crate) struct ServiceData {
    pub categories: Vec<Value>,
    pub products: Vec<Value>,
    pub orders: Vec<Value>,
    pub offers: Vec<Value>,
    pub customers: Vec<Value>,
    pub questions: Vec<Value>,
    pub tickets: Vec<Value>,
    pub next_id: i64,
    pub hits: HashMap<&'static str, usize>,
    pub failing: HashSet<&'static str>,
    pub forbidden: HashSet<&'static str>,
    pub delays: HashMap<&'static str, Duration>,
    pub last_json: Option<Value>,
    pub last_multipart: Option<BTreeMap<String, String>>,
}

impl ServiceData {
    fn seeded() -> Self {
        Self {
            categories: vec![
                json!({"id": 1, "name": "Shoes"}),
                json!({"id": 2, "name": "Bags"}),
            ],
            products: vec![json!({
                "id": 10,
                "name": "Runner",
                "price": 59.5,
                "stock": 12,
                "description": "Trail shoe",
                "categoryId": 1,
                "imageUrl": "/images/runner.png"
            })],
            orders: vec![
                json!({"id": 100, "userName": "dana", "totalAmount": 120.0, "status": "Pending"}),
                json!({"id": 101, "userName": "lee", "totalAmount": 35.5, "status": "Canceled"}),
            ],
            offers: vec![json!({
                "id": 20,
                "name": "Spring sale",
                "categoryId": 1,
                "minQuantity": 2,
                "discountPercentage": 15.0,
                "startDate": "2024-01-01T00:00:00",
                "endDate": "2024-02-01T00:00:00"
            })],
            customers: vec![json!({
                "id": "u-1",
                "firstName": "Dana",
                "lastName": "Reyes",
                "email": "dana@example.com",
                "phoneNumber": "555-0100"
            })],
            questions: vec![json!({
                "id": 30,
                "text": "Which size?",
                "questionType": "choice",
                "categoryId": 1,
                "possibleAnswers": ["S", "M"]
            })],
            tickets: vec![json!({
                "id": 40,
                "message": "Where is my order?",
                "createdAt": "2024-03-01T10:00:00",
                "response": null,
                "respondedAt": null
            })],
            next_id: 1000,
            hits: HashMap::new(),
            failing: HashSet::new(),
            forbidden: HashSet::new(),
            delays: HashMap::new(),
            last_json: None,
            last_multipart: None,
        }
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

type MockState = Arc<Mutex<ServiceData>>;
type Reply = Result<Response, Response>;

#[derive(Clone)]
pub(crate) struct MockService {
    pub base_url: String,
    state: MockState,
}

impl MockService {
    pub(crate) fn transport(&self) -> Arc<HttpTransport> {
        let config = TransportConfig::parse(&self.base_url).expect("mock base url");
        Arc::new(HttpTransport::new(config).expect("transport"))
    }

    pub(crate) fn admin_session(&self) -> Session {
        Session::with_token(TEST_TOKEN)
    }

    pub(crate) async fn hits(&self, route: &str) -> usize {
        self.state.lock().await.hits.get(route).copied().unwrap_or(0)
    }

    pub(crate) async fn total_hits(&self) -> usize {
        self.state.lock().await.hits.values().sum()
    }

    pub(crate) async fn fail(&self, route: &'static str) {
        self.state.lock().await.failing.insert(route);
    }

    pub(crate) async fn forbid(&self, route: &'static str) {
        self.state.lock().await.forbidden.insert(route);
    }

    pub(crate) async fn delay(&self, route: &'static str, delay: Duration) {
        self.state.lock().await.delays.insert(route, delay);
    }

    pub(crate) async fn last_json(&self) -> Option<Value> {
        self.state.lock().await.last_json.clone()
    }

    pub(crate) async fn last_multipart(&self) -> Option<BTreeMap<String, String>> {
        self.state.lock().await.last_multipart.clone()
    }

    pub(crate) async fn with_data<T>(&self, inspect: impl FnOnce(&mut ServiceData) -> T) -> T {
        let mut guard = self.state.lock().await;
        inspect(&mut guard)
    }
}

pub(crate) async fn spawn_mock_service() -> Result<MockService> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state: MockState = Arc::new(Mutex::new(ServiceData::seeded()));

    let api = Router::new()
        .route("/Category/AllCategories", get(list_categories))
        .route("/Category/Add", post(create_category))
        .route("/Category/update/:id", put(update_category))
        .route("/Category/:id", delete(remove_category))
        .route("/Product", get(list_products).post(create_product))
        .route("/Product/:id", put(update_product).delete(remove_product))
        .route("/order/all", get(list_orders))
        .route("/order/track-status", post(track_order))
        .route("/order/:id", put(update_order).delete(cancel_order))
        .route("/Offer", get(list_offers))
        .route("/offer", post(create_offer))
        .route("/offer/:id", put(update_offer).delete(remove_offer))
        .route("/Users/Login", post(login))
        .route("/Users/:id", get(list_customers).delete(remove_customer))
        .route("/Question/category/:id", get(list_questions))
        .route("/Question/AddQuestion", post(create_question))
        .route("/Support/all", get(list_tickets))
        .route("/Support/respond/:id", post(respond_ticket))
        .with_state(state.clone());
    let app = Router::new().nest("/api", api);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(MockService {
        base_url: format!("http://{addr}/api"),
        state,
    })
}

/// Counts the hit, then applies the auth, forbidden and failure switches.
async fn gate<'a>(
    state: &'a MockState,
    route: &'static str,
    headers: &HeaderMap,
    protected: bool,
) -> Result<MutexGuard<'a, ServiceData>, Response> {
    let delay = {
        let mut data = state.lock().await;
        *data.hits.entry(route).or_default() += 1;
        data.delays.get(route).copied()
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let data = state.lock().await;
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TEST_TOKEN}"));
    if protected && !authorized {
        return Err((StatusCode::UNAUTHORIZED, "missing bearer token").into_response());
    }
    if data.forbidden.contains(route) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({"message": "Admins only"})),
        )
            .into_response());
    }
    if data.failing.contains(route) {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": {"message": format!("{route} is unavailable")}})),
        )
            .into_response());
    }
    Ok(data)
}

fn position(items: &[Value], id: &Value) -> Result<usize, Response> {
    items
        .iter()
        .position(|item| &item["id"] == id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "no such record").into_response())
}

fn ok() -> Reply {
    Ok(StatusCode::OK.into_response())
}

async fn list_categories(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let data = gate(&state, "category.list", &headers, false).await?;
    Ok(Json(data.categories.clone()).into_response())
}

async fn create_category(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "category.create", &headers, false).await?;
    data.last_json = Some(body.clone());
    let id = data.allocate_id();
    let record = json!({"id": id, "name": body["name"]});
    data.categories.push(record.clone());
    Ok(Json(record).into_response())
}

async fn update_category(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "category.update", &headers, false).await?;
    data.last_json = Some(body.clone());
    let index = position(&data.categories, &json!(id))?;
    data.categories[index]["name"] = body["name"].clone();
    Ok(Json(data.categories[index].clone()).into_response())
}

async fn remove_category(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut data = gate(&state, "category.remove", &headers, false).await?;
    let index = position(&data.categories, &json!(id))?;
    data.categories.remove(index);
    ok()
}

async fn list_products(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let data = gate(&state, "product.list", &headers, false).await?;
    Ok(Json(data.products.clone()).into_response())
}

async fn read_multipart(mut multipart: Multipart) -> Result<BTreeMap<String, String>, Response> {
    let bad_request = |err: axum::extract::multipart::MultipartError| {
        (StatusCode::BAD_REQUEST, err.to_string()).into_response()
    };
    let mut fields = BTreeMap::new();
    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().unwrap_or("none").to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                format!("{file_name} {content_type} ({} bytes)", bytes.len())
            }
            None => field.text().await.map_err(bad_request)?,
        };
        fields.insert(name, value);
    }
    Ok(fields)
}

fn product_from_fields(id: i64, fields: &BTreeMap<String, String>, image_url: Value) -> Value {
    let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
    json!({
        "id": id,
        "name": field("Name"),
        "description": field("Description"),
        "price": field("Price").parse::<f64>().unwrap_or_default(),
        "stock": field("Stock").parse::<i64>().unwrap_or_default(),
        "categoryId": field("CategoryId").parse::<i64>().unwrap_or_default(),
        "imageUrl": image_url,
    })
}

async fn create_product(
    State(state): State<MockState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    gate(&state, "product.create", &headers, true).await?;
    let fields = read_multipart(multipart).await?;
    let mut data = state.lock().await;
    let id = data.allocate_id();
    let image_url = fields
        .get("imageFile")
        .and_then(|file| file.split(' ').next())
        .map(|name| json!(format!("/images/{name}")))
        .unwrap_or(Value::Null);
    let record = product_from_fields(id, &fields, image_url);
    data.products.push(record.clone());
    data.last_multipart = Some(fields);
    Ok(Json(record).into_response())
}

async fn update_product(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Reply {
    gate(&state, "product.update", &headers, true).await?;
    let fields = read_multipart(multipart).await?;
    let mut data = state.lock().await;
    let index = position(&data.products, &json!(id))?;
    let image_url = fields
        .get("ImageUrl")
        .map(|url| json!(url))
        .unwrap_or(Value::Null);
    data.products[index] = product_from_fields(id, &fields, image_url);
    data.last_multipart = Some(fields);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn remove_product(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut data = gate(&state, "product.remove", &headers, true).await?;
    let index = position(&data.products, &json!(id))?;
    data.products.remove(index);
    ok()
}

async fn list_orders(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let data = gate(&state, "order.list", &headers, true).await?;
    Ok(Json(data.orders.clone()).into_response())
}

async fn update_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "order.update", &headers, true).await?;
    data.last_json = Some(body.clone());
    let index = position(&data.orders, &json!(id))?;
    data.orders[index]["status"] = body["status"].clone();
    Ok(Json(json!({"message": "Order status updated"})).into_response())
}

async fn cancel_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut data = gate(&state, "order.remove", &headers, true).await?;
    let index = position(&data.orders, &json!(id))?;
    data.orders[index]["status"] = json!("Canceled");
    ok()
}

async fn track_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let data = gate(&state, "order.track", &headers, true).await?;
    let id = query
        .get("orderId")
        .and_then(|id| id.parse::<i64>().ok())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "orderId is required").into_response())?;
    let index = position(&data.orders, &json!(id))?;
    let status = data.orders[index]["status"].as_str().unwrap_or_default();
    Ok(Json(json!(format!("Order {id} is now {status}"))).into_response())
}

async fn list_offers(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let data = gate(&state, "offer.list", &headers, false).await?;
    Ok(Json(data.offers.clone()).into_response())
}

fn offer_from_body(id: i64, body: &Value) -> Value {
    json!({
        "id": id,
        "name": body["name"],
        "categoryId": body["categoryId"],
        "minQuantity": body["minQuantity"],
        "discountPercentage": body["discountPercentage"],
        "startDate": body["startDate"],
        "endDate": body["endDate"],
    })
}

async fn create_offer(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "offer.create", &headers, false).await?;
    data.last_json = Some(body.clone());
    let id = data.allocate_id();
    let record = offer_from_body(id, &body);
    data.offers.push(record.clone());
    Ok(Json(record).into_response())
}

async fn update_offer(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "offer.update", &headers, false).await?;
    data.last_json = Some(body.clone());
    let index = position(&data.offers, &json!(id))?;
    data.offers[index] = offer_from_body(id, &body);
    ok()
}

async fn remove_offer(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Reply {
    let mut data = gate(&state, "offer.remove", &headers, false).await?;
    let index = position(&data.offers, &json!(id))?;
    data.offers.remove(index);
    ok()
}

async fn list_customers(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(listing): Path<String>,
) -> Reply {
    if listing != "All Users" {
        return Err((StatusCode::NOT_FOUND, "unknown listing").into_response());
    }
    let data = gate(&state, "customer.list", &headers, true).await?;
    Ok(Json(data.customers.clone()).into_response())
}

async fn remove_customer(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let mut data = gate(&state, "customer.remove", &headers, true).await?;
    if query.get("confirm").map(String::as_str) != Some("true") {
        return Err((StatusCode::BAD_REQUEST, "confirmation required").into_response());
    }
    let index = position(&data.customers, &json!(id))?;
    data.customers.remove(index);
    ok()
}

async fn login(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "login", &headers, false).await?;
    data.last_json = Some(body.clone());
    if body["email"] == ADMIN_EMAIL && body["password"] == ADMIN_PASSWORD {
        return Ok(Json(json!({"token": TEST_TOKEN, "id": 7})).into_response());
    }
    Err((StatusCode::UNAUTHORIZED, "Invalid credentials").into_response())
}

async fn list_questions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(category_id): Path<i64>,
) -> Reply {
    let data = gate(&state, "question.list", &headers, false).await?;
    let questions: Vec<Value> = data
        .questions
        .iter()
        .filter(|question| question["categoryId"] == json!(category_id))
        .cloned()
        .collect();
    Ok(Json(questions).into_response())
}

async fn create_question(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "question.create", &headers, false).await?;
    data.last_json = Some(body.clone());
    let id = data.allocate_id();
    let mut record = body;
    record["id"] = json!(id);
    data.questions.push(record);
    ok()
}

async fn list_tickets(State(state): State<MockState>, headers: HeaderMap) -> Reply {
    let data = gate(&state, "support.list", &headers, false).await?;
    Ok(Json(data.tickets.clone()).into_response())
}

async fn respond_ticket(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Reply {
    let mut data = gate(&state, "support.respond", &headers, true).await?;
    data.last_json = Some(body.clone());
    let index = position(&data.tickets, &json!(id))?;
    data.tickets[index]["response"] = body["response"].clone();
    data.tickets[index]["respondedAt"] = json!("2024-03-02T09:00:00");
    ok()
}

/// Keeps every notice for assertions.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: std::sync::Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notices lock").clone()
    }

    pub(crate) fn last(&self) -> Option<Notice> {
        self.notices().pop()
    }

    pub(crate) fn kinds(&self) -> Vec<NoticeKind> {
        self.notices().into_iter().map(|notice| notice.kind).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind, duration: Duration) {
        self.notices.lock().expect("notices lock").push(Notice {
            message: message.to_string(),
            kind,
            duration,
        });
    }
}
