use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use relieftrack_auth::{JwtClaims, Role};
use relieftrack_core::{OrganizationId, UserId};
use relieftrack_infra::AppConfig;

const JWT_SECRET: &str = "test-secret";
const ADMIN_EMAIL: &str = "admin@relief.test";
const ADMIN_PASSWORD: &str = "correct horse";

struct TestServer {
    base_url: String,
    organization_id: OrganizationId,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some(JWT_SECRET.to_string());
        config.auth.admin_email = ADMIN_EMAIL.to_string();
        config.auth.admin_password = Some(ADMIN_PASSWORD.to_string());
        let organization_id = config.auth.organization_id;

        // Same router as prod, bound to an ephemeral port.
        let app = relieftrack_api::app::build_app(&config);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            organization_id,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(organization_id: OrganizationId, role: &'static str) -> String {
    let claims = JwtClaims::new(
        UserId::new(),
        organization_id,
        format!("{role}@relief.test"),
        vec![Role::new(role)],
        Utc::now(),
        ChronoDuration::minutes(10),
    );

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn login(client: &reqwest::Client, srv: &TestServer) -> String {
    let res = client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn post_json(client: &reqwest::Client, url: String, token: &str, body: Value) -> reqwest::Response {
    client.post(url).bearer_auth(token).json(&body).send().await.unwrap()
}

async fn get_json(client: &reqwest::Client, url: String, token: &str) -> Value {
    let res = client.get(url).bearer_auth(token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

async fn create_warehouse(client: &reqwest::Client, srv: &TestServer, token: &str) -> String {
    let res = post_json(
        client,
        srv.url("/warehouses"),
        token,
        json!({
            "location": "Dadaab",
            "capacity": 5000,
            "transport": "Rift Haulage",
            "email": "dadaab@relief.test",
            "phone": "+254 700 000 000",
            "latitude": 0.05,
            "longitude": 40.3,
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn create_item(
    client: &reqwest::Client,
    srv: &TestServer,
    token: &str,
    warehouse_id: &str,
    quantity: u64,
) -> String {
    let res = post_json(
        client,
        srv.url("/inventory"),
        token,
        json!({
            "warehouse_id": warehouse_id,
            "name": "Water purification tablets",
            "category": "water",
            "unit": "boxes",
            "min_stock_level": 10,
            "quantity": quantity,
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_issues_a_token_for_the_configured_admin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = post_json(
        &client,
        srv.url("/auth/login"),
        "",
        json!({ "email": ADMIN_EMAIL, "password": "wrong" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");

    let token = login(&client, &srv).await;
    let me = get_json(&client, srv.url("/whoami"), &token).await;
    assert_eq!(
        me["organization_id"].as_str().unwrap(),
        srv.organization_id.to_string()
    );
    assert_eq!(me["email"], ADMIN_EMAIL);
    assert!(me["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn viewer_cannot_write() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let viewer = mint_jwt(srv.organization_id, "viewer");

    let res = client
        .get(srv.url("/inventory"))
        .bearer_auth(&viewer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = post_json(
        &client,
        srv.url("/warehouses"),
        &viewer,
        json!({
            "location": "Kakuma",
            "capacity": 100,
            "transport": "Rift Haulage",
            "email": "kakuma@relief.test",
            "phone": "0700 000 000",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn coordinator_may_ship_but_not_edit_reference_data() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv).await;
    let coordinator = mint_jwt(srv.organization_id, "coordinator");

    let warehouse_id = create_warehouse(&client, &srv, &admin).await;
    let item_id = create_item(&client, &srv, &coordinator, &warehouse_id, 50).await;

    let res = post_json(
        &client,
        srv.url("/shipments"),
        &coordinator,
        json!({
            "source_warehouse_id": warehouse_id,
            "destination": "Garissa",
            "line_items": [{ "inventory_item_id": item_id, "quantity": 5 }],
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .delete(srv.url(&format!("/warehouses/{warehouse_id}")))
        .bearer_auth(&coordinator)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn shipment_lifecycle_reserves_and_delivers() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let warehouse_id = create_warehouse(&client, &srv, &token).await;
    let item_id = create_item(&client, &srv, &token, &warehouse_id, 100).await;

    let res = post_json(
        &client,
        srv.url("/shipments"),
        &token,
        json!({
            "source_warehouse_id": warehouse_id,
            "destination": "Garissa",
            "priority": "high",
            "line_items": [{ "inventory_item_id": item_id, "quantity": 30 }],
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let shipment: Value = res.json().await.unwrap();
    let shipment_id = shipment["id"].as_str().unwrap().to_string();
    assert_eq!(shipment["status"], "pending");
    assert!(shipment["tracking_number"].as_str().unwrap().starts_with("SHP-"));

    let item = get_json(&client, srv.url(&format!("/inventory/{item_id}")), &token).await;
    assert_eq!(item["quantity"], 70);

    let tracking = shipment["tracking_number"].as_str().unwrap();
    let found = get_json(
        &client,
        srv.url(&format!("/shipments/tracking/{tracking}")),
        &token,
    )
    .await;
    assert_eq!(found["id"], shipment_id.as_str());

    for status in ["in-transit", "delivered"] {
        let res = post_json(
            &client,
            srv.url(&format!("/shipments/{shipment_id}/status")),
            &token,
            json!({ "status": status }),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    // Delivered is terminal.
    let res = post_json(
        &client,
        srv.url(&format!("/shipments/{shipment_id}/status")),
        &token,
        json!({ "status": "cancelled" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");

    let stats = get_json(&client, srv.url("/shipments/stats"), &token).await;
    assert_eq!(stats["total_shipments"], 1);
}

#[tokio::test]
async fn insufficient_stock_is_rejected_and_cancel_restores() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let warehouse_id = create_warehouse(&client, &srv, &token).await;
    let item_id = create_item(&client, &srv, &token, &warehouse_id, 10).await;

    let res = post_json(
        &client,
        srv.url("/shipments"),
        &token,
        json!({
            "source_warehouse_id": warehouse_id,
            "destination": "Garissa",
            "line_items": [{ "inventory_item_id": item_id, "quantity": 11 }],
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = post_json(
        &client,
        srv.url("/shipments"),
        &token,
        json!({
            "source_warehouse_id": warehouse_id,
            "destination": "Garissa",
            "line_items": [{ "inventory_item_id": item_id, "quantity": 10 }],
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let shipment: Value = res.json().await.unwrap();
    let shipment_id = shipment["id"].as_str().unwrap();

    let item = get_json(&client, srv.url(&format!("/inventory/{item_id}")), &token).await;
    assert_eq!(item["quantity"], 0);
    assert_eq!(item["status"], "out-of-stock");

    let res = post_json(
        &client,
        srv.url(&format!("/shipments/{shipment_id}/status")),
        &token,
        json!({ "status": "cancelled", "notes": "road closed" }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let item = get_json(&client, srv.url(&format!("/inventory/{item_id}")), &token).await;
    assert_eq!(item["quantity"], 10);
}

#[tokio::test]
async fn malformed_and_unknown_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let res = client
        .get(srv.url("/shipments/not-a-uuid"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(srv.url(&format!("/warehouses/{}", uuid::Uuid::now_v7())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn warehouse_in_use_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let warehouse_id = create_warehouse(&client, &srv, &token).await;
    create_item(&client, &srv, &token, &warehouse_id, 1).await;

    let res = client
        .delete(srv.url(&format!("/warehouses/{warehouse_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "in_use");
}

#[tokio::test]
async fn stream_delivers_organization_events() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let warehouse_id = create_warehouse(&client, &srv, &token).await;
    let item_id = create_item(&client, &srv, &token, &warehouse_id, 20).await;

    let mut stream = client
        .get(srv.url("/stream"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), StatusCode::OK);

    let res = post_json(
        &client,
        srv.url(&format!("/inventory/{item_id}/adjust")),
        &token,
        json!({ "delta": -5 }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let mut received = String::new();
    let read = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while let Some(chunk) = stream.chunk().await.unwrap() {
            received.push_str(&String::from_utf8_lossy(&chunk));
            if received.contains("event: inventory.updated") {
                break;
            }
        }
    })
    .await;

    assert!(read.is_ok(), "no inventory.updated event within timeout");
    assert!(received.contains(&item_id));
    assert!(received.contains("\"new_quantity\":15"));
}

#[tokio::test]
async fn dashboard_lists_mapped_warehouses() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    create_warehouse(&client, &srv, &token).await;

    let dashboard = get_json(&client, srv.url("/dashboard"), &token).await;
    assert_eq!(dashboard["warehouses"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["warehouse_stats"]["total_warehouses"], 1);
}

#[tokio::test]
async fn transport_lookup_search_and_availability() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let res = post_json(
        &client,
        srv.url("/transport"),
        &token,
        json!({
            "name": "Rift Haulage",
            "location": "Nakuru",
            "email": "dispatch@rifthaulage.test",
            "phone": "+254 711 222 333",
            "type": "Road Trucking",
            "service_areas": ["Turkana"],
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let provider: Value = res.json().await.unwrap();
    let provider_id = provider["id"].as_str().unwrap().to_string();

    let available = get_json(&client, srv.url("/transport/available/Road%20Trucking/Turkana"), &token).await;
    assert_eq!(available.as_array().unwrap().len(), 1);
    let by_type = get_json(&client, srv.url("/transport?type=Air%20Cargo"), &token).await;
    assert!(by_type.as_array().unwrap().is_empty());
    let found = get_json(&client, srv.url("/transport/search?q=NAKURU"), &token).await;
    assert_eq!(found[0]["id"], provider["id"]);

    let res = client
        .get(srv.url("/transport/search?q="))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .patch(srv.url(&format!("/transport/{provider_id}/availability")))
        .bearer_auth(&token)
        .json(&json!({ "availability": "unavailable" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["availability"], "unavailable");

    let available = get_json(&client, srv.url("/transport/available/Road%20Trucking/Turkana"), &token).await;
    assert!(available.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn partner_rating_and_search() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;

    let res = post_json(
        &client,
        srv.url("/partners"),
        &token,
        json!({
            "organization_name": "Red Cross Kenya",
            "contact_name": "Amina Njoroge",
            "address": "Mombasa",
            "email": "amina@redcross.test",
            "phone": "+254 722 000 111",
            "partnership_type": "logistics",
        }),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let partner: Value = res.json().await.unwrap();
    let partner_id = partner["id"].as_str().unwrap().to_string();

    let found = get_json(&client, srv.url("/partners/search?q=red%20cross"), &token).await;
    assert_eq!(found[0]["id"], partner["id"]);
    let suppliers = get_json(&client, srv.url("/partners?type=supplier"), &token).await;
    assert!(suppliers.as_array().unwrap().is_empty());

    let rate = |rating: u8| {
        client
            .patch(srv.url(&format!("/partners/{partner_id}/rating")))
            .bearer_auth(&token)
            .json(&json!({ "rating": rating }))
            .send()
    };
    let res = rate(5).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["rating"], 5);

    let res = rate(6).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn warehouse_utilization_drives_capacity_check() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = login(&client, &srv).await;
    let warehouse_id = create_warehouse(&client, &srv, &token).await;

    let check = get_json(
        &client,
        srv.url(&format!("/warehouses/{warehouse_id}/capacity?required=5000")),
        &token,
    )
    .await;
    assert_eq!(check["can_accept"], true);

    let res = client
        .patch(srv.url(&format!("/warehouses/{warehouse_id}/utilization")))
        .bearer_auth(&token)
        .json(&json!({ "utilization": 80 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["utilization"], 80);

    // 20% of 5000 m² is free.
    let check = get_json(
        &client,
        srv.url(&format!("/warehouses/{warehouse_id}/capacity?required=1001")),
        &token,
    )
    .await;
    assert_eq!(check["can_accept"], false);
    assert_eq!(check["utilization"], 80);
}
