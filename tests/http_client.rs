//! Exercises the HTTP client against a local stub of the maintenance API.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;

use clinica_admin::api::{AdminApi, ApiError, Credentials, HttpApi, TOKEN_HEADER};
use clinica_admin::config::ApiConfig;
use clinica_admin::models::{records_from_payload, Equipment, ResourceKind, Supplier, User};
use clinica_admin::session::{MemoryStore, Permission, SessionGuard, SessionState};

#[derive(Clone)]
struct Stub {
    token: Arc<String>,
}

fn authorized(headers: &HeaderMap, stub: &Stub) -> bool {
    headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == stub.token.as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Token inválido"})),
    )
        .into_response()
}

async fn login(State(stub): State<Stub>, Json(body): Json<Value>) -> Response {
    if body["nome_usuario"] == "admin" && body["senha"] == "secret" {
        Json(json!({"token": stub.token.as_str()})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Credenciais inválidas"})),
        )
            .into_response()
    }
}

async fn list_equipment(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers, &stub) {
        return unauthorized();
    }
    Json(json!({
        "equipamentos": [{
            "id": 1,
            "nome": "Bisturi",
            "marca": "X",
            "valor_compra": "10.50",
            "data_compra": "2024-01-01",
            "tipo_posse": "proprio",
            "numero_identificacao": "PAT-001"
        }]
    }))
    .into_response()
}

async fn list_suppliers(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers, &stub) {
        return unauthorized();
    }
    Json(json!([{"id": 3, "nome": "MedSupply", "telefone": "(11) 98765-4321"}])).into_response()
}

async fn list_users(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers, &stub) {
        return unauthorized();
    }
    Json(json!({"total": 0})).into_response()
}

async fn create_order(State(stub): State<Stub>, headers: HeaderMap) -> Response {
    if !authorized(&headers, &stub) {
        return unauthorized();
    }
    StatusCode::BAD_REQUEST.into_response()
}

async fn delete_equipment(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !authorized(&headers, &stub) {
        return unauthorized();
    }
    if id == 1 {
        return StatusCode::NO_CONTENT.into_response();
    }
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "Equipamento não encontrado"})),
    )
        .into_response()
}

fn issued_token() -> String {
    encode(
        &Header::default(),
        &json!({"id": 1, "permissao": "administrador"}),
        &EncodingKey::from_secret(b"segredo-do-servidor"),
    )
    .unwrap()
}

async fn spawn_stub() -> (HttpApi, String) {
    let token = issued_token();
    let stub = Stub {
        token: Arc::new(token.clone()),
    };

    let app = Router::new()
        .route("/login", post(login))
        .route("/equipamentos", get(list_equipment))
        .route("/equipamentos/:id", delete(delete_equipment))
        .route("/fornecedores", get(list_suppliers))
        .route("/usuarios", get(list_users))
        .route("/ordens-servico", post(create_order))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = HttpApi::new(&ApiConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 5,
    })
    .unwrap();
    (api, token)
}

#[tokio::test]
async fn login_through_session_guard() {
    let (api, token) = spawn_stub().await;
    let guard = SessionGuard::initialize(Box::new(MemoryStore::new()));

    let permission = guard
        .login(&api, &Credentials::new("admin", "secret"))
        .await
        .unwrap();

    assert_eq!(permission, Permission::Administrador);
    assert_eq!(guard.state(), SessionState::Authenticated);
    assert_eq!(guard.reader().token(), Some(token));
}

#[tokio::test]
async fn rejected_login_surfaces_server_message() {
    let (api, _) = spawn_stub().await;

    let err = api
        .login(&Credentials::new("admin", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Credenciais inválidas");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn lists_accept_wrapped_bare_and_missing_collections() {
    let (api, token) = spawn_stub().await;

    let payload = api.list(ResourceKind::Equipment, &token).await.unwrap();
    let equipment: Vec<Equipment> = records_from_payload(ResourceKind::Equipment, payload).unwrap();
    assert_eq!(equipment.len(), 1);
    assert_eq!(equipment[0].purchase_value, Some(10.5));

    let payload = api.list(ResourceKind::Suppliers, &token).await.unwrap();
    let suppliers: Vec<Supplier> = records_from_payload(ResourceKind::Suppliers, payload).unwrap();
    assert_eq!(suppliers[0].name, "MedSupply");

    let payload = api.list(ResourceKind::Users, &token).await.unwrap();
    let users: Vec<User> = records_from_payload(ResourceKind::Users, payload).unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let (api, _) = spawn_stub().await;

    let err = api.list(ResourceKind::Equipment, "outro").await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
}

#[tokio::test]
async fn rejection_without_message_uses_status_text() {
    let (api, token) = spawn_stub().await;

    let err = api
        .create(ResourceKind::ServiceOrders, &token, &json!({"setor": "UTI"}))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Bad Request");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn delete_reports_server_message() {
    let (api, token) = spawn_stub().await;

    api.delete(ResourceKind::Equipment, 1, &token).await.unwrap();

    let err = api
        .delete(ResourceKind::Equipment, 42, &token)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Equipamento não encontrado");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpApi::new(&ApiConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 2,
    })
    .unwrap();

    let err = api
        .login(&Credentials::new("admin", "secret"))
        .await
        .unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.to_string(), "Erro ao conectar ao servidor");
}
