//! Shared fixtures for unit tests: signed tokens, an in-memory API and a
//! session store that tests can inspect after handing it to the guard.

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::api::{AdminApi, ApiError, Credentials};
use crate::models::{RecordId, ResourceKind};
use crate::session::{MemoryStore, Permission, SessionStore, StoreError};

/// Key only the "server" knows; the client never verifies with it
const SERVER_SECRET: &[u8] = b"chave-do-servidor";

pub fn token_with_claims(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SERVER_SECRET),
    )
    .expect("token encoding")
}

pub fn token_for(permission: Permission) -> String {
    token_with_claims(json!({
        "id": 1,
        "permissao": permission.as_str(),
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

/// Cloneable handle around a [`MemoryStore`]
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<MemoryStore>);

impl SharedStore {
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self(Arc::new(MemoryStore::with_entries(entries.iter().copied())))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SessionStore for SharedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.0.remove(key)
    }
}

/// In-memory stand-in for the maintenance API
#[derive(Default)]
pub struct FakeApi {
    accounts: Mutex<HashMap<String, (String, String)>>,
    collections: Mutex<BTreeMap<ResourceKind, Vec<Value>>>,
    failures: Mutex<VecDeque<ApiError>>,
    list_failures: Mutex<HashMap<ResourceKind, ApiError>>,
    next_id: AtomicUsize,
    requests: AtomicUsize,
    wrap_lists: AtomicBool,
    revoked: AtomicBool,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            ..Default::default()
        }
    }

    pub fn with_user(self, username: &str, password: &str, permission: Permission) -> Self {
        let token = token_for(permission);
        self.with_raw_token(username, password, &token)
    }

    /// Account whose login returns exactly `token`
    pub fn with_raw_token(self, username: &str, password: &str, token: &str) -> Self {
        self.accounts
            .lock()
            .insert(username.to_string(), (password.to_string(), token.to_string()));
        self
    }

    /// Return lists wrapped in `{ "<collection key>": [...] }`
    pub fn wrapped(self) -> Self {
        self.wrap_lists.store(true, Ordering::SeqCst);
        self
    }

    /// Store a record as if it already existed on the server
    pub fn seed(&self, kind: ResourceKind, record: Value) -> RecordId {
        let mut record = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let id = match record.get("id").and_then(Value::as_i64) {
            Some(id) => {
                self.next_id.fetch_max(id as usize + 1, Ordering::SeqCst);
                id
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) as RecordId;
                record.insert("id".to_string(), json!(id));
                id
            }
        };
        self.collections
            .lock()
            .entry(kind)
            .or_default()
            .push(Value::Object(record));
        id
    }

    pub fn records(&self, kind: ResourceKind) -> Vec<Value> {
        self.collections.lock().get(&kind).cloned().unwrap_or_default()
    }

    /// Make the next call, whatever it is, fail with `error`
    pub fn fail_next(&self, error: ApiError) {
        self.failures.lock().push_back(error);
    }

    /// Make every listing of `kind` fail with `error`
    pub fn fail_list(&self, kind: ResourceKind, error: ApiError) {
        self.list_failures.lock().insert(kind, error);
    }

    /// Reject every authenticated call from now on
    pub fn revoke_tokens(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn authorize(&self, token: &str) -> Result<(), ApiError> {
        self.begin()?;
        if token.is_empty() || self.revoked.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    fn not_found() -> ApiError {
        ApiError::Rejected {
            status: 404,
            message: "Registro não encontrado".to_string(),
        }
    }
}

#[async_trait]
impl AdminApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        self.begin()?;
        let accounts = self.accounts.lock();
        match accounts.get(&credentials.nome_usuario) {
            Some((password, token)) if *password == credentials.senha => Ok(token.clone()),
            _ => Err(ApiError::Rejected {
                status: 401,
                message: "Credenciais inválidas".to_string(),
            }),
        }
    }

    async fn list(&self, kind: ResourceKind, token: &str) -> Result<Value, ApiError> {
        self.authorize(token)?;
        if let Some(error) = self.list_failures.lock().get(&kind) {
            return Err(error.clone());
        }
        let list = Value::Array(self.records(kind));
        if self.wrap_lists.load(Ordering::SeqCst) {
            Ok(json!({ kind.collection_key(): list }))
        } else {
            Ok(list)
        }
    }

    async fn create(&self, kind: ResourceKind, token: &str, body: &Value) -> Result<(), ApiError> {
        self.authorize(token)?;
        let mut record = body.as_object().cloned().unwrap_or_default();
        record.remove("id");
        self.seed(kind, Value::Object(record));
        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: RecordId,
        token: &str,
        body: &Value,
    ) -> Result<(), ApiError> {
        self.authorize(token)?;
        let mut collections = self.collections.lock();
        let record = collections
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|r| r["id"].as_i64() == Some(id)))
            .ok_or_else(Self::not_found)?;

        if let (Some(target), Some(fields)) = (record.as_object_mut(), body.as_object()) {
            for (key, value) in fields {
                if key != "id" {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, id: RecordId, token: &str) -> Result<(), ApiError> {
        self.authorize(token)?;
        let mut collections = self.collections.lock();
        let list = collections.get_mut(&kind).ok_or_else(Self::not_found)?;
        let before = list.len();
        list.retain(|r| r["id"].as_i64() != Some(id));
        if list.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
