//! Resource view controllers.
//!
//! One [`ResourceController`] drives the screen of one collection: it owns
//! the loaded list, the open editor (if any) and the last error. Every intent
//! takes `&mut self`, so a controller never has two requests in flight.
//! Dropping an intent's future before it completes leaves the controller as
//! it was; a late response is never applied.

mod service_orders;

pub use service_orders::{ServiceOrderView, UNKNOWN_EQUIPMENT};

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{AdminApi, ApiError};
use crate::models::{records_from_payload, EditMode, RecordId, Resource, ResourceForm, ValidationErrors};
use crate::session::SessionReader;

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Sessão não autenticada. Faça login")]
    NotAuthenticated,

    #[error("Nenhum formulário aberto")]
    NoEditor,

    #[error("Registro {0} não encontrado")]
    RecordNotFound(RecordId),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ViewError {
    /// The server no longer accepts the session token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ViewError::Api(e) if e.is_unauthorized())
    }
}

/// Asks the user before a destructive action
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

/// An open create/edit form
#[derive(Debug, Clone)]
pub struct Editor<F> {
    target: Option<RecordId>,
    pub form: F,
    error: Option<String>,
}

impl<F> Editor<F> {
    /// Record being edited; `None` when creating
    pub fn target(&self) -> Option<RecordId> {
        self.target
    }

    pub fn mode(&self) -> EditMode {
        EditMode::from_target(self.target)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub struct ResourceController<R: Resource> {
    api: Arc<dyn AdminApi>,
    session: SessionReader,
    records: Vec<R>,
    loaded: bool,
    error: Option<String>,
    editor: Option<Editor<R::Form>>,
}

impl<R: Resource> ResourceController<R> {
    pub fn new(api: Arc<dyn AdminApi>, session: SessionReader) -> Self {
        Self {
            api,
            session,
            records: Vec::new(),
            loaded: false,
            error: None,
            editor: None,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Whether at least one load has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn editor(&self) -> Option<&Editor<R::Form>> {
        self.editor.as_ref()
    }

    pub fn session(&self) -> &SessionReader {
        &self.session
    }

    fn token(&self) -> Result<String, ViewError> {
        self.session.token().ok_or(ViewError::NotAuthenticated)
    }

    /// Fetch the collection and replace the list wholesale.
    ///
    /// On failure the previous list stays and the error is recorded.
    pub async fn load(&mut self) -> Result<(), ViewError> {
        let token = self.token()?;
        let result = match self.api.list(R::KIND, &token).await {
            Ok(payload) => records_from_payload::<R>(R::KIND, payload),
            Err(e) => Err(e),
        };

        match result {
            Ok(records) => {
                debug!(kind = ?R::KIND, count = records.len(), "Collection loaded");
                self.records = records;
                self.loaded = true;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(kind = ?R::KIND, error = %e, "Failed to load collection");
                self.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Open the editor blank (`None`) or pre-filled from a record
    pub fn open_editor(&mut self, record: Option<&R>) -> &mut Editor<R::Form> {
        let editor = Editor {
            target: record.map(Resource::id),
            form: record.map(Resource::to_form).unwrap_or_default(),
            error: None,
        };
        self.editor.insert(editor)
    }

    /// Open the editor for a record of the loaded list
    pub fn open_editor_for(&mut self, id: RecordId) -> Result<&mut Editor<R::Form>, ViewError> {
        let record = self.record(id).cloned().ok_or(ViewError::RecordNotFound(id))?;
        Ok(self.open_editor(Some(&record)))
    }

    pub fn editor_mut(&mut self) -> Option<&mut Editor<R::Form>> {
        self.editor.as_mut()
    }

    /// Replace the open editor's input
    pub fn fill(&mut self, form: R::Form) -> Result<(), ViewError> {
        let editor = self.editor.as_mut().ok_or(ViewError::NoEditor)?;
        editor.form = form;
        Ok(())
    }

    /// Discard the editor and its input
    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Validate and send the editor's form.
    ///
    /// On success the editor closes and the list is reloaded from the
    /// server; the returned error, if any, is then the reload's. On failure
    /// the editor stays open with the user's input and the error message.
    pub async fn submit(&mut self) -> Result<(), ViewError> {
        let token = self.token()?;
        let editor = self.editor.as_mut().ok_or(ViewError::NoEditor)?;
        let mode = editor.mode();

        let body = match editor.form.payload(mode) {
            Ok(body) => body,
            Err(errors) => {
                editor.error = Some(errors.to_string());
                return Err(errors.into());
            }
        };

        let result = match mode {
            EditMode::Create => self.api.create(R::KIND, &token, &body).await,
            EditMode::Update(id) => self.api.update(R::KIND, id, &token, &body).await,
        };

        if let Err(e) = result {
            warn!(kind = ?R::KIND, mode = ?mode, error = %e, "Save rejected");
            editor.error = Some(e.to_string());
            return Err(e.into());
        }

        info!(kind = ?R::KIND, mode = ?mode, "Record saved");
        self.editor = None;
        self.load().await
    }

    /// Delete a record after confirmation.
    ///
    /// A refused confirmation sends nothing. A failed request leaves the
    /// list untouched and records the error.
    pub async fn delete(
        &mut self,
        id: RecordId,
        confirm: &mut dyn Confirm,
    ) -> Result<DeleteOutcome, ViewError> {
        let token = self.token()?;
        if !confirm.confirm(R::KIND.delete_prompt()) {
            debug!(kind = ?R::KIND, id, "Deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        if let Err(e) = self.api.delete(R::KIND, id, &token).await {
            warn!(kind = ?R::KIND, id, error = %e, "Deletion rejected");
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        info!(kind = ?R::KIND, id, "Record deleted");
        self.load().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Equipment, EquipmentForm, ResourceKind, Supplier, User};
    use crate::session::{Permission, SessionGuard};
    use crate::test_support::{FakeApi, SharedStore};
    use crate::api::Credentials;
    use serde_json::json;

    async fn logged_in(api: &Arc<FakeApi>) -> SessionGuard {
        let guard = SessionGuard::initialize(Box::new(SharedStore::default()));
        guard
            .login(api.as_ref(), &Credentials::new("ana", "senha"))
            .await
            .unwrap();
        guard
    }

    fn fake_api() -> Arc<FakeApi> {
        Arc::new(FakeApi::new().with_user("ana", "senha", Permission::Tecnico))
    }

    fn controller<R: Resource>(api: &Arc<FakeApi>, guard: &SessionGuard) -> ResourceController<R> {
        let api: Arc<dyn AdminApi> = api.clone();
        ResourceController::new(api, guard.reader())
    }

    fn bisturi_form() -> EquipmentForm {
        EquipmentForm {
            name: "Bisturi".to_string(),
            brand: "X".to_string(),
            purchase_value: "10.50".to_string(),
            purchase_date: "2024-01-01".to_string(),
            identification_number: "PAT-001".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_load_shows_record_once() {
        let api = fake_api();
        let guard = logged_in(&api).await;
        let mut view = controller::<Equipment>(&api, &guard);

        view.load().await.unwrap();
        assert!(view.is_loaded());
        assert!(view.records().is_empty());

        view.open_editor(None).form = bisturi_form();
        view.submit().await.unwrap();

        assert!(view.editor().is_none());
        assert_eq!(view.records().len(), 1);
        let record = &view.records()[0];
        assert_eq!(record.name, "Bisturi");
        assert_eq!(record.purchase_value, Some(10.5));
    }

    #[tokio::test]
    async fn test_wrapped_list_is_accepted() {
        let api = Arc::new(
            FakeApi::new()
                .with_user("ana", "senha", Permission::Tecnico)
                .wrapped(),
        );
        api.seed(ResourceKind::Suppliers, json!({"nome": "MedSupply"}));
        let guard = logged_in(&api).await;
        let mut view = controller::<Supplier>(&api, &guard);

        view.load().await.unwrap();
        assert_eq!(view.records().len(), 1);
        assert_eq!(view.records()[0].name, "MedSupply");
    }

    #[tokio::test]
    async fn test_update_prefills_and_reloads() {
        let api = fake_api();
        let id = api.seed(
            ResourceKind::Equipment,
            json!({"nome": "Serra", "marca": "Y", "valor_compra": 5, "data_compra": "2023-02-01",
                   "tipo_posse": "proprio", "numero_identificacao": "PAT-9"}),
        );
        let guard = logged_in(&api).await;
        let mut view = controller::<Equipment>(&api, &guard);
        view.load().await.unwrap();

        let editor = view.open_editor_for(id).unwrap();
        assert_eq!(editor.target(), Some(id));
        assert_eq!(editor.form.name, "Serra");
        editor.form.name = "Serra Oscilatória".to_string();
        view.submit().await.unwrap();

        assert_eq!(view.records().len(), 1);
        assert_eq!(view.records()[0].name, "Serra Oscilatória");
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let api = fake_api();
        let guard = logged_in(&api).await;
        let mut view = controller::<Equipment>(&api, &guard);
        let before = api.request_count();

        view.open_editor(None);
        let err = view.submit().await.unwrap_err();

        assert!(matches!(err, ViewError::Validation(_)));
        assert_eq!(api.request_count(), before);
        assert!(view.editor().unwrap().error().is_some());
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_editor_open() {
        let api = fake_api();
        let guard = logged_in(&api).await;
        let mut view = controller::<Equipment>(&api, &guard);

        view.open_editor(None).form = bisturi_form();
        api.fail_next(ApiError::Rejected {
            status: 400,
            message: "Número de identificação já cadastrado".to_string(),
        });
        view.submit().await.unwrap_err();

        let editor = view.editor().unwrap();
        assert_eq!(editor.form, bisturi_form());
        assert_eq!(editor.error(), Some("Número de identificação já cadastrado"));
        assert!(api.records(ResourceKind::Equipment).is_empty());
    }

    #[tokio::test]
    async fn test_close_editor_discards_input() {
        let api = fake_api();
        let guard = logged_in(&api).await;
        let mut view = controller::<Equipment>(&api, &guard);

        view.open_editor(None).form = bisturi_form();
        view.close_editor();
        assert!(view.editor().is_none());
        assert!(matches!(view.submit().await, Err(ViewError::NoEditor)));
        assert!(matches!(view.fill(bisturi_form()), Err(ViewError::NoEditor)));
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_exactly_that_record() {
        let api = fake_api();
        let keep = api.seed(ResourceKind::Suppliers, json!({"nome": "A"}));
        let gone = api.seed(ResourceKind::Suppliers, json!({"nome": "B"}));
        let guard = logged_in(&api).await;
        let mut view = controller::<Supplier>(&api, &guard);
        view.load().await.unwrap();

        let mut prompts = Vec::new();
        let mut confirm = |prompt: &str| {
            prompts.push(prompt.to_string());
            true
        };
        let outcome = view.delete(gone, &mut confirm).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(prompts, vec![ResourceKind::Suppliers.delete_prompt()]);
        let ids: Vec<_> = view.records().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![keep]);
    }

    #[tokio::test]
    async fn test_cancelled_delete_sends_nothing() {
        let api = fake_api();
        let id = api.seed(ResourceKind::Suppliers, json!({"nome": "A"}));
        let guard = logged_in(&api).await;
        let mut view = controller::<Supplier>(&api, &guard);
        view.load().await.unwrap();
        let before = api.request_count();

        let outcome = view.delete(id, &mut |_: &str| false).await.unwrap();

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(api.request_count(), before);
        assert_eq!(view.records().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_list_and_shows_error() {
        let api = fake_api();
        api.seed(ResourceKind::Suppliers, json!({"nome": "A"}));
        let guard = logged_in(&api).await;
        let mut view = controller::<Supplier>(&api, &guard);
        view.load().await.unwrap();

        let err = view.delete(999, &mut |_: &str| true).await.unwrap_err();

        assert_eq!(err.to_string(), "Registro não encontrado");
        assert_eq!(view.error(), Some("Registro não encontrado"));
        assert_eq!(view.records().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_list() {
        let api = fake_api();
        api.seed(ResourceKind::Users, json!({"nome_usuario": "joao", "permissao": "tecnico"}));
        let guard = logged_in(&api).await;
        let mut view = controller::<User>(&api, &guard);
        view.load().await.unwrap();

        api.fail_next(ApiError::Network("timeout".to_string()));
        view.load().await.unwrap_err();

        assert_eq!(view.records().len(), 1);
        assert_eq!(view.error(), Some("Erro ao conectar ao servidor"));
    }

    #[tokio::test]
    async fn test_first_load_failure_is_an_error_state() {
        let api = fake_api();
        let guard = logged_in(&api).await;
        let mut view = controller::<User>(&api, &guard);

        api.fail_next(ApiError::Network("refused".to_string()));
        view.load().await.unwrap_err();

        assert!(!view.is_loaded());
        assert!(view.error().is_some());
    }

    #[tokio::test]
    async fn test_revoked_token_is_reported_as_unauthorized() {
        let api = fake_api();
        let guard = logged_in(&api).await;
        let mut view = controller::<Equipment>(&api, &guard);

        api.revoke_tokens();
        let err = view.load().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_requires_session() {
        let api = fake_api();
        let guard = SessionGuard::initialize(Box::new(SharedStore::default()));
        let mut view = controller::<Equipment>(&api, &guard);

        assert!(matches!(view.load().await, Err(ViewError::NotAuthenticated)));
        assert_eq!(api.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_without_session_never_asks() {
        let api = fake_api();
        let guard = SessionGuard::initialize(Box::new(SharedStore::default()));
        let mut view = controller::<Equipment>(&api, &guard);

        let mut asked = false;
        let mut confirm = |_: &str| {
            asked = true;
            true
        };
        let result = view.delete(1, &mut confirm).await;

        assert!(matches!(result, Err(ViewError::NotAuthenticated)));
        assert!(!asked);
        assert_eq!(api.request_count(), 0);
    }
}
