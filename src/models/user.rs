use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{EditMode, RecordId};
use super::validation::{
    validate_optional_email, validate_required, ValidationErrorBuilder, ValidationErrors,
    REQUIRED_MESSAGE,
};
use super::{to_body, Resource, ResourceForm, ResourceKind};
use crate::session::Permission;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: RecordId,
    #[serde(rename = "nome_usuario")]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Kept as sent by the server; see [`User::known_permission`]
    #[serde(rename = "permissao", default)]
    pub permission: String,
}

impl User {
    pub fn known_permission(&self) -> Option<Permission> {
        self.permission.parse().ok()
    }
}

#[derive(Clone, Default, PartialEq)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    /// Required on create; left blank on update to keep the current password
    pub password: String,
    pub permission: Permission,
}

impl std::fmt::Debug for UserForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("permission", &self.permission)
            .finish()
    }
}

#[derive(Serialize)]
struct UserBody<'a> {
    nome_usuario: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    senha: Option<&'a str>,
    permissao: Permission,
}

impl ResourceForm for UserForm {
    fn payload(&self, mode: EditMode) -> Result<Value, ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        let username = errors.check("nome_usuario", validate_required(&self.username));
        errors.check("email", validate_optional_email(&self.email));
        if mode.is_create() && self.password.is_empty() {
            errors.add("senha", REQUIRED_MESSAGE);
        }
        errors.finish()?;

        let username = username.unwrap_or_default();
        Ok(to_body(&UserBody {
            nome_usuario: &username,
            email: self.email.trim(),
            senha: Some(self.password.as_str()).filter(|p| !p.is_empty()),
            permissao: self.permission,
        }))
    }
}

impl Resource for User {
    type Form = UserForm;

    const KIND: ResourceKind = ResourceKind::Users;

    fn id(&self) -> RecordId {
        self.id
    }

    fn to_form(&self) -> UserForm {
        UserForm {
            username: self.username.clone(),
            email: self.email.clone().unwrap_or_default(),
            password: String::new(),
            permission: self.known_permission().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_requires_password() {
        let form = UserForm {
            username: "maria".to_string(),
            ..Default::default()
        };
        let errors = form.payload(EditMode::Create).unwrap_err();
        assert_eq!(errors.get("senha").unwrap()[0], REQUIRED_MESSAGE);
    }

    #[test]
    fn test_update_without_password_omits_it() {
        let form = UserForm {
            username: "maria".to_string(),
            email: "maria@clinica.com".to_string(),
            password: String::new(),
            permission: Permission::Tecnico,
        };
        assert_eq!(
            form.payload(EditMode::Update(3)).unwrap(),
            json!({
                "nome_usuario": "maria",
                "email": "maria@clinica.com",
                "permissao": "tecnico"
            })
        );
    }

    #[test]
    fn test_create_payload_carries_password() {
        let form = UserForm {
            username: "joao".to_string(),
            email: String::new(),
            password: "s3nha".to_string(),
            permission: Permission::Administrador,
        };
        let body = form.payload(EditMode::Create).unwrap();
        assert_eq!(body["senha"], "s3nha");
        assert_eq!(body["permissao"], "administrador");
    }

    #[test]
    fn test_debug_redacts_password() {
        let form = UserForm {
            password: "s3nha".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", form).contains("s3nha"));
    }

    #[test]
    fn test_unknown_permission_is_kept_verbatim() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "nome_usuario": "root",
            "permissao": "admin"
        }))
        .unwrap();
        assert_eq!(user.permission, "admin");
        assert_eq!(user.known_permission(), None);
        assert_eq!(user.to_form().permission, Permission::Visualizador);
    }
}
