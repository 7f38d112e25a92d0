//! Role labels carried in the token and the capability table built on them.
//!
//! Every permission-dependent branch in the client goes through
//! [`Permission::can`]. The check only decides what to offer; the API is
//! the authority on what is allowed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::ResourceKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Administrador,
    Tecnico,
    Patrimonio,
    #[default]
    Visualizador,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Administrador,
        Permission::Tecnico,
        Permission::Patrimonio,
        Permission::Visualizador,
    ];

    /// Wire value, as found in the `permissao` claim
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Administrador => "administrador",
            Permission::Tecnico => "tecnico",
            Permission::Patrimonio => "patrimonio",
            Permission::Visualizador => "visualizador",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Permission::Administrador => "Administrador",
            Permission::Tecnico => "Técnico",
            Permission::Patrimonio => "Patrimônio",
            Permission::Visualizador => "Visualizador",
        }
    }

    pub fn can(&self, action: Action) -> bool {
        match action {
            Action::View(_) => true,
            Action::Create(ResourceKind::Users)
            | Action::Edit(ResourceKind::Users)
            | Action::Delete(ResourceKind::Users) => *self == Permission::Administrador,
            Action::Create(_) | Action::Edit(_) | Action::Delete(_) => true,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("permissão desconhecida: '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Something the user can be offered to do in a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View(ResourceKind),
    Create(ResourceKind),
    Edit(ResourceKind),
    Delete(ResourceKind),
}

impl Action {
    pub const CREATE_USER: Action = Action::Create(ResourceKind::Users);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_labels_only() {
        assert_eq!("administrador".parse::<Permission>().unwrap(), Permission::Administrador);
        assert_eq!(" tecnico ".parse::<Permission>().unwrap(), Permission::Tecnico);
        assert!("admin".parse::<Permission>().is_err());
        assert!("Administrador".parse::<Permission>().is_err());
        assert!("".parse::<Permission>().is_err());
    }

    #[test]
    fn test_only_admin_manages_users() {
        for permission in Permission::ALL {
            let is_admin = permission == Permission::Administrador;
            assert_eq!(permission.can(Action::CREATE_USER), is_admin);
            assert_eq!(permission.can(Action::Edit(ResourceKind::Users)), is_admin);
            assert_eq!(permission.can(Action::Delete(ResourceKind::Users)), is_admin);
            assert!(permission.can(Action::View(ResourceKind::Users)));
        }
    }

    #[test]
    fn test_everyone_sees_and_edits_other_resources() {
        for permission in Permission::ALL {
            for kind in [
                ResourceKind::Equipment,
                ResourceKind::ServiceOrders,
                ResourceKind::Suppliers,
            ] {
                assert!(permission.can(Action::View(kind)));
                assert!(permission.can(Action::Create(kind)));
                assert!(permission.can(Action::Delete(kind)));
            }
        }
    }

    #[test]
    fn test_serde_uses_wire_values() {
        assert_eq!(
            serde_json::to_string(&Permission::Patrimonio).unwrap(),
            "\"patrimonio\""
        );
        assert_eq!(Permission::default(), Permission::Visualizador);
    }
}
