//! Resource records and their editor forms.
//!
//! Records are server-owned DTOs: the client deserializes them leniently and
//! does not enforce invariants on them. Forms hold raw user input and turn it
//! into a request payload after input-level validation.

mod common;
mod equipment;
mod service_order;
mod supplier;
mod user;
pub mod validation;

pub use common::*;
pub use equipment::{Equipment, EquipmentForm, Ownership};
pub use service_order::{MaintenanceType, OrderStatus, ServiceOrder, ServiceOrderForm};
pub use supplier::{mask_phone, Supplier, SupplierForm};
pub use user::{User, UserForm};
pub use validation::ValidationErrors;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// The four collections exposed by the maintenance API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Equipment,
    ServiceOrders,
    Suppliers,
    Users,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Equipment,
        ResourceKind::ServiceOrders,
        ResourceKind::Suppliers,
        ResourceKind::Users,
    ];

    /// Collection path on the API
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Equipment => "/equipamentos",
            ResourceKind::ServiceOrders => "/ordens-servico",
            ResourceKind::Suppliers => "/fornecedores",
            ResourceKind::Users => "/usuarios",
        }
    }

    /// Key holding the list when the API wraps the collection in an object
    pub fn collection_key(&self) -> &'static str {
        match self {
            ResourceKind::Equipment => "equipamentos",
            ResourceKind::ServiceOrders => "ordens_servico",
            ResourceKind::Suppliers => "fornecedores",
            ResourceKind::Users => "usuarios",
        }
    }

    /// Section title, as shown in the menu
    pub fn title(&self) -> &'static str {
        match self {
            ResourceKind::Equipment => "Equipamentos",
            ResourceKind::ServiceOrders => "Ordens de Serviço",
            ResourceKind::Suppliers => "Fornecedores",
            ResourceKind::Users => "Usuários",
        }
    }

    /// Label of the "new record" action
    pub fn create_label(&self) -> &'static str {
        match self {
            ResourceKind::Equipment => "Novo Equipamento",
            ResourceKind::ServiceOrders => "Nova Ordem",
            ResourceKind::Suppliers => "Novo Fornecedor",
            ResourceKind::Users => "Novo Usuário",
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            ResourceKind::Equipment => "Nenhum equipamento cadastrado",
            ResourceKind::ServiceOrders => "Nenhuma ordem de serviço cadastrada",
            ResourceKind::Suppliers => "Nenhum fornecedor cadastrado",
            ResourceKind::Users => "Nenhum usuário cadastrado",
        }
    }

    pub fn delete_prompt(&self) -> &'static str {
        match self {
            ResourceKind::Equipment => "Tem certeza que deseja deletar este equipamento?",
            ResourceKind::ServiceOrders => "Tem certeza que deseja deletar esta ordem de serviço?",
            ResourceKind::Suppliers => "Tem certeza que deseja deletar este fornecedor?",
            ResourceKind::Users => "Tem certeza que deseja deletar este usuário?",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A server-owned record type bound to one collection
pub trait Resource: Clone + fmt::Debug + DeserializeOwned + Send + Sync + 'static {
    type Form: ResourceForm;

    const KIND: ResourceKind;

    fn id(&self) -> RecordId;

    /// Pre-populate an editor with the record's current values
    fn to_form(&self) -> Self::Form;
}

/// Raw editor input for a resource
pub trait ResourceForm: Clone + fmt::Debug + Default + Send + Sync {
    /// Validate the input and build the JSON body for POST/PUT.
    fn payload(&self, mode: EditMode) -> Result<Value, ValidationErrors>;
}

/// Helper so forms can emit a body from a serializable struct
pub(crate) fn to_body<T: Serialize>(body: &T) -> Value {
    // Serializing plain structs of strings and numbers cannot fail
    serde_json::to_value(body).unwrap_or(Value::Null)
}
