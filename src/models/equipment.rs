use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::common::{flexible_f64, EditMode, RecordId};
use super::validation::{
    validate_date, validate_decimal, validate_required, ValidationErrorBuilder, ValidationErrors,
};
use super::{to_body, Resource, ResourceForm, ResourceKind};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Equipment {
    pub id: RecordId,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "marca", default)]
    pub brand: String,
    #[serde(rename = "valor_compra", default, deserialize_with = "flexible_f64")]
    pub purchase_value: Option<f64>,
    #[serde(rename = "data_compra", default)]
    pub purchase_date: Option<String>,
    #[serde(rename = "tipo_posse", default)]
    pub ownership: String,
    #[serde(rename = "numero_identificacao", default)]
    pub identification_number: Option<String>,
}

/// How the clinic holds an item of equipment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    /// Owned by the clinic
    #[default]
    Proprio,
    /// On loan from a supplier
    Comodato,
}

impl Ownership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ownership::Proprio => "proprio",
            Ownership::Comodato => "comodato",
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ownership {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "proprio" | "próprio" => Ok(Ownership::Proprio),
            "comodato" => Ok(Ownership::Comodato),
            other => Err(format!(
                "tipo de posse inválido: '{}' (use proprio ou comodato)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentForm {
    pub name: String,
    pub brand: String,
    pub purchase_value: String,
    pub purchase_date: String,
    pub ownership: Ownership,
    pub identification_number: String,
}

#[derive(Serialize)]
struct EquipmentBody<'a> {
    nome: &'a str,
    marca: &'a str,
    valor_compra: f64,
    data_compra: String,
    tipo_posse: Ownership,
    numero_identificacao: &'a str,
}

impl ResourceForm for EquipmentForm {
    fn payload(&self, _mode: EditMode) -> Result<Value, ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        let name = errors.check("nome", validate_required(&self.name));
        let brand = errors.check("marca", validate_required(&self.brand));
        let value = errors.check("valor_compra", validate_decimal(&self.purchase_value, 0.01, 0.0));
        let date = errors.check("data_compra", validate_date(&self.purchase_date));
        let ident = errors.check(
            "numero_identificacao",
            validate_required(&self.identification_number),
        );
        errors.finish()?;

        match (name, brand, value, date, ident) {
            (Some(name), Some(brand), Some(value), Some(date), Some(ident)) => {
                Ok(to_body(&EquipmentBody {
                    nome: &name,
                    marca: &brand,
                    valor_compra: value,
                    data_compra: date.format("%Y-%m-%d").to_string(),
                    tipo_posse: self.ownership,
                    numero_identificacao: &ident,
                }))
            }
            _ => Err(ValidationErrors::default()),
        }
    }
}

impl Resource for Equipment {
    type Form = EquipmentForm;

    const KIND: ResourceKind = ResourceKind::Equipment;

    fn id(&self) -> RecordId {
        self.id
    }

    fn to_form(&self) -> EquipmentForm {
        EquipmentForm {
            name: self.name.clone(),
            brand: self.brand.clone(),
            purchase_value: self
                .purchase_value
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
            // Date inputs only take the calendar part of a timestamp
            purchase_date: self
                .purchase_date
                .as_deref()
                .map(|d| d.chars().take(10).collect())
                .unwrap_or_default(),
            ownership: self.ownership.parse().unwrap_or_default(),
            identification_number: self.identification_number.clone().unwrap_or_default(),
        }
    }
}
