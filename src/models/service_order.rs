use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::common::{flexible_i64, EditMode, RecordId};
use super::validation::{
    validate_integer, validate_required, ValidationErrorBuilder, ValidationErrors,
};
use super::{to_body, Resource, ResourceForm, ResourceKind};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceOrder {
    pub id: RecordId,
    #[serde(rename = "equipamento_id", default, deserialize_with = "flexible_i64")]
    pub equipment_id: Option<RecordId>,
    #[serde(rename = "setor", default)]
    pub sector: String,
    #[serde(rename = "descricao_problema", default)]
    pub problem_description: String,
    #[serde(rename = "tipo_manutencao", default)]
    pub maintenance_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "data_abertura", default)]
    pub opened_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceType {
    #[default]
    Corretiva,
    Programada,
}

impl MaintenanceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceType::Corretiva => "corretiva",
            MaintenanceType::Programada => "programada",
        }
    }
}

impl fmt::Display for MaintenanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "corretiva" => Ok(MaintenanceType::Corretiva),
            "programada" => Ok(MaintenanceType::Programada),
            other => Err(format!(
                "tipo de manutenção inválido: '{}' (use corretiva ou programada)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Aberta,
    EmAndamento,
    Fechada,
    Cancelada,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Aberta => "aberta",
            OrderStatus::EmAndamento => "em_andamento",
            OrderStatus::Fechada => "fechada",
            OrderStatus::Cancelada => "cancelada",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Aberta => "Aberta",
            OrderStatus::EmAndamento => "Em Andamento",
            OrderStatus::Fechada => "Fechada",
            OrderStatus::Cancelada => "Cancelada",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "aberta" => Ok(OrderStatus::Aberta),
            "em_andamento" => Ok(OrderStatus::EmAndamento),
            "fechada" => Ok(OrderStatus::Fechada),
            "cancelada" => Ok(OrderStatus::Cancelada),
            other => Err(format!(
                "status inválido: '{}' (use aberta, em_andamento, fechada ou cancelada)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceOrderForm {
    pub equipment_id: String,
    pub sector: String,
    pub problem_description: String,
    pub maintenance_type: MaintenanceType,
    pub status: OrderStatus,
}

#[derive(Serialize)]
struct ServiceOrderBody<'a> {
    equipamento_id: RecordId,
    setor: &'a str,
    descricao_problema: &'a str,
    tipo_manutencao: MaintenanceType,
    status: OrderStatus,
}

impl ResourceForm for ServiceOrderForm {
    fn payload(&self, _mode: EditMode) -> Result<Value, ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        let equipment_id = errors.check("equipamento_id", validate_integer(&self.equipment_id));
        let sector = errors.check("setor", validate_required(&self.sector));
        let description = errors.check(
            "descricao_problema",
            validate_required(&self.problem_description),
        );
        errors.finish()?;

        match (equipment_id, sector, description) {
            (Some(equipment_id), Some(sector), Some(description)) => {
                Ok(to_body(&ServiceOrderBody {
                    equipamento_id: equipment_id,
                    setor: &sector,
                    descricao_problema: &description,
                    tipo_manutencao: self.maintenance_type,
                    status: self.status,
                }))
            }
            _ => Err(ValidationErrors::default()),
        }
    }
}

impl Resource for ServiceOrder {
    type Form = ServiceOrderForm;

    const KIND: ResourceKind = ResourceKind::ServiceOrders;

    fn id(&self) -> RecordId {
        self.id
    }

    fn to_form(&self) -> ServiceOrderForm {
        ServiceOrderForm {
            equipment_id: self
                .equipment_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            sector: self.sector.clone(),
            problem_description: self.problem_description.clone(),
            maintenance_type: self.maintenance_type.parse().unwrap_or_default(),
            status: self.status.parse().unwrap_or_default(),
        }
    }
}
