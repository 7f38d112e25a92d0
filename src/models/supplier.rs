use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{EditMode, RecordId};
use super::validation::{
    validate_optional_email, validate_required, ValidationErrorBuilder, ValidationErrors,
};
use super::{to_body, Resource, ResourceForm, ResourceKind};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Supplier {
    pub id: RecordId,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(rename = "contato", default)]
    pub contact: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Apply the Brazilian phone mask to whatever digits the input holds.
///
/// At most 11 digits are kept: `(11) 2345-6789` for landlines and
/// `(11) 98765-4321` for mobiles. Partial input gets a partial mask.
pub fn mask_phone(value: &str) -> String {
    let digits: String = value
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(11)
        .collect();

    // ASCII digits only, so byte slicing is safe
    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({}", digits),
        3..=7 => format!("({}) {}", &digits[..2], &digits[2..]),
        8..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplierForm {
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
}

#[derive(Serialize)]
struct SupplierBody<'a> {
    nome: &'a str,
    contato: &'a str,
    telefone: String,
    email: &'a str,
}

impl ResourceForm for SupplierForm {
    fn payload(&self, _mode: EditMode) -> Result<Value, ValidationErrors> {
        let mut errors = ValidationErrorBuilder::new();
        let name = errors.check("nome", validate_required(&self.name));
        errors.check("email", validate_optional_email(&self.email));
        errors.finish()?;

        let name = name.unwrap_or_default();
        Ok(to_body(&SupplierBody {
            nome: &name,
            contato: self.contact.trim(),
            telefone: mask_phone(&self.phone),
            email: self.email.trim(),
        }))
    }
}

impl Resource for Supplier {
    type Form = SupplierForm;

    const KIND: ResourceKind = ResourceKind::Suppliers;

    fn id(&self) -> RecordId {
        self.id
    }

    fn to_form(&self) -> SupplierForm {
        SupplierForm {
            name: self.name.clone(),
            contact: self.contact.clone().unwrap_or_default(),
            phone: self.phone.as_deref().map(mask_phone).unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
        }
    }
}
