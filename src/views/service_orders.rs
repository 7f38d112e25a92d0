//! Service-order screen: the order controller plus an equipment lookup so
//! each order can show the name of the equipment it refers to.

use std::sync::Arc;
use tracing::warn;

use super::{ResourceController, ViewError};
use crate::api::AdminApi;
use crate::models::{Equipment, RecordId, ServiceOrder};
use crate::session::SessionReader;

/// Shown when an order points at equipment the client does not know
pub const UNKNOWN_EQUIPMENT: &str = "Desconhecido";

pub struct ServiceOrderView {
    orders: ResourceController<ServiceOrder>,
    equipment: ResourceController<Equipment>,
}

impl ServiceOrderView {
    pub fn new(api: Arc<dyn AdminApi>, session: SessionReader) -> Self {
        Self {
            orders: ResourceController::new(Arc::clone(&api), session.clone()),
            equipment: ResourceController::new(api, session),
        }
    }

    pub fn orders(&self) -> &ResourceController<ServiceOrder> {
        &self.orders
    }

    pub fn orders_mut(&mut self) -> &mut ResourceController<ServiceOrder> {
        &mut self.orders
    }

    pub fn equipment(&self) -> &[Equipment] {
        self.equipment.records()
    }

    /// Load the orders, then the equipment used for names.
    ///
    /// Only the order list decides success. A failed equipment fetch is
    /// logged and leaves names unresolved.
    pub async fn load(&mut self) -> Result<(), ViewError> {
        self.orders.load().await?;
        if let Err(e) = self.equipment.load().await {
            if e.is_unauthorized() {
                return Err(e);
            }
            warn!(error = %e, "Equipment names unavailable");
        }
        Ok(())
    }

    pub fn equipment_name(&self, id: Option<RecordId>) -> &str {
        id.and_then(|id| self.equipment.record(id))
            .map(|e| e.name.as_str())
            .unwrap_or(UNKNOWN_EQUIPMENT)
    }
}
