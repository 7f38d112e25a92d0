//! Text rendering of the admin screens.
//!
//! Everything here is a pure function from loaded data to a `String`; the
//! CLI decides where it goes.

use chrono::{DateTime, NaiveDate};

use crate::models::{
    Equipment, OrderStatus, Ownership, ResourceKind, ServiceOrder, Supplier, User,
};
use crate::session::{Action, Permission, SessionReader};
use crate::views::ServiceOrderView;

/// Service-order descriptions longer than this are cut in list views
pub const DESCRIPTION_PREVIEW_CHARS: usize = 50;

/// Column-aligned text table
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(pad_line(self.headers.iter().copied(), &widths));
        out.push("-".repeat(total));
        for row in &self.rows {
            out.push(pad_line(row.iter().map(String::as_str), &widths));
        }
        out.join("\n")
    }
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// `R$ 10.50`; two decimals with a dot, as the web screens show it
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("R$ {:.2}", v),
        None => "-".to_string(),
    }
}

/// Calendar date as `dd/mm/yyyy`.
///
/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. The calendar part is
/// taken as sent, without moving it to another time zone. Anything else is
/// shown unchanged.
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return "-".to_string();
    };

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            raw.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        });

    match date {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}...", cut)
}

pub fn or_dash(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

fn ownership_label(raw: &str) -> String {
    match raw.parse::<Ownership>() {
        Ok(Ownership::Proprio) => "Próprio".to_string(),
        Ok(Ownership::Comodato) => "Comodato".to_string(),
        Err(_) => or_dash(Some(raw)),
    }
}

pub fn equipment_table(records: &[Equipment]) -> Table {
    let mut table = Table::new(&[
        "ID",
        "Nome",
        "Marca",
        "Valor Compra",
        "Data Compra",
        "Tipo Posse",
        "Nº Identificação",
    ]);
    for eq in records {
        table.push(vec![
            eq.id.to_string(),
            or_dash(Some(&eq.name)),
            or_dash(Some(&eq.brand)),
            format_currency(eq.purchase_value),
            format_date(eq.purchase_date.as_deref()),
            ownership_label(&eq.ownership),
            or_dash(eq.identification_number.as_deref()),
        ]);
    }
    table
}

pub fn service_order_table(view: &ServiceOrderView) -> Table {
    let mut table = Table::new(&[
        "ID",
        "Equipamento",
        "Setor",
        "Descrição",
        "Tipo",
        "Status",
        "Data Abertura",
    ]);
    for order in view.orders().records() {
        table.push(service_order_row(order, view.equipment_name(order.equipment_id)));
    }
    table
}

fn service_order_row(order: &ServiceOrder, equipment: &str) -> Vec<String> {
    let status = order
        .status
        .parse::<OrderStatus>()
        .map(|s| s.label().to_string())
        .unwrap_or_else(|_| or_dash(Some(&order.status)));

    vec![
        order.id.to_string(),
        equipment.to_string(),
        or_dash(Some(&order.sector)),
        truncate_description(&order.problem_description),
        or_dash(Some(&order.maintenance_type)),
        status,
        format_date(order.opened_at.as_deref()),
    ]
}

pub fn supplier_table(records: &[Supplier]) -> Table {
    let mut table = Table::new(&["ID", "Nome", "Contato", "Telefone", "Email"]);
    for supplier in records {
        table.push(vec![
            supplier.id.to_string(),
            or_dash(Some(&supplier.name)),
            or_dash(supplier.contact.as_deref()),
            or_dash(supplier.phone.as_deref()),
            or_dash(supplier.email.as_deref()),
        ]);
    }
    table
}

pub fn user_table(records: &[User]) -> Table {
    let mut table = Table::new(&["ID", "Nome de Usuário", "Email", "Permissão"]);
    for user in records {
        table.push(vec![
            user.id.to_string(),
            user.username.clone(),
            or_dash(user.email.as_deref()),
            or_dash(Some(&user.permission)),
        ]);
    }
    table
}

/// The table, or the collection's empty message when there is nothing
pub fn render_list(kind: ResourceKind, table: &Table) -> String {
    if table.is_empty() {
        kind.empty_message().to_string()
    } else {
        table.render()
    }
}

/// Actions offered on a collection screen for the current session
pub fn view_actions(kind: ResourceKind, session: &SessionReader) -> Vec<&'static str> {
    let mut actions = Vec::new();
    if session.can(Action::Create(kind)) {
        actions.push(kind.create_label());
    }
    if session.can(Action::Edit(kind)) {
        actions.push("Editar");
    }
    if session.can(Action::Delete(kind)) {
        actions.push("Deletar");
    }
    actions
}

/// Landing screen after login
pub fn dashboard(session: &SessionReader) -> String {
    let permission = session.permission().unwrap_or(Permission::Visualizador);
    let mut out = vec![
        format!("Sua Permissão: {}", permission.as_str()),
        String::new(),
        "Bem-vindo ao Sistema".to_string(),
        String::new(),
        "Funcionalidades Disponíveis:".to_string(),
    ];
    for kind in ResourceKind::ALL {
        if session.can(Action::View(kind)) {
            out.push(format!("  - {}", kind.title()));
        }
    }
    out.join("\n")
}
