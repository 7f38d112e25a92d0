//! Command-line front end.
//!
//! Each subcommand is one screen of the admin panel:
//! - `login` / `logout` / `status` - manage the stored session
//! - `dashboard` - landing screen with the current permission
//! - `equipment`, `orders`, `suppliers`, `users` - list and edit a collection
//!
//! Before a screen runs, the route guard decides whether it is reachable
//! with the current session.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::api::{AdminApi, Credentials, HttpApi};
use crate::config::Config;
use crate::models::{
    Equipment, EquipmentForm, MaintenanceType, OrderStatus, Ownership, RecordId, Resource,
    ResourceKind, ServiceOrderForm, Supplier, SupplierForm, User, UserForm,
};
use crate::router::{resolve, Route};
use crate::session::{Action, FileStore, Permission, SessionGuard, SessionState};
use crate::ui;
use crate::views::{Confirm, DeleteOutcome, ResourceController, ServiceOrderView, ViewError};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "clinica-admin")]
#[command(author, version, about = "Gestão de manutenção de equipamentos da clínica", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "clinica.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to (overrides the config file)
    #[arg(long, env = "CLINICA_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and store the session
    Login {
        /// Username (prompted when absent)
        #[arg(short, long, env = "CLINICA_USERNAME")]
        username: Option<String>,
        /// Password (prompted when absent)
        #[arg(long, env = "CLINICA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the stored session
    Logout,

    /// Show the stored session and the API in use
    Status,

    /// Landing screen
    Dashboard,

    /// Equipment screen
    #[command(subcommand)]
    Equipment(EquipmentCommands),

    /// Service order screen
    #[command(subcommand)]
    Orders(OrderCommands),

    /// Supplier screen
    #[command(subcommand)]
    Suppliers(SupplierCommands),

    /// User screen
    #[command(subcommand)]
    Users(UserCommands),
}

#[derive(Subcommand, Debug)]
pub enum EquipmentCommands {
    /// List all equipment
    List,
    /// Register new equipment
    Create(EquipmentArgs),
    /// Edit equipment; omitted fields keep their current value
    Update {
        id: RecordId,
        #[command(flatten)]
        args: EquipmentArgs,
    },
    /// Delete equipment
    Delete {
        id: RecordId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// List all service orders
    List,
    /// Open a service order
    Create(OrderArgs),
    /// Edit a service order; omitted fields keep their current value
    Update {
        id: RecordId,
        #[command(flatten)]
        args: OrderArgs,
    },
    /// Delete a service order
    Delete {
        id: RecordId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SupplierCommands {
    /// List all suppliers
    List,
    /// Register a supplier
    Create(SupplierArgs),
    /// Edit a supplier; omitted fields keep their current value
    Update {
        id: RecordId,
        #[command(flatten)]
        args: SupplierArgs,
    },
    /// Delete a supplier
    Delete {
        id: RecordId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List all users
    List,
    /// Create a user
    Create(UserArgs),
    /// Edit a user; omitted fields keep their current value
    Update {
        id: RecordId,
        #[command(flatten)]
        args: UserArgs,
    },
    /// Delete a user
    Delete {
        id: RecordId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

// ============================================================================
// Form arguments
// ============================================================================

/// Command-line fields copied onto a resource form
pub trait FormArgs {
    type Form;

    fn apply(&self, form: &mut Self::Form);
}

fn set(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

#[derive(Args, Debug, Default)]
pub struct EquipmentArgs {
    #[arg(long)]
    pub nome: Option<String>,
    #[arg(long)]
    pub marca: Option<String>,
    /// Purchase value, e.g. 1500.00
    #[arg(long)]
    pub valor_compra: Option<String>,
    /// Purchase date as YYYY-MM-DD
    #[arg(long)]
    pub data_compra: Option<String>,
    /// proprio or comodato
    #[arg(long)]
    pub tipo_posse: Option<Ownership>,
    #[arg(long)]
    pub numero_identificacao: Option<String>,
}

impl FormArgs for EquipmentArgs {
    type Form = EquipmentForm;

    fn apply(&self, form: &mut EquipmentForm) {
        set(&mut form.name, &self.nome);
        set(&mut form.brand, &self.marca);
        set(&mut form.purchase_value, &self.valor_compra);
        set(&mut form.purchase_date, &self.data_compra);
        set(&mut form.identification_number, &self.numero_identificacao);
        if let Some(ownership) = self.tipo_posse {
            form.ownership = ownership;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct OrderArgs {
    /// ID of the equipment the order refers to
    #[arg(long)]
    pub equipamento_id: Option<RecordId>,
    #[arg(long)]
    pub setor: Option<String>,
    #[arg(long)]
    pub descricao_problema: Option<String>,
    /// corretiva or programada
    #[arg(long)]
    pub tipo_manutencao: Option<MaintenanceType>,
    /// aberta, em_andamento, fechada or cancelada
    #[arg(long)]
    pub status: Option<OrderStatus>,
}

impl FormArgs for OrderArgs {
    type Form = ServiceOrderForm;

    fn apply(&self, form: &mut ServiceOrderForm) {
        if let Some(id) = self.equipamento_id {
            form.equipment_id = id.to_string();
        }
        set(&mut form.sector, &self.setor);
        set(&mut form.problem_description, &self.descricao_problema);
        if let Some(kind) = self.tipo_manutencao {
            form.maintenance_type = kind;
        }
        if let Some(status) = self.status {
            form.status = status;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SupplierArgs {
    #[arg(long)]
    pub nome: Option<String>,
    #[arg(long)]
    pub contato: Option<String>,
    /// Phone number; formatted as (dd) ddddd-dddd
    #[arg(long)]
    pub telefone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

impl FormArgs for SupplierArgs {
    type Form = SupplierForm;

    fn apply(&self, form: &mut SupplierForm) {
        set(&mut form.name, &self.nome);
        set(&mut form.contact, &self.contato);
        set(&mut form.phone, &self.telefone);
        set(&mut form.email, &self.email);
    }
}

#[derive(Args, Debug, Default)]
pub struct UserArgs {
    #[arg(long)]
    pub nome_usuario: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Required on create; leave out on update to keep the current one
    #[arg(long)]
    pub senha: Option<String>,
    /// administrador, tecnico, patrimonio or visualizador
    #[arg(long)]
    pub permissao: Option<Permission>,
}

impl FormArgs for UserArgs {
    type Form = UserForm;

    fn apply(&self, form: &mut UserForm) {
        set(&mut form.username, &self.nome_usuario);
        set(&mut form.email, &self.email);
        set(&mut form.password, &self.senha);
        if let Some(permission) = self.permissao {
            form.permission = permission;
        }
    }
}

/// What to do on a collection screen, independent of the resource
#[derive(Debug)]
pub enum ResourceAction<'a, A> {
    List,
    Create(&'a A),
    Update(RecordId, &'a A),
    Delete { id: RecordId, yes: bool },
}

macro_rules! impl_resource_action {
    ($commands:ident, $args:ty) => {
        impl<'a> From<&'a $commands> for ResourceAction<'a, $args> {
            fn from(command: &'a $commands) -> Self {
                match command {
                    $commands::List => ResourceAction::List,
                    $commands::Create(args) => ResourceAction::Create(args),
                    $commands::Update { id, args } => ResourceAction::Update(*id, args),
                    $commands::Delete { id, yes } => {
                        ResourceAction::Delete { id: *id, yes: *yes }
                    }
                }
            }
        }
    };
}

impl_resource_action!(EquipmentCommands, EquipmentArgs);
impl_resource_action!(OrderCommands, OrderArgs);
impl_resource_action!(SupplierCommands, SupplierArgs);
impl_resource_action!(UserCommands, UserArgs);

// ============================================================================
// Terminal input
// ============================================================================

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Asks on the terminal; anything but yes is a no
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        match prompt_line(&format!("{} [s/N] ", prompt)) {
            Ok(answer) => is_yes(&answer),
            Err(_) => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "sim" | "y" | "yes"
    )
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Session guard and API shared by every command of one invocation
pub struct App {
    config: Config,
    guard: SessionGuard,
    api: Arc<dyn AdminApi>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = HttpApi::new(&config.api)?;
        let store = FileStore::open(&config.session.store_path);
        let guard = SessionGuard::initialize(Box::new(store));
        Ok(Self::with_parts(config, guard, Arc::new(api)))
    }

    pub fn with_parts(config: Config, guard: SessionGuard, api: Arc<dyn AdminApi>) -> Self {
        Self { config, guard, api }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Run the route guard for `route`. Errors when it sends us to login.
    fn enter(&self, route: Route) -> Result<()> {
        let target = resolve(self.guard.state(), route);
        debug!(requested = %route, resolved = %target, "Route resolved");
        if target == Route::Login && route != Route::Login {
            bail!("Sessão não autenticada. Execute `clinica-admin login` primeiro");
        }
        Ok(())
    }

    /// Turn a view error into a CLI error, ending the session on a 401
    fn fail(&self, error: ViewError) -> anyhow::Error {
        if error.is_unauthorized() {
            self.guard.expire();
        }
        anyhow::anyhow!(error.to_string())
    }

    /// Refuse actions the screen does not offer to the current permission
    fn permit<A>(&self, kind: ResourceKind, action: &ResourceAction<'_, A>) -> Result<()> {
        let required = match action {
            ResourceAction::List => return Ok(()),
            ResourceAction::Create(_) => Action::Create(kind),
            ResourceAction::Update(..) => Action::Edit(kind),
            ResourceAction::Delete { .. } => Action::Delete(kind),
        };
        if !self.guard.reader().can(required) {
            debug!(action = ?required, "Action not offered to current permission");
            bail!("Ação não permitida para a permissão atual");
        }
        Ok(())
    }

    fn confirmer(yes: bool) -> Box<dyn Confirm> {
        if yes {
            Box::new(|_: &str| true)
        } else {
            Box::new(StdinConfirm)
        }
    }

    pub async fn run(&self, command: &Commands) -> Result<()> {
        match command {
            Commands::Login { username, password } => {
                self.cmd_login(username.as_deref(), password.as_deref()).await
            }
            Commands::Logout => {
                self.guard.logout();
                println!("Sessão encerrada.");
                Ok(())
            }
            Commands::Status => {
                self.cmd_status();
                Ok(())
            }
            Commands::Dashboard => {
                self.enter(Route::Dashboard)?;
                println!("{}", ui::dashboard(&self.guard.reader()));
                Ok(())
            }
            Commands::Equipment(cmd) => {
                self.cmd_resource::<Equipment, EquipmentArgs>(cmd.into(), ui::equipment_table)
                    .await
            }
            Commands::Orders(cmd) => self.cmd_orders(cmd.into()).await,
            Commands::Suppliers(cmd) => {
                self.cmd_resource::<Supplier, SupplierArgs>(cmd.into(), ui::supplier_table)
                    .await
            }
            Commands::Users(cmd) => {
                self.cmd_resource::<User, UserArgs>(cmd.into(), ui::user_table)
                    .await
            }
        }
    }

    async fn cmd_login(&self, username: Option<&str>, password: Option<&str>) -> Result<()> {
        if resolve(self.guard.state(), Route::Login) == Route::Dashboard {
            println!("Sessão já ativa.");
            println!();
            println!("{}", ui::dashboard(&self.guard.reader()));
            return Ok(());
        }

        let username = match username {
            Some(username) => username.to_string(),
            None => prompt_line("Nome de usuário: ")?,
        };
        let password = match password {
            Some(password) => password.to_string(),
            None => prompt_line("Senha: ")?,
        };

        let credentials = Credentials::new(username, password);
        if let Err(e) = self.guard.login(self.api.as_ref(), &credentials).await {
            bail!("{}", e);
        }

        println!("Login realizado com sucesso.");
        println!();
        println!("{}", ui::dashboard(&self.guard.reader()));
        Ok(())
    }

    fn cmd_status(&self) {
        let reader = self.guard.reader();
        println!();
        println!("=== Sessão ===");
        println!();
        match reader.state() {
            SessionState::Authenticated => {
                let permission = reader.permission().unwrap_or_default();
                println!("  Estado:     autenticado");
                println!("  Permissão:  {}", permission.label());
            }
            SessionState::Unauthenticated => println!("  Estado:     não autenticado"),
        }
        println!("  API:        {}", self.config.api.base_url);
        println!("  Arquivo:    {}", self.config.session.store_path.display());
        println!();
    }

    async fn cmd_resource<R, A>(
        &self,
        action: ResourceAction<'_, A>,
        table: fn(&[R]) -> ui::Table,
    ) -> Result<()>
    where
        R: Resource,
        A: FormArgs<Form = R::Form>,
    {
        self.enter(Route::Page(R::KIND))?;
        self.permit(R::KIND, &action)?;
        let mut view = ResourceController::<R>::new(Arc::clone(&self.api), self.guard.reader());
        view.load().await.map_err(|e| self.fail(e))?;

        self.apply(&mut view, action).await?;
        self.print_screen(R::KIND, &table(view.records()));
        Ok(())
    }

    async fn cmd_orders(&self, action: ResourceAction<'_, OrderArgs>) -> Result<()> {
        self.enter(Route::Page(ResourceKind::ServiceOrders))?;
        self.permit(ResourceKind::ServiceOrders, &action)?;
        let mut view = ServiceOrderView::new(Arc::clone(&self.api), self.guard.reader());
        view.load().await.map_err(|e| self.fail(e))?;

        self.apply(view.orders_mut(), action).await?;
        self.print_screen(ResourceKind::ServiceOrders, &ui::service_order_table(&view));
        Ok(())
    }

    /// Carry out a create, update or delete on a loaded controller
    async fn apply<R, A>(
        &self,
        view: &mut ResourceController<R>,
        action: ResourceAction<'_, A>,
    ) -> Result<()>
    where
        R: Resource,
        A: FormArgs<Form = R::Form>,
    {
        match action {
            ResourceAction::List => {}
            ResourceAction::Create(args) => {
                args.apply(&mut view.open_editor(None).form);
                view.submit().await.map_err(|e| self.fail(e))?;
                println!("Registro criado com sucesso.");
            }
            ResourceAction::Update(id, args) => {
                let editor = view.open_editor_for(id).map_err(|e| self.fail(e))?;
                args.apply(&mut editor.form);
                view.submit().await.map_err(|e| self.fail(e))?;
                println!("Registro {} atualizado com sucesso.", id);
            }
            ResourceAction::Delete { id, yes } => {
                let mut confirm = Self::confirmer(yes);
                match view.delete(id, confirm.as_mut()).await.map_err(|e| self.fail(e))? {
                    DeleteOutcome::Deleted => println!("Registro {} removido.", id),
                    DeleteOutcome::Cancelled => println!("Operação cancelada."),
                }
            }
        }
        Ok(())
    }

    fn print_screen(&self, kind: ResourceKind, table: &ui::Table) {
        let actions = ui::view_actions(kind, &self.guard.reader());
        println!();
        println!("=== {} ===", kind.title());
        if !actions.is_empty() {
            println!("Ações: {}", actions.join(", "));
        }
        println!();
        println!("{}", ui::render_list(kind, table));
        println!();
    }
}

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: Config) -> Result<()> {
    let app = App::new(config)?;
    app.run(&cli.command).await
}
