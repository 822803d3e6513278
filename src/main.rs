use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use condolink::analytics::maintenance::block_overview;
use condolink::analytics::task_filter::{distinct_statuses, TaskFilter};
use condolink::domain::access::{authorize, home_route, Access, Route};
use condolink::domain::forms::LoginForm;
use condolink::domain::models::{MaintenanceTask, RoleCode, Session, TaskStatus};
use condolink::domain::snapshot::UNKNOWN;
use condolink::time_utils::format_display_date;
use condolink::{AppState, ClientConfig, SharedState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "condolink")]
#[command(author, version, about = "Command-line client for the CondoLink condominium backend", long_about = None)]
struct Cli {
    /// Backend root URL
    #[arg(long, env = "CONDOLINK_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Load the dashboard snapshot and print its size
    Dashboard,
    /// Maintenance deadlines and monthly histogram for the resident's block
    Overview,
    /// Admins see the filtered task table, subcontractors their assignments
    Tasks {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        block: Option<i64>,
        #[arg(long)]
        status: Option<String>,
    },
    /// List buildings and their blocks
    Buildings,
    /// Approve a pending resident
    Approve {
        #[arg(long)]
        user_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }

    let state = AppState::from_config(config).context("Failed to build client")?;
    state.session.restore().await.context("Failed to read stored session")?;

    match cli.command {
        Commands::Login { email, password } => login(&state, email, password).await,
        Commands::Logout => {
            state.session.logout().await;
            println!("Signed out.");
            Ok(())
        }
        Commands::Whoami => {
            let session = require(&state, Route::Dashboard).await?;
            println!(
                "{} <{}> {} (building {})",
                session.full_name,
                session.email,
                session.role_code.label(),
                session.building_id.map_or_else(|| "-".to_string(), |id| id.to_string())
            );
            Ok(())
        }
        Commands::Dashboard => {
            require(&state, Route::Dashboard).await?;
            load(&state).await?;
            state
                .dashboard
                .read(|snapshot| {
                    if let Some(s) = snapshot {
                        println!("users:       {}", s.users.len());
                        println!("buildings:   {}", s.buildings.len());
                        println!("blocks:      {}", s.blocks.len());
                        println!("services:    {}", s.services.len());
                        println!("maintenance: {}", s.maintenance.len());
                    }
                })
                .await;
            Ok(())
        }
        Commands::Overview => overview(&state).await,
        Commands::Tasks {
            search,
            category,
            block,
            status,
        } => {
            let filter = TaskFilter {
                search,
                category,
                block,
                status: status.as_deref().map(TaskStatus::parse),
            };
            tasks(&state, filter).await
        }
        Commands::Buildings => {
            let directory = state.directory.list_buildings().await?;
            for building in &directory.buildings {
                println!("{} {}", building.id, building.name);
                for block in directory.blocks_for(building.id) {
                    println!("    {} {}", block.id, block.name);
                }
            }
            Ok(())
        }
        Commands::Approve { user_id } => {
            require(&state, Route::AdminResidents).await?;
            load(&state).await?;
            state
                .admin
                .approve_user(user_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Failed to approve user.")))?;
            println!("User {user_id} approved.");
            Ok(())
        }
    }
}

async fn login(state: &SharedState, email: String, password: String) -> anyhow::Result<()> {
    let form = LoginForm { email, password };
    form.validate()?;
    let outcome = state.session.login(&form.email, &form.password).await;
    if !outcome.success {
        bail!(outcome.message.unwrap_or_else(|| "Login failed.".to_string()));
    }
    if let Some(role) = outcome.role_code {
        println!("Signed in as {}; home is {}", role.label(), home_route(role).path());
    }
    Ok(())
}

/// Mirrors the route guard: no session or the wrong role stops the command.
async fn require(state: &SharedState, route: Route) -> anyhow::Result<Session> {
    let session = state.session.current().await;
    match authorize(session.as_ref(), route) {
        Access::Granted => session.context("Not signed in. Run `condolink login` first."),
        Access::RedirectHome => bail!("Not signed in. Run `condolink login` first."),
        Access::RedirectUnauthorized => bail!("Your role cannot open {}", route.path()),
    }
}

async fn load(state: &SharedState) -> anyhow::Result<()> {
    state
        .dashboard
        .refresh()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Failed to load dashboard data.")))?;
    Ok(())
}

async fn overview(state: &SharedState) -> anyhow::Result<()> {
    let session = require(state, Route::ResidentsHome).await?;
    let Some(block_id) = session.block_id else {
        bail!("No block is linked to this account.");
    };
    load(state).await?;
    let zone = state.session.config().zone;
    let now = zone.now();
    let rendered = state
        .dashboard
        .read(|snapshot| {
            snapshot
                .map(|s| serde_json::to_string_pretty(&block_overview(&s.maintenance, block_id, &zone, now)))
                .transpose()
        })
        .await?;
    if let Some(json) = rendered {
        println!("{json}");
    }
    Ok(())
}

async fn tasks(state: &SharedState, filter: TaskFilter) -> anyhow::Result<()> {
    let session = require(state, Route::Dashboard).await?;
    load(state).await?;
    let zone = state.session.config().zone;
    state
        .dashboard
        .read(|snapshot| {
            let Some(s) = snapshot else { return };
            let building = session.building_id.map_or(UNKNOWN, |id| s.building_name(id));
            println!("{building}");
            let rows: Vec<&MaintenanceTask> = match session.role_code {
                RoleCode::Admin => filter.apply(&s.maintenance).collect(),
                RoleCode::Subcontractor => s.assigned_tasks(session.id).collect(),
                RoleCode::Resident => s
                    .maintenance
                    .iter()
                    .filter(|t| Some(t.block_id) == session.block_id)
                    .collect(),
            };
            for task in rows {
                println!(
                    "{:>5}  {:<12} {:<10} {:<12} {:<16} {}  {}",
                    task.id,
                    task.status.label(),
                    s.block_name(task.block_id),
                    s.service_name(task.category),
                    s.subcontractor_name(task.subcontractor),
                    format_display_date(Some(&task.due_to), &zone),
                    task.task
                );
            }
            if session.role_code == RoleCode::Admin {
                println!("statuses: {}", distinct_statuses(&s.maintenance).join(", "));
            }
        })
        .await;
    Ok(())
}
