use clap::{
    Parser,
    Subcommand,
};
use std::{
    fs::read_to_string,
    path::PathBuf,
};
use wfcore::{
    ac::agent::Agent,
    config::WorkflowConfigs,
    entity::{
        EntityRef,
        WorkflowAware,
    },
    history::{
        HistoryOrder,
        HistoryRecord,
    },
    platform::ConnectorOption,
};
use wfctrl::platform::{
    Builder as PlatformBuilder,
    Platform,
};
use wfdb_sqlite::SqliteBackend;
use wfrbac::Builder as RbacBuilder;

#[derive(Debug, Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[clap(long, value_name = "WFCTRL_DB_URL", env = "WFCTRL_DB_URL")]
    wfctrl_db_url: String,
    /// Workflow configuration used to build workflows on first use.
    #[clap(long, value_name = "WFCTRL_CONFIG", env = "WFCTRL_CONFIG")]
    wfctrl_config: Option<PathBuf>,
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(arg_required_else_help = true)]
    Workflow {
        #[command(subcommand)]
        cmd: WorkflowCmd,
    },
    #[command(arg_required_else_help = true)]
    Entity {
        kind: String,
        id: i64,
        #[command(subcommand)]
        cmd: EntityCmd,
    },
}

#[derive(Debug, Subcommand)]
enum WorkflowCmd {
    /// Builds every workflow in the configuration file and binds each
    /// to its entity kind
    #[command(arg_required_else_help = true)]
    Load {
        config: PathBuf,
    },
    /// Lists the known workflows
    List,
    #[command(arg_required_else_help = true)]
    Show {
        name: String,
    },
}

#[derive(Debug, Subcommand)]
enum EntityCmd {
    Status,
    Transitions {
        #[clap(long, short = 'u')]
        user: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Transition {
        name: String,
        #[clap(long, short = 'u')]
        user: Option<String>,
        #[clap(long, short = 'c')]
        comment: Option<String>,
    },
    History {
        #[clap(long, action)]
        chronological: bool,
    },
}

/// An entity known only by its reference.
struct Detached {
    entity: EntityRef,
    state_id: Option<i64>,
}

impl WorkflowAware for Detached {
    fn kind(&self) -> &str {
        &self.entity.kind
    }

    fn id(&self) -> i64 {
        self.entity.id
    }

    fn current_state_id(&self) -> Option<i64> {
        self.state_id
    }

    fn set_current_state_id(&mut self, state_id: Option<i64>) {
        self.state_id = state_id;
    }
}

/// The initial record has no transition and shows as `-`.
fn history_line(
    record: &HistoryRecord,
    transition: Option<&str>,
    state: &str,
    actor: &str,
) -> String {
    format!(
        "{} [{}] {state} by {actor}: {}",
        record.created_ts,
        transition.unwrap_or("-"),
        record.comment.as_deref().unwrap_or(""),
    )
}

fn read_configs(path: &PathBuf) -> anyhow::Result<WorkflowConfigs> {
    Ok(read_to_string(path)?.parse::<WorkflowConfigs>()?)
}

#[async_std::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    stderrlog::new()
        .module(module_path!())
        .module("wfctrl")
        .module("wfdb_sqlite")
        .module("wfrbac")
        .verbosity((args.verbose as usize) + 1)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let backend = SqliteBackend::wf(
        ConnectorOption::from(&args.wfctrl_db_url)
            .auto_create_db(true)
    ).await?;
    let configs = match &args.wfctrl_config {
        Some(path) => read_configs(path)?,
        None => WorkflowConfigs::default(),
    };
    let platform = PlatformBuilder::new()
        .wf_platform(backend)
        .rbac_builder(RbacBuilder::new())
        .configs(configs)
        .build()?;

    match args.command {
        Commands::Workflow { cmd } => {
            parse_workflow(&platform, cmd).await?;
        },
        Commands::Entity { kind, id, cmd } => {
            parse_entity(&platform, EntityRef::new(kind, id), cmd).await?;
        },
    }

    Ok(())
}

async fn agent_for(
    platform: &Platform,
    user: Option<String>,
) -> anyhow::Result<Agent> {
    Ok(match user {
        Some(name) => platform.user_by_name(&name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("no such user: {name}"))?
            .into(),
        None => Agent::Anonymous,
    })
}

async fn parse_workflow(
    platform: &Platform,
    arg: WorkflowCmd,
) -> anyhow::Result<()> {
    match arg {
        WorkflowCmd::Load { config } => {
            let configs = read_configs(&config)?;
            for (kind, config) in configs.iter() {
                let workflow = platform.create_workflow_from_config(kind, config).await?;
                println!("loaded workflow {workflow} (id {}) for {kind}", workflow.id);
            }
            platform.load_workflow_config(configs);
        }
        WorkflowCmd::List => {
            for workflow in platform.workflows().await?.iter() {
                println!("{}: {workflow}", workflow.id);
            }
        }
        WorkflowCmd::Show { name } => {
            let workflow = platform.workflow_by_name(&name)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no such workflow: {name}"))?;
            let initial = platform.initial_state(&workflow).await?;
            println!("workflow {workflow} (id {})", workflow.id);
            for state in platform.states(&workflow).await?.iter() {
                let flag = if initial.as_ref().map(|s| s.id) == Some(state.id) {
                    "*"
                } else {
                    " "
                };
                println!("[{flag}] {state}");
                for transition in platform.state_transitions(state).await?.iter() {
                    println!("      -> {transition}");
                }
            }
            for permission in platform.workflow_permissions(&workflow).await?.iter() {
                println!("permission: {permission}");
            }
        }
    }
    Ok(())
}

async fn parse_entity(
    platform: &Platform,
    entity: EntityRef,
    arg: EntityCmd,
) -> anyhow::Result<()> {
    match arg {
        EntityCmd::Status => {
            match platform.resolve_workflow(&entity).await? {
                Some(workflow) => println!("{entity}: workflow {workflow}"),
                None => println!("{entity}: no workflow"),
            }
            match platform.resolve_state(&entity).await? {
                Some(state) => println!("{entity}: state {state}"),
                None => println!("{entity}: no state"),
            }
        }
        EntityCmd::Transitions { user } => {
            let agent = agent_for(platform, user).await?;
            for transition in platform.allowed_transitions(&entity, &agent).await?.iter() {
                println!("{transition}");
            }
        }
        EntityCmd::Transition { name, user, comment } => {
            let agent = agent_for(platform, user).await?;
            let state_id = platform.resolve_state(&entity).await?.map(|s| s.id);
            let mut detached = Detached { entity, state_id };
            let done = platform.attempt_transition(
                &mut detached,
                name.as_str(),
                &agent,
                comment.as_deref(),
            ).await?;
            let entity = detached.entity_ref();
            if done {
                println!("{entity}: took transition {name}");
            } else {
                anyhow::bail!("{entity}: transition {name} not available");
            }
        }
        EntityCmd::History { chronological } => {
            let order = if chronological {
                HistoryOrder::Chronological
            } else {
                HistoryOrder::RecentFirst
            };
            for record in platform.history_for(&entity, order).await?.iter() {
                let state = platform.wf_platform()
                    .get_state_by_id(record.state_id)
                    .await?
                    .map(|state| state.to_string())
                    .unwrap_or_else(|| record.state_id.to_string());
                let transition = match record.transition_id {
                    Some(id) => Some(platform.wf_platform()
                        .get_transition_by_id(id)
                        .await?
                        .map(|transition| transition.name)
                        .unwrap_or_else(|| id.to_string())),
                    None => None,
                };
                let actor = match record.actor_id {
                    Some(id) => platform.user_by_id(id)
                        .await?
                        .map(|user| user.name)
                        .unwrap_or_else(|| id.to_string()),
                    None => "-".to_string(),
                };
                println!("{}", history_line(
                    record,
                    transition.as_deref(),
                    &state,
                    &actor,
                ));
            }
        }
    }
    Ok(())
}
