use std::path::{Path, PathBuf};

use anyhow::Context as _;
use crew_client::{Advance, SessionController};
use crew_core::activity;
use crew_core::guard::{self, Access, View};
use crew_core::store::Effect;
use crew_core::types::{AgentDraft, SessionStatus, TaskDraft};
use crew_core::wizard::WizardStep;
use serde::Deserialize;

use super::Context;
use crate::render;

pub struct RunOptions {
    pub crew_file: Option<PathBuf>,
    pub topic: Option<String>,
    pub model: Option<String>,
    pub defaults: bool,
}

/// A crew described in TOML:
///
/// ```toml
/// topic = "Rust in embedded systems"
/// model = "gemini-2.0-flash"
///
/// [[agents]]
/// name = "Researcher"
/// role = "Senior researcher"
/// goal = "Find sources"
/// backstory = "Digs deep"
/// tools = ["internet_search"]
///
/// [[tasks]]
/// description = "Collect five sources"
/// expected_output = "A bullet list"
/// agent = "Researcher"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct CrewFile {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Prepend the researcher/writer/editor preset.
    #[serde(default)]
    pub default_agents: bool,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskEntry {
    pub description: String,
    pub expected_output: String,
    pub agent: String,
}

impl CrewFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading crew file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing crew file {}", path.display()))
    }
}

/// Fill the controller's drafts from the crew file, with CLI flags winning.
fn apply_crew(controller: &mut SessionController, crew: CrewFile, opts: &RunOptions) {
    if crew.default_agents || opts.defaults {
        controller.load_default_agents();
    }
    for a in crew.agents {
        controller.add_agent(AgentDraft::new(a.name, a.role, a.goal, a.backstory).with_tools(a.tools));
    }
    for t in crew.tasks {
        controller.add_task(TaskDraft::new(t.description, t.expected_output, t.agent));
    }
    if let Some(model) = opts.model.clone().or(crew.model) {
        controller.set_model(model);
    }
    controller.set_topic(opts.topic.clone().unwrap_or(crew.topic));
}

/// Run `run`: guard, build the crew, walk the wizard, stream the run.
pub async fn run(ctx: &Context, opts: RunOptions) -> anyhow::Result<()> {
    let credentials = ctx.credentials();
    let mut controller = SessionController::new(
        ctx.api()?,
        ctx.config.api.clone(),
        ctx.config.realtime.clone(),
    );

    if guard::check(View::Wizard, &credentials, controller.store()) != Access::Allow {
        anyhow::bail!("No validated API key. Run `crew settings validate <key>` first.");
    }

    let crew = match &opts.crew_file {
        Some(path) => CrewFile::load(path)?,
        None => CrewFile::default(),
    };
    apply_crew(&mut controller, crew, &opts);

    let store = controller.store();
    if store.agents().is_empty() {
        anyhow::bail!("The crew has no agents. Add [[agents]] to the crew file or pass --defaults.");
    }
    if store.tasks().is_empty() {
        anyhow::bail!("The crew has no tasks. Add [[tasks]] to the crew file.");
    }
    for task in store.dangling_tasks() {
        eprintln!(
            "warning: task {:?} is assigned to unknown agent {:?}",
            task.description, task.agent_name
        );
    }

    controller.load_catalogs().await;
    let store = controller.store();
    if !store.available_models().is_empty()
        && !store
            .available_models()
            .iter()
            .any(|m| m.id == store.selected_model())
    {
        eprintln!(
            "warning: model {:?} is not in the backend catalog",
            store.selected_model()
        );
    }

    let session_id = controller.create_session().await?;
    println!("Session {session_id}");
    eprintln!(
        "note: runs are not resumable. If this process exits, fetch the outcome with `crew result {session_id}`."
    );

    loop {
        let step = controller.wizard().step();
        let total = WizardStep::ALL.len();
        match controller.advance_wizard(Some(credentials.credential())).await? {
            Advance::Step(_) => println!("[{}/{total}] {} saved", step.index() + 1, step.label()),
            Advance::Started => {
                println!("[{total}/{total}] crew started on {:?}", controller.store().topic());
                break;
            }
        }
    }

    if guard::check(View::Execution, &credentials, controller.store()) != Access::Allow {
        anyhow::bail!("Session {session_id} is not running.");
    }
    stream(&mut controller).await;

    if !controller.store().status().is_terminal() {
        tracing::info!(session = %session_id, "realtime channel ended early, fetching result");
        controller.fetch_result().await?;
    }

    let store = controller.store();
    match store.status() {
        SessionStatus::Error => anyhow::bail!("Crew run failed. See the log above."),
        _ if guard::check(View::Result, &credentials, store) == Access::Allow => {
            print_outcome(&controller);
            Ok(())
        }
        _ => {
            println!("Run still in progress. Check later with `crew result {session_id}`.");
            Ok(())
        }
    }
}

/// Print events until the run reaches a terminal state or the channel ends.
async fn stream(controller: &mut SessionController) {
    while let Some((event, effect)) = controller.next_event().await {
        match effect {
            Effect::Logged | Effect::Completed | Effect::Failed => {
                println!("{}", render::format_event(&event));
            }
            Effect::StepChanged(_) | Effect::Ignored => {}
        }
        if matches!(effect, Effect::Completed | Effect::Failed) {
            return;
        }
    }
}

fn print_outcome(controller: &SessionController) {
    let store = controller.store();
    let logs = store.logs();

    println!();
    println!("{}", "=".repeat(40));
    println!("{}", store.result().unwrap_or("(empty result)"));
    println!("{}", "=".repeat(40));

    let summary = activity::summary(logs);
    println!(
        "{} events, {} tasks completed, {} actions, {} thoughts ({:.0}% of tasks)",
        summary.total_events,
        summary.completed_tasks,
        summary.actions,
        summary.thoughts,
        activity::progress(logs, store.tasks().len()) * 100.0
    );
    for agent in activity::agent_activity(store.agents(), logs) {
        println!(
            "  {:<16} {:<8} events={} actions={} thoughts={}",
            agent.name,
            format!("{:?}", agent.status).to_lowercase(),
            agent.events,
            agent.actions,
            agent.thoughts
        );
    }
}
