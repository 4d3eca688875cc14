//! Implementations of the ten command-surface verbs.
//!
//! Every command loads (or builds) a [`Session`], does its work, and
//! saves the session back before returning, against a local file instead
//! of a live database connection (see `session.rs`).

use std::path::Path;

use chrono::Utc;
use kiln_engine::generation::Evaluator;
use kiln_engine::population::AgentRecord;
use kiln_engine::SimulationConfig;
use kiln_graph::invariants::{check_activation_bounds, check_anchor_reachability, check_anchor_set_shape, check_no_anchor_cross_talk};
use kiln_graph::TopologyOverlay;
use kiln_types::{Agent, AgentId, AgentStatus, Archetype, Lesson, LessonId, LessonKind, NodeId, VirtueId};
use rand::Rng;

use crate::cli::CliArchetype;
use crate::error::CliError;
use crate::parse;
use crate::seed;
use crate::session::Session;
use crate::store_sync::{self, Store};

/// `init`: build a fresh session from a seed document (or the built-in
/// default set) and persist it.
///
/// # Errors
///
/// Returns [`CliError::User`] if a session already exists and `force` is
/// not set, or any error `Session::fresh`/`Session::save` raises.
pub async fn init(session_path: &Path, seed_path: Option<&Path>, force: bool, config: SimulationConfig, store_url: Option<&str>) -> Result<(), CliError> {
    if session_path.exists() && !force {
        return Err(CliError::User(format!("session {} already exists; pass --force to re-initialize", session_path.display())));
    }
    let virtues = match seed_path {
        Some(path) => seed::load(path)?,
        None => seed::default_virtues(),
    };
    let session = Session::fresh(virtues, config)?;
    session.save(session_path)?;

    let store = Store::connect(store_url).await?;
    store_sync::ensure_indexes(&store).await?;
    for anchor in session.engine.substrate.anchors() {
        store_sync::write_anchor(&store, anchor).await?;
    }

    let counts = session.counts();
    println!("initialized session at {}: {} anchors", session_path.display(), counts.anchors);
    Ok(())
}

/// `reset`: wipe the session file entirely.
///
/// # Errors
///
/// Returns [`CliError::User`] if `confirm` was not passed.
pub fn reset(session_path: &Path, confirm: bool) -> Result<(), CliError> {
    if !confirm {
        return Err(CliError::User("reset refused: pass --confirm to wipe all session state".to_owned()));
    }
    if session_path.exists() {
        std::fs::remove_file(session_path)?;
    }
    println!("session reset");
    Ok(())
}

/// `status`: print anchor/concept/agent/warning counts.
///
/// # Errors
///
/// Returns [`CliError::User`] if no session exists yet.
pub fn status(session_path: &Path, config: SimulationConfig) -> Result<(), CliError> {
    let session = require_session(session_path, config)?;
    let counts = session.counts();
    println!(
        "anchors={} concepts={} agents={} active_warnings={}",
        counts.anchors, counts.concepts, counts.agents, counts.active_warnings
    );
    Ok(())
}

/// `health`: check invariants I1–I6 -- I1 and I5 against the shared
/// substrate, I2, I3, and I4 per agent overlay, and I6 against the
/// Mercy Machine's warning ladder.
///
/// # Errors
///
/// Returns [`CliError::InvariantFailed`] (exit code 2) if any violation is
/// found.
pub fn health(session_path: &Path, config: SimulationConfig) -> Result<(), CliError> {
    let session = require_session(session_path, config)?;
    let mut violations = Vec::new();

    if let Err(err) = check_anchor_set_shape(&session.engine.substrate) {
        violations.push(format!("anchor set shape: {err}"));
    }
    if let Err(err) = check_activation_bounds(&session.engine.substrate) {
        violations.push(format!("activation bounds: {err}"));
    }
    for record in session.population.records.values() {
        if let Err(err) = check_no_anchor_cross_talk(&record.overlay) {
            violations.push(format!("agent {}: {err}", record.agent.id));
        }
        if let Err(err) = record.overlay.check_weight_bounds() {
            violations.push(format!("agent {}: {err}", record.agent.id));
        }
        if let Err(err) = check_anchor_reachability(&session.engine.substrate, &record.overlay) {
            violations.push(format!("agent {}: {err}", record.agent.id));
        }
    }
    if let Err(err) = kiln_mercy::check_warning_cap(&session.engine.mercy) {
        violations.push(format!("warning cap: {err}"));
    }

    if violations.is_empty() {
        println!("health: ok ({} agents checked)", session.population.len());
        Ok(())
    } else {
        for violation in &violations {
            tracing::warn!(%violation, "invariant violation");
        }
        Err(CliError::InvariantFailed(violations.join("; ")))
    }
}

/// Number of starter concepts seeded into a freshly spawned agent's
/// overlay.
const STARTER_CONCEPT_COUNT: usize = 4;

/// Whimsical starter-concept names, picked without replacement.
const STARTER_CONCEPT_NAMES: &[&str] = &[
    "kindling", "tinder", "coal", "ash", "spark", "soot", "char", "flint", "smoke", "cinder",
];

/// `spawn`: create a new agent with a freshly seeded starter topology.
///
/// # Errors
///
/// Returns [`CliError::User`] if no session exists yet, or propagates any
/// error raised while seeding the starter overlay.
pub async fn spawn(session_path: &Path, archetype: Option<CliArchetype>, parent_id: Option<&str>, binding: Option<&str>, config: SimulationConfig, store_url: Option<&str>) -> Result<(), CliError> {
    let mut session = require_session(session_path, config)?;
    let parent_ids = parent_id.map(|raw| parse::agent_id(raw)).transpose()?.into_iter().collect();

    let agent = Agent {
        id: AgentId::new(),
        archetype: archetype.map_or(Archetype::Untyped, Archetype::from),
        generation: session.population.generation,
        parent_ids,
        binding: binding.map(str::to_owned),
        status: AgentStatus::Evolving,
    };

    let mut rng = rand::rng();
    let mut overlay = TopologyOverlay::new();
    let anchor_ids: Vec<VirtueId> = session.engine.substrate.anchors().map(|anchor| anchor.id).collect();
    for name in STARTER_CONCEPT_NAMES.iter().take(STARTER_CONCEPT_COUNT) {
        let concept_id = session.engine.substrate.create_concept(*name, 0.1);
        let concept_node = NodeId::Concept(concept_id);
        let anchor_count = anchor_ids.len();
        if anchor_count == 0 {
            continue;
        }
        let chosen = rng.random_range(0..anchor_count);
        if let Some(anchor_id) = anchor_ids.get(chosen).copied() {
            let weight = rng.random_range(0.2..0.6);
            overlay.upsert_edge(concept_node, NodeId::Anchor(anchor_id), weight)?;
        }
    }

    let agent_id = agent.id;
    session.population.insert(AgentRecord::new(agent.clone(), overlay));
    session.save(session_path)?;

    let store = Store::connect(store_url).await?;
    store_sync::write_agent(&store, &agent).await?;
    for concept in session.engine.substrate.concepts() {
        store_sync::write_concept(&store, concept).await?;
    }
    if let Some(record) = session.population.records.get(&agent_id) {
        for (src, tgt, edge) in record.overlay.iter_edges(|_, _, _| true) {
            store_sync::write_edge(&store, src, tgt, &agent_id.to_string(), edge).await?;
        }
    }

    println!("{agent_id}");
    Ok(())
}

/// `test`: run a coherence evaluation for an existing agent.
///
/// # Errors
///
/// Returns [`CliError::UnknownAgent`] if `agent_id` is not in the session,
/// or propagates any error the evaluator raises.
pub fn test(session_path: &Path, agent_id: &str, n_stimuli: Option<u32>, config: SimulationConfig) -> Result<(), CliError> {
    let mut session = require_session(session_path, config)?;
    let agent_id = parse::agent_id(agent_id)?;

    let mut coherence_config = session.engine.config.coherence.clone();
    if let Some(n) = n_stimuli {
        coherence_config.n_stimuli = n;
    }

    let record = session.population.records.get(&agent_id).ok_or(CliError::UnknownAgent(agent_id))?;
    let previous = record.last_report.clone();
    let report = kiln_coherence::evaluate(
        &session.engine.substrate,
        &record.overlay,
        &session.engine.registry,
        &session.engine.config.dynamics,
        &coherence_config,
        &record.agent,
        previous.as_ref(),
    )?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(record) = session.population.records.get_mut(&agent_id) {
        record.last_report = Some(report);
    }
    session.save(session_path)?;
    Ok(())
}

/// `spread`: run one trajectory for inspection, with no overlay mutation.
///
/// # Errors
///
/// Returns [`CliError::UnknownAgent`] if `agent_id` is not in the session,
/// or propagates any error the activation engine raises.
pub fn spread(session_path: &Path, node_id: &str, agent_id: &str, config: SimulationConfig) -> Result<(), CliError> {
    let session = require_session(session_path, config)?;
    let agent_id = parse::agent_id(agent_id)?;
    let stimulus = parse::node_id(node_id)?;

    let record = session.population.records.get(&agent_id).ok_or(CliError::UnknownAgent(agent_id))?;
    let outcome = kiln_dynamics::run_trajectory(
        &session.engine.substrate,
        &record.overlay,
        &session.engine.registry,
        &session.engine.config.dynamics,
        agent_id,
        record.agent.archetype,
        record.agent.generation,
        stimulus,
    )?;

    println!("{}", serde_json::to_string_pretty(&outcome.trajectory)?);
    Ok(())
}

/// `kiln`: run the evolutionary loop to completion, printing each
/// generation's report.
///
/// # Errors
///
/// Returns [`CliError::User`] if no session exists yet, or propagates any
/// error the Kiln loop raises.
pub async fn kiln(session_path: &Path, config: SimulationConfig, store_url: Option<&str>) -> Result<(), CliError> {
    let mut session = require_session(session_path, config)?;
    let mut rng = rand::rng();
    let now = Utc::now();

    let reports = session.engine.run(&mut session.population, Evaluator::Sequential, now, &mut rng)?;
    for report in &reports {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    session.save(session_path)?;

    let store = Store::connect(store_url).await?;
    for record in session.population.records.values() {
        store_sync::write_agent(&store, &record.agent).await?;
        for (src, tgt, edge) in record.overlay.iter_edges(|_, _, _| true) {
            store_sync::write_edge(&store, src, tgt, &record.agent.id.to_string(), edge).await?;
        }
    }
    Ok(())
}

/// `dissolve`: force an agent's dissolution, salvaging a lesson.
///
/// Bypasses [`kiln_mercy::classify`] entirely: that function judges an
/// in-loop action automatically, whereas this is an operator's direct
/// override, so it goes straight to the Mercy Machine's terminal state
/// the same way the generation loop's own forced-dissolution path does.
///
/// # Errors
///
/// Returns [`CliError::UnknownAgent`] if `agent_id` is not in the session.
pub fn dissolve(session_path: &Path, agent_id: &str, reason: &str, config: SimulationConfig) -> Result<(), CliError> {
    let mut session = require_session(session_path, config)?;
    let agent_id = parse::agent_id(agent_id)?;

    if !session.population.records.contains_key(&agent_id) {
        return Err(CliError::UnknownAgent(agent_id));
    }

    session.engine.mercy.dissolve(agent_id);
    session.engine.mercy.forget(agent_id);
    session.population.records.remove(&agent_id);

    session.engine.knowledge.record_lesson(Lesson {
        id: LessonId::new(),
        kind: LessonKind::Failure,
        source_agent_id: agent_id,
        virtue_id: None,
        description: reason.to_owned(),
        created_at: Utc::now(),
        access_count: 0,
    });

    session.save(session_path)?;
    println!("dissolved {agent_id}");
    Ok(())
}

/// `warnings`: list an agent's active warnings.
///
/// # Errors
///
/// Returns [`CliError::User`] if no session exists yet.
pub fn warnings(session_path: &Path, agent_id: &str, config: SimulationConfig) -> Result<(), CliError> {
    let session = require_session(session_path, config)?;
    let agent_id = parse::agent_id(agent_id)?;

    let active = session.engine.mercy.record(agent_id).map(kiln_mercy::MercyRecord::active_warnings).unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(active)?);
    Ok(())
}

/// Load a session, erroring if none exists yet.
fn require_session(session_path: &Path, config: SimulationConfig) -> Result<Session, CliError> {
    Session::load(session_path, config)?.ok_or_else(|| CliError::User(format!("no session at {}; run `init` first", session_path.display())))
}
