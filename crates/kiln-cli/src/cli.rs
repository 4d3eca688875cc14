//! The `clap`-derived command surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kiln_types::Archetype;

/// Soul Kiln: an experimental alignment-dynamics engine.
#[derive(Debug, Parser)]
#[command(name = "kiln", about, version)]
pub struct Cli {
    /// Path to the configuration YAML document. Falls back to every
    /// field's published default when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the local session snapshot file that bridges state across
    /// separate invocations of this binary.
    #[arg(long, global = true, default_value = "soul-kiln-session.json")]
    pub session: PathBuf,

    /// Connection string for the persistence adapter, e.g.
    /// `falkordb://127.0.0.1:6379/soul-kiln`. When omitted, durable writes
    /// go to an in-memory `NullStore` and are lost at process exit.
    #[arg(long, global = true)]
    pub store_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// The ten command-surface verbs.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize the substrate and virtue registry from a seed document.
    Init {
        /// Path to the 19-virtue seed YAML document. Falls back to the
        /// built-in default set when omitted.
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Re-initialize even if a session already exists.
        #[arg(long)]
        force: bool,
    },

    /// Wipe all mutable state, keeping nothing.
    Reset {
        /// Required acknowledgement; refused without it.
        #[arg(long)]
        confirm: bool,
    },

    /// Report counts of anchors, concepts, agents, and warnings.
    Status,

    /// Run invariant checks I1-I6 over the current session.
    Health,

    /// Create a new agent with a freshly seeded starter topology.
    Spawn {
        /// Initial archetype hint; defaults to `Untyped`.
        #[arg(long, value_enum)]
        archetype: Option<CliArchetype>,
        /// Id of the agent to record as this agent's sole parent, if any.
        #[arg(long)]
        parent_id: Option<String>,
        /// An external identity this agent is bound to.
        #[arg(long)]
        binding: Option<String>,
    },

    /// Run a coherence evaluation (C4) for an existing agent.
    Test {
        /// The agent to evaluate.
        agent_id: String,
        /// Override the configured stimulus sample size for this run.
        #[arg(long)]
        n_stimuli: Option<u32>,
    },

    /// Run a single trajectory for inspection.
    Spread {
        /// The stimulus node: `V01`..`V19` for an anchor, or a concept's
        /// UUID.
        node_id: String,
        /// The agent whose overlay to spread over.
        #[arg(long)]
        agent_id: String,
    },

    /// Run the Kiln evolutionary loop to completion.
    Kiln,

    /// Force the dissolution of an agent, salvaging a lesson from it.
    Dissolve {
        /// The agent to dissolve.
        agent_id: String,
        /// Why this agent is being dissolved.
        reason: String,
    },

    /// List an agent's active warnings.
    Warnings {
        /// The agent to inspect.
        agent_id: String,
    },
}

/// `clap::ValueEnum` mirror of [`kiln_types::Archetype`] (the domain type
/// has no `ValueEnum` derive, since `kiln-types` carries no CLI
/// dependency).
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliArchetype {
    /// See [`Archetype::Guardian`].
    Guardian,
    /// See [`Archetype::Seeker`].
    Seeker,
    /// See [`Archetype::Servant`].
    Servant,
    /// See [`Archetype::Contemplative`].
    Contemplative,
    /// See [`Archetype::Untyped`].
    Untyped,
}

impl From<CliArchetype> for Archetype {
    fn from(value: CliArchetype) -> Self {
        match value {
            CliArchetype::Guardian => Self::Guardian,
            CliArchetype::Seeker => Self::Seeker,
            CliArchetype::Servant => Self::Servant,
            CliArchetype::Contemplative => Self::Contemplative,
            CliArchetype::Untyped => Self::Untyped,
        }
    }
}
