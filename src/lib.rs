//! quadnet: hyper-relational graph Q-networks over quadruple working memory
//!
//! An agent's working memory is a list of quadruples
//! `(head, relation, tail, qualifiers)`. A batch of such lists is merged into
//! one graph with inverse edges and reified qualifiers, a stack of
//! StarE-style layers updates entity and relation embeddings, and two
//! feed-forward heads turn the result into action values:
//!
//! - memory management: one 3-way vector (episodic, semantic, forget) per
//!   short-term memory, i.e. per quadruple carrying `current_time`
//! - explore: one 5-way vector (north, east, south, west, stay) per sample,
//!   read at the `agent` node
//!
//! The model only computes Q-values. Training loops, replay buffers and the
//! environment live with the caller, who can reach every parameter through
//! [`GraphQNetwork::trainable_vars`].

pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod nn;
pub mod policy;

pub use config::{ComputeTarget, GcnLayerParams, LayerVariant, MlpParams, ModelConfig, PolicyType};
pub use error::{QuadnetError, Result};
pub use graph::{EncodedBatch, QualifierValue, Quadruple, Vocabulary, AGENT, CURRENT_TIME, STRENGTH, TIMESTAMP};
pub use model::GraphQNetwork;
pub use policy::{greedy, Action, AnswerPolicy, ExploreAction, ExplorePolicy, MemoryAction, Question};
