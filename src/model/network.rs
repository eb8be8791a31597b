//! Graph Q-network: embeddings, message passing and the two Q-value heads.

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use tracing::{debug, info};

use super::heads;
use crate::config::{ModelConfig, PolicyType};
use crate::error::Result;
use crate::graph::{EncodedBatch, Quadruple, Vocabulary};
use crate::nn::init::{entity_table, relation_table};
use crate::nn::{GraphTensors, MessagePassingStack, QNetwork};

/// Q-value estimator over batches of working-memory samples.
///
/// The vocabulary is fixed at construction; samples mentioning any other
/// entity or relation fail with an unknown-symbol error.
///
/// # Example
/// ```
/// use quadnet::{GraphQNetwork, ModelConfig, PolicyType, Quadruple, CURRENT_TIME};
///
/// let entities = ["agent", "room_000", "wall", "2"];
/// let relations = ["atlocation", "north", "current_time"];
/// let mut model = GraphQNetwork::new(entities, relations, ModelConfig::default()).unwrap();
/// model.eval();
///
/// let sample = vec![
///     Quadruple::new("agent", "atlocation", "room_000").with_qualifier(CURRENT_TIME, 2),
///     Quadruple::new("room_000", "north", "wall"),
/// ];
/// let q = model.forward(&[sample], PolicyType::Explore).unwrap();
/// assert_eq!(q[0].dims(), &[1, 5]);
/// ```
pub struct GraphQNetwork {
    vocab: Vocabulary,
    config: ModelConfig,
    device: Device,
    /// `[num_entities, dim]`
    entity_embeddings: Var,
    /// `[2 * num_relations, dim]`, forward block then inverse block
    relation_embeddings: Var,
    /// Layer and head parameters
    varmap: VarMap,
    stack: MessagePassingStack,
    mlp_mm: QNetwork,
    mlp_explore: QNetwork,
    training: bool,
}

impl GraphQNetwork {
    /// Build the model on the configured device. Starts in training mode.
    pub fn new<E, R>(entities: E, relations: R, config: ModelConfig) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        config.validate()?;
        let device = config.device.device()?;
        let vocab = Vocabulary::new(entities, relations)?;
        let dim = config.gcn_layer_params.embedding_dim;

        let entity_embeddings = entity_table(vocab.num_entities(), dim, &device)?;
        let relation_embeddings = relation_table(vocab.num_base_relations(), dim, &device)?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let stack = MessagePassingStack::new(
            &config.gcn_layer_params,
            config.dropout_between_gcn_layers,
            config.relu_between_gcn_layers,
            vb.pp("gcn"),
        )?;

        let mlp = &config.mlp_params;
        let mlp_mm = QNetwork::new(
            PolicyType::MemoryManagement.num_actions(),
            dim * 3,
            dim,
            mlp.num_hidden_layers,
            mlp.dueling_dqn,
            vb.pp("mlp_mm"),
        )?;
        let mlp_explore = QNetwork::new(
            PolicyType::Explore.num_actions(),
            dim,
            dim,
            mlp.num_hidden_layers,
            mlp.dueling_dqn,
            vb.pp("mlp_explore"),
        )?;

        info!(
            variant = %config.gcn_layer_params.variant,
            entities = vocab.num_entities(),
            relations = vocab.num_base_relations(),
            dim,
            layers = stack.num_layers(),
            device = %config.device,
            "built graph Q-network"
        );

        Ok(Self {
            vocab,
            config,
            device,
            entity_embeddings,
            relation_embeddings,
            varmap,
            stack,
            mlp_mm,
            mlp_explore,
            training: true,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Enable dropout.
    pub fn train(&mut self) {
        self.training = true;
    }

    /// Disable dropout; forward passes become deterministic.
    pub fn eval(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Entity table before message passing.
    pub fn entity_embeddings(&self) -> &Tensor {
        self.entity_embeddings.as_tensor()
    }

    /// Relation table before message passing.
    pub fn relation_embeddings(&self) -> &Tensor {
        self.relation_embeddings.as_tensor()
    }

    /// Every learnable parameter, for an external optimizer.
    pub fn trainable_vars(&self) -> Vec<Var> {
        let mut vars = vec![self.entity_embeddings.clone(), self.relation_embeddings.clone()];
        vars.extend(self.varmap.all_vars());
        vars
    }

    /// Encode a batch against this model's vocabulary.
    pub fn encode<S: AsRef<[Quadruple]>>(&self, samples: &[S]) -> Result<EncodedBatch> {
        EncodedBatch::encode(&self.vocab, samples)
    }

    /// Entity and relation embeddings after the message-passing stack.
    pub fn propagate(&self, batch: &EncodedBatch) -> Result<(Tensor, Tensor)> {
        let graph = GraphTensors::new(batch, self.vocab.num_entities(), &self.device)?;
        self.stack.forward(
            self.entity_embeddings.as_tensor(),
            self.relation_embeddings.as_tensor(),
            &graph,
            self.training,
        )
    }

    /// Q-values per sample, in sample order.
    ///
    /// `MemoryManagement` yields a `[k, 3]` tensor per sample (`k` short-term
    /// memories, possibly zero); `Explore` yields a `[1, 5]` tensor per sample.
    pub fn forward<S: AsRef<[Quadruple]>>(&self, samples: &[S], policy: PolicyType) -> Result<Vec<Tensor>> {
        let batch = self.encode(samples)?;
        let (entities, relations) = self.propagate(&batch)?;
        debug!(policy = %policy, samples = batch.num_samples(), "forward pass");

        match policy {
            PolicyType::MemoryManagement => heads::memory_management(&self.mlp_mm, &batch, &entities, &relations),
            PolicyType::Explore => heads::explore(&self.mlp_explore, &batch, &entities),
        }
    }
}

impl std::fmt::Debug for GraphQNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQNetwork")
            .field("variant", &self.config.gcn_layer_params.variant)
            .field("entities", &self.vocab.num_entities())
            .field("relations", &self.vocab.num_base_relations())
            .field("training", &self.training)
            .field("device", &self.device)
            .finish()
    }
}
