//! Stack of graph-convolution layers with optional dropout and ReLU between them.

use candle_core::Tensor;
use candle_nn::{Dropout, VarBuilder};

use super::gcn::GcnConv;
use super::stare::StarEConv;
use super::tensors::GraphTensors;
use crate::config::{GcnLayerParams, LayerVariant};
use crate::error::Result;

/// A layer of either variant, chosen once at construction.
#[derive(Debug, Clone)]
pub enum ConvLayer {
    StarE(StarEConv),
    Vanilla(GcnConv),
}

impl ConvLayer {
    fn forward(
        &self,
        entities: &Tensor,
        relations: &Tensor,
        graph: &GraphTensors,
        train: bool,
    ) -> Result<(Tensor, Tensor)> {
        match self {
            ConvLayer::StarE(layer) => layer.forward(entities, relations, graph, train),
            ConvLayer::Vanilla(layer) => Ok((layer.forward(entities, graph)?, relations.clone())),
        }
    }
}

/// Message-passing stack.
#[derive(Debug, Clone)]
pub struct MessagePassingStack {
    layers: Vec<ConvLayer>,
    dropout: Option<Dropout>,
    relu: bool,
}

impl MessagePassingStack {
    pub fn new(params: &GcnLayerParams, dropout_between: bool, relu_between: bool, vb: VarBuilder) -> Result<Self> {
        let dim = params.embedding_dim;
        let layers = (0..params.num_layers)
            .map(|i| -> Result<ConvLayer> {
                let vb = vb.pp(i);
                Ok(match params.variant {
                    LayerVariant::StarE => {
                        ConvLayer::StarE(StarEConv::new(dim, params.gcn_drop, params.triple_qual_weight, vb)?)
                    }
                    LayerVariant::Vanilla => ConvLayer::Vanilla(GcnConv::new(dim, vb)?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            layers,
            dropout: dropout_between.then(|| Dropout::new(params.gcn_drop as f32)),
            relu: relu_between,
        })
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Run every layer; dropout and ReLU touch entity embeddings only.
    pub fn forward(
        &self,
        entities: &Tensor,
        relations: &Tensor,
        graph: &GraphTensors,
        train: bool,
    ) -> Result<(Tensor, Tensor)> {
        let mut entities = entities.clone();
        let mut relations = relations.clone();
        for layer in &self.layers {
            (entities, relations) = layer.forward(&entities, &relations, graph, train)?;
            if let Some(dropout) = &self.dropout {
                entities = dropout.forward(&entities, train)?;
            }
            if self.relu {
                entities = entities.relu()?;
            }
        }
        Ok((entities, relations))
    }
}
