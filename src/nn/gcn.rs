//! Plain graph convolution: connectivity only, no self-loops, no normalisation.

use candle_core::Tensor;
use candle_nn::{Init, VarBuilder};

use super::init::xavier_normal;
use super::tensors::GraphTensors;
use crate::error::Result;

/// `out[v] = Σ_{(u, v)} x[u] · W + b` over the forward and inverse edges.
#[derive(Debug, Clone)]
pub struct GcnConv {
    weight: Tensor,
    bias: Tensor,
}

impl GcnConv {
    pub fn new(dim: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            weight: vb.get_with_hints((dim, dim), "weight", xavier_normal(dim, dim))?,
            bias: vb.get_with_hints(dim, "bias", Init::Const(0.0))?,
        })
    }

    /// Update entity embeddings `[N, dim]`; relations and qualifiers are not read.
    pub fn forward(&self, entities: &Tensor, graph: &GraphTensors) -> Result<Tensor> {
        let projected = entities.matmul(&self.weight)?;
        let mut agg = projected.zeros_like()?;
        for block in graph.blocks() {
            if block.num_edges == 0 {
                continue;
            }
            let messages = projected.index_select(&block.src, 0)?;
            agg = agg.index_add(&block.dst, &messages, 0)?;
        }
        Ok(agg.broadcast_add(&self.bias)?)
    }
}
