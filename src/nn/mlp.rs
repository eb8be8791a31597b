//! Feed-forward Q-value network with an optional dueling decomposition.

use candle_core::{Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};

use crate::error::Result;

/// Linear layers with ReLU between them.
#[derive(Debug, Clone)]
struct Stream {
    layers: Vec<Linear>,
}

impl Stream {
    /// `in -> hidden (-> hidden)* -> out`, or a single `in -> out` with no hidden layers.
    fn new(input: usize, hidden: usize, output: usize, num_hidden_layers: usize, vb: VarBuilder) -> Result<Self> {
        let mut layers = Vec::with_capacity(num_hidden_layers + 1);
        let mut width = input;
        for i in 0..num_hidden_layers {
            layers.push(candle_nn::linear(width, hidden, vb.pp(i))?);
            width = hidden;
        }
        layers.push(candle_nn::linear(width, output, vb.pp(num_hidden_layers))?);
        Ok(Self { layers })
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let last = self.layers.len() - 1;
        let mut h = x.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h)?;
            if i < last {
                h = h.relu()?;
            }
        }
        Ok(h)
    }
}

/// Maps `[n, input]` features to `[n, num_actions]` action values.
#[derive(Debug, Clone)]
pub struct QNetwork {
    advantage: Stream,
    value: Option<Stream>,
    num_actions: usize,
}

impl QNetwork {
    pub fn new(
        num_actions: usize,
        input_size: usize,
        hidden_size: usize,
        num_hidden_layers: usize,
        dueling: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let advantage = Stream::new(input_size, hidden_size, num_actions, num_hidden_layers, vb.pp("advantage"))?;
        let value = if dueling {
            Some(Stream::new(input_size, hidden_size, 1, num_hidden_layers, vb.pp("value"))?)
        } else {
            None
        };
        Ok(Self {
            advantage,
            value,
            num_actions,
        })
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub fn is_dueling(&self) -> bool {
        self.value.is_some()
    }

    /// Q = A, or Q = V + A - mean(A) when dueling.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let advantage = self.advantage.forward(x)?;
        let Some(value_stream) = &self.value else {
            return Ok(advantage);
        };
        let value = value_stream.forward(x)?;
        let centered = advantage.broadcast_sub(&advantage.mean_keepdim(D::Minus1)?)?;
        Ok(centered.broadcast_add(&value)?)
    }
}
