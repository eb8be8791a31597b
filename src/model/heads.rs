//! Pooling of propagated embeddings into the two Q-value heads.

use candle_core::{DType, Tensor};

use crate::error::{QuadnetError, Result};
use crate::graph::{u32_tensor, EncodedBatch};
use crate::nn::QNetwork;

/// One `[k, 3]` tensor per sample, `k` = its number of short-term memories.
///
/// Each short-term edge is pooled as `[head, relation, tail]` embeddings, the
/// network runs once over the whole batch, and the rows are handed back to
/// their samples by exclusive prefix sums of the per-sample counts.
pub fn memory_management(
    network: &QNetwork,
    batch: &EncodedBatch,
    entities: &Tensor,
    relations: &Tensor,
) -> Result<Vec<Tensor>> {
    batch.check_short_memory_counts()?;
    let num_actions = network.num_actions();
    let device = entities.device();

    let q_values = if batch.short_memory_idx.is_empty() {
        None
    } else {
        let pick = |column: &[u32]| -> Vec<u32> {
            batch
                .short_memory_idx
                .iter()
                .map(|&edge| column[edge as usize])
                .collect()
        };
        let heads = u32_tensor(&pick(&batch.edge_src), device)?;
        let tails = u32_tensor(&pick(&batch.edge_dst), device)?;
        let types = u32_tensor(&pick(&batch.edge_types), device)?;

        let triples = Tensor::cat(
            &[
                &entities.index_select(&heads, 0)?,
                &relations.index_select(&types, 0)?,
                &entities.index_select(&tails, 0)?,
            ],
            1,
        )?;
        Some(network.forward(&triples)?)
    };

    batch
        .short_memory_segments()
        .into_iter()
        .map(|(start, count)| -> Result<Tensor> {
            match &q_values {
                Some(q) if count > 0 => Ok(q.narrow(0, start, count)?),
                _ => Ok(Tensor::zeros((0, num_actions), DType::F32, device)?),
            }
        })
        .collect()
}

/// One `[1, 5]` tensor per sample, read at the sample's agent node.
pub fn explore(network: &QNetwork, batch: &EncodedBatch, entities: &Tensor) -> Result<Vec<Tensor>> {
    let agents = batch
        .agent_entity_idx
        .iter()
        .enumerate()
        .map(|(sample, agent)| agent.ok_or(QuadnetError::MissingAgent { sample }))
        .collect::<Result<Vec<u32>>>()?;
    if agents.is_empty() {
        return Ok(Vec::new());
    }

    let nodes = entities.index_select(&u32_tensor(&agents, entities.device())?, 0)?;
    let q_values = network.forward(&nodes)?;

    (0..agents.len())
        .map(|i| -> Result<Tensor> { Ok(q_values.narrow(0, i, 1)?) })
        .collect()
}
