//! Qualifier-aware hyper-relational graph convolution (StarE style).
//!
//! Each edge's relation embedding is mixed with the sum of its qualifier
//! messages before composing with the source entity:
//!
//! - qualifier message: q = φ(e_qv, r_qr) · W_q, summed per edge
//! - edge relation:     r_e = α · r + (1 - α) · Σq
//! - edge message:      m = φ(e_src, r_e) · W_dir · norm
//!
//! where φ is complex rotation. Forward edges use W_in, inverse edges W_out,
//! and a learned loop relation with W_loop provides the self-connection.

use candle_core::{DType, Tensor};
use candle_nn::{Dropout, Init, VarBuilder};

use super::init::{rotate, xavier_normal};
use super::tensors::{BlockTensors, GraphTensors};
use crate::error::Result;

/// One StarE layer with square weights `[dim, dim]`.
#[derive(Debug, Clone)]
pub struct StarEConv {
    dim: usize,
    w_loop: Tensor,
    w_in: Tensor,
    w_out: Tensor,
    w_rel: Tensor,
    w_q: Tensor,
    loop_rel: Tensor,
    bias: Tensor,
    drop: Dropout,
    /// α: share of the edge relation against its qualifiers
    triple_qual_weight: f64,
}

impl StarEConv {
    pub fn new(dim: usize, gcn_drop: f64, triple_qual_weight: f64, vb: VarBuilder) -> Result<Self> {
        let weight = |name: &str| vb.get_with_hints((dim, dim), name, xavier_normal(dim, dim));
        Ok(Self {
            dim,
            w_loop: weight("w_loop")?,
            w_in: weight("w_in")?,
            w_out: weight("w_out")?,
            w_rel: weight("w_rel")?,
            w_q: weight("w_q")?,
            loop_rel: vb.get_with_hints((1, dim), "loop_rel", xavier_normal(1, dim))?,
            bias: vb.get_with_hints(dim, "bias", Init::Const(0.0))?,
            drop: Dropout::new(gcn_drop as f32),
            triple_qual_weight,
        })
    }

    /// Update entity `[N, dim]` and relation `[2R, dim]` embeddings.
    pub fn forward(
        &self,
        entities: &Tensor,
        relations: &Tensor,
        graph: &GraphTensors,
        train: bool,
    ) -> Result<(Tensor, Tensor)> {
        let in_res = self.propagate(entities, relations, &graph.forward, &self.w_in)?;
        let out_res = self.propagate(entities, relations, &graph.inverse, &self.w_out)?;
        let loop_res = rotate(entities, &self.loop_rel)?.matmul(&self.w_loop)?;

        let in_res = self.drop.forward(&in_res, train)?;
        let out_res = self.drop.forward(&out_res, train)?;

        let out = ((in_res + out_res)? + loop_res)?
            .affine(1.0 / 3.0, 0.0)?
            .broadcast_add(&self.bias)?;
        let relations = relations.matmul(&self.w_rel)?;

        Ok((out, relations))
    }

    /// Relation embedding per edge, mixed with the edge's qualifiers.
    fn edge_relations(&self, entities: &Tensor, relations: &Tensor, block: &BlockTensors) -> Result<Tensor> {
        let edge_rel = relations.index_select(&block.types, 0)?;
        let Some(quals) = &block.quals else {
            return Ok((edge_rel * self.triple_qual_weight)?);
        };

        let q_ent = entities.index_select(&quals.entity, 0)?;
        let q_rel = relations.index_select(&quals.relation, 0)?;
        let q_msg = rotate(&q_ent, &q_rel)?.matmul(&self.w_q)?;
        let q_sum = Tensor::zeros((block.num_edges, self.dim), q_msg.dtype(), q_msg.device())?
            .index_add(&quals.edge, &q_msg, 0)?;

        let mixed = ((edge_rel * self.triple_qual_weight)? + (q_sum * (1.0 - self.triple_qual_weight))?)?;
        Ok(mixed)
    }

    fn propagate(
        &self,
        entities: &Tensor,
        relations: &Tensor,
        block: &BlockTensors,
        weight: &Tensor,
    ) -> Result<Tensor> {
        let num_nodes = entities.dim(0)?;
        let agg = Tensor::zeros((num_nodes, self.dim), DType::F32, entities.device())?;
        if block.num_edges == 0 {
            return Ok(agg);
        }

        let edge_rel = self.edge_relations(entities, relations, block)?;
        let src = entities.index_select(&block.src, 0)?;
        let messages = rotate(&src, &edge_rel)?
            .matmul(weight)?
            .broadcast_mul(&block.norm)?;

        Ok(agg.index_add(&block.dst, &messages, 0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use candle_nn::VarMap;

    use crate::graph::{EncodedBatch, Quadruple, Vocabulary, CURRENT_TIME, STRENGTH};
    use crate::nn::init::{entity_table, relation_table};

    fn vocab() -> Vocabulary {
        Vocabulary::new(
            ["agent", "room_000", "wall", "1", "2", "3"],
            ["atlocation", "north", "current_time", "strength"],
        )
        .unwrap()
    }

    fn layer(varmap: &VarMap, alpha: f64) -> StarEConv {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
        StarEConv::new(8, 0.0, alpha, vb.pp("stare")).unwrap()
    }

    fn run(
        layer: &StarEConv,
        vocab: &Vocabulary,
        sample: Vec<Quadruple>,
        ent: &Tensor,
        rel: &Tensor,
    ) -> (Tensor, Tensor) {
        let batch = EncodedBatch::encode(vocab, &[sample]).unwrap();
        let graph = GraphTensors::new(&batch, vocab.num_entities(), &Device::Cpu).unwrap();
        layer.forward(ent, rel, &graph, false).unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let device = Device::Cpu;
        let vocab = vocab();
        let varmap = VarMap::new();
        let layer = layer(&varmap, 0.8);
        let ent = entity_table(vocab.num_entities(), 8, &device).unwrap();
        let rel = relation_table(vocab.num_base_relations(), 8, &device).unwrap();

        let sample = vec![
            Quadruple::new("agent", "atlocation", "room_000").with_qualifier(CURRENT_TIME, 2),
            Quadruple::new("room_000", "north", "wall").with_qualifier(STRENGTH, 1.2),
        ];
        let (e, r) = run(&layer, &vocab, sample, ent.as_tensor(), rel.as_tensor());

        assert_eq!(e.dims(), &[6, 8]);
        assert_eq!(r.dims(), &[8, 8]);
    }

    #[test]
    fn test_qualifier_values_change_messages() {
        let device = Device::Cpu;
        let vocab = vocab();
        let varmap = VarMap::new();
        let layer = layer(&varmap, 0.5);
        let ent = entity_table(vocab.num_entities(), 8, &device).unwrap();
        let rel = relation_table(vocab.num_base_relations(), 8, &device).unwrap();

        let with = |strength: f64| {
            vec![Quadruple::new("agent", "atlocation", "room_000").with_qualifier(STRENGTH, strength)]
        };
        let (a, _) = run(&layer, &vocab, with(1.0), ent.as_tensor(), rel.as_tensor());
        let (b, _) = run(&layer, &vocab, with(3.0), ent.as_tensor(), rel.as_tensor());

        // room_000 receives the forward message, agent the inverse one
        let diff: f32 = (a - b).unwrap().abs().unwrap().sum_all().unwrap().to_scalar().unwrap();
        assert!(diff > 0.0);
    }

    #[test]
    fn test_isolated_nodes_only_see_self_loop() {
        let device = Device::Cpu;
        let vocab = vocab();
        let varmap = VarMap::new();
        let layer = layer(&varmap, 0.8);
        let ent = entity_table(vocab.num_entities(), 8, &device).unwrap();
        let rel = relation_table(vocab.num_base_relations(), 8, &device).unwrap();

        let sample = vec![Quadruple::new("agent", "atlocation", "room_000")];
        let (e, _) = run(&layer, &vocab, sample, ent.as_tensor(), rel.as_tensor());

        // wall (id 2) has no edges: out = loop / 3 + bias(0)
        let wall = ent.as_tensor().narrow(0, 2, 1).unwrap();
        let expected = (rotate(&wall, &layer.loop_rel).unwrap().matmul(&layer.w_loop).unwrap() / 3.0).unwrap();
        let got = e.narrow(0, 2, 1).unwrap();
        let diff: f32 = (got - expected).unwrap().abs().unwrap().max_all().unwrap().to_scalar().unwrap();
        assert!(diff < 1e-5);
    }

    #[test]
    fn test_empty_graph() {
        let device = Device::Cpu;
        let vocab = vocab();
        let varmap = VarMap::new();
        let layer = layer(&varmap, 0.8);
        let ent = entity_table(vocab.num_entities(), 8, &device).unwrap();
        let rel = relation_table(vocab.num_base_relations(), 8, &device).unwrap();

        let (e, _) = run(&layer, &vocab, vec![], ent.as_tensor(), rel.as_tensor());
        assert_eq!(e.dims(), &[6, 8]);
    }
}
