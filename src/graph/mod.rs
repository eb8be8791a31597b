//! Hyper-relational graph construction from working-memory quadruples.
//!
//! A batch of samples (each a list of quadruples) is encoded into one global
//! edge list with forward and inverse edges, qualifier triples attached to
//! edge positions, and per-sample bookkeeping for the Q-value heads.

mod batch;
mod quadruple;
mod sample;
mod vocab;

pub use batch::{EdgeBlock, EncodedBatch};
pub(crate) use batch::u32_tensor;
pub use quadruple::{QualifierValue, Qualifiers, Quadruple, AGENT, CURRENT_TIME, STRENGTH, TIMESTAMP};
pub use sample::{encode_sample, QualifierTriple, SampleEncoding};
pub use vocab::{Vocabulary, INVERSE_SUFFIX};
