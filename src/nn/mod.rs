//! Neural building blocks: embedding initialisation, graph layers and Q-value networks.

pub mod init;
mod gcn;
mod mlp;
mod stack;
mod stare;
mod tensors;

pub use gcn::GcnConv;
pub use mlp::QNetwork;
pub use stack::{ConvLayer, MessagePassingStack};
pub use stare::StarEConv;
pub use tensors::{BlockTensors, GraphTensors, QualifierTensors};
