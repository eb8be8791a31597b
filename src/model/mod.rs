//! End-to-end model: batch encoding, message passing and Q-value heads.

pub mod heads;
mod network;

pub use network::GraphQNetwork;
