//! Model configuration.
//!
//! Loaded from JSON; every field has a default so partial documents work:
//!
//! ```json
//! {
//!   "gcn_layer_params": {"type": "stare", "embedding_dim": 8, "num_layers": 2,
//!                        "gcn_drop": 0.1, "triple_qual_weight": 0.8},
//!   "relu_between_gcn_layers": true,
//!   "dropout_between_gcn_layers": true,
//!   "mlp_params": {"num_hidden_layers": 2, "dueling_dqn": true},
//!   "device": "cpu"
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use candle_core::Device;
use serde::{Deserialize, Serialize};

use crate::error::{QuadnetError, Result};

/// Graph-convolution layer variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LayerVariant {
    /// Qualifier-aware hyper-relational layer
    StarE,
    /// Plain graph convolution over connectivity only
    Vanilla,
}

impl FromStr for LayerVariant {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stare" => Ok(LayerVariant::StarE),
            "vanilla" => Ok(LayerVariant::Vanilla),
            other => Err(QuadnetError::InvalidConfig(format!("{} is not a valid GNN type", other))),
        }
    }
}

impl TryFrom<String> for LayerVariant {
    type Error = QuadnetError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LayerVariant> for String {
    fn from(v: LayerVariant) -> Self {
        v.to_string()
    }
}

impl fmt::Display for LayerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerVariant::StarE => write!(f, "stare"),
            LayerVariant::Vanilla => write!(f, "vanilla"),
        }
    }
}

/// Which Q-value head a forward pass evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyType {
    /// One 3-way vector per short-term memory
    MemoryManagement,
    /// One 5-way vector per sample, read at the agent node
    Explore,
}

impl PolicyType {
    /// Size of the action set of this head.
    pub fn num_actions(&self) -> usize {
        match self {
            PolicyType::MemoryManagement => 3,
            PolicyType::Explore => 5,
        }
    }
}

impl FromStr for PolicyType {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mm" => Ok(PolicyType::MemoryManagement),
            "explore" => Ok(PolicyType::Explore),
            other => Err(QuadnetError::InvalidConfig(format!("{} is not a valid policy type", other))),
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyType::MemoryManagement => write!(f, "mm"),
            PolicyType::Explore => write!(f, "explore"),
        }
    }
}

/// Processor the model lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComputeTarget {
    #[default]
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl ComputeTarget {
    /// Open the candle device. Backends not compiled in report a tensor error.
    pub fn device(&self) -> Result<Device> {
        let device = match self {
            ComputeTarget::Cpu => Device::Cpu,
            ComputeTarget::Cuda(ordinal) => Device::new_cuda(*ordinal)?,
            ComputeTarget::Metal(ordinal) => Device::new_metal(*ordinal)?,
        };
        Ok(device)
    }
}

impl FromStr for ComputeTarget {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, ordinal) = match lower.split_once(':') {
            Some((name, ordinal)) => {
                let ordinal = ordinal
                    .parse::<usize>()
                    .map_err(|_| QuadnetError::InvalidConfig(format!("invalid device ordinal in {}", s)))?;
                (name, ordinal)
            }
            None => (lower.as_str(), 0),
        };
        match name {
            "cpu" => Ok(ComputeTarget::Cpu),
            "cuda" => Ok(ComputeTarget::Cuda(ordinal)),
            "metal" | "mps" => Ok(ComputeTarget::Metal(ordinal)),
            _ => Err(QuadnetError::InvalidConfig(format!("unknown device {}", s))),
        }
    }
}

impl TryFrom<String> for ComputeTarget {
    type Error = QuadnetError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ComputeTarget> for String {
    fn from(t: ComputeTarget) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ComputeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeTarget::Cpu => write!(f, "cpu"),
            ComputeTarget::Cuda(n) => write!(f, "cuda:{}", n),
            ComputeTarget::Metal(n) => write!(f, "metal:{}", n),
        }
    }
}

/// Graph layer stack parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcnLayerParams {
    #[serde(rename = "type")]
    pub variant: LayerVariant,
    /// Width of entity and relation embeddings (must be even)
    pub embedding_dim: usize,
    pub num_layers: usize,
    /// Dropout rate inside and between layers
    pub gcn_drop: f64,
    /// Weight of the edge relation against its aggregated qualifiers (StarE only)
    pub triple_qual_weight: f64,
}

impl Default for GcnLayerParams {
    fn default() -> Self {
        Self {
            variant: LayerVariant::StarE,
            embedding_dim: 8,
            num_layers: 2,
            gcn_drop: 0.1,
            triple_qual_weight: 0.8,
        }
    }
}

/// Q-value head parameters, shared by both heads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpParams {
    pub num_hidden_layers: usize,
    pub dueling_dqn: bool,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            num_hidden_layers: 2,
            dueling_dqn: true,
        }
    }
}

/// Full model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub gcn_layer_params: GcnLayerParams,
    pub relu_between_gcn_layers: bool,
    pub dropout_between_gcn_layers: bool,
    pub mlp_params: MlpParams,
    pub device: ComputeTarget,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gcn_layer_params: GcnLayerParams::default(),
            relu_between_gcn_layers: true,
            dropout_between_gcn_layers: true,
            mlp_params: MlpParams::default(),
            device: ComputeTarget::Cpu,
        }
    }
}

impl ModelConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        check_named_options(&value)?;
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the model cannot be built with.
    pub fn validate(&self) -> Result<()> {
        let gcn = &self.gcn_layer_params;
        if gcn.embedding_dim == 0 || gcn.embedding_dim % 2 != 0 {
            return Err(QuadnetError::InvalidConfig(format!(
                "embedding_dim must be a positive even number, got {}",
                gcn.embedding_dim
            )));
        }
        if !(0.0..1.0).contains(&gcn.gcn_drop) {
            return Err(QuadnetError::InvalidConfig(format!(
                "gcn_drop must be in [0, 1), got {}",
                gcn.gcn_drop
            )));
        }
        if !(0.0..=1.0).contains(&gcn.triple_qual_weight) {
            return Err(QuadnetError::InvalidConfig(format!(
                "triple_qual_weight must be in [0, 1], got {}",
                gcn.triple_qual_weight
            )));
        }
        Ok(())
    }
}

/// Parse the layer variant and device names of a raw document, so that an
/// unknown name reports `InvalidConfig` rather than a JSON error.
fn check_named_options(value: &serde_json::Value) -> Result<()> {
    if let Some(variant) = value.pointer("/gcn_layer_params/type").and_then(|v| v.as_str()) {
        variant.parse::<LayerVariant>()?;
    }
    if let Some(device) = value.get("device").and_then(|v| v.as_str()) {
        device.parse::<ComputeTarget>()?;
    }
    Ok(())
}
