//! Discrete action sets of the two Q-value heads.

use std::fmt;
use std::str::FromStr;

use candle_core::{Tensor, D};

use crate::error::{QuadnetError, Result};

/// A finite action set whose order matches the columns of a Q-value tensor.
pub trait Action: Copy + Sized + 'static {
    /// Every action, in column order.
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn name(self) -> &'static str;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Greedy action per row of a `[n, num_actions]` Q-value tensor.
pub fn greedy<A: Action>(q_values: &Tensor) -> Result<Vec<A>> {
    let num_actions = q_values.dims().last().copied().unwrap_or(0);
    if num_actions != A::ALL.len() {
        return Err(QuadnetError::Consistency {
            expected: A::ALL.len(),
            got: num_actions,
        });
    }
    if q_values.elem_count() == 0 {
        return Ok(Vec::new());
    }

    let rows = q_values.reshape(((), num_actions))?;
    rows.argmax(D::Minus1)?
        .to_vec1::<u32>()?
        .into_iter()
        .map(|i| {
            A::from_index(i as usize).ok_or(QuadnetError::Consistency {
                expected: num_actions,
                got: i as usize,
            })
        })
        .collect()
}

/// What to do with a short-term memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryAction {
    /// Move into episodic long-term memory
    Episodic,
    /// Move into semantic long-term memory
    Semantic,
    Forget,
}

impl Action for MemoryAction {
    const ALL: &'static [Self] = &[MemoryAction::Episodic, MemoryAction::Semantic, MemoryAction::Forget];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            MemoryAction::Episodic => "episodic",
            MemoryAction::Semantic => "semantic",
            MemoryAction::Forget => "forget",
        }
    }
}

/// Where the agent moves next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExploreAction {
    North,
    East,
    South,
    West,
    Stay,
}

impl ExploreAction {
    /// The four moves, without `Stay`.
    pub const DIRECTIONS: [ExploreAction; 4] =
        [ExploreAction::North, ExploreAction::East, ExploreAction::South, ExploreAction::West];
}

impl Action for ExploreAction {
    const ALL: &'static [Self] = &[
        ExploreAction::North,
        ExploreAction::East,
        ExploreAction::South,
        ExploreAction::West,
        ExploreAction::Stay,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        match self {
            ExploreAction::North => "north",
            ExploreAction::East => "east",
            ExploreAction::South => "south",
            ExploreAction::West => "west",
            ExploreAction::Stay => "stay",
        }
    }
}

fn parse_action<A: Action>(s: &str, kind: &str) -> Result<A> {
    let lower = s.to_ascii_lowercase();
    A::ALL
        .iter()
        .copied()
        .find(|a| a.name() == lower)
        .ok_or_else(|| QuadnetError::InvalidConfig(format!("{} is not a valid {} action", s, kind)))
}

impl FromStr for MemoryAction {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        parse_action(s, "memory management")
    }
}

impl FromStr for ExploreAction {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        parse_action(s, "explore")
    }
}

impl fmt::Display for MemoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ExploreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
