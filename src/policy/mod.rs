//! Action sets and handcrafted policies.

mod actions;
mod handcrafted;

pub use actions::{greedy, Action, ExploreAction, MemoryAction};
pub use handcrafted::{answer_question, explore, find_agent_location, AnswerPolicy, ExplorePolicy, Question};
