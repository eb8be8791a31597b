//! Non-learned policies over a working-memory slice.
//!
//! These are the baselines the learned heads are compared against, and the
//! fallbacks used while a head is not trained yet.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use super::actions::{Action, ExploreAction};
use crate::error::{QuadnetError, Result};
use crate::graph::{Quadruple, AGENT};

const AT_LOCATION: &str = "atlocation";
const WALL: &str = "wall";
const ROOM_PREFIX: &str = "room_";
const WILDCARD: &str = "?";

/// Tail of the `agent atlocation X` memory with the latest timestamp.
///
/// Ties go to the memory that comes later in the slice.
pub fn find_agent_location(working_memory: &[Quadruple]) -> Option<&str> {
    let mut best: Option<(f64, &str)> = None;
    for q in working_memory {
        if q.head != AGENT || q.relation != AT_LOCATION {
            continue;
        }
        let Some(t) = q.latest_timestamp() else {
            continue;
        };
        if best.map_or(true, |(latest, _)| t >= latest) {
            best = Some((t, q.tail.as_str()));
        }
    }
    best.map(|(_, location)| location)
}

/// Handcrafted exploration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorePolicy {
    /// Uniform over all five actions
    Random,
    /// Prefer known rooms, never walk into a known wall
    AvoidWalls,
}

impl FromStr for ExplorePolicy {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(ExplorePolicy::Random),
            "avoid_walls" => Ok(ExplorePolicy::AvoidWalls),
            _ => Err(QuadnetError::InvalidConfig(format!("{} is not a valid explore policy", s))),
        }
    }
}

impl fmt::Display for ExplorePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorePolicy::Random => write!(f, "random"),
            ExplorePolicy::AvoidWalls => write!(f, "avoid_walls"),
        }
    }
}

fn random_action<R: Rng + ?Sized>(rng: &mut R) -> ExploreAction {
    ExploreAction::ALL.choose(rng).copied().unwrap_or(ExploreAction::Stay)
}

/// Pick the next move from what working memory says about the map.
pub fn explore<R: Rng + ?Sized>(working_memory: &[Quadruple], policy: ExplorePolicy, rng: &mut R) -> ExploreAction {
    if policy == ExplorePolicy::Random {
        return random_action(rng);
    }
    let Some(location) = find_agent_location(working_memory) else {
        return random_action(rng);
    };

    let mut to_take = Vec::new();
    let mut to_avoid = Vec::new();
    let mut known = false;
    for q in working_memory.iter().filter(|q| q.head == location) {
        let Some(direction) = ExploreAction::DIRECTIONS.into_iter().find(|d| d.name() == q.relation) else {
            continue;
        };
        known = true;
        if q.tail.starts_with(ROOM_PREFIX) {
            to_take.push(direction);
        } else if q.tail == WALL && !to_avoid.contains(&direction) {
            to_avoid.push(direction);
        }
    }

    if !known {
        return random_action(rng);
    }
    if let Some(&action) = to_take.choose(rng) {
        return action;
    }
    let options: Vec<ExploreAction> = ExploreAction::ALL
        .iter()
        .copied()
        .filter(|a| !to_avoid.contains(a))
        .collect();
    options.choose(rng).copied().unwrap_or(ExploreAction::Stay)
}

/// Handcrafted question-answering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPolicy {
    /// Any matching memory
    Random,
    /// Most recent episodic match, else strongest semantic match
    LatestStrongest,
    /// Strongest semantic match, else most recent episodic match
    StrongestLatest,
}

impl FromStr for AnswerPolicy {
    type Err = QuadnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(AnswerPolicy::Random),
            "latest_strongest" => Ok(AnswerPolicy::LatestStrongest),
            "strongest_latest" => Ok(AnswerPolicy::StrongestLatest),
            _ => Err(QuadnetError::InvalidConfig(format!("{} is not a valid answer policy", s))),
        }
    }
}

impl fmt::Display for AnswerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerPolicy::Random => write!(f, "random"),
            AnswerPolicy::LatestStrongest => write!(f, "latest_strongest"),
            AnswerPolicy::StrongestLatest => write!(f, "strongest_latest"),
        }
    }
}

/// Which side of a one-hop question is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unknown {
    Head,
    Tail,
}

/// One-hop question such as `(laptop, atlocation, ?)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub head: String,
    pub relation: String,
    pub tail: String,
    unknown: Unknown,
}

impl Question {
    /// Exactly one of `head` and `tail` must be `?`.
    pub fn new(head: impl Into<String>, relation: impl Into<String>, tail: impl Into<String>) -> Result<Self> {
        let (head, relation, tail) = (head.into(), relation.into(), tail.into());
        let unknown = match (head == WILDCARD, tail == WILDCARD) {
            (true, false) => Unknown::Head,
            (false, true) => Unknown::Tail,
            _ => {
                return Err(QuadnetError::InvalidQuestion(format!(
                    "({}, {}, {}) must have exactly one ? in head or tail",
                    head, relation, tail
                )))
            }
        };
        Ok(Self {
            head,
            relation,
            tail,
            unknown,
        })
    }

    fn matches(&self, q: &Quadruple) -> bool {
        q.relation == self.relation
            && match self.unknown {
                Unknown::Head => q.tail == self.tail,
                Unknown::Tail => q.head == self.head,
            }
    }

    fn answer<'a>(&self, q: &'a Quadruple) -> &'a str {
        match self.unknown {
            Unknown::Head => &q.head,
            Unknown::Tail => &q.tail,
        }
    }
}

/// First memory with the largest key; memories without the key are skipped.
fn argmax_by<'a>(memories: &[&'a Quadruple], key: impl Fn(&Quadruple) -> Option<f64>) -> Option<&'a Quadruple> {
    let mut best: Option<(f64, &Quadruple)> = None;
    for &q in memories {
        if let Some(k) = key(q) {
            if best.map_or(true, |(top, _)| k > top) {
                best = Some((k, q));
            }
        }
    }
    best.map(|(_, q)| q)
}

/// Answer a one-hop question from working memory; `None` when nothing matches.
pub fn answer_question<R: Rng + ?Sized>(
    working_memory: &[Quadruple],
    policy: AnswerPolicy,
    question: &Question,
    rng: &mut R,
) -> Option<String> {
    let matches: Vec<&Quadruple> = working_memory.iter().filter(|q| question.matches(q)).collect();

    let chosen = match policy {
        AnswerPolicy::Random => matches.choose(rng).copied(),
        AnswerPolicy::LatestStrongest => {
            argmax_by(&matches, Quadruple::latest_timestamp).or_else(|| argmax_by(&matches, Quadruple::strength))
        }
        AnswerPolicy::StrongestLatest => {
            argmax_by(&matches, Quadruple::strength).or_else(|| argmax_by(&matches, Quadruple::latest_timestamp))
        }
    }?;
    Some(question.answer(chosen).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CURRENT_TIME, STRENGTH, TIMESTAMP};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn memory() -> Vec<Quadruple> {
        vec![
            Quadruple::new("agent", "atlocation", "room_000").with_qualifier(TIMESTAMP, vec![0, 1]),
            Quadruple::new("agent", "atlocation", "room_001").with_qualifier(TIMESTAMP, vec![3]),
            Quadruple::new("agent", "atlocation", "room_002").with_qualifier(STRENGTH, 5),
            Quadruple::new("room_001", "north", "wall").with_qualifier(STRENGTH, 1),
            Quadruple::new("room_001", "east", "wall").with_qualifier(TIMESTAMP, vec![2]),
            Quadruple::new("room_001", "south", "room_000").with_qualifier(CURRENT_TIME, 3),
            Quadruple::new("room_000", "west", "room_003"),
            Quadruple::new("laptop", "atlocation", "room_000").with_qualifier(TIMESTAMP, vec![1]),
            Quadruple::new("laptop", "atlocation", "room_001").with_qualifier(TIMESTAMP, vec![2]),
            Quadruple::new("laptop", "atlocation", "room_003").with_qualifier(STRENGTH, 3),
            Quadruple::new("laptop", "atlocation", "room_002").with_qualifier(STRENGTH, 1),
        ]
    }

    #[test]
    fn test_find_agent_location() {
        assert_eq!(find_agent_location(&memory()), Some("room_001"));
        assert_eq!(find_agent_location(&memory()[2..]), None);

        let tie = vec![
            Quadruple::new("agent", "atlocation", "room_000").with_qualifier(TIMESTAMP, vec![4]),
            Quadruple::new("agent", "atlocation", "room_005").with_qualifier(TIMESTAMP, vec![4]),
        ];
        assert_eq!(find_agent_location(&tie), Some("room_005"));
    }

    #[test]
    fn test_avoid_walls_prefers_rooms() {
        let mut rng = rng();
        for _ in 0..20 {
            assert_eq!(explore(&memory(), ExplorePolicy::AvoidWalls, &mut rng), ExploreAction::South);
        }
    }

    #[test]
    fn test_avoid_walls_without_rooms() {
        let memory = vec![
            Quadruple::new("agent", "atlocation", "room_001").with_qualifier(TIMESTAMP, vec![3]),
            Quadruple::new("room_001", "north", "wall"),
            Quadruple::new("room_001", "east", "wall"),
            Quadruple::new("room_001", "north", "wall").with_qualifier(CURRENT_TIME, 3),
        ];
        let mut rng = rng();
        for _ in 0..50 {
            let action = explore(&memory, ExplorePolicy::AvoidWalls, &mut rng);
            assert!(matches!(action, ExploreAction::South | ExploreAction::West | ExploreAction::Stay));
        }
    }

    #[test]
    fn test_random_explore_covers_actions() {
        let mut rng = rng();
        let mut seen = [false; 5];
        for _ in 0..200 {
            seen[explore(&[], ExplorePolicy::Random, &mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    fn draws(memory: &[Quadruple], rng: &mut ChaCha8Rng) -> [bool; 5] {
        let mut seen = [false; 5];
        for _ in 0..200 {
            seen[explore(memory, ExplorePolicy::AvoidWalls, rng).index()] = true;
        }
        seen
    }

    #[test]
    fn test_avoid_walls_without_location_is_random() {
        let mut rng = rng();
        // map facts but no episodic agent location
        let all = memory();
        let memory = &all[3..];
        assert_eq!(find_agent_location(memory), None);

        let seen = draws(memory, &mut rng);
        assert!(seen.iter().all(|&s| s), "{:?}", seen);
    }

    #[test]
    fn test_avoid_walls_without_map_is_random() {
        let mut rng = rng();
        let memory = vec![
            Quadruple::new("agent", "atlocation", "room_002").with_qualifier(TIMESTAMP, vec![5]),
            // facts about other rooms, or non-direction facts, do not count as map
            Quadruple::new("room_001", "north", "wall"),
            Quadruple::new("room_002", "stay", "room_002"),
            Quadruple::new("room_002", "atlocation", "wall"),
        ];
        assert_eq!(find_agent_location(&memory), Some("room_002"));

        let seen = draws(&memory, &mut rng);
        assert!(seen[ExploreAction::Stay.index()]);
        assert!(seen.iter().all(|&s| s), "{:?}", seen);
    }

    #[test]
    fn test_answer_policies() {
        let memory = memory();
        let mut rng = rng();
        let question = Question::new("laptop", "atlocation", "?").unwrap();

        let latest = answer_question(&memory, AnswerPolicy::LatestStrongest, &question, &mut rng);
        assert_eq!(latest.as_deref(), Some("room_001"));

        let strongest = answer_question(&memory, AnswerPolicy::StrongestLatest, &question, &mut rng);
        assert_eq!(strongest.as_deref(), Some("room_003"));

        let any = answer_question(&memory, AnswerPolicy::Random, &question, &mut rng).unwrap();
        assert!(["room_000", "room_001", "room_002", "room_003"].contains(&any.as_str()));
    }

    #[test]
    fn test_answer_head_and_fallbacks() {
        let memory = memory();
        let mut rng = rng();

        let who = Question::new("?", "west", "room_003").unwrap();
        // no timestamps or strengths: the ranked policies have nothing to rank
        assert_eq!(answer_question(&memory, AnswerPolicy::LatestStrongest, &who, &mut rng), None);
        assert_eq!(
            answer_question(&memory, AnswerPolicy::Random, &who, &mut rng).as_deref(),
            Some("room_000")
        );

        // episodic only: strongest_latest falls back to the latest
        let walls = Question::new("room_001", "east", "?").unwrap();
        assert_eq!(
            answer_question(&memory, AnswerPolicy::StrongestLatest, &walls, &mut rng).as_deref(),
            Some("wall")
        );

        let nothing = Question::new("phone", "atlocation", "?").unwrap();
        assert_eq!(answer_question(&memory, AnswerPolicy::Random, &nothing, &mut rng), None);
    }

    #[test]
    fn test_invalid_questions_and_policies() {
        assert!(matches!(
            Question::new("?", "atlocation", "?"),
            Err(QuadnetError::InvalidQuestion(_))
        ));
        assert!(Question::new("laptop", "atlocation", "room_000").is_err());
        assert!(matches!("greedy".parse::<AnswerPolicy>(), Err(QuadnetError::InvalidConfig(_))));
        assert_eq!("AVOID_WALLS".parse::<ExplorePolicy>().unwrap(), ExplorePolicy::AvoidWalls);
    }
}
