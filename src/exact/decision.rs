//! Edge decisions and the arena holding decision sequences.
//!
//! Every path from the root of the search tree is a sequence of edge
//! decisions. Sequences share their prefixes: each arena entry stores one
//! decision and a link to its parent entry, so branching appends a single
//! entry instead of copying the whole list.

use serde::{Deserialize, Serialize};

/// Whether a branch forces an edge into the tour or out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    Include,
    Exclude,
}

/// A decision on the directed edge `from -> to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeDecision {
    pub from: usize,
    pub to: usize,
    pub choice: Choice,
}

impl EdgeDecision {
    pub fn include(from: usize, to: usize) -> Self {
        EdgeDecision { from, to, choice: Choice::Include }
    }

    pub fn exclude(from: usize, to: usize) -> Self {
        EdgeDecision { from, to, choice: Choice::Exclude }
    }

    #[inline]
    pub fn is_include(&self) -> bool {
        self.choice == Choice::Include
    }
}

impl std::fmt::Display for EdgeDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = match self.choice {
            Choice::Include => '+',
            Choice::Exclude => '-',
        };
        write!(f, "{}({}->{})", sign, self.from, self.to)
    }
}

/// Index of the last decision of a sequence in a [`DecisionArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecisionId(usize);

/// A decision sequence, named by its last decision. The root is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionPath {
    tip: Option<DecisionId>,
    len: usize,
}

impl DecisionPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Number of decisions in the sequence
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone)]
struct ArenaEntry {
    decision: EdgeDecision,
    parent: Option<DecisionId>,
}

/// Append-only store of parent-linked decisions.
#[derive(Debug, Default)]
pub struct DecisionArena {
    entries: Vec<ArenaEntry>,
}

impl DecisionArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend `path` by one decision. `path` itself stays valid and unchanged.
    pub fn extend(&mut self, path: DecisionPath, decision: EdgeDecision) -> DecisionPath {
        let id = DecisionId(self.entries.len());
        self.entries.push(ArenaEntry {
            decision,
            parent: path.tip,
        });
        DecisionPath {
            tip: Some(id),
            len: path.len + 1,
        }
    }

    /// The two children of a branch on `from -> to`: include first, then exclude.
    pub fn branch(&mut self, path: DecisionPath, from: usize, to: usize) -> [DecisionPath; 2] {
        [
            self.extend(path, EdgeDecision::include(from, to)),
            self.extend(path, EdgeDecision::exclude(from, to)),
        ]
    }

    /// Materialize a sequence in decision order (root first).
    pub fn decisions(&self, path: DecisionPath) -> Vec<EdgeDecision> {
        let mut decisions = Vec::with_capacity(path.len);
        let mut cursor = path.tip;
        while let Some(DecisionId(index)) = cursor {
            let entry = &self.entries[index];
            decisions.push(entry.decision);
            cursor = entry.parent;
        }
        decisions.reverse();
        decisions
    }

    /// Total number of decisions stored
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
