use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::NodeID;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RestrictionType {
    BanTurns,
    OnlyAllowTurns,
}

/// A node-based turn restriction: for traffic that arrived at `via` from
/// `from`, continuing to `to` is either banned or the only legal choice.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct TurnRestriction {
    pub from: NodeID,
    pub via: NodeID,
    pub to: NodeID,
    pub restriction_type: RestrictionType,
}

/// Point-lookup index over turn restrictions. Restrictions may reference
/// geometry that later processing removed; this index doesn't try to
/// validate that, callers check adjacency themselves.
#[derive(Clone, Debug, Default)]
pub struct RestrictionIndex {
    banned: HashSet<(NodeID, NodeID, NodeID)>,
    only_turns: HashMap<(NodeID, NodeID), NodeID>,
}

impl RestrictionIndex {
    pub fn new(restrictions: &[TurnRestriction]) -> RestrictionIndex {
        let mut index = RestrictionIndex::default();
        // TODO Flag conflicting only-turns on the same (from, via) pair
        // instead of letting the last one win.
        for r in restrictions {
            match r.restriction_type {
                RestrictionType::BanTurns => {
                    index.banned.insert((r.from, r.via, r.to));
                }
                RestrictionType::OnlyAllowTurns => {
                    index.only_turns.insert((r.from, r.via), r.to);
                }
            }
        }
        index
    }

    pub fn is_restricted(&self, from: NodeID, via: NodeID, to: NodeID) -> bool {
        self.banned.contains(&(from, via, to))
    }

    /// The destination an only-turn restriction names for traffic arriving
    /// at `via` from `from`, if one exists. The destination may no longer be
    /// adjacent to `via`; callers decide how to degrade.
    pub fn only_turn_destination(&self, from: NodeID, via: NodeID) -> Option<NodeID> {
        self.only_turns.get(&(from, via)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries() {
        let index = RestrictionIndex::new(&[
            TurnRestriction {
                from: NodeID(0),
                via: NodeID(1),
                to: NodeID(2),
                restriction_type: RestrictionType::BanTurns,
            },
            TurnRestriction {
                from: NodeID(3),
                via: NodeID(1),
                to: NodeID(4),
                restriction_type: RestrictionType::OnlyAllowTurns,
            },
        ]);
        assert!(index.is_restricted(NodeID(0), NodeID(1), NodeID(2)));
        assert!(!index.is_restricted(NodeID(0), NodeID(1), NodeID(3)));
        assert_eq!(
            index.only_turn_destination(NodeID(3), NodeID(1)),
            Some(NodeID(4))
        );
        assert_eq!(index.only_turn_destination(NodeID(0), NodeID(1)), None);
    }
}
