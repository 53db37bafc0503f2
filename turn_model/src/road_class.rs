use serde::{Deserialize, Serialize};

/// A road whose priority is more than this factor better (= numerically
/// smaller) than a sibling's dominates it. Not derived from any data; tune
/// freely.
pub const PRIORITY_DISTINCTION_FACTOR: u8 = 2;

/// Coarse functional classification of a road edge. `priority` is ordered
/// with *lower* values more important (motorways before residential streets);
/// `low_priority` marks service roads, driveways, parking aisles and the
/// like.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoadClassification {
    pub priority: u8,
    pub num_lanes: u8,
    pub low_priority: bool,
}

impl RoadClassification {
    pub fn is_low_priority(self) -> bool {
        self.low_priority
    }
}

/// True when `candidate` so clearly dominates `other` that continuing onto
/// it is the obvious choice for a driver arriving on `incoming`: either the
/// candidate continues the incoming road's class and outranks the other by
/// [`PRIORITY_DISTINCTION_FACTOR`], or both the incoming road and the
/// candidate are proper roads while the other is a service way.
pub fn obvious_by_road_class(
    incoming: RoadClassification,
    candidate: RoadClassification,
    other: RoadClassification,
) -> bool {
    obvious_by_road_class_with_factor(incoming, candidate, other, PRIORITY_DISTINCTION_FACTOR)
}

pub fn obvious_by_road_class_with_factor(
    incoming: RoadClassification,
    candidate: RoadClassification,
    other: RoadClassification,
    factor: u8,
) -> bool {
    let has_high_priority = u16::from(factor) * u16::from(candidate.priority) < u16::from(other.priority);
    let continues_on_same_class = incoming == candidate;
    (has_high_priority && continues_on_same_class)
        || (!candidate.is_low_priority() && !incoming.is_low_priority() && other.is_low_priority())
}
