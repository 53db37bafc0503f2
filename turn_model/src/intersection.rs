use std::ops::Deref;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use geom::{angular_deviation, normalize_degrees, Bearing, Distance};

use crate::graph::EdgeID;

/// One road leaving an intersection: the edge, the compass direction it
/// leaves at, and how long its geometry runs until the next node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionShapeData {
    pub edge: EdgeID,
    pub bearing: Bearing,
    pub segment_length: Distance,
}

/// All roads leaving an intersection, sorted by bearing relative to a base
/// direction.
pub type IntersectionShape = Vec<IntersectionShapeData>;

/// A road leaving an intersection as seen by a driver who entered it from a
/// specific edge: on top of the shape data, whether turning onto it is
/// legal, and the turn angle (0 turns back the way the driver came, 180
/// continues straight).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionViewData {
    pub edge: EdgeID,
    pub bearing: Bearing,
    pub segment_length: Distance,
    pub entry_allowed: bool,
    pub angle: f64,
}

impl IntersectionViewData {
    pub fn new(road: IntersectionShapeData, entry_allowed: bool, angle: f64) -> IntersectionViewData {
        IntersectionViewData {
            edge: road.edge,
            bearing: road.bearing,
            segment_length: road.segment_length,
            entry_allowed,
            angle,
        }
    }

    /// The same road under a left/right mirror of the intersection. The
    /// turn-back entry is a fixed point of mirroring and stays untouched.
    pub fn mirrored(mut self) -> IntersectionViewData {
        if angular_deviation(self.angle, 0.0) > f64::EPSILON {
            self.angle = normalize_degrees(360.0 - self.angle);
        }
        self
    }
}

/// The full view of an intersection for one incoming edge, sorted by turn
/// angle. The entry turning back towards the previous node sits at index 0
/// with an angle of zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntersectionView(Vec<IntersectionViewData>);

impl IntersectionView {
    pub(crate) fn new(roads: Vec<IntersectionViewData>) -> IntersectionView {
        IntersectionView(roads)
    }

    /// Checks the ordering contract: non-empty, sorted by angle, and
    /// anchored by the turn-back entry.
    pub fn valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.windows(2).all(|pair| pair[0].angle <= pair[1].angle)
            && self.0[0].angle < f64::EPSILON
    }

    /// The entry whose turn angle is closest to `angle`, measuring around
    /// the circle.
    pub fn find_closest_turn(&self, angle: f64) -> Option<&IntersectionViewData> {
        self.0
            .iter()
            .min_by_key(|road| NotNan::new(angular_deviation(road.angle, angle)).unwrap())
    }
}

impl Deref for IntersectionView {
    type Target = [IntersectionViewData];

    fn deref(&self) -> &[IntersectionViewData] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a IntersectionView {
    type Item = &'a IntersectionViewData;
    type IntoIter = std::slice::Iter<'a, IntersectionViewData>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The alphabet of turn directions a turn angle classifies into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum DirectionModifier {
    UTurn,
    SharpRight,
    Right,
    SlightRight,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
}

impl DirectionModifier {
    /// The involution a left/right mirror of an intersection applies: each
    /// severity swaps sides, u-turns and going straight stay put.
    pub fn mirror(self) -> DirectionModifier {
        match self {
            DirectionModifier::UTurn => DirectionModifier::UTurn,
            DirectionModifier::SharpRight => DirectionModifier::SharpLeft,
            DirectionModifier::Right => DirectionModifier::Left,
            DirectionModifier::SlightRight => DirectionModifier::SlightLeft,
            DirectionModifier::Straight => DirectionModifier::Straight,
            DirectionModifier::SlightLeft => DirectionModifier::SlightRight,
            DirectionModifier::Left => DirectionModifier::Right,
            DirectionModifier::SharpLeft => DirectionModifier::SharpRight,
        }
    }
}

/// Classifies a turn angle (0 = back, 180 = straight, below 180 leaving
/// left, above 180 leaving right).
pub fn turn_direction(angle: f64) -> DirectionModifier {
    if angle > 0.0 && angle < 60.0 {
        DirectionModifier::SharpLeft
    } else if angle >= 60.0 && angle < 140.0 {
        DirectionModifier::Left
    } else if angle >= 140.0 && angle < 160.0 {
        DirectionModifier::SlightLeft
    } else if angle >= 160.0 && angle <= 200.0 {
        DirectionModifier::Straight
    } else if angle > 200.0 && angle < 220.0 {
        DirectionModifier::SlightRight
    } else if angle >= 220.0 && angle < 300.0 {
        DirectionModifier::Right
    } else if angle >= 300.0 && angle < 360.0 {
        DirectionModifier::SharpRight
    } else {
        DirectionModifier::UTurn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn road(edge: u32, angle: f64) -> IntersectionViewData {
        IntersectionViewData {
            edge: EdgeID(edge),
            bearing: Bearing::new(angle),
            segment_length: Distance::meters(10.0),
            entry_allowed: true,
            angle,
        }
    }

    #[test]
    fn mirror_is_an_involution() {
        use DirectionModifier::*;
        for modifier in [
            UTurn, SharpRight, Right, SlightRight, Straight, SlightLeft, Left, SharpLeft,
        ] {
            assert_eq!(modifier.mirror().mirror(), modifier);
        }
        assert_eq!(Left.mirror(), Right);
        assert_eq!(UTurn.mirror(), UTurn);
        assert_eq!(Straight.mirror(), Straight);
    }

    #[test]
    fn classification_windows() {
        assert_eq!(turn_direction(0.0), DirectionModifier::UTurn);
        assert_eq!(turn_direction(30.0), DirectionModifier::SharpLeft);
        assert_eq!(turn_direction(90.0), DirectionModifier::Left);
        assert_eq!(turn_direction(150.0), DirectionModifier::SlightLeft);
        assert_eq!(turn_direction(180.0), DirectionModifier::Straight);
        assert_eq!(turn_direction(210.0), DirectionModifier::SlightRight);
        assert_eq!(turn_direction(270.0), DirectionModifier::Right);
        assert_eq!(turn_direction(330.0), DirectionModifier::SharpRight);
    }

    #[test]
    fn mirroring_a_view_entry() {
        let left = road(1, 90.0);
        assert_eq!(left.mirrored().angle, 270.0);
        let back = road(0, 0.0);
        assert_eq!(back.mirrored().angle, 0.0);
    }

    #[test]
    fn validity_and_closest_turn() {
        let view = IntersectionView::new(vec![road(0, 0.0), road(1, 90.0), road(2, 200.0)]);
        assert!(view.valid());
        assert_eq!(view.find_closest_turn(180.0).unwrap().edge, EdgeID(2));
        assert_eq!(view.find_closest_turn(350.0).unwrap().edge, EdgeID(0));

        let unsorted = IntersectionView::new(vec![road(1, 90.0), road(0, 0.0)]);
        assert!(!unsorted.valid());
        assert!(!IntersectionView::new(vec![]).valid());
    }
}
