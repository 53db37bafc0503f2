//! The intersection analysis core of a road-network preprocessing pipeline.
//! Given a directed road graph whose edges carry polylines, this crate
//! answers "standing on this edge, what does the junction ahead look like":
//! which roads leave it, at which bearings, which of the turns onto them are
//! legal, and where the next real decision point is once trivial
//! pass-through nodes are skipped.
//!
//! Everything is a pure function over borrowed, immutable containers; a
//! single [`IntersectionGenerator`] can be shared across worker threads.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod coordinate_extractor;
mod geometry;
mod graph;
mod intersection;
mod intersection_generator;
mod restrictions;
mod road_class;

pub use crate::coordinate_extractor::CoordinateExtractor;
pub use crate::geometry::EdgeGeometry;
pub use crate::graph::{EdgeData, EdgeID, NodeID, RoadGraph};
pub use crate::intersection::{
    turn_direction, DirectionModifier, IntersectionShape, IntersectionShapeData, IntersectionView,
    IntersectionViewData,
};
pub use crate::intersection_generator::IntersectionGenerator;
pub use crate::restrictions::{RestrictionIndex, RestrictionType, TurnRestriction};
pub use crate::road_class::{
    obvious_by_road_class, obvious_by_road_class_with_factor, RoadClassification,
    PRIORITY_DISTINCTION_FACTOR,
};
