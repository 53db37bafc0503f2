use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::Coordinate;

use crate::graph::EdgeID;

/// The polyline of every directed edge, indexed by edge id and stored in
/// source-to-target order with both endpoint coordinates included.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeGeometry {
    polylines: Vec<Vec<Coordinate>>,
}

impl EdgeGeometry {
    pub fn new(polylines: Vec<Vec<Coordinate>>) -> Result<EdgeGeometry> {
        for (idx, polyline) in polylines.iter().enumerate() {
            if polyline.len() < 2 {
                bail!(
                    "{} has {} coordinates; even a plain segment needs both endpoints",
                    EdgeID(idx as u32),
                    polyline.len()
                );
            }
        }
        Ok(EdgeGeometry { polylines })
    }

    pub fn num_edges(&self) -> usize {
        self.polylines.len()
    }

    /// The full polyline of `edge`, oriented in the direction of traversal.
    pub fn coordinates_along_road(
        &self,
        edge: EdgeID,
        traversed_in_reverse: bool,
    ) -> Vec<Coordinate> {
        let mut coordinates = self.polylines[edge.0 as usize].clone();
        if traversed_in_reverse {
            coordinates.reverse();
        }
        coordinates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_direction() {
        let polyline = vec![
            Coordinate::new(0, 0),
            Coordinate::new(10, 10),
            Coordinate::new(20, 20),
        ];
        let geometry = EdgeGeometry::new(vec![polyline.clone()]).unwrap();
        assert_eq!(geometry.coordinates_along_road(EdgeID(0), false), polyline);
        let mut reversed = polyline;
        reversed.reverse();
        assert_eq!(geometry.coordinates_along_road(EdgeID(0), true), reversed);
    }

    #[test]
    fn rejects_degenerate_polylines() {
        assert!(EdgeGeometry::new(vec![vec![Coordinate::new(0, 0)]]).is_err());
    }
}
