use geom::{
    closest_point_on_line, least_squares_regression, trim_to_length, Coordinate, Distance,
};

use crate::geometry::EdgeGeometry;
use crate::graph::{EdgeID, NodeID};

/// How far down the polyline the close-to-turn coordinate sits when the
/// leading segment hugs the intersection too closely to be meaningful.
const DISTANCE_TO_CLOSE_COORDINATE: Distance = Distance::const_meters(2.0);

/// Physical width assumed per lane when deciding how far to look down a road.
const ASSUMED_LANE_WIDTH: f64 = 3.25;

/// Never look further than this, no matter how wide the intersection is.
const FAR_LOOKAHEAD_DISTANCE: Distance = Distance::const_meters(40.0);

/// Picks, for an edge leaving an intersection, the single coordinate whose
/// bearing from the intersection center best represents the direction the
/// road actually leaves at. Never fails; degenerate geometry falls back to
/// cruder but always-available picks.
pub struct CoordinateExtractor<'a> {
    geometry: &'a EdgeGeometry,
    node_coordinates: &'a [Coordinate],
}

impl<'a> CoordinateExtractor<'a> {
    pub fn new(
        geometry: &'a EdgeGeometry,
        node_coordinates: &'a [Coordinate],
    ) -> CoordinateExtractor<'a> {
        CoordinateExtractor {
            geometry,
            node_coordinates,
        }
    }

    /// The full polyline of `via`, oriented so it starts at `from`.
    pub fn coordinates_along_road(
        &self,
        from: NodeID,
        via: EdgeID,
        traversed_in_reverse: bool,
        _to: NodeID,
    ) -> Vec<Coordinate> {
        let coordinates = self.geometry.coordinates_along_road(via, traversed_in_reverse);
        debug_assert!(coordinates.len() >= 2);
        debug_assert_eq!(
            coordinates[0], self.node_coordinates[from.0 as usize],
            "geometry of {} doesn't start at {}",
            via, from
        );
        coordinates
    }

    /// A coordinate right past the intersection: the first geometry vertex
    /// beyond the center, or a synthetic point a fixed short distance along
    /// the polyline when that vertex sits too close to tell directions
    /// apart.
    pub fn coordinate_close_to_turn(
        &self,
        from: NodeID,
        via: EdgeID,
        traversed_in_reverse: bool,
        to: NodeID,
    ) -> Coordinate {
        let coordinates = self.coordinates_along_road(from, via, traversed_in_reverse, to);
        if coordinates.len() == 2 {
            return coordinates[1];
        }
        let leading_segment = coordinates[0].to_lon_lat().gps_dist(coordinates[1].to_lon_lat());
        if leading_segment >= DISTANCE_TO_CLOSE_COORDINATE {
            return coordinates[1];
        }
        *trim_to_length(&coordinates, DISTANCE_TO_CLOSE_COORDINATE)
            .last()
            .unwrap()
    }

    /// A coordinate far enough down the road that its bearing from the
    /// intersection center reflects the leaving direction rather than
    /// lane-entry flare. Multi-lane junctions fan their edges out over the
    /// width of the crossing road, so the lookahead scales with the lane
    /// count; a least-squares fit over that window then absorbs the flare
    /// itself.
    pub fn extract_representative_coordinate(
        &self,
        from: NodeID,
        via: EdgeID,
        traversed_in_reverse: bool,
        to: NodeID,
        intersection_lanes: u8,
        coordinates: Vec<Coordinate>,
    ) -> Coordinate {
        debug_assert!(coordinates.len() >= 2);
        if intersection_lanes <= 1 || coordinates.len() == 2 {
            // Without lane information (or intermediate vertices) there is
            // no flare to correct for.
            return self.coordinate_close_to_turn(from, via, traversed_in_reverse, to);
        }

        let lookahead = (Distance::meters(ASSUMED_LANE_WIDTH) * f64::from(intersection_lanes))
            .min(FAR_LOOKAHEAD_DISTANCE);
        let window = trim_to_length(&coordinates, lookahead);
        let (line_start, line_end) = least_squares_regression(&window);
        let tip = window.last().unwrap().to_lon_lat();
        closest_point_on_line(line_start, line_end, tip).to_fixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::LonLat;

    // All fixtures model a single edge 0 leaving node 0 towards node 1.
    fn extractor_parts(polyline: Vec<Coordinate>) -> (EdgeGeometry, Vec<Coordinate>) {
        let ends = vec![polyline[0], *polyline.last().unwrap()];
        (EdgeGeometry::new(vec![polyline]).unwrap(), ends)
    }

    fn bearing_from_origin(c: Coordinate) -> f64 {
        LonLat::new(0.0, 0.0).bearing_to(c.to_lon_lat()).degrees()
    }

    #[test]
    fn close_to_turn_takes_the_first_vertex() {
        let (geometry, nodes) = extractor_parts(vec![
            Coordinate::new(0, 0),
            Coordinate::new(1000, 0),
            Coordinate::new(2000, 1000),
        ]);
        let extractor = CoordinateExtractor::new(&geometry, &nodes);
        assert_eq!(
            extractor.coordinate_close_to_turn(NodeID(0), EdgeID(0), false, NodeID(1)),
            Coordinate::new(1000, 0)
        );
    }

    #[test]
    fn close_to_turn_synthesizes_past_a_tiny_leading_segment() {
        // The first vertex is only ~0.5m out; the pick should land ~2m down
        // the road instead.
        let (geometry, nodes) = extractor_parts(vec![
            Coordinate::new(0, 0),
            Coordinate::new(5, 0),
            Coordinate::new(5, 2000),
        ]);
        let extractor = CoordinateExtractor::new(&geometry, &nodes);
        let picked = extractor.coordinate_close_to_turn(NodeID(0), EdgeID(0), false, NodeID(1));
        assert_eq!(picked.lon, 5);
        assert!(picked.lat > 0 && picked.lat < 20, "got {}", picked);
    }

    #[test]
    fn representative_coordinate_sees_past_lane_flare() {
        // A road that actually heads due east, but flares 45 degrees north
        // for its first meter and a half at the intersection mouth.
        let polyline = vec![
            Coordinate::new(0, 0),
            Coordinate::new(10, 10),
            Coordinate::new(3000, 10),
        ];
        let (geometry, nodes) = extractor_parts(polyline.clone());
        let extractor = CoordinateExtractor::new(&geometry, &nodes);

        let naive = extractor.coordinate_close_to_turn(NodeID(0), EdgeID(0), false, NodeID(1));
        let representative = extractor.extract_representative_coordinate(
            NodeID(0),
            EdgeID(0),
            false,
            NodeID(1),
            6,
            polyline,
        );
        // The close pick still points well away from east...
        assert!(bearing_from_origin(naive) < 60.0);
        // ...while the fitted pick leans almost due east
        assert!(bearing_from_origin(representative) > 80.0);
        assert!(bearing_from_origin(representative) <= 90.0);
    }

    #[test]
    fn representative_coordinate_without_lanes_falls_back() {
        let polyline = vec![
            Coordinate::new(0, 0),
            Coordinate::new(1000, 0),
            Coordinate::new(2000, 1000),
        ];
        let (geometry, nodes) = extractor_parts(polyline.clone());
        let extractor = CoordinateExtractor::new(&geometry, &nodes);
        assert_eq!(
            extractor.extract_representative_coordinate(
                NodeID(0),
                EdgeID(0),
                false,
                NodeID(1),
                1,
                polyline,
            ),
            Coordinate::new(1000, 0)
        );
    }
}
