use std::collections::HashSet;

use anyhow::Result;
use ordered_float::NotNan;

use geom::{haversine_length, Coordinate};

use crate::coordinate_extractor::CoordinateExtractor;
use crate::geometry::EdgeGeometry;
use crate::graph::{EdgeID, NodeID, RoadGraph};
use crate::intersection::{
    IntersectionShape, IntersectionShapeData, IntersectionView, IntersectionViewData,
};
use crate::restrictions::RestrictionIndex;

/// Answers intersection queries over borrowed, immutable containers. One
/// instance can serve any number of worker threads; every query allocates
/// only its own shape and view.
pub struct IntersectionGenerator<'a> {
    graph: &'a RoadGraph,
    restrictions: &'a RestrictionIndex,
    barrier_nodes: &'a HashSet<NodeID>,
    node_coordinates: &'a [Coordinate],
    coordinate_extractor: CoordinateExtractor<'a>,
}

impl<'a> IntersectionGenerator<'a> {
    pub fn new(
        graph: &'a RoadGraph,
        restrictions: &'a RestrictionIndex,
        barrier_nodes: &'a HashSet<NodeID>,
        node_coordinates: &'a [Coordinate],
        geometry: &'a EdgeGeometry,
    ) -> IntersectionGenerator<'a> {
        IntersectionGenerator {
            graph,
            restrictions,
            barrier_nodes,
            node_coordinates,
            coordinate_extractor: CoordinateExtractor::new(geometry, node_coordinates),
        }
    }

    pub fn coordinate_extractor(&self) -> &CoordinateExtractor<'a> {
        &self.coordinate_extractor
    }

    /// The intersection ahead of `via`, as seen by a driver arriving from
    /// `from`, with full-precision bearings.
    pub fn get_connected_roads(&self, from: NodeID, via: EdgeID) -> IntersectionView {
        self.get_connected_roads_with_precision(from, via, false)
    }

    //                                               a
    //                                               |
    //                                               v
    //             from --via--> node_at_intersection --> c
    //                                               ^
    //                                               |
    //                                               b
    //
    // The view contains every adjacent road as if the graph was undirected:
    // not just the turn onto c, but also the ones onto a and onto b. Turns
    // that can't legally be taken are present but marked, since
    // classification passes still need to see the full fan.
    pub fn get_connected_roads_with_precision(
        &self,
        from: NodeID,
        via: EdgeID,
        use_low_precision: bool,
    ) -> IntersectionView {
        debug_assert!(
            self.graph.begin_edges(from) <= via
                && via.0 < self.graph.begin_edges(from).0 + self.graph.out_degree(from) as u32,
            "{} doesn't leave {}",
            via,
            from
        );
        let shape = self.compute_shape(self.graph.target(via), None, use_low_precision);
        self.transform_shape_into_view(from, via, &shape)
    }

    /// Every edge leaving `node`, with the bearing and length of its
    /// geometry, sorted by bearing relative to the road towards
    /// `sorting_base` (or, lacking one, the first adjacent road). Isolated
    /// nodes produce an empty shape; callers must check.
    pub fn compute_shape(
        &self,
        node: NodeID,
        sorting_base: Option<NodeID>,
        use_low_precision: bool,
    ) -> IntersectionShape {
        let intersection_degree = self.graph.out_degree(node);
        let mut intersection: IntersectionShape = Vec::with_capacity(intersection_degree);
        let turn_coordinate = self.node_coordinates[node.0 as usize];
        let intersection_lanes = self.graph.lane_count_at_intersection(node);

        for edge in self.graph.adjacent_edges(node) {
            let to_node = self.graph.target(edge);
            let coordinates = self
                .coordinate_extractor
                .coordinates_along_road(node, edge, false, to_node);
            let segment_length = haversine_length(&coordinates);

            // Cheap passes and trivial junctions settle for the vertex next
            // to the center; everything else pays for the fitted estimate.
            let extracted = if use_low_precision || intersection_degree <= 2 {
                self.coordinate_extractor
                    .coordinate_close_to_turn(node, edge, false, to_node)
            } else {
                self.coordinate_extractor.extract_representative_coordinate(
                    node,
                    edge,
                    false,
                    to_node,
                    intersection_lanes,
                    coordinates,
                )
            };
            let bearing = turn_coordinate.to_lon_lat().bearing_to(extracted.to_lon_lat());

            intersection.push(IntersectionShapeData {
                edge,
                bearing,
                segment_length,
            });
        }

        if !intersection.is_empty() {
            let base_bearing = sorting_base
                .and_then(|base| {
                    intersection
                        .iter()
                        .find(|road| self.graph.target(road.edge) == base)
                })
                .unwrap_or(&intersection[0])
                .bearing
                .reverse();
            intersection
                .sort_by_key(|road| NotNan::new(road.bearing.angle_between(base_bearing)).unwrap());
        }
        intersection
    }

    /// Convenience for the common case of a shape that never went through
    /// merging.
    pub fn transform_shape_into_view(
        &self,
        previous_node: NodeID,
        entering_via_edge: EdgeID,
        shape: &IntersectionShape,
    ) -> IntersectionView {
        self.transform_normalised_shape_into_view(previous_node, entering_via_edge, shape, shape, &[])
    }

    /// Turns a bearing-sorted shape into the angle-sorted view for a driver
    /// who arrived at the shape's node via `entering_via_edge`:
    /// per-road legality, turn angles measured from the direction back to
    /// `previous_node`, and the u-turn policy.
    ///
    /// `normalised_shape` is the shape after any edge-merging normalization;
    /// `original_shape` the one before (they may be the same), with
    /// `performed_merges` recording which edges were folded into which. The
    /// road back to `previous_node` must appear in `original_shape`, or the
    /// caller paired the wrong nodes and edges.
    pub fn transform_normalised_shape_into_view(
        &self,
        previous_node: NodeID,
        entering_via_edge: EdgeID,
        normalised_shape: &IntersectionShape,
        original_shape: &IntersectionShape,
        performed_merges: &[(EdgeID, EdgeID)],
    ) -> IntersectionView {
        let node_at_intersection = self.graph.target(entering_via_edge);

        let only_valid_turn =
            self.only_allowed_turn_if_existent(previous_node, node_at_intersection);

        // Barriers change our behaviour regarding u-turns
        let is_barrier_node = self.barrier_nodes.contains(&node_at_intersection);

        let connects_to_previous =
            |road: &IntersectionShapeData| self.graph.target(road.edge) == previous_node;

        // With parallel edges several roads may connect back; they share
        // their coordinates, so the first stands in for the rest.
        let uturn_edge = original_shape
            .iter()
            .find(|road| connects_to_previous(road))
            .unwrap_or_else(|| {
                panic!(
                    "no road back from {} to {}; mismatched entering pair",
                    node_at_intersection, previous_node
                )
            });

        let is_restricted = |destination: NodeID| {
            if let Some(only) = only_valid_turn {
                if only != destination {
                    return true;
                }
            }
            self.restrictions
                .is_restricted(previous_node, node_at_intersection, destination)
        };

        let is_allowed_turn = |road: &IntersectionShapeData| {
            let road_data = self.graph.edge_data(road.edge);
            let destination = self.graph.target(road.edge);
            // Against-flow edges are never valid exits; past a barrier, only
            // turning back is.
            !road_data.reversed
                && (!is_barrier_node || destination == previous_node)
                && !is_restricted(destination)
        };

        // Normalization may have merged the u-turn road away; recover its
        // direction from the surviving road in that case.
        let uturn_bearing = match performed_merges
            .iter()
            .find(|(merged_from, _)| *merged_from == uturn_edge.edge)
        {
            Some((_, merged_into)) => {
                normalised_shape
                    .iter()
                    .find(|road| road.edge == *merged_into)
                    .expect("merged-into road missing from the normalised shape")
                    .bearing
            }
            None => {
                normalised_shape
                    .iter()
                    .find(|road| connects_to_previous(road))
                    .expect("no road back to the previous node in the normalised shape")
                    .bearing
            }
        }
        .reverse();

        let mut view: Vec<IntersectionViewData> = normalised_shape
            .iter()
            .map(|road| {
                IntersectionViewData::new(
                    *road,
                    is_allowed_turn(road),
                    road.bearing.turn_angle_from(uturn_bearing),
                )
            })
            .collect();

        let valid_count = view.iter().filter(|road| road.entry_allowed).count();
        let uturn_view_idx = view
            .iter()
            .position(|road| self.graph.target(road.edge) == previous_node);
        if let Some(idx) = uturn_view_idx {
            // U-turns are a last resort: forbid the casual ones, and
            // re-check the forbidden one when it's the only way out.
            if (view[idx].entry_allowed && !is_barrier_node && valid_count != 1)
                || valid_count == 0
            {
                let allow_uturn_at_dead_end = {
                    let uturn_data = self.graph.edge_data(uturn_edge.edge);
                    if uturn_data.reversed {
                        // Can't turn back onto a oneway
                        false
                    } else if is_restricted(previous_node) {
                        false
                    } else {
                        // A dead end is a road that can only be left by
                        // turning back: at most one adjacent edge runs in
                        // both directions.
                        let bidirectional_edges = self
                            .graph
                            .adjacent_edges(node_at_intersection)
                            .filter(|&edge| {
                                let to_node = self.graph.target(edge);
                                let reverse_edge =
                                    self.graph.find_edge(to_node, node_at_intersection);
                                reverse_edge != EdgeID::INVALID
                                    && !self.graph.edge_data(reverse_edge).reversed
                            })
                            .count();
                        bidirectional_edges <= 1
                    }
                };
                view[idx].entry_allowed = allow_uturn_at_dead_end;
            }
        }

        view.sort_by_key(|road| NotNan::new(road.angle).unwrap());
        let view = IntersectionView::new(view);
        debug_assert!(
            view[0].angle >= 0.0 && view[0].angle < f64::EPSILON,
            "the u-turn doesn't anchor the view (angle {})",
            view[0].angle
        );
        view
    }

    /// Follows `via_edge` through chains of trivial two-degree nodes and
    /// returns the view at the first real intersection, along with the
    /// resolved `(from, via)` pair that reaches it.
    pub fn get_actual_next_intersection(
        &self,
        starting_node: NodeID,
        via_edge: EdgeID,
    ) -> (IntersectionView, NodeID, EdgeID) {
        let mut query_node = starting_node;
        let mut query_edge = via_edge;

        // Remembering the visited nodes terminates degenerate cycles of
        // pass-through nodes.
        let mut visited_nodes: HashSet<NodeID> = HashSet::new();
        while !visited_nodes.contains(&query_node)
            && self.graph.out_degree(self.graph.target(query_edge)) == 2
        {
            visited_nodes.insert(query_node);
            let next_node = self.graph.target(query_edge);
            let next_edge = self.next_edge_through(query_node, query_edge);
            if let Err(reason) = self.can_skip_through(query_edge, next_edge, starting_node) {
                debug!("Stopping the walk at {}: {}", next_node, reason);
                break;
            }
            query_node = next_node;
            query_edge = next_edge;
        }

        let view = self.get_connected_roads(query_node, query_edge);
        (view, query_node, query_edge)
    }

    // Of the two edges leaving the degree-two node ahead of `via`, the one
    // that doesn't point back to `from`.
    fn next_edge_through(&self, from: NodeID, via: EdgeID) -> EdgeID {
        let new_node = self.graph.target(via);
        debug_assert_eq!(self.graph.out_degree(new_node), 2);
        let begin_edges_new_node = self.graph.begin_edges(new_node);
        if self.graph.target(begin_edges_new_node) == from {
            EdgeID(begin_edges_new_node.0 + 1)
        } else {
            begin_edges_new_node
        }
    }

    fn can_skip_through(
        &self,
        via_edge: EdgeID,
        next_edge: EdgeID,
        starting_node: NodeID,
    ) -> Result<()> {
        if !self
            .graph
            .edge_data(via_edge)
            .compatible_to(self.graph.edge_data(next_edge))
        {
            bail!("the road changes character");
        }
        if self.graph.target(next_edge) == starting_node {
            bail!("the road loops back to the start");
        }
        Ok(())
    }

    /// The destination of an only-turn restriction on `(coming_from_node,
    /// node_at_intersection)`, if one exists *and* still references an
    /// adjacent node. Restrictions pointing at roads some other pass removed
    /// are ignored; better to route over the intersection permissively than
    /// to not route over it at all.
    fn only_allowed_turn_if_existent(
        &self,
        coming_from_node: NodeID,
        node_at_intersection: NodeID,
    ) -> Option<NodeID> {
        let destination = self
            .restrictions
            .only_turn_destination(coming_from_node, node_at_intersection)?;
        for onto_edge in self.graph.adjacent_edges(node_at_intersection) {
            if self.graph.target(onto_edge) == destination {
                return Some(destination);
            }
        }
        warn!(
            "Ignoring an only-turn restriction via {}: {} isn't adjacent",
            node_at_intersection, destination
        );
        None
    }
}
