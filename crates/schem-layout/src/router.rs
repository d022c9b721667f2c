//! C8 — Orthogonal Router (`spec.md` §4.7).
//!
//! Grounded on the routing-graph / route-then-map-to-segments shape of an
//! obstacle-aware orthogonal router (`layoutalg::ortho`'s
//! `create_routing_graph` / `route_edges` / `map_routes_to_segments`
//! pipeline), simplified here to a deterministic bounded-bend search
//! instead of a full channel-routing graph: for each hyperedge, candidate
//! L- and Z-shaped polylines are generated honoring each anchor's
//! visibility direction, then scored by obstacle-buffer intersections and
//! bend count, picking the cheapest collision-free candidate.
//!
//! The router is transactional and not reentrant (`spec.md` §4.7 "State"):
//! `route_all` takes the full obstacle set and edge set for one `layout()`
//! call and holds no state afterward.

use schem_core::geom::Rect;
use schem_core::model::{Obstacle, VisibilityDirection};
use tracing::warn;

use crate::connectivity::{Anchor, BinaryEdge};

const STUB_LENGTH: f64 = 10.0;
const OBSTACLE_BUFFER: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct RoutedEdge {
    pub polyline: Vec<(f64, f64)>,
}

/// Routes every edge independently against the full obstacle set. Returns
/// one `Option<RoutedEdge>` per input edge, in order; `None` means the
/// edge is dropped (`spec.md` §4.7 "Failure").
pub fn route_all(obstacles: &[Obstacle], edges: &[BinaryEdge]) -> Vec<Option<RoutedEdge>> {
    let inflated: Vec<(String, Rect)> = obstacles
        .iter()
        .map(|o| (o.id.clone(), o.rect.inflate(OBSTACLE_BUFFER)))
        .collect();

    edges
        .iter()
        .map(|edge| {
            let own_ids = [edge.source.node_id.as_str(), edge.target.node_id.as_str()];
            let relevant: Vec<&Rect> = inflated
                .iter()
                .filter(|(id, _)| !own_ids.contains(&id.as_str()))
                .map(|(_, rect)| rect)
                .collect();
            route_one(&edge.source, &edge.target, &relevant)
        })
        .collect()
}

fn route_one(source: &Anchor, target: &Anchor, obstacles: &[&Rect]) -> Option<RoutedEdge> {
    let src_stub = stub_point(source);
    let tgt_stub = stub_point(target);

    let mut candidates: Vec<Vec<(f64, f64)>> = Vec::new();

    if direct_path_respects_visibility(source, target) {
        candidates.push(vec![(source.x, source.y), (target.x, target.y)]);
    }

    candidates.push(build_polyline(
        source,
        target,
        src_stub,
        tgt_stub,
        (tgt_stub.0, src_stub.1),
    ));
    candidates.push(build_polyline(
        source,
        target,
        src_stub,
        tgt_stub,
        (src_stub.0, tgt_stub.1),
    ));
    let mid = ((src_stub.0 + tgt_stub.0) / 2.0, (src_stub.1 + tgt_stub.1) / 2.0);
    candidates.push(build_polyline(
        source,
        target,
        src_stub,
        tgt_stub,
        (mid.0, src_stub.1),
    ));
    candidates.push(build_polyline(
        source,
        target,
        src_stub,
        tgt_stub,
        (src_stub.0, mid.1),
    ));

    let best = candidates
        .into_iter()
        .map(|polyline| {
            let collisions = count_collisions(&polyline, obstacles);
            let bends = polyline.len();
            (collisions, bends, polyline)
        })
        .min_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    match best {
        Some((0, _, polyline)) => Some(RoutedEdge {
            polyline: dedup_collinear(polyline),
        }),
        Some((_, _, _)) => {
            warn!(
                source = %source.port_id,
                target = %target.port_id,
                "no collision-free route found, dropping edge"
            );
            None
        }
        None => None,
    }
}

/// A straight two-point path is only legal when it is also the direction
/// each anchor's `visibility_direction` permits leaving from — a direct
/// line that backs a port into its own pad is not a valid route even when
/// it is collision-free and aligned (`spec.md` §4.7 "The router must
/// respect each anchor's `visibility_direction`").
fn direct_path_respects_visibility(source: &Anchor, target: &Anchor) -> bool {
    let dx = target.x - source.x;
    let dy = target.y - source.y;

    if dy.abs() < 1e-9 && dx.abs() >= 1e-9 {
        let (source_needs, target_needs) = if dx > 0.0 {
            (VisibilityDirection::E, VisibilityDirection::W)
        } else {
            (VisibilityDirection::W, VisibilityDirection::E)
        };
        return allows(source.visibility_direction, source_needs)
            && allows(target.visibility_direction, target_needs);
    }

    if dx.abs() < 1e-9 && dy.abs() >= 1e-9 {
        let (source_needs, target_needs) = if dy > 0.0 {
            (VisibilityDirection::S, VisibilityDirection::N)
        } else {
            (VisibilityDirection::N, VisibilityDirection::S)
        };
        return allows(source.visibility_direction, source_needs)
            && allows(target.visibility_direction, target_needs);
    }

    // Coincident anchors, or not axis-aligned at all (no direct candidate
    // is offered in the latter case regardless of this check).
    dx.abs() < 1e-9 && dy.abs() < 1e-9
}

fn allows(direction: VisibilityDirection, needed: VisibilityDirection) -> bool {
    direction == VisibilityDirection::All || direction == needed
}

fn stub_point(anchor: &Anchor) -> (f64, f64) {
    match anchor.visibility_direction {
        VisibilityDirection::N => (anchor.x, anchor.y - STUB_LENGTH),
        VisibilityDirection::S => (anchor.x, anchor.y + STUB_LENGTH),
        VisibilityDirection::E => (anchor.x + STUB_LENGTH, anchor.y),
        VisibilityDirection::W => (anchor.x - STUB_LENGTH, anchor.y),
        VisibilityDirection::All => (anchor.x, anchor.y),
    }
}

fn build_polyline(
    source: &Anchor,
    target: &Anchor,
    src_stub: (f64, f64),
    tgt_stub: (f64, f64),
    bend: (f64, f64),
) -> Vec<(f64, f64)> {
    let mut points = vec![(source.x, source.y)];
    if src_stub != (source.x, source.y) {
        points.push(src_stub);
    }
    if bend != src_stub && bend != tgt_stub {
        points.push(bend);
    }
    if tgt_stub != (target.x, target.y) {
        points.push(tgt_stub);
    }
    points.push((target.x, target.y));
    points
}

fn dedup_collinear(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if points.len() < 3 {
        return points;
    }
    let mut out = vec![points[0]];
    for window in points.windows(3) {
        let (a, b, c) = (window[0], window[1], window[2]);
        let collinear_horizontal = (a.1 - b.1).abs() < 1e-9 && (b.1 - c.1).abs() < 1e-9;
        let collinear_vertical = (a.0 - b.0).abs() < 1e-9 && (b.0 - c.0).abs() < 1e-9;
        if !(collinear_horizontal || collinear_vertical) {
            out.push(b);
        }
    }
    out.push(*points.last().unwrap());
    out
}

fn count_collisions(polyline: &[(f64, f64)], obstacles: &[&Rect]) -> usize {
    polyline
        .windows(2)
        .map(|w| {
            let seg_rect = Rect::from_min_max(
                w[0].0.min(w[1].0),
                w[0].1.min(w[1].1),
                w[0].0.max(w[1].0),
                w[0].1.max(w[1].1),
            );
            obstacles
                .iter()
                .filter(|rect| seg_rect.intersects(rect))
                .count()
        })
        .sum()
}

/// Every segment in `polyline` must be horizontal or vertical
/// (`spec.md` §3 invariant 2, §4.7 "Contract").
pub fn is_orthogonal(polyline: &[(f64, f64)]) -> bool {
    polyline
        .windows(2)
        .all(|w| (w[0].0 - w[1].0).abs() < 1e-9 || (w[0].1 - w[1].1).abs() < 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(id: &str, node: &str, x: f64, y: f64, dir: VisibilityDirection) -> Anchor {
        Anchor {
            port_id: id.to_string(),
            node_id: node.to_string(),
            x,
            y,
            visibility_direction: dir,
            is_symbol_anchor: false,
        }
    }

    #[test]
    fn routes_aligned_anchors_directly() {
        let source = anchor("a", "A", 0.0, 0.0, VisibilityDirection::E);
        let target = anchor("b", "B", 100.0, 0.0, VisibilityDirection::W);
        let routed = route_one(&source, &target, &[]).unwrap();
        assert!(is_orthogonal(&routed.polyline));
        assert_eq!(routed.polyline.first(), Some(&(0.0, 0.0)));
        assert_eq!(routed.polyline.last(), Some(&(100.0, 0.0)));
    }

    #[test]
    fn routes_perpendicular_anchors_with_a_bend() {
        let source = anchor("a", "A", 0.0, 0.0, VisibilityDirection::E);
        let target = anchor("b", "B", 100.0, 100.0, VisibilityDirection::S);
        let routed = route_one(&source, &target, &[]).unwrap();
        assert!(is_orthogonal(&routed.polyline));
        assert_eq!(routed.polyline.first(), Some(&(0.0, 0.0)));
        assert_eq!(routed.polyline.last(), Some(&(100.0, 100.0)));
    }

    #[test]
    fn aligned_anchors_facing_away_from_each_other_do_not_route_directly() {
        // Both ports must leave the pad away from each other (E faces right,
        // W faces left, but the target sits to the left of the source), so a
        // straight 2-point path would back both ports into their own pads.
        let source = anchor("a", "A", 200.0, 0.0, VisibilityDirection::E);
        let target = anchor("b", "B", 100.0, 0.0, VisibilityDirection::W);
        let routed = route_one(&source, &target, &[]).unwrap();
        assert_ne!(routed.polyline, vec![(200.0, 0.0), (100.0, 0.0)]);
        assert!(is_orthogonal(&routed.polyline));
    }

    #[test]
    fn drops_edge_with_no_collision_free_candidate() {
        let source = anchor("a", "A", 0.0, 0.0, VisibilityDirection::All);
        let target = anchor("b", "B", 10.0, 10.0, VisibilityDirection::All);
        let blocking = Rect::from_min_max(-1000.0, -1000.0, 1000.0, 1000.0);
        let routed = route_one(&source, &target, &[&blocking]);
        assert!(routed.is_none());
    }
}
