//! Places a label anchor inside each facet using a pole-of-inaccessibility
//! search (recursive cell subdivision maximizing distance to the polygon
//! boundary), treating fully-enclosed neighbour facets as holes. See
//! SPEC_FULL.md §4.7.
//!
//! Grounded on the original's `facetlabelplacer.py` for the polygon/hole
//! construction and the exact `label_bounds` padding formula
//! (`inner_padding = 2*sqrt(2*distance)`). The polylabel cell-subdivision
//! search itself has no pack precedent — neither the teacher nor
//! `other_examples/` implements it — so it is written directly from the
//! well-known Mapbox polylabel algorithm as described in SPEC_FULL.md
//! §4.7; see DESIGN.md for this explicit note.

use crate::facet::{Facet, LabelBounds, SegmentPoint};
use crate::facet::FacetResult;

/// Reconstructs a facet's outer boundary ring by walking its
/// `border_segments` in order, reversing each referenced canonical
/// segment when `reverse_order` is set.
fn facet_ring(result: &FacetResult, facet_id: u32) -> Vec<SegmentPoint> {
    let facet = match result.get(facet_id) {
        Some(f) => f,
        None => return Vec::new(),
    };
    let mut ring = Vec::new();
    for bs in facet.border_segments.as_deref().unwrap_or(&[]) {
        let seg = &result.segments[bs.segment_index];
        if bs.reverse_order {
            ring.extend(seg.points.iter().rev().copied());
        } else {
            ring.extend(seg.points.iter().copied());
        }
    }
    ring
}

fn bbox_strictly_contains(outer: &Facet, inner: &Facet) -> bool {
    inner.bbox.min_x > outer.bbox.min_x
        && inner.bbox.min_y > outer.bbox.min_y
        && inner.bbox.max_x < outer.bbox.max_x
        && inner.bbox.max_y < outer.bbox.max_y
}

fn seg_dist_sq(px: f64, py: f64, a: SegmentPoint, b: SegmentPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        let ddx = px - a.x;
        let ddy = py - a.y;
        return ddx * ddx + ddy * ddy;
    }
    let t = (((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    let ddx = px - cx;
    let ddy = py - cy;
    ddx * ddx + ddy * ddy
}

/// Signed distance from `(px, py)` to the polygon formed by `rings`
/// (outer ring first, then any holes), using the even-odd rule over all
/// rings combined so holes naturally subtract from the interior.
fn point_to_polygon_dist(px: f64, py: f64, rings: &[Vec<SegmentPoint>]) -> f64 {
    let mut inside = false;
    let mut min_dist_sq = f64::INFINITY;

    for ring in rings {
        if ring.len() < 2 {
            continue;
        }
        let len = ring.len();
        for i in 0..len {
            let a = ring[i];
            let b = ring[(i + 1) % len];
            if (a.y > py) != (b.y > py) {
                let x_intersect = (b.x - a.x) * (py - a.y) / (b.y - a.y) + a.x;
                if px < x_intersect {
                    inside = !inside;
                }
            }
            min_dist_sq = min_dist_sq.min(seg_dist_sq(px, py, a, b));
        }
    }

    let d = min_dist_sq.sqrt();
    if inside {
        d
    } else {
        -d
    }
}

struct Cell {
    x: f64,
    y: f64,
    half: f64,
    distance: f64,
    max_potential: f64,
}

fn make_cell(x: f64, y: f64, half: f64, rings: &[Vec<SegmentPoint>]) -> Cell {
    let distance = point_to_polygon_dist(x, y, rings);
    Cell {
        x,
        y,
        half,
        distance,
        max_potential: distance + half * std::f64::consts::SQRT_2,
    }
}

/// Finds the point inside `rings` (outer ring + holes) that maximizes the
/// minimum distance to the boundary, by recursive cell subdivision.
/// `precision` bounds how close to optimal the search settles.
fn polylabel(rings: &[Vec<SegmentPoint>], precision: f64) -> (f64, f64, f64) {
    let outer = &rings[0];
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in outer {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let width = max_x - min_x;
    let height = max_y - min_y;
    let cell_size = width.min(height);
    if cell_size == 0.0 {
        return (min_x, min_y, 0.0);
    }
    let mut half = cell_size / 2.0;

    // Seed the queue with a grid of cells covering the bbox. A simple
    // Vec scanned for the max-potential cell each pop keeps this readable
    // without needing an `Ord` wrapper around `f64` for a `BinaryHeap`.
    let mut queue: Vec<Cell> = Vec::new();
    let mut x = min_x;
    while x < max_x {
        let mut y = min_y;
        while y < max_y {
            queue.push(make_cell(x + half, y + half, half, rings));
            y += cell_size;
        }
        x += cell_size;
    }

    let centroid = make_cell(min_x + width / 2.0, min_y + height / 2.0, 0.0, rings);
    let mut best = if centroid.distance > 0.0 {
        centroid
    } else {
        make_cell(min_x, min_y, 0.0, rings)
    };

    while let Some(pos) = queue
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.max_potential.partial_cmp(&b.max_potential).unwrap())
        .map(|(i, _)| i)
    {
        let cell = queue.swap_remove(pos);

        if cell.distance > best.distance {
            best = Cell {
                x: cell.x,
                y: cell.y,
                half: cell.half,
                distance: cell.distance,
                max_potential: cell.max_potential,
            };
        }

        if cell.max_potential - best.distance <= precision {
            continue;
        }

        half = cell.half / 2.0;
        for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            queue.push(make_cell(cell.x + dx * half, cell.y + dy * half, half, rings));
        }
    }

    (best.x, best.y, best.distance)
}

/// Computes `label_bounds` for every facet in `facets_in_order`.
pub fn place_labels(result: &mut FacetResult, facets_in_order: &[u32]) {
    log::debug!("label_placer: placing labels for {} facets", facets_in_order.len());

    let rings_by_facet: std::collections::HashMap<u32, Vec<SegmentPoint>> = facets_in_order
        .iter()
        .map(|&id| (id, facet_ring(result, id)))
        .collect();

    for &id in facets_in_order {
        let outer = match rings_by_facet.get(&id) {
            Some(r) if r.len() >= 2 => r.clone(),
            _ => continue,
        };

        let facet = result.get(id).unwrap();
        let mut rings = vec![outer];
        if let Some(neighbours) = facet.neighbour_facets.clone() {
            for nid in neighbours {
                if nid == id {
                    continue;
                }
                let (contains, hole_ring) = match (result.get(id), result.get(nid)) {
                    (Some(outer_facet), Some(inner_facet)) => (
                        bbox_strictly_contains(outer_facet, inner_facet),
                        rings_by_facet.get(&nid).cloned(),
                    ),
                    _ => (false, None),
                };
                if contains {
                    if let Some(hole) = hole_ring {
                        if hole.len() >= 2 {
                            rings.push(hole);
                        }
                    }
                }
            }
        }

        let (x, y, distance) = polylabel(&rings, 1.0);
        let half_side = 2.0 * (2.0 * distance.max(0.0)).sqrt();

        if let Some(facet) = result.get_mut(id) {
            facet.label_bounds = Some(LabelBounds {
                center_x: x,
                center_y: y,
                half_side,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<SegmentPoint> {
        vec![
            SegmentPoint::new(min, min),
            SegmentPoint::new(max, min),
            SegmentPoint::new(max, max),
            SegmentPoint::new(min, max),
        ]
    }

    #[test]
    fn polylabel_centers_in_a_simple_square() {
        let rings = vec![square(0.0, 10.0)];
        let (x, y, distance) = polylabel(&rings, 0.5);
        assert!((x - 5.0).abs() < 1.0, "x={}", x);
        assert!((y - 5.0).abs() < 1.0, "y={}", y);
        assert!((distance - 5.0).abs() < 1.0, "distance={}", distance);
    }

    #[test]
    fn point_to_polygon_dist_is_negative_outside() {
        let rings = vec![square(0.0, 10.0)];
        assert!(point_to_polygon_dist(20.0, 20.0, &rings) < 0.0);
        assert!(point_to_polygon_dist(5.0, 5.0, &rings) > 0.0);
    }

    #[test]
    fn hole_ring_is_excluded_from_interior() {
        let rings = vec![square(0.0, 10.0), square(4.0, 6.0)];
        // center of the hole should now read as outside (negative distance)
        assert!(point_to_polygon_dist(5.0, 5.0, &rings) < 0.0);
        // a point between the hole and the outer edge is still inside
        assert!(point_to_polygon_dist(1.0, 1.0, &rings) > 0.0);
    }
}
