//! Splits each facet's closed border path at neighbour-facet transitions,
//! smooths each resulting segment with repeated pairwise averaging, and
//! matches segments pairwise between adjacent facets so the shared
//! boundary geometry is represented once. See SPEC_FULL.md §4.6.
//!
//! Grounded on the original's `facetbordersegmenter.py`:
//! `build_facet_border_segments`, `_prepare_segments_per_facet`,
//! `_reduce_segment_haar_wavelet`, `_is_outside_border_point`,
//! `_match_segments_with_neighbours`.

use crate::facet::{FacetBoundarySegment, Orientation, PathPoint, PathSegment, SegmentPoint};
use crate::facet::Facet;
use crate::facet::FacetResult;
use crate::grid::Grid;

/// Matching tolerance in geometric (wall-coordinate) distance. Kept as a
/// literal constant, not exposed via `Settings`, matching the original
/// (see DESIGN.md Open Question resolution #3).
const MAX_SEGMENT_MATCH_DISTANCE: f64 = 4.0;
/// Segments this short are left untouched by a smoothing pass (matches
/// the original's `MIN_PATH_LENGTH_FOR_REDUCTION`).
const MIN_LENGTH_FOR_SMOOTHING: usize = 5;

struct RawSegment {
    points: Vec<SegmentPoint>,
    neighbour: Option<u32>,
    consumed: bool,
}

/// The diagonal corner pixel shared between two orientations meeting at a
/// same-pixel rotation (e.g. Left -> Top rotates around the pixel's
/// upper-left corner). `None` for orientation pairs that never occur as a
/// rotation (identical or opposite orientations).
fn diagonal_corner(a: Orientation, b: Orientation, x: i32, y: i32) -> Option<(i32, i32)> {
    use Orientation::*;
    match (a, b) {
        (Left, Top) | (Top, Left) => Some((x - 1, y - 1)),
        (Top, Right) | (Right, Top) => Some((x + 1, y - 1)),
        (Right, Bottom) | (Bottom, Right) => Some((x + 1, y + 1)),
        (Bottom, Left) | (Left, Bottom) => Some((x - 1, y + 1)),
        _ => None,
    }
}

/// For a same-pixel rotation transition (`prev` and `cur` share a pixel but
/// not an orientation), the facet id of the diagonal corner pixel the
/// rotation turns around — or `None` if `prev`/`cur` aren't a rotation
/// pair, or the corner falls outside the image.
fn rotation_diagonal_facet(facet_map: &Grid<u32>, prev: PathPoint, cur: PathPoint) -> Option<Option<u32>> {
    if prev.x != cur.x || prev.y != cur.y || prev.orientation == cur.orientation {
        return None;
    }
    let (cx, cy) = diagonal_corner(prev.orientation, cur.orientation, prev.x, prev.y)?;
    Some(facet_map.get(cx, cy).copied())
}

/// Splits a closed wall-edge loop into runs that each face a single
/// neighbour facet. A transition is either a plain neighbour change across
/// the wall (straight move or diagonal turn — `PathPoint::neighbour` is
/// well-defined from orientation alone, so a pairwise comparison catches
/// both) or, for a same-pixel rotation, the diagonal corner pixel at the
/// turn belonging to a third facet distinct from both the current facet
/// and the neighbour seen on either flank.
fn split_segments(path: &[PathPoint], facet_map: &Grid<u32>, facet_id: u32) -> Vec<RawSegment> {
    let n = path.len();
    if n == 0 {
        return Vec::new();
    }

    let neighbours: Vec<Option<u32>> = path.iter().map(|p| p.neighbour(facet_map)).collect();

    let is_boundary = |i: usize, prev: usize| -> bool {
        if neighbours[i] != neighbours[prev] {
            return true;
        }
        if let Some(diag) = rotation_diagonal_facet(facet_map, path[prev], path[i]) {
            if diag != Some(facet_id) && diag != neighbours[prev] {
                return true;
            }
        }
        false
    };

    let mut start = 0;
    let mut found_boundary = false;
    for i in 0..n {
        let prev = (i + n - 1) % n;
        if is_boundary(i, prev) {
            start = i;
            found_boundary = true;
            break;
        }
    }

    if !found_boundary {
        return vec![RawSegment {
            points: path.iter().map(|p| SegmentPoint::from_path_point(*p)).collect(),
            neighbour: neighbours[0],
            consumed: false,
        }];
    }

    let mut segments = Vec::new();
    let mut current_points = vec![SegmentPoint::from_path_point(path[start])];
    let mut current_neighbour = neighbours[start];
    let mut i = (start + 1) % n;
    while i != start {
        let prev = (i + n - 1) % n;
        if !is_boundary(i, prev) {
            current_points.push(SegmentPoint::from_path_point(path[i]));
        } else {
            segments.push(RawSegment {
                points: std::mem::take(&mut current_points),
                neighbour: current_neighbour,
                consumed: false,
            });
            current_points.push(SegmentPoint::from_path_point(path[i]));
            current_neighbour = neighbours[i];
        }
        i = (i + 1) % n;
    }
    segments.push(RawSegment {
        points: current_points,
        neighbour: current_neighbour,
        consumed: false,
    });
    segments
}

fn is_on_image_frame(p: SegmentPoint, width: u32, height: u32) -> bool {
    p.x <= 0.0 || p.y <= 0.0 || p.x >= (width as f64 - 1.0) || p.y >= (height as f64 - 1.0)
}

/// One Haar-style smoothing pass: keeps the first and last point verbatim,
/// and replaces each interior pair with its midpoint. Points on the image
/// frame are preserved verbatim (both pair members kept) so the outer
/// boundary doesn't erode.
fn smooth_once(points: &[SegmentPoint], width: u32, height: u32) -> Vec<SegmentPoint> {
    if points.len() <= MIN_LENGTH_FOR_SMOOTHING {
        return points.to_vec();
    }

    let mut result = Vec::with_capacity(points.len() / 2 + 2);
    result.push(points[0]);

    // Pairwise-average everything strictly between the first and last
    // point; those two are always kept verbatim so the segment's
    // endpoints never drift away from the facets they join.
    let interior = &points[1..points.len() - 1];
    let mut i = 0;
    while i + 1 < interior.len() {
        let a = interior[i];
        let b = interior[i + 1];
        if is_on_image_frame(a, width, height) || is_on_image_frame(b, width, height) {
            result.push(a);
            result.push(b);
        } else {
            result.push(SegmentPoint::midpoint(a, b));
        }
        i += 2;
    }
    if i < interior.len() {
        // odd interior count: leave the last unpaired interior point as-is
        result.push(interior[i]);
    }

    result.push(*points.last().unwrap());
    result
}

fn smooth(points: Vec<SegmentPoint>, passes: usize, width: u32, height: u32) -> Vec<SegmentPoint> {
    let mut current = points;
    for _ in 0..passes {
        current = smooth_once(&current, width, height);
    }
    current
}

/// Each endpoint pair must individually fall within
/// `MAX_SEGMENT_MATCH_DISTANCE` (Manhattan) — not a summed/doubled budget
/// across both pairs, which would let one close endpoint compensate for a
/// far one.
fn endpoints_match(a: &[SegmentPoint], b: &[SegmentPoint]) -> Option<bool> {
    let (a0, a1) = (*a.first()?, *a.last()?);
    let (b0, b1) = (*b.first()?, *b.last()?);

    let straight = a0.distance(&b0).max(a1.distance(&b1));
    let reversed = a0.distance(&b1).max(a1.distance(&b0));

    if straight <= MAX_SEGMENT_MATCH_DISTANCE && straight <= reversed {
        Some(false)
    } else if reversed <= MAX_SEGMENT_MATCH_DISTANCE {
        Some(true)
    } else {
        None
    }
}

/// Builds, smooths, and cross-matches every facet's border segments.
/// `facets_in_order` should be every surviving facet id, ascending.
pub fn segment_all(
    result: &mut FacetResult,
    facets_in_order: &[u32],
    smoothing_passes: usize,
    width: u32,
    height: u32,
) {
    log::debug!(
        "border_segmenter: segmenting {} facets, {} smoothing passes",
        facets_in_order.len(),
        smoothing_passes
    );

    let mut working: std::collections::HashMap<u32, Vec<RawSegment>> = std::collections::HashMap::new();
    for &id in facets_in_order {
        let path = result
            .get(id)
            .and_then(|f: &Facet| f.border_path.clone())
            .unwrap_or_default();
        let mut segments = split_segments(&path, &result.facet_map, id);
        for seg in &mut segments {
            seg.points = smooth(std::mem::take(&mut seg.points), smoothing_passes, width, height);
        }
        working.insert(id, segments);
    }

    // Maps (facet_id, raw_segment_index) -> the facet's final view of the
    // canonical segment. Built in discovery order but applied in each
    // facet's own natural cyclic order below, so `get_full_path_from_
    // border_segments`-style reconstruction stays contiguous even for the
    // peer side of a match.
    let mut refs: std::collections::HashMap<(u32, usize), FacetBoundarySegment> =
        std::collections::HashMap::new();
    let mut unmatched_count = 0usize;

    for &a_id in facets_in_order {
        let seg_count = working[&a_id].len();
        for seg_idx in 0..seg_count {
            if working[&a_id][seg_idx].consumed {
                continue;
            }
            let neighbour = working[&a_id][seg_idx].neighbour;
            let a_points = working[&a_id][seg_idx].points.clone();

            let matched = match neighbour {
                None => None,
                Some(b_id) => working.get(&b_id).and_then(|b_segments| {
                    b_segments.iter().enumerate().find_map(|(b_idx, b_seg)| {
                        if b_seg.consumed || b_seg.neighbour != Some(a_id) {
                            return None;
                        }
                        endpoints_match(&a_points, &b_seg.points).map(|reverse| (b_idx, reverse))
                    })
                }),
            };

            let canonical_idx = result.segments.len();
            result.segments.push(PathSegment {
                points: a_points,
                neighbour,
            });
            refs.insert(
                (a_id, seg_idx),
                FacetBoundarySegment {
                    segment_index: canonical_idx,
                    reverse_order: false,
                },
            );
            working.get_mut(&a_id).unwrap()[seg_idx].consumed = true;

            match (neighbour, matched) {
                (Some(b_id), Some((b_idx, reverse))) => {
                    working.get_mut(&b_id).unwrap()[b_idx].consumed = true;
                    refs.insert(
                        (b_id, b_idx),
                        FacetBoundarySegment {
                            segment_index: canonical_idx,
                            reverse_order: !reverse,
                        },
                    );
                }
                (Some(b_id), None) => {
                    unmatched_count += 1;
                    log::warn!(
                        "border_segmenter: segment on facet {} (neighbour {}) unmatched within tolerance",
                        a_id,
                        b_id
                    );
                }
                (None, _) => {}
            }
        }
    }

    for &id in facets_in_order {
        let seg_count = working[&id].len();
        let ordered: Vec<FacetBoundarySegment> = (0..seg_count)
            .map(|i| refs[&(id, i)])
            .collect();
        if let Some(facet) = result.get_mut(id) {
            facet.border_segments = Some(ordered);
        }
    }

    if unmatched_count > 0 {
        log::warn!("border_segmenter: {} unmatched segments total", unmatched_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border_tracer::{trace, TracerScratch};
    use crate::facet_builder::build_facets;

    #[test]
    fn single_facet_full_image_has_one_image_edge_segment() {
        let grid = Grid::new(3, 3, 0u16);
        let mut result = build_facets(&grid);
        let mut scratch = TracerScratch::new(3, 3);
        let path = {
            let facet = result.get(0).unwrap();
            trace(0, &result.facet_map, &facet.border_points, &mut scratch).unwrap()
        };
        result.get_mut(0).unwrap().border_path = Some(path);

        segment_all(&mut result, &[0], 0, 3, 3);

        let facet = result.get(0).unwrap();
        let segs = facet.border_segments.as_ref().unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(result.segments[segs[0].segment_index].neighbour, None);
    }

    #[test]
    fn two_facets_share_exactly_one_matched_segment() {
        let mut grid = Grid::new(4, 2, 0u16);
        grid.set(2, 0, 1);
        grid.set(3, 0, 1);
        grid.set(2, 1, 1);
        grid.set(3, 1, 1);
        let mut result = build_facets(&grid);
        let mut scratch = TracerScratch::new(4, 2);

        let ids: Vec<u32> = (0..result.facets.len() as u32).collect();
        for &id in &ids {
            let path = {
                let facet = result.get(id).unwrap();
                trace(id, &result.facet_map, &facet.border_points, &mut scratch).unwrap()
            };
            result.get_mut(id).unwrap().border_path = Some(path);
        }

        segment_all(&mut result, &ids, 0, 4, 2);

        let shared_count: usize = ids
            .iter()
            .map(|&id| {
                result
                    .get(id)
                    .unwrap()
                    .border_segments
                    .as_ref()
                    .unwrap()
                    .iter()
                    .filter(|s| result.segments[s.segment_index].neighbour.is_some())
                    .count()
            })
            .sum();
        // each side owns or references exactly one shared segment
        assert_eq!(shared_count, 2);
    }
}
