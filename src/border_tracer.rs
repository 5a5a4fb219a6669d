//! Wall-following border tracer: walks the outer boundary of a facet one
//! wall-edge at a time, keeping the facet on its interior side. See
//! SPEC_FULL.md §4.5.
//!
//! Grounded on the original's `facetbordertracer.py` (`build_facet_border_paths`,
//! `_get_path`, `_add_point_to_path`, and the four `_check_*_orientation`
//! methods) — the candidate priority order (rotations, then straight
//! moves, then diagonal turns) mirrors that file exactly. Dispatch on the
//! current orientation is a plain `match` over a 4-variant enum (a tagged
//! sum), not a trait object, per SPEC_FULL.md §9.

use crate::error::{PbnError, Result};
use crate::facet::{Orientation, PathPoint};
use crate::geometry::Point;
use crate::grid::Grid;
use std::collections::HashSet;

/// Scratch state reused across facets within a single Border Tracer run,
/// matching the original's wall-grid reuse for big images.
pub struct TracerScratch {
    x_wall: Grid<bool>,
    y_wall: Grid<bool>,
}

impl TracerScratch {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x_wall: Grid::new(width + 1, height, false),
            y_wall: Grid::new(width, height + 1, false),
        }
    }

    fn is_marked(&self, p: PathPoint) -> bool {
        match p.orientation {
            Orientation::Left => *self.x_wall.get_checked(p.x as u32, p.y as u32),
            Orientation::Right => *self.x_wall.get_checked((p.x + 1) as u32, p.y as u32),
            Orientation::Top => *self.y_wall.get_checked(p.x as u32, p.y as u32),
            Orientation::Bottom => *self.y_wall.get_checked(p.x as u32, (p.y + 1) as u32),
        }
    }

    fn mark(&mut self, p: PathPoint) {
        match p.orientation {
            Orientation::Left => self.x_wall.set(p.x as u32, p.y as u32, true),
            Orientation::Right => self.x_wall.set((p.x + 1) as u32, p.y as u32, true),
            Orientation::Top => self.y_wall.set(p.x as u32, p.y as u32, true),
            Orientation::Bottom => self.y_wall.set(p.x as u32, (p.y + 1) as u32, true),
        }
    }

    fn unmark(&mut self, p: PathPoint) {
        match p.orientation {
            Orientation::Left => self.x_wall.set(p.x as u32, p.y as u32, false),
            Orientation::Right => self.x_wall.set((p.x + 1) as u32, p.y as u32, false),
            Orientation::Top => self.y_wall.set(p.x as u32, p.y as u32, false),
            Orientation::Bottom => self.y_wall.set(p.x as u32, (p.y + 1) as u32, false),
        }
    }
}

fn is_outward(facet_map: &Grid<u32>, facet_id: u32, p: PathPoint) -> bool {
    p.neighbour(facet_map) != Some(facet_id)
}

fn rotation_candidates(p: PathPoint) -> [PathPoint; 2] {
    let (o1, o2) = match p.orientation {
        Orientation::Left => (Orientation::Top, Orientation::Bottom),
        Orientation::Top => (Orientation::Right, Orientation::Left),
        Orientation::Right => (Orientation::Bottom, Orientation::Top),
        Orientation::Bottom => (Orientation::Left, Orientation::Right),
    };
    [
        PathPoint::new(p.x, p.y, o1),
        PathPoint::new(p.x, p.y, o2),
    ]
}

fn straight_candidates(p: PathPoint) -> [PathPoint; 2] {
    match p.orientation {
        Orientation::Left => [
            PathPoint::new(p.x, p.y - 1, Orientation::Left),
            PathPoint::new(p.x, p.y + 1, Orientation::Left),
        ],
        Orientation::Right => [
            PathPoint::new(p.x, p.y + 1, Orientation::Right),
            PathPoint::new(p.x, p.y - 1, Orientation::Right),
        ],
        Orientation::Top => [
            PathPoint::new(p.x + 1, p.y, Orientation::Top),
            PathPoint::new(p.x - 1, p.y, Orientation::Top),
        ],
        Orientation::Bottom => [
            PathPoint::new(p.x - 1, p.y, Orientation::Bottom),
            PathPoint::new(p.x + 1, p.y, Orientation::Bottom),
        ],
    }
}

fn diagonal_candidates(p: PathPoint) -> [PathPoint; 2] {
    match p.orientation {
        Orientation::Left => [
            PathPoint::new(p.x - 1, p.y - 1, Orientation::Bottom),
            PathPoint::new(p.x - 1, p.y + 1, Orientation::Top),
        ],
        Orientation::Right => [
            PathPoint::new(p.x + 1, p.y + 1, Orientation::Top),
            PathPoint::new(p.x + 1, p.y - 1, Orientation::Bottom),
        ],
        Orientation::Top => [
            PathPoint::new(p.x + 1, p.y - 1, Orientation::Left),
            PathPoint::new(p.x - 1, p.y - 1, Orientation::Right),
        ],
        Orientation::Bottom => [
            PathPoint::new(p.x - 1, p.y + 1, Orientation::Right),
            PathPoint::new(p.x + 1, p.y + 1, Orientation::Left),
        ],
    }
}

/// Pairs each diagonal candidate with the current point's own rotation wall
/// that the turn pivots around: taking the diagonal is only valid if that
/// rotation hasn't already been consumed earlier in the same trace (else
/// the path would cross itself at this pixel). Mirrors the second wall
/// check in each of the original's four `_check_*_orientation` methods.
fn diagonal_candidates_with_checks(p: PathPoint) -> [(PathPoint, PathPoint); 2] {
    let diag = diagonal_candidates(p);
    let rot = rotation_candidates(p);
    [(diag[0], rot[0]), (diag[1], rot[1])]
}

fn pixel_in_facet(facet_map: &Grid<u32>, facet_id: u32, x: i32, y: i32) -> bool {
    facet_map.in_bounds(x, y) && *facet_map.get_checked(x as u32, y as u32) == facet_id
}

fn eligible(
    facet_map: &Grid<u32>,
    facet_id: u32,
    border_set: &HashSet<Point>,
    scratch: &TracerScratch,
    cand: PathPoint,
    require_border: bool,
    also_unmarked: Option<PathPoint>,
) -> bool {
    if !pixel_in_facet(facet_map, facet_id, cand.x, cand.y) {
        return false;
    }
    if require_border && !border_set.contains(&Point::new(cand.x, cand.y)) {
        return false;
    }
    if scratch.is_marked(cand) {
        return false;
    }
    if let Some(also) = also_unmarked {
        if scratch.is_marked(also) {
            return false;
        }
    }
    is_outward(facet_map, facet_id, cand)
}

fn next_candidate(
    facet_map: &Grid<u32>,
    facet_id: u32,
    border_set: &HashSet<Point>,
    scratch: &TracerScratch,
    current: PathPoint,
) -> Option<PathPoint> {
    for cand in rotation_candidates(current) {
        if eligible(facet_map, facet_id, border_set, scratch, cand, false, None) {
            return Some(cand);
        }
    }
    for cand in straight_candidates(current) {
        if eligible(facet_map, facet_id, border_set, scratch, cand, false, None) {
            return Some(cand);
        }
    }
    for (cand, check) in diagonal_candidates_with_checks(current) {
        if eligible(facet_map, facet_id, border_set, scratch, cand, true, Some(check)) {
            return Some(cand);
        }
    }
    None
}

fn find_start(facet_map: &Grid<u32>, facet_id: u32, border_points: &[Point]) -> Option<PathPoint> {
    let first = border_points.first()?;
    for orientation in [
        Orientation::Left,
        Orientation::Top,
        Orientation::Right,
        Orientation::Bottom,
    ] {
        let p = PathPoint::new(first.x, first.y, orientation);
        if is_outward(facet_map, facet_id, p) {
            return Some(p);
        }
    }
    None
}

fn count_outward_walls(facet_map: &Grid<u32>, facet_id: u32, border_points: &[Point]) -> usize {
    let mut total = 0;
    for bp in border_points {
        for orientation in [
            Orientation::Left,
            Orientation::Top,
            Orientation::Right,
            Orientation::Bottom,
        ] {
            if is_outward(facet_map, facet_id, PathPoint::new(bp.x, bp.y, orientation)) {
                total += 1;
            }
        }
    }
    total
}

/// Traces the closed wall-edge loop around `facet_id`. The loop is
/// returned as a flat ordered list; last and first points are implicitly
/// adjacent.
pub fn trace(
    facet_id: u32,
    facet_map: &Grid<u32>,
    border_points: &[Point],
    scratch: &mut TracerScratch,
) -> Result<Vec<PathPoint>> {
    let border_set: HashSet<Point> = border_points.iter().copied().collect();
    let start = find_start(facet_map, facet_id, border_points).ok_or(PbnError::TraceDidNotClose {
        facet_id,
        walls_traced: 0,
        walls_expected: count_outward_walls(facet_map, facet_id, border_points),
    })?;

    let mut path = vec![start];
    scratch.mark(start);
    let mut current = start;

    loop {
        match next_candidate(facet_map, facet_id, &border_set, scratch, current) {
            Some(next) => {
                scratch.mark(next);
                path.push(next);
                current = next;
            }
            None => break,
        }
    }

    let walls_expected = count_outward_walls(facet_map, facet_id, border_points);
    if path.len() != walls_expected {
        for p in &path {
            scratch.unmark(*p);
        }
        return Err(PbnError::TraceDidNotClose {
            facet_id,
            walls_traced: path.len(),
            walls_expected,
        });
    }

    for p in &path {
        scratch.unmark(*p);
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet_builder::build_facets;

    #[test]
    fn traces_single_pixel_facet_as_a_4_edge_loop() {
        let mut grid = Grid::new(3, 3, 0u16);
        grid.set(1, 1, 1);
        let result = build_facets(&grid);
        let center_id = *result.facet_map.get_checked(1, 1);
        let facet = result.get(center_id).unwrap();
        let mut scratch = TracerScratch::new(3, 3);
        let path = trace(center_id, &result.facet_map, &facet.border_points, &mut scratch).unwrap();
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn traces_full_image_single_facet_as_perimeter_loop() {
        let grid = Grid::new(3, 3, 0u16);
        let result = build_facets(&grid);
        let facet = result.get(0).unwrap();
        let mut scratch = TracerScratch::new(3, 3);
        let path = trace(0, &result.facet_map, &facet.border_points, &mut scratch).unwrap();
        // perimeter of a 3x3 block in wall-units is 4*3 = 12.
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn scratch_grids_are_clean_after_trace_for_reuse() {
        let mut grid = Grid::new(4, 4, 0u16);
        grid.set(1, 1, 1);
        let result = build_facets(&grid);
        let mut scratch = TracerScratch::new(4, 4);
        let outer = result.get(0).unwrap();
        let _ = trace(0, &result.facet_map, &outer.border_points, &mut scratch).unwrap();
        let inner = result.get(*result.facet_map.get_checked(1, 1)).unwrap();
        // A second trace must succeed; it would find every wall pre-marked
        // if the scratch grids leaked state between calls.
        let path2 = trace(
            inner.id,
            &result.facet_map,
            &inner.border_points,
            &mut scratch,
        )
        .unwrap();
        assert_eq!(path2.len(), 4);
    }
}
