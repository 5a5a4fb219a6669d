//! Facet extraction via 4-connected flood fill. See SPEC_FULL.md §4.3.
//!
//! Grounded on the original's `facetbuilder.py` (`build_facet`,
//! `build_all_facets`, `calculate_bounding_box`, `identify_border_points`,
//! `build_facet_neighbour`). The fill uses an explicit stack rather than
//! recursion: recursion depth would be bounded only by facet size and
//! could overflow on a single-color megapixel image.

use crate::facet::{Facet, FacetResult};
use crate::geometry::Point;
use crate::grid::{neighbours4, Grid};
use std::collections::HashSet;

const UNASSIGNED: u32 = u32::MAX;

pub fn build_facets(color_index: &Grid<u16>) -> FacetResult {
    let width = color_index.width();
    let height = color_index.height();

    log::debug!("facet_builder: building facets for {}x{} grid", width, height);

    let mut facet_map = Grid::new(width, height, UNASSIGNED);
    let mut facets: Vec<Option<Facet>> = Vec::new();
    let mut stack: Vec<(i32, i32)> = Vec::new();

    for (x0, y0) in color_index.iter_coords() {
        if *facet_map.get_checked(x0, y0) != UNASSIGNED {
            continue;
        }

        let color = *color_index.get_checked(x0, y0);
        let id = facets.len() as u32;
        let mut facet = Facet::new(id, color, Point::new(x0 as i32, y0 as i32));

        stack.push((x0 as i32, y0 as i32));
        facet_map.set(x0, y0, id);

        while let Some((x, y)) = stack.pop() {
            facet.point_count += 1;
            facet.bbox.grow(Point::new(x, y));

            let mut is_border = false;
            for (dx, dy) in crate::grid::NEIGHBOURS_4 {
                let (nx, ny) = (x + dx, y + dy);
                if !facet_map.in_bounds(nx, ny) {
                    is_border = true;
                    continue;
                }
                let (ux, uy) = (nx as u32, ny as u32);
                if *color_index.get_checked(ux, uy) != color {
                    is_border = true;
                    continue;
                }
                if *facet_map.get_checked(ux, uy) == UNASSIGNED {
                    facet_map.set(ux, uy, id);
                    stack.push((nx, ny));
                }
            }
            if is_border {
                facet.border_points.push(Point::new(x, y));
            }
        }

        facets.push(Some(facet));
    }

    log::debug!("facet_builder: built {} facets", facets.len());

    FacetResult {
        facets,
        facet_map,
        segments: Vec::new(),
    }
}

/// Computes (and caches) the distinct set of neighbour facet ids touching
/// `facet_id`'s border points.
pub fn build_neighbours(result: &mut FacetResult, facet_id: u32) {
    let facet_map = result.facet_map.clone();
    let width = facet_map.width();
    let height = facet_map.height();
    let border_points = result
        .get(facet_id)
        .map(|f| f.border_points.clone())
        .unwrap_or_default();

    let mut neighbours = HashSet::new();
    for p in &border_points {
        for (nx, ny) in neighbours4(p.x, p.y, width, height) {
            let nid = *facet_map.get_checked(nx as u32, ny as u32);
            if nid != facet_id {
                neighbours.insert(nid);
            }
        }
    }

    if let Some(facet) = result.get_mut(facet_id) {
        facet.neighbour_facets = Some(neighbours);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_color_image_is_one_facet() {
        let grid = Grid::new(3, 3, 5u16);
        let result = build_facets(&grid);
        assert_eq!(result.surviving_count(), 1);
        let facet = result.get(0).unwrap();
        assert_eq!(facet.point_count, 9);
        assert_eq!(facet.border_points.len(), 9);
    }

    #[test]
    fn center_pixel_forms_its_own_facet() {
        let mut grid = Grid::new(3, 3, 0u16);
        grid.set(1, 1, 1);
        let result = build_facets(&grid);
        assert_eq!(result.surviving_count(), 2);
        let center_id = *result.facet_map.get_checked(1, 1);
        let center = result.get(center_id).unwrap();
        assert_eq!(center.point_count, 1);
        assert_eq!(center.border_points.len(), 1);
    }

    #[test]
    fn build_neighbours_finds_adjacent_facet() {
        let mut grid = Grid::new(3, 3, 0u16);
        grid.set(1, 1, 1);
        let mut result = build_facets(&grid);
        let center_id = *result.facet_map.get_checked(1, 1);
        let outer_id = *result.facet_map.get_checked(0, 0);
        build_neighbours(&mut result, center_id);
        let center = result.get(center_id).unwrap();
        assert!(center.neighbour_facets.as_ref().unwrap().contains(&outer_id));
    }
}
