//! Core entities of the geometric pipeline: facets, wall-edge path points,
//! and the shared-boundary segment store. See SPEC_FULL.md §3.
//!
//! Grounded on the original's `facetmanagement.py` (`Facet`, `FacetResult`,
//! `PathSegment`, `FacetBoundarySegment`) and `core/types.py`
//! (`OrientationEnum`, `PathPoint`).

use crate::geometry::{BoundingBox, Point};
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which of the four unit walls of a pixel a `PathPoint` sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Left,
    Top,
    Right,
    Bottom,
}

/// One wall-edge of a pixel: the atomic unit of a facet's boundary path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: i32,
    pub y: i32,
    pub orientation: Orientation,
}

impl PathPoint {
    pub fn new(x: i32, y: i32, orientation: Orientation) -> Self {
        Self { x, y, orientation }
    }

    /// The fractional geometric coordinate this wall-edge sits at.
    pub fn wall_x(&self) -> f64 {
        match self.orientation {
            Orientation::Left => self.x as f64 - 0.5,
            Orientation::Right => self.x as f64 + 0.5,
            Orientation::Top | Orientation::Bottom => self.x as f64,
        }
    }

    pub fn wall_y(&self) -> f64 {
        match self.orientation {
            Orientation::Top => self.y as f64 - 0.5,
            Orientation::Bottom => self.y as f64 + 0.5,
            Orientation::Left | Orientation::Right => self.y as f64,
        }
    }

    /// The facet id on the outward side of this wall-edge, or `None` if
    /// the wall faces outside the image.
    pub fn neighbour(&self, facet_map: &Grid<u32>) -> Option<u32> {
        let (nx, ny) = match self.orientation {
            Orientation::Left => (self.x - 1, self.y),
            Orientation::Right => (self.x + 1, self.y),
            Orientation::Top => (self.x, self.y - 1),
            Orientation::Bottom => (self.x, self.y + 1),
        };
        facet_map.get(nx, ny).copied()
    }
}

// `Eq`/`Hash` need a total-order wrapper; PathPoint fields are all exact
// integers plus an enum, so structural equality is exact (no float noise).
impl Eq for PathPoint {}

impl std::hash::Hash for PathPoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
        self.orientation.hash(state);
    }
}

/// An ordered, non-empty run of wall-edges all facing the same neighbour
/// facet (`None` means the image edge). Owned canonically by one facet;
/// referenced non-owning by the other via `FacetBoundarySegment`.
///
/// Points are plain fractional coordinates (the wall-edge's `wall_x`/
/// `wall_y`), not `PathPoint`s: once a segment has gone through Haar
/// smoothing its points are midpoints of midpoints and no longer sit on
/// any single pixel's wall, so the orientation tag no longer means
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentPoint {
    pub x: f64,
    pub y: f64,
}

impl SegmentPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_path_point(p: PathPoint) -> Self {
        Self::new(p.wall_x(), p.wall_y())
    }

    pub fn midpoint(a: SegmentPoint, b: SegmentPoint) -> Self {
        Self::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }

    /// Manhattan distance. Matches-tolerance checks use this, not Euclidean,
    /// so that diagonal neighbours don't read as "closer" than orthogonal
    /// ones (see the original's `Point.distance_to`).
    pub fn distance(&self, other: &SegmentPoint) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSegment {
    pub points: Vec<SegmentPoint>,
    pub neighbour: Option<u32>,
}

/// A facet's own view of a shared `PathSegment`: which segment in the
/// store, and whether this facet traverses it in reverse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FacetBoundarySegment {
    pub segment_index: usize,
    pub reverse_order: bool,
}

/// The axis-aligned square label placement derived from the pole of
/// inaccessibility: `half_side = 2*sqrt(2*distance)` per the original's
/// padding formula (SPEC_FULL.md §4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LabelBounds {
    pub center_x: f64,
    pub center_y: f64,
    pub half_side: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facet {
    pub id: u32,
    pub color: u16,
    pub point_count: u32,
    pub border_points: Vec<Point>,
    pub bbox: BoundingBox,
    #[serde(skip)]
    pub neighbour_facets: Option<HashSet<u32>>,
    #[serde(skip)]
    pub border_path: Option<Vec<PathPoint>>,
    pub border_segments: Option<Vec<FacetBoundarySegment>>,
    pub label_bounds: Option<LabelBounds>,
}

impl Facet {
    pub fn new(id: u32, color: u16, first_point: Point) -> Self {
        Self {
            id,
            color,
            point_count: 0,
            border_points: Vec::new(),
            bbox: BoundingBox::from_point(first_point),
            neighbour_facets: None,
            border_path: None,
            border_segments: None,
            label_bounds: None,
        }
    }
}

/// Owns the full set of facets (by stable slot index; vacated slots are
/// `None` and never reused) plus the facet-id map and the canonical
/// segment store referenced by `FacetBoundarySegment`.
#[derive(Debug, Clone)]
pub struct FacetResult {
    pub facets: Vec<Option<Facet>>,
    pub facet_map: Grid<u32>,
    pub segments: Vec<PathSegment>,
}

impl FacetResult {
    pub fn get(&self, id: u32) -> Option<&Facet> {
        self.facets.get(id as usize).and_then(|f| f.as_ref())
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Facet> {
        self.facets.get_mut(id as usize).and_then(|f| f.as_mut())
    }

    pub fn surviving_count(&self) -> usize {
        self.facets.iter().filter(|f| f.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_coordinates_match_orientation() {
        let p = PathPoint::new(5, 5, Orientation::Left);
        assert_eq!(p.wall_x(), 4.5);
        assert_eq!(p.wall_y(), 5.0);

        let p = PathPoint::new(5, 5, Orientation::Bottom);
        assert_eq!(p.wall_x(), 5.0);
        assert_eq!(p.wall_y(), 5.5);
    }

    #[test]
    fn neighbour_is_none_outside_image() {
        let facet_map = Grid::new(3, 3, 0u32);
        let p = PathPoint::new(0, 0, Orientation::Left);
        assert_eq!(p.neighbour(&facet_map), None);
    }

    #[test]
    fn neighbour_reads_adjacent_facet_id() {
        let mut facet_map = Grid::new(3, 3, 0u32);
        facet_map.set(2, 1, 7);
        let p = PathPoint::new(1, 1, Orientation::Right);
        assert_eq!(p.neighbour(&facet_map), Some(7));
    }
}
