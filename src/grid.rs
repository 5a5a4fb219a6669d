//! Row-major 2D buffer used throughout the pipeline: the color-index grid,
//! the facet-id map, and the wall-tracking scratch grids all share this
//! representation rather than each growing a bespoke typed array, the way
//! the original's `Uint32Array2D`/`Uint8Array2D`/`BooleanArray2D` classes did.

/// The four 4-connected neighbour offsets, in a fixed, deterministic order.
pub const NEIGHBOURS_4: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// The four diagonal neighbour offsets, paired with the 4-connected ones
/// gives 8-connectivity in a fixed order.
pub const NEIGHBOURS_8: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

#[derive(Debug, Clone)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        Self {
            width,
            height,
            data: vec![fill; (width as usize) * (height as usize)],
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(&self.data[self.index(x as u32, y as u32)])
        } else {
            None
        }
    }

    pub fn get_checked(&self, x: u32, y: u32) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let w = self.width;
        (0..self.height).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }
}

/// Returns the in-bounds 4-neighbours of `(x, y)` as `(x, y)` pairs.
pub fn neighbours4(x: i32, y: i32, width: u32, height: u32) -> impl Iterator<Item = (i32, i32)> {
    NEIGHBOURS_4.into_iter().filter_map(move |(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        (nx >= 0 && ny >= 0 && (nx as u32) < width && (ny as u32) < height).then_some((nx, ny))
    })
}

/// Returns the in-bounds 8-neighbours of `(x, y)` as `(x, y)` pairs.
pub fn neighbours8(x: i32, y: i32, width: u32, height: u32) -> impl Iterator<Item = (i32, i32)> {
    NEIGHBOURS_8.into_iter().filter_map(move |(dx, dy)| {
        let (nx, ny) = (x + dx, y + dy);
        (nx >= 0 && ny >= 0 && (nx as u32) < width && (ny as u32) < height).then_some((nx, ny))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_4way_interior() {
        let got: Vec<_> = neighbours4(1, 1, 3, 3).collect();
        assert_eq!(got, vec![(1, 0), (2, 1), (1, 2), (0, 1)]);
    }

    #[test]
    fn test_neighbors_4way_corner() {
        let got: Vec<_> = neighbours4(0, 0, 3, 3).collect();
        assert_eq!(got, vec![(1, 0), (0, 1)]);
    }

    #[test]
    fn test_neighbors_8way_interior() {
        let got: Vec<_> = neighbours8(1, 1, 3, 3).collect();
        assert_eq!(got.len(), 8);
    }

    #[test]
    fn grid_get_set_roundtrip() {
        let mut g = Grid::new(4, 4, 0u32);
        g.set(2, 3, 42);
        assert_eq!(*g.get(2, 3).unwrap(), 42);
        assert_eq!(g.get(4, 0), None);
    }
}
