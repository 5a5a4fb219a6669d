//! Removes single-pixel isolated strips by reassigning each to its
//! color-nearest neighbour. See SPEC_FULL.md §4.2.
//!
//! Grounded on the original's `process_narrow_pixel_strip_cleanup`: the
//! horizontal check (top/bottom) runs strictly before the vertical check
//! (left/right); a pixel that differs from all four neighbours is left
//! untouched by design.

use crate::color::{rgb_distance, Rgb};
use crate::grid::Grid;

/// Runs one cleanup pass over `index`, using `palette` to compare colors.
/// Returns the number of pixels replaced.
pub fn clean_strips(index: &mut Grid<u16>, palette: &[Rgb]) -> usize {
    let width = index.width();
    let height = index.height();
    if width < 3 || height < 3 {
        return 0;
    }

    let mut replacements = Vec::new();

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let here = *index.get_checked(x, y);
            let top = *index.get_checked(x, y - 1);
            let bottom = *index.get_checked(x, y + 1);
            let left = *index.get_checked(x - 1, y);
            let right = *index.get_checked(x + 1, y);

            if here != top && here != bottom {
                let color_here = palette[here as usize];
                let d_top = rgb_distance(color_here, palette[top as usize]);
                let d_bottom = rgb_distance(color_here, palette[bottom as usize]);
                let replacement = if d_top <= d_bottom { top } else { bottom };
                replacements.push((x, y, replacement));
            } else if here != left && here != right {
                let color_here = palette[here as usize];
                let d_left = rgb_distance(color_here, palette[left as usize]);
                let d_right = rgb_distance(color_here, palette[right as usize]);
                let replacement = if d_left <= d_right { left } else { right };
                replacements.push((x, y, replacement));
            }
        }
    }

    let count = replacements.len();
    for (x, y, value) in replacements {
        index.set(x, y, value);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_palette() -> Vec<Rgb> {
        vec![(255, 0, 0), (0, 255, 0), (0, 0, 255)]
    }

    #[test]
    fn replaces_horizontally_isolated_pixel() {
        let mut g = Grid::new(3, 3, 0u16);
        // middle column entirely color 1, flanked by color 0, except (1,1)
        // which is horizontally isolated (differs from left and right).
        for y in 0..3 {
            g.set(0, y, 0);
            g.set(2, y, 0);
        }
        g.set(1, 0, 0);
        g.set(1, 1, 1);
        g.set(1, 2, 0);
        let palette = make_palette();
        let replaced = clean_strips(&mut g, &palette);
        assert_eq!(replaced, 1);
        assert_eq!(*g.get(1, 1).unwrap(), 0);
    }

    #[test]
    fn leaves_fully_isolated_single_pixel_untouched() {
        let mut g = Grid::new(3, 3, 0u16);
        g.set(1, 1, 1);
        let palette = make_palette();
        let replaced = clean_strips(&mut g, &palette);
        assert_eq!(replaced, 0);
        assert_eq!(*g.get(1, 1).unwrap(), 1);
    }

    #[test]
    fn too_small_grid_is_noop() {
        let mut g = Grid::new(2, 2, 0u16);
        let palette = make_palette();
        assert_eq!(clean_strips(&mut g, &palette), 0);
    }
}
