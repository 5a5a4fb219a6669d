//! Color quantizer: groups pixels into weighted points by quantized RGB,
//! runs weighted k-means in the configured color space, and emits a
//! palette plus a per-pixel color-index grid. See SPEC_FULL.md §4.1.

use crate::color::{hsl_to_rgb, lab_to_rgb, rgb_to_hsl, rgb_to_lab, Rgb};
use crate::error::Result;
use crate::grid::Grid;
use crate::kmeans::{KMeans, WeightedPoint};
use crate::settings::ColorSpace;
use std::collections::HashMap;

pub struct QuantizeResult {
    pub palette: Vec<Rgb>,
    pub color_index: Grid<u16>,
}

/// Drops the 2 least-significant bits of each channel, matching the
/// original's weighted-point grouping key.
fn quantize_channel(c: u8) -> u8 {
    c & 0b1111_1100
}

fn to_working_space(rgb: Rgb, space: ColorSpace) -> [f64; 3] {
    match space {
        ColorSpace::Rgb => [rgb.0 as f64, rgb.1 as f64, rgb.2 as f64],
        ColorSpace::Hsl => {
            let (h, s, l) = rgb_to_hsl(rgb);
            [h, s, l]
        }
        ColorSpace::Lab => {
            let (l, a, b) = rgb_to_lab(rgb);
            [l, a, b]
        }
    }
}

fn from_working_space(c: [f64; 3], space: ColorSpace) -> Rgb {
    match space {
        ColorSpace::Rgb => (
            c[0].round().clamp(0.0, 255.0) as u8,
            c[1].round().clamp(0.0, 255.0) as u8,
            c[2].round().clamp(0.0, 255.0) as u8,
        ),
        ColorSpace::Hsl => hsl_to_rgb((c[0], c[1], c[2])),
        ColorSpace::Lab => lab_to_rgb((c[0], c[1], c[2])),
    }
}

pub fn quantize(
    pixels: &[Rgb],
    width: u32,
    height: u32,
    k: usize,
    color_space: ColorSpace,
    seed: u64,
    min_delta: f64,
) -> Result<QuantizeResult> {
    log::debug!(
        "quantizer: {}x{} pixels, k={}, color_space={:?}",
        width,
        height,
        k,
        color_space
    );

    // Group pixels by quantized RGB so k-means only sees distinct colors,
    // not raw pixel count.
    let mut groups: HashMap<Rgb, (Rgb, u32)> = HashMap::new();
    for &p in pixels {
        let key = (
            quantize_channel(p.0),
            quantize_channel(p.1),
            quantize_channel(p.2),
        );
        let entry = groups.entry(key).or_insert((p, 0));
        entry.1 += 1;
    }

    let total: u64 = groups.values().map(|(_, count)| *count as u64).sum();
    let keys: Vec<Rgb> = groups.keys().copied().collect();
    let points: Vec<WeightedPoint> = keys
        .iter()
        .map(|key| {
            let (rgb, count) = groups[key];
            WeightedPoint::new(
                to_working_space(rgb, color_space),
                count as f64 / total as f64,
            )
        })
        .collect();

    let km = KMeans::new(k, min_delta);
    let (centroids, assignment) = km.fit(&points, seed)?;

    let palette: Vec<Rgb> = centroids
        .iter()
        .map(|c| from_working_space(*c, color_space))
        .collect();

    let mut key_to_cluster: HashMap<Rgb, usize> = HashMap::new();
    for (key, cluster) in keys.iter().zip(assignment.iter()) {
        key_to_cluster.insert(*key, *cluster);
    }

    let mut color_index = Grid::new(width, height, 0u16);
    for (i, &p) in pixels.iter().enumerate() {
        let key = (
            quantize_channel(p.0),
            quantize_channel(p.1),
            quantize_channel(p.2),
        );
        let cluster = key_to_cluster[&key];
        let x = (i as u32) % width;
        let y = (i as u32) / width;
        color_index.set(x, y, cluster as u16);
    }

    log::debug!("quantizer: produced {} palette entries", palette.len());

    Ok(QuantizeResult {
        palette,
        color_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_color_image_yields_one_effective_cluster() {
        let pixels = vec![(255u8, 0u8, 0u8); 9];
        let result = quantize(&pixels, 3, 3, 2, ColorSpace::Rgb, 1, 1.0).unwrap();
        let first = *result.color_index.get(0, 0).unwrap();
        assert!(result.color_index.data().iter().all(|&c| c == first));
    }

    #[test]
    fn two_distinct_colors_produce_two_clusters() {
        let mut pixels = vec![(255u8, 0u8, 0u8); 4];
        pixels.extend(vec![(0u8, 0u8, 255u8); 4]);
        let result = quantize(&pixels, 4, 2, 2, ColorSpace::Rgb, 1, 1.0).unwrap();
        let a = *result.color_index.get(0, 0).unwrap();
        let b = *result.color_index.get(3, 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_pixels_error() {
        let pixels: Vec<Rgb> = vec![];
        assert!(quantize(&pixels, 0, 0, 2, ColorSpace::Rgb, 1, 1.0).is_err());
    }
}
