//! Orchestrates the full geometric pipeline: CQ → SC → FB → FR → BT → BS →
//! LP, in that order. See SPEC_FULL.md §2 and §5.
//!
//! Grounded on the original's `core/pipeline.py`
//! (`PaintByNumbersPipeline.process`); the `update(stage, progress)`
//! closure there becomes the `ProgressReporter` capability here.

use crate::border_segmenter;
use crate::border_tracer::{trace, TracerScratch};
use crate::color::Rgb;
use crate::error::{PbnError, Result};
use crate::facet::FacetResult;
use crate::facet_builder::{build_facets, build_neighbours};
use crate::facet_reducer;
use crate::grid::Grid;
use crate::label_placer;
use crate::quantizer::{self, QuantizeResult};
use crate::settings::{CancellationToken, ProgressReporter, Settings};
use rand::Rng;

pub struct PipelineOutput {
    pub palette: Vec<Rgb>,
    pub facets: FacetResult,
}

pub struct Pipeline {
    settings: Settings,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn run(
        &self,
        pixels: &[Rgb],
        width: u32,
        height: u32,
        cancel: &CancellationToken,
        mut progress: ProgressReporter,
    ) -> Result<PipelineOutput> {
        log::info!("pipeline: starting run on {}x{} image", width, height);

        progress("quantize", 0.0);
        let seed = self
            .settings
            .random_seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let QuantizeResult {
            palette,
            mut color_index,
        } = quantizer::quantize(
            pixels,
            width,
            height,
            self.settings.k_means_clusters,
            self.settings.k_means_color_space,
            seed,
            self.settings.k_means_min_delta,
        )?;
        progress("quantize", 1.0);

        progress("strip_clean", 0.0);
        for pass in 0..self.settings.strip_cleanup_passes {
            let replaced = crate::strip_cleaner::clean_strips(&mut color_index, &palette);
            log::debug!("strip_clean: pass {} replaced {} pixels", pass, replaced);
            if cancel.is_cancelled() {
                return Err(PbnError::Cancelled { stage: "strip_clean" });
            }
        }
        progress("strip_clean", 1.0);

        progress("build_facets", 0.0);
        let mut result = build_facets(&color_index);
        progress("build_facets", 1.0);

        progress("reduce_facets", 0.0);
        facet_reducer::reduce(&mut result, &mut color_index, &palette, &self.settings)?;
        progress("reduce_facets", 1.0);

        let mut facets_in_order: Vec<u32> = result
            .facets
            .iter()
            .filter_map(|f| f.as_ref().map(|f| f.id))
            .collect();
        // Largest-first so the shared wall-grid scratch amortizes its
        // biggest cost over the facets that need it most.
        facets_in_order.sort_by_key(|&id| std::cmp::Reverse(result.get(id).unwrap().point_count));

        for &id in &facets_in_order {
            if result.get(id).and_then(|f| f.neighbour_facets.as_ref()).is_none() {
                build_neighbours(&mut result, id);
            }
        }

        progress("trace_borders", 0.0);
        let mut scratch = TracerScratch::new(width, height);
        let total = facets_in_order.len().max(1);
        for (i, &id) in facets_in_order.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PbnError::Cancelled { stage: "trace_borders" });
            }
            let border_points = result.get(id).unwrap().border_points.clone();
            let path = trace(id, &result.facet_map, &border_points, &mut scratch)?;
            result.get_mut(id).unwrap().border_path = Some(path);

            if i % (total / 100).max(1) == 0 {
                progress("trace_borders", i as f32 / total as f32);
            }
        }
        progress("trace_borders", 1.0);

        progress("segment_borders", 0.0);
        // Ascending id order gives a deterministic, reproducible traversal
        // for cross-facet matching (see border_segmenter::segment_all).
        let mut ascending = facets_in_order.clone();
        ascending.sort_unstable();
        border_segmenter::segment_all(
            &mut result,
            &ascending,
            self.settings.border_smoothing_passes,
            width,
            height,
        );
        progress("segment_borders", 1.0);

        progress("place_labels", 0.0);
        label_placer::place_labels(&mut result, &ascending);
        progress("place_labels", 1.0);

        log::info!(
            "pipeline: finished, {} facets, {} palette entries",
            result.surviving_count(),
            palette.len()
        );

        Ok(PipelineOutput {
            palette,
            facets: result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::noop_reporter;

    fn run_pipeline(pixels: &[Rgb], w: u32, h: u32, settings: Settings) -> Result<PipelineOutput> {
        let pipeline = Pipeline::new(settings);
        let cancel = CancellationToken::new();
        pipeline.run(pixels, w, h, &cancel, noop_reporter())
    }

    /// E1: a uniform 3x3 red image with k=2 produces a single facet
    /// covering all 9 pixels, with a closed 12-wall-edge perimeter loop.
    #[test]
    fn e1_uniform_image_single_facet() {
        let pixels = vec![(255u8, 0u8, 0u8); 9];
        let settings = Settings {
            k_means_clusters: 2,
            remove_facets_smaller_than: 0,
            strip_cleanup_passes: 0,
            border_smoothing_passes: 0,
            ..Settings::default()
        };
        let output = run_pipeline(&pixels, 3, 3, settings).unwrap();
        assert_eq!(output.facets.surviving_count(), 1);
        let facet = output.facets.get(0).unwrap();
        assert_eq!(facet.point_count, 9);
        assert_eq!(facet.border_path.as_ref().unwrap().len(), 12);
    }

    /// E2: a 4x2 image split red/blue produces two facets, each with a
    /// perimeter of 8 wall-edges, and exactly one shared segment between
    /// them after segmentation.
    #[test]
    fn e2_two_color_split_shares_one_segment() {
        let mut pixels = vec![(255u8, 0u8, 0u8); 4];
        pixels.extend(vec![(0u8, 0u8, 255u8); 4]);
        let settings = Settings {
            k_means_clusters: 2,
            remove_facets_smaller_than: 0,
            strip_cleanup_passes: 0,
            border_smoothing_passes: 0,
            ..Settings::default()
        };
        let output = run_pipeline(&pixels, 4, 2, settings).unwrap();
        assert_eq!(output.facets.surviving_count(), 2);
        for facet in output.facets.facets.iter().flatten() {
            assert_eq!(facet.border_path.as_ref().unwrap().len(), 8);
            let shared: usize = facet
                .border_segments
                .as_ref()
                .unwrap()
                .iter()
                .filter(|s| output.facets.segments[s.segment_index].neighbour.is_some())
                .count();
            assert_eq!(shared, 1);
        }
    }

    /// E6: determinism — identical seed + config on identical noise input
    /// must yield identical palettes and facet maps across two runs.
    #[test]
    fn e6_determinism_across_runs() {
        let mut pixels = Vec::with_capacity(100 * 100);
        for i in 0..100 * 100u32 {
            pixels.push(((i * 37 % 256) as u8, (i * 53 % 256) as u8, (i * 97 % 256) as u8));
        }
        let settings = Settings {
            k_means_clusters: 8,
            random_seed: Some(42),
            ..Settings::default()
        };

        let out1 = run_pipeline(&pixels, 100, 100, settings.clone()).unwrap();
        let out2 = run_pipeline(&pixels, 100, 100, settings).unwrap();

        assert_eq!(out1.palette, out2.palette);
        assert_eq!(out1.facets.facet_map.data(), out2.facets.facet_map.data());
    }

    #[test]
    fn cancellation_is_honored_before_tracing_starts() {
        let pixels = vec![(255u8, 0u8, 0u8); 9];
        let settings = Settings {
            k_means_clusters: 2,
            ..Settings::default()
        };
        let pipeline = Pipeline::new(settings);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = pipeline.run(&pixels, 3, 3, &cancel, noop_reporter());
        assert!(matches!(result, Err(PbnError::Cancelled { .. })));
    }
}
