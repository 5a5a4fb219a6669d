//! Configuration and cooperative-cancellation primitives for the pipeline.
//!
//! `Settings` is a plain, serializable struct: loading it from JSON or a CLI
//! is the caller's job, not this crate's. It exists here so every stage has
//! somewhere to read its parameters from.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Color space used by the color quantizer's k-means clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Rgb,
    Hsl,
    Lab,
}

impl Default for ColorSpace {
    fn default() -> Self {
        ColorSpace::Rgb
    }
}

/// Pipeline-wide configuration. See SPEC_FULL.md §6 for field semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// K in color quantization (default: 16).
    pub k_means_clusters: usize,
    /// Convergence threshold on total centroid movement (default: 1.0).
    pub k_means_min_delta: f64,
    /// Color space clustering is performed in (default: Rgb).
    pub k_means_color_space: ColorSpace,
    /// RNG seed for reproducible clustering; `None` draws a fresh seed.
    pub random_seed: Option<u64>,
    /// Facets smaller than this are merged into neighbours (default: 20).
    pub remove_facets_smaller_than: usize,
    /// If set, reduction also enforces this upper bound on facet count.
    pub max_facets: Option<usize>,
    /// Iteration order for `max_facets` trimming among equally-undersized
    /// facets; does not affect which facets fall below `remove_facets_smaller_than`.
    pub remove_facets_large_to_small: bool,
    /// Number of strip-cleaning passes (default: 3).
    pub strip_cleanup_passes: usize,
    /// Number of Haar-style border smoothing passes (default: 2).
    pub border_smoothing_passes: usize,
    /// Image-loader collaborator hint; this crate never reads these itself.
    pub resize_max_w: Option<u32>,
    pub resize_max_h: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            k_means_clusters: 16,
            k_means_min_delta: 1.0,
            k_means_color_space: ColorSpace::Rgb,
            random_seed: None,
            remove_facets_smaller_than: 20,
            max_facets: None,
            remove_facets_large_to_small: true,
            strip_cleanup_passes: 3,
            border_smoothing_passes: 2,
            resize_max_w: None,
            resize_max_h: None,
        }
    }
}

/// A shared, thread-safe flag a caller can raise to ask the pipeline to stop
/// at the next safe point (a facet boundary inside FR/BT/BS/LP).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller-supplied progress callback: `(stage_name, progress_0_to_1)`.
pub type ProgressReporter<'a> = Box<dyn FnMut(&str, f32) + 'a>;

/// A progress reporter that does nothing, for callers who opt out.
pub fn noop_reporter<'a>() -> ProgressReporter<'a> {
    Box::new(|_, _| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_spec() {
        let s = Settings::default();
        assert_eq!(s.k_means_clusters, 16);
        assert_eq!(s.remove_facets_smaller_than, 20);
        assert_eq!(s.strip_cleanup_passes, 3);
        assert_eq!(s.border_smoothing_passes, 2);
    }

    #[test]
    fn cancellation_token_shares_state_across_clones() {
        let tok = CancellationToken::new();
        let clone = tok.clone();
        assert!(!clone.is_cancelled());
        tok.cancel();
        assert!(clone.is_cancelled());
    }
}
