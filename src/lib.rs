//! Geometric core for paint-by-numbers vector generation.
//!
//! Converts a color-quantized raster into closed, numbered, color-filled
//! facets: color quantization, strip cleaning, facet extraction and
//! reduction, wall-following border tracing, border segmentation, and
//! label placement. Image decoding, SVG serialization, and CLI/config
//! file I/O are the caller's job — see `SPEC_FULL.md` for the exact
//! boundary.

mod border_segmenter;
mod border_tracer;
mod color;
mod error;
mod facet;
mod facet_builder;
mod facet_reducer;
mod geometry;
mod grid;
mod kmeans;
mod label_placer;
mod pipeline;
mod quantizer;
mod settings;
mod strip_cleaner;

pub use color::{hsl_to_rgb, lab_to_rgb, rgb_to_hsl, rgb_to_lab, Rgb};
pub use error::{PbnError, Result};
pub use facet::{
    Facet, FacetBoundarySegment, FacetResult, LabelBounds, Orientation, PathPoint, PathSegment,
    SegmentPoint,
};
pub use geometry::{BoundingBox, Point};
pub use grid::Grid;
pub use pipeline::{Pipeline, PipelineOutput};
pub use quantizer::QuantizeResult;
pub use settings::{noop_reporter, CancellationToken, ColorSpace, ProgressReporter, Settings};
