use thiserror::Error;

/// Errors produced by the paint-by-numbers geometric pipeline.
#[derive(Error, Debug)]
pub enum PbnError {
    #[error("empty input: no pixels to quantize")]
    EmptyInput,

    #[error("invalid cluster count: k must be >= 1, got {0}")]
    InvalidK(usize),

    #[error("all facets were eliminated by reduction (threshold {threshold} too aggressive for {facet_count} input facets)")]
    AllFacetsEliminated { threshold: usize, facet_count: usize },

    #[error("border trace for facet {facet_id} did not close: traversed {walls_traced} walls, expected {walls_expected}")]
    TraceDidNotClose {
        facet_id: u32,
        walls_traced: usize,
        walls_expected: usize,
    },

    #[error("segment in facet {facet_id} could not be matched with any neighbour within tolerance")]
    UnmatchedSegment { facet_id: u32 },

    #[error("operation cancelled at stage '{stage}'")]
    Cancelled { stage: &'static str },
}

pub type Result<T> = std::result::Result<T, PbnError>;
