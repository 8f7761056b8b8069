//! Frame-level parallelism on the rayon pool.
//!
//! A compiled filter holds no per-run state, so independent frames or planes
//! can share it across worker threads. Results are returned in input order.

use super::{Filter, FilterOutput, SeparableFilter};
use crate::image::{ImageView, OwnedImage};
use crate::pixel::Pixel;
use crate::trace::{trace_event, trace_span};
use crate::util::FilterResult;
use rayon::prelude::*;

/// Applies `filter` to every frame in parallel.
pub fn apply_batch_par<I: Pixel, O: Pixel>(
    filter: &Filter<I, O>,
    frames: &[ImageView<'_, I>],
) -> FilterResult<Vec<FilterOutput<O>>> {
    let _span = trace_span!("batch_par", frames = frames.len(), kind = "filter").entered();
    let out = frames
        .par_iter()
        .map(|frame| filter.apply(*frame))
        .collect::<FilterResult<Vec<_>>>()?;
    trace_event!("batch_complete", frames = out.len());
    Ok(out)
}

/// Applies a two-input filter to every frame pair in parallel.
pub fn apply_pairs_par<I: Pixel, O: Pixel>(
    filter: &Filter<I, O>,
    pairs: &[(ImageView<'_, I>, ImageView<'_, I>)],
) -> FilterResult<Vec<FilterOutput<O>>> {
    let _span = trace_span!("batch_par", frames = pairs.len(), kind = "pair").entered();
    pairs
        .par_iter()
        .map(|(primary, secondary)| filter.apply_pair(*primary, *secondary))
        .collect()
}

/// Applies a separable filter to every frame in parallel.
pub fn apply_separable_par<T: Pixel>(
    filter: &SeparableFilter<T>,
    frames: &[ImageView<'_, T>],
) -> FilterResult<Vec<OwnedImage<T>>> {
    let _span = trace_span!("batch_par", frames = frames.len(), kind = "separable").entered();
    frames.par_iter().map(|frame| filter.apply(*frame)).collect()
}
