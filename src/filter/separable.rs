//! Two-pass separable filtering: a `1 x K` row pass feeding a `K x 1` column pass.
//!
//! The row pass runs on a one-row sliding window. Its results are buffered
//! together with the raw input pixel, so the column pass can fall back to the
//! input on the [`BorderPolicy::Undefined`] ring without a second input
//! stream.

use super::StreamStats;
use crate::image::{ImageView, OwnedImage};
use crate::kernel::LineKernel;
use crate::ops::LineOperator;
use crate::pixel::{Conversion, Pixel};
use crate::stream::{collect_frame, vectorize, Sink, StreamElement, Vector};
use crate::trace::{trace_event, trace_span};
use crate::util::{FilterError, FilterResult};
use crate::window::{BorderPolicy, Geometry, LineBufferBank, SlidingWindow};
use std::marker::PhantomData;

/// Builder for [`SeparableFilter`].
#[derive(Clone, Debug)]
pub struct SeparableBuilder<T> {
    width: usize,
    height: usize,
    vec_num: usize,
    border: BorderPolicy,
    conversion: Conversion,
    operator: LineOperator,
    kernel: Option<LineKernel>,
    _pixel: PhantomData<fn() -> T>,
}

impl<T: Pixel> SeparableBuilder<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            vec_num: 1,
            border: BorderPolicy::default(),
            conversion: Conversion::default(),
            operator: LineOperator::Box,
            kernel: None,
            _pixel: PhantomData,
        }
    }

    pub fn vec_num(mut self, vec_num: usize) -> Self {
        self.vec_num = vec_num;
        self
    }

    pub fn border(mut self, border: BorderPolicy) -> Self {
        self.border = border;
        self
    }

    pub fn conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn operator(mut self, operator: LineOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Row kernel used for both passes.
    pub fn kernel(mut self, kernel: LineKernel) -> Self {
        self.kernel = Some(kernel);
        self
    }

    pub fn build(self) -> FilterResult<SeparableFilter<T>> {
        let operator = self.operator;
        let kernel = self.kernel.ok_or(FilterError::UnsupportedOperator {
            operator: operator.name(),
            reason: "no kernel configured",
        })?;
        let geometry = Geometry::new(self.width, self.height, kernel.size(), self.vec_num)?;
        if T::SIGNED {
            return Err(FilterError::UnsupportedPixelType {
                operator: operator.name(),
                reason: "input must be unsigned",
            });
        }
        operator.validate(&kernel)?;
        Ok(SeparableFilter {
            geometry,
            border: self.border,
            conversion: self.conversion,
            operator,
            kernel,
            _pixel: PhantomData,
        })
    }
}

/// Compiled separable filter over `T` pixels.
#[derive(Clone, Debug)]
pub struct SeparableFilter<T> {
    geometry: Geometry,
    border: BorderPolicy,
    conversion: Conversion,
    operator: LineOperator,
    kernel: LineKernel,
    _pixel: PhantomData<fn() -> T>,
}

impl<T: Pixel> SeparableFilter<T> {
    pub fn builder(width: usize, height: usize) -> SeparableBuilder<T> {
        SeparableBuilder::new(width, height)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn operator(&self) -> LineOperator {
        self.operator
    }

    pub fn kernel(&self) -> &LineKernel {
        &self.kernel
    }

    /// Streams one frame into `sink`.
    pub fn run<A, S>(&self, input: A, mut sink: S) -> FilterResult<StreamStats>
    where
        A: IntoIterator<Item = Vector<T>>,
        S: Sink<T>,
    {
        let geometry = self.geometry;
        let rows = geometry.height();
        let vec_cols = geometry.vec_cols();
        let k = geometry.kernel_size();
        let r = geometry.radius();
        let v = geometry.vec_num();
        let ohd = geometry.overhead();
        let expected = geometry.vectors();

        let _span = trace_span!(
            "separable_run",
            width = geometry.width(),
            height = rows,
            kernel = k,
            vec_num = v
        )
        .entered();

        let mut input = input.into_iter();
        let mut row_window = SlidingWindow::<T>::new(1, &geometry);
        let mut lines = LineBufferBank::<(T, T)>::new(k, vec_cols, v);
        let mut column = vec![(T::default(), T::default()); k * v];
        let mut pass = vec![(T::default(), T::default()); v];
        let mut samples = vec![0i64; k];
        let zero = vec![T::default(); v];
        let mut stats = StreamStats::default();

        for y in 0..rows + r {
            for x in 0..vec_cols + ohd {
                stats.steps += 1;
                if y < rows && x < vec_cols {
                    let vector = input.next().ok_or(FilterError::InputUnderrun {
                        expected,
                        got: stats.consumed,
                    })?;
                    if vector.len() != v {
                        return Err(FilterError::VectorWidthMismatch {
                            expected: v,
                            got: vector.len(),
                        });
                    }
                    stats.consumed += 1;
                    row_window.shift_and_refill(vector.as_slice(), x, vec_cols, self.border);
                } else {
                    row_window.shift_and_refill(&zero, x, vec_cols, self.border);
                }
                if x < ohd {
                    continue;
                }

                let xs = x - ohd;
                let row = row_window.row(0);
                for (lane, slot) in pass.iter_mut().enumerate() {
                    for (sample, &value) in samples.iter_mut().zip(&row[lane..lane + k]) {
                        *sample = value.to_i64();
                    }
                    let value = self.operator.apply(&self.kernel, &samples);
                    *slot = (T::from_i64(value, self.conversion), row[lane + r]);
                }
                lines.read_and_append(xs, &pass, &mut column);
                self.border.correct_rows(&mut column, k, v, y, rows);

                if y < r {
                    continue;
                }
                let oy = y - r;
                let mut data = Vector::<T>::zeroed(v);
                for (lane, slot) in data.as_mut_slice().iter_mut().enumerate() {
                    *slot = if self.border.passes_through()
                        && geometry.in_border_ring(xs * v + lane, oy)
                    {
                        column[r * v + lane].1
                    } else {
                        for (i, sample) in samples.iter_mut().enumerate() {
                            *sample = column[i * v + lane].0.to_i64();
                        }
                        T::from_i64(self.operator.apply(&self.kernel, &samples), self.conversion)
                    };
                }
                sink.push(StreamElement {
                    data,
                    is_first: oy == 0 && xs == 0,
                    is_last: oy + 1 == rows && xs + 1 == vec_cols,
                })?;
                stats.emitted += 1;
            }
        }

        trace_event!(
            "stream_complete",
            steps = stats.steps,
            consumed = stats.consumed,
            emitted = stats.emitted
        );
        Ok(stats)
    }

    /// Filters a whole frame held in memory.
    pub fn apply(&self, input: ImageView<'_, T>) -> FilterResult<OwnedImage<T>> {
        let (width, height) = (self.geometry.width(), self.geometry.height());
        if input.width() != width || input.height() != height {
            return Err(FilterError::InvalidDimensions {
                width: input.width(),
                height: input.height(),
            });
        }
        let mut out: Vec<StreamElement<T>> = Vec::with_capacity(self.geometry.vectors());
        self.run(vectorize(input, self.geometry.vec_num()), &mut out)?;
        collect_frame(out, width, height)
    }
}
