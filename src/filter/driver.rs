//! The raster loop feeding line buffers, windows and operators.

use super::{Filter, StreamStats};
use crate::ops::{Taps, WindowOp};
use crate::pixel::Pixel;
use crate::stream::{Sink, StreamElement, Vector, MAX_VEC_NUM};
use crate::trace::{trace_event, trace_span};
use crate::util::{FilterError, FilterResult};
use crate::window::{LineBufferBank, SlidingWindow};

/// Per-run state: one line buffer, row group and window per input stream.
pub(crate) struct StreamDriver<'f, I: Pixel, O: Pixel> {
    filter: &'f Filter<I, O>,
    lines: Vec<LineBufferBank<I>>,
    groups: Vec<Vec<I>>,
    windows: Vec<SlidingWindow<I>>,
}

impl<'f, I: Pixel, O: Pixel> StreamDriver<'f, I, O> {
    pub(crate) fn new(filter: &'f Filter<I, O>, two_inputs: bool) -> Self {
        let geometry = &filter.geometry;
        let k = geometry.kernel_size();
        let v = geometry.vec_num();
        let inputs = if two_inputs { 2 } else { 1 };
        Self {
            filter,
            lines: (0..inputs)
                .map(|_| LineBufferBank::new(k, geometry.vec_cols(), v))
                .collect(),
            groups: (0..inputs).map(|_| vec![I::default(); k * v]).collect(),
            windows: (0..inputs).map(|_| SlidingWindow::new(k, geometry)).collect(),
        }
    }

    /// Runs the whole frame: `ROWS + R` rows of `VEC_COLS + OHD` steps.
    ///
    /// With a step `s`, only rows that are multiples of `s + 1` and vector
    /// columns that are multiples of the column stride are emitted.
    pub(crate) fn run<A, B, S1, S2>(
        mut self,
        mut primary: A,
        mut secondary: Option<B>,
        mut first: S1,
        mut second: S2,
    ) -> FilterResult<StreamStats>
    where
        A: Iterator<Item = Vector<I>>,
        B: Iterator<Item = Vector<I>>,
        S1: Sink<O>,
        S2: Sink<O>,
    {
        let filter = self.filter;
        let geometry = filter.geometry;
        let rows = geometry.height();
        let vec_cols = geometry.vec_cols();
        let r = geometry.radius();
        let v = geometry.vec_num();
        let ohd = geometry.overhead();
        let expected = geometry.vectors();
        let row_stride = filter.step() + 1;
        let col_stride = filter.column_stride();
        let last_row = (rows - 1) / row_stride * row_stride;
        let last_col = (vec_cols - 1) / col_stride * col_stride;
        let lanes_out = filter.output_vec_num();

        let _span = trace_span!(
            "filter_run",
            width = geometry.width(),
            height = rows,
            kernel = geometry.kernel_size(),
            vec_num = v,
            step = filter.step(),
            outputs = filter.compiled.len()
        )
        .entered();

        let zero = Vector::<I>::zeroed(v);
        let mut stats = StreamStats::default();
        let mut results = [0i64; MAX_VEC_NUM];

        for y in 0..rows + r {
            for x in 0..vec_cols + ohd {
                stats.steps += 1;
                let reading = y < rows && x < vec_cols;

                let a = if reading {
                    next_vector(&mut primary, v, expected, stats.consumed)?
                } else {
                    zero
                };
                self.advance(0, &a, x, y);
                if let Some(stream) = secondary.as_mut() {
                    let b = if reading {
                        next_vector(stream, v, expected, stats.consumed)?
                    } else {
                        zero
                    };
                    self.advance(1, &b, x, y);
                }
                if reading {
                    stats.consumed += 1;
                }

                if y < r || x < ohd {
                    continue;
                }
                let (ox, oy) = (x - ohd, y - r);
                if oy % row_stride != 0 || ox % col_stride != 0 {
                    continue;
                }
                let is_first = oy == 0 && ox == 0;
                let is_last = oy == last_row && ox == last_col;
                for (index, op) in filter.compiled.iter().enumerate() {
                    let data = self.evaluate(index, op.as_ref(), ox, oy, &mut results[..lanes_out]);
                    let element = StreamElement {
                        data,
                        is_first,
                        is_last,
                    };
                    if index == 0 {
                        first.push(element)?;
                    } else {
                        second.push(element)?;
                    }
                }
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

    /// Pushes one input vector through its line buffer into its window.
    fn advance(&mut self, input: usize, vector: &Vector<I>, x: usize, y: usize) {
        let geometry = &self.filter.geometry;
        let border = self.filter.border;
        let vec_cols = geometry.vec_cols();
        let group = &mut self.groups[input];
        if x < vec_cols {
            self.lines[input].read_and_append(x, vector.as_slice(), group);
            border.correct_rows(
                group,
                geometry.kernel_size(),
                geometry.vec_num(),
                y,
                geometry.height(),
            );
        }
        self.windows[input].shift_and_refill(group, x, vec_cols, border);
    }

    /// Evaluates output stream `index` for every emitted lane of the current step.
    ///
    /// Emitted lane `j` reads the window at column offset `j * (step + 1)`.
    fn evaluate(
        &self,
        index: usize,
        op: &dyn WindowOp<I>,
        ox: usize,
        oy: usize,
        lanes: &mut [i64],
    ) -> Vector<O> {
        let filter = self.filter;
        let geometry = &filter.geometry;
        let k = geometry.kernel_size();
        let v = geometry.vec_num();
        let primary = &self.windows[0];
        let secondary = self.windows.get(1);

        let stride = filter.step() + 1;
        let passthrough = filter.border.passes_through();
        let in_ring = |lane: usize| passthrough && geometry.in_border_ring(ox * v + lane * stride, oy);
        if !(0..lanes.len()).all(in_ring) {
            if stride == 1 {
                op.compute_lanes(primary, secondary, k, lanes);
            } else {
                for (lane, slot) in lanes.iter_mut().enumerate() {
                    *slot = op.compute(&Taps::new(primary, secondary, lane * stride, k));
                }
            }
        }
        if passthrough {
            let plane = filter.outputs[index].operator.passthrough_plane();
            for (lane, slot) in lanes.iter_mut().enumerate() {
                if in_ring(lane) {
                    *slot = Taps::new(primary, secondary, lane * stride, k).center(plane);
                }
            }
        }

        let mut out = Vector::<O>::zeroed(lanes.len());
        for (slot, &value) in out.as_mut_slice().iter_mut().zip(lanes.iter()) {
            *slot = O::from_i64(value, filter.conversion);
        }
        out
    }
}

fn next_vector<T, S>(stream: &mut S, lanes: usize, expected: usize, consumed: usize) -> FilterResult<Vector<T>>
where
    T: Copy + Default,
    S: Iterator<Item = Vector<T>>,
{
    let vector = stream.next().ok_or(FilterError::InputUnderrun {
        expected,
        got: consumed,
    })?;
    if vector.len() != lanes {
        return Err(FilterError::VectorWidthMismatch {
            expected: lanes,
            got: vector.len(),
        });
    }
    Ok(vector)
}
