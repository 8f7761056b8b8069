//! Filter construction and streaming execution.
//!
//! A [`Filter`] is validated and compiled once by [`FilterBuilder::build`] and
//! can then process any number of frames. Each run allocates its own line
//! buffers and windows, so a filter is shareable across threads.

mod driver;
pub mod pipeline;
#[cfg(feature = "rayon")]
pub mod rayon;
pub mod separable;

pub use pipeline::{Pipeline, StreamStage};
pub use separable::{SeparableBuilder, SeparableFilter};

use crate::image::{ImageView, OwnedImage};
use crate::kernel::Kernel;
use crate::ops::{Operator, WindowOp};
use crate::pixel::{Conversion, Pixel};
use crate::stream::{collect_frame, vectorize, Discard, Sink, StreamElement, Vector};
use crate::util::{FilterError, FilterResult};
use crate::window::{BorderPolicy, Geometry};
use driver::StreamDriver;
use std::marker::PhantomData;

/// Most output streams a single filter produces.
pub const MAX_OUTPUTS: usize = 2;

/// One output stream: an operator and the kernel plane it reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    /// Operator evaluated for this stream.
    pub operator: Operator,
    /// Kernel plane index for operators that read coefficients.
    pub plane: usize,
}

impl OutputSpec {
    pub fn new(operator: Operator, plane: usize) -> Self {
        Self { operator, plane }
    }
}

/// Counters reported by every run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Loop iterations, including fill and drain.
    pub steps: usize,
    /// Vectors pulled from each input stream.
    pub consumed: usize,
    /// Vectors pushed to each output stream.
    pub emitted: usize,
}

/// Frames produced by [`Filter::apply`].
#[derive(Clone, Debug)]
pub struct FilterOutput<O> {
    /// Result of the first output stream.
    pub primary: OwnedImage<O>,
    /// Result of the second output stream, when configured.
    pub secondary: Option<OwnedImage<O>>,
}

#[derive(Clone, Debug)]
enum KernelSource {
    Unset,
    Size(usize),
    Explicit(Kernel),
}

/// Builder for [`Filter`].
///
/// Defaults: one lane per vector, no decimation, [`BorderPolicy::Replicate`]
/// and [`Conversion::Wrap`].
#[derive(Clone, Debug)]
pub struct FilterBuilder<I, O> {
    width: usize,
    height: usize,
    vec_num: usize,
    step: usize,
    border: BorderPolicy,
    conversion: Conversion,
    kernel: KernelSource,
    outputs: Vec<OutputSpec>,
    _pixels: PhantomData<fn(I) -> O>,
}

impl<I: Pixel, O: Pixel> FilterBuilder<I, O> {
    /// Starts a builder for `width x height` frames.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            vec_num: 1,
            step: 0,
            border: BorderPolicy::default(),
            conversion: Conversion::default(),
            kernel: KernelSource::Unset,
            outputs: Vec::new(),
            _pixels: PhantomData,
        }
    }

    /// Pixels per vector: 1, 2, 4 or 8.
    pub fn vec_num(mut self, vec_num: usize) -> Self {
        self.vec_num = vec_num;
        self
    }

    /// Skips `step` rows and columns between emitted pixels.
    ///
    /// `step + 1` must divide the vector width or be a multiple of it.
    pub fn step(mut self, step: usize) -> Self {
        self.step = step;
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

    /// Coefficient planes for the operators.
    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = KernelSource::Explicit(kernel);
        self
    }

    /// Window size for operators that ignore coefficients; uses a box kernel.
    pub fn kernel_size(mut self, size: usize) -> Self {
        self.kernel = KernelSource::Size(size);
        self
    }

    /// Adds an output stream reading kernel plane 0.
    pub fn output(self, operator: Operator) -> Self {
        self.output_plane(operator, 0)
    }

    /// Adds an output stream reading kernel plane `plane`.
    pub fn output_plane(mut self, operator: Operator, plane: usize) -> Self {
        self.outputs.push(OutputSpec::new(operator, plane));
        self
    }

    /// Validates the configuration and compiles the operators.
    pub fn build(self) -> FilterResult<Filter<I, O>> {
        let kernel = match self.kernel {
            KernelSource::Explicit(kernel) => kernel,
            KernelSource::Size(size) => Kernel::box_filter(size)?,
            KernelSource::Unset => {
                return Err(FilterError::UnsupportedOperator {
                    operator: "filter",
                    reason: "no kernel configured",
                })
            }
        };
        let geometry = Geometry::new(self.width, self.height, kernel.size(), self.vec_num)?;
        let stride = self.step + 1;
        if self.vec_num % stride != 0 && stride % self.vec_num != 0 {
            return Err(FilterError::InvalidStep {
                step: self.step,
                vec_num: self.vec_num,
            });
        }

        let Some(first) = self.outputs.first() else {
            return Err(FilterError::UnsupportedOperator {
                operator: "filter",
                reason: "at least one output operator is required",
            });
        };
        if self.outputs.len() > MAX_OUTPUTS {
            return Err(FilterError::UnsupportedOperator {
                operator: first.operator.name(),
                reason: "at most two output streams are supported",
            });
        }
        if O::BITS < I::BITS {
            return Err(FilterError::UnsupportedPixelType {
                operator: first.operator.name(),
                reason: "output must be at least as wide as the input",
            });
        }
        for spec in &self.outputs {
            spec.operator.validate::<I, O>(&kernel, spec.plane)?;
        }

        let range = (O::min_i64(), O::max_i64());
        let compiled = self
            .outputs
            .iter()
            .map(|spec| spec.operator.compile::<I>(&kernel, spec.plane, range))
            .collect();

        Ok(Filter {
            geometry,
            step: self.step,
            border: self.border,
            conversion: self.conversion,
            kernel,
            outputs: self.outputs,
            compiled,
            _pixels: PhantomData,
        })
    }
}

/// A compiled 2-D streaming filter from `I` pixels to `O` pixels.
pub struct Filter<I: Pixel, O: Pixel> {
    geometry: Geometry,
    step: usize,
    border: BorderPolicy,
    conversion: Conversion,
    kernel: Kernel,
    outputs: Vec<OutputSpec>,
    compiled: Vec<Box<dyn WindowOp<I>>>,
    _pixels: PhantomData<fn(I) -> O>,
}

impl<I: Pixel, O: Pixel> std::fmt::Debug for Filter<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter")
            .field("geometry", &self.geometry)
            .field("step", &self.step)
            .field("border", &self.border)
            .field("conversion", &self.conversion)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl<I: Pixel, O: Pixel> Filter<I, O> {
    /// Starts a [`FilterBuilder`] for `width x height` frames.
    pub fn builder(width: usize, height: usize) -> FilterBuilder<I, O> {
        FilterBuilder::new(width, height)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Rows and columns skipped between emitted pixels.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Lanes per emitted vector: `vec_num / (step + 1)`, at least one.
    pub fn output_vec_num(&self) -> usize {
        (self.geometry.vec_num() / (self.step + 1)).max(1)
    }

    /// Input vector columns between emitted vectors.
    pub(crate) fn column_stride(&self) -> usize {
        ((self.step + 1) / self.geometry.vec_num()).max(1)
    }

    /// Width of the emitted frame.
    pub fn output_width(&self) -> usize {
        self.geometry.width().div_ceil(self.step + 1)
    }

    /// Height of the emitted frame.
    pub fn output_height(&self) -> usize {
        self.geometry.height().div_ceil(self.step + 1)
    }

    /// Vectors emitted per output stream and frame.
    pub fn output_vectors(&self) -> usize {
        self.output_width() / self.output_vec_num() * self.output_height()
    }

    pub fn border(&self) -> BorderPolicy {
        self.border
    }

    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn outputs(&self) -> &[OutputSpec] {
        &self.outputs
    }

    /// Returns `true` when some output reads the secondary input.
    pub fn needs_secondary(&self) -> bool {
        self.outputs.iter().any(|spec| spec.operator.needs_secondary())
    }

    /// Streams one frame from a single input into `sink`.
    ///
    /// A second output stream, if configured, is discarded.
    pub fn run<A, S>(&self, input: A, sink: S) -> FilterResult<StreamStats>
    where
        A: IntoIterator<Item = Vector<I>>,
        S: Sink<O>,
    {
        self.run_with(input, None::<std::iter::Empty<Vector<I>>>, sink, Discard)
    }

    /// Streams one frame from one or two inputs into one or two sinks.
    ///
    /// Both inputs must carry `height * width / vec_num` vectors of
    /// `vec_num` lanes. Elements of [`Filter::output_vec_num`] lanes are
    /// pushed in raster order with the frame markers set on the first and
    /// last element of each output stream.
    pub fn run_with<A, B, S1, S2>(
        &self,
        primary: A,
        secondary: Option<B>,
        first: S1,
        second: S2,
    ) -> FilterResult<StreamStats>
    where
        A: IntoIterator<Item = Vector<I>>,
        B: IntoIterator<Item = Vector<I>>,
        S1: Sink<O>,
        S2: Sink<O>,
    {
        if secondary.is_none() {
            if let Some(spec) = self.outputs.iter().find(|s| s.operator.needs_secondary()) {
                return Err(FilterError::MissingSecondaryInput {
                    operator: spec.operator.name(),
                });
            }
        }
        StreamDriver::new(self, secondary.is_some()).run(
            primary.into_iter(),
            secondary.map(IntoIterator::into_iter),
            first,
            second,
        )
    }

    /// Filters a whole frame held in memory.
    pub fn apply(&self, input: ImageView<'_, I>) -> FilterResult<FilterOutput<O>> {
        self.apply_views(input, None)
    }

    /// Filters a frame pair for two-input operators.
    pub fn apply_pair(
        &self,
        primary: ImageView<'_, I>,
        secondary: ImageView<'_, I>,
    ) -> FilterResult<FilterOutput<O>> {
        self.apply_views(primary, Some(secondary))
    }

    fn apply_views<'a>(
        &self,
        primary: ImageView<'a, I>,
        secondary: Option<ImageView<'a, I>>,
    ) -> FilterResult<FilterOutput<O>> {
        for view in std::iter::once(&primary).chain(secondary.as_ref()) {
            self.check_frame(view)?;
        }
        let vec_num = self.geometry.vec_num();
        let mut first: Vec<StreamElement<O>> = Vec::with_capacity(self.output_vectors());
        let mut second: Vec<StreamElement<O>> = Vec::new();
        self.run_with(
            vectorize(primary, vec_num),
            secondary.map(|view| vectorize(view, vec_num)),
            &mut first,
            &mut second,
        )?;

        let (width, height) = (self.output_width(), self.output_height());
        let secondary = if self.outputs.len() > 1 {
            Some(collect_frame(second, width, height)?)
        } else {
            None
        };
        Ok(FilterOutput {
            primary: collect_frame(first, width, height)?,
            secondary,
        })
    }

    fn check_frame(&self, view: &ImageView<'_, I>) -> FilterResult<()> {
        if view.width() != self.geometry.width() || view.height() != self.geometry.height() {
            return Err(FilterError::InvalidDimensions {
                width: view.width(),
                height: view.height(),
            });
        }
        Ok(())
    }
}
