//! Producer/consumer chaining of filters on scoped threads.
//!
//! Every upstream stage runs on its own thread and pushes [`StreamElement`]s
//! into a bounded channel; the next stage pulls vectors from the receiving
//! end. The last stage runs on the calling thread and writes to the caller's
//! sink. When a stage fails the channels close behind it, and the reported
//! error is the first one in stage order that is not a closed channel.

use super::{Filter, SeparableFilter, StreamStats};
use crate::pixel::Pixel;
use crate::stream::{Sink, StreamElement, Vector};
use crate::trace::{trace_event, trace_failure, trace_span};
use crate::util::{FilterError, FilterResult};
use std::sync::mpsc::{sync_channel, Receiver};
use std::thread;

/// Elements buffered between two stages when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 64;

/// A filter that consumes one vector stream and produces one element stream.
pub trait StreamStage<I, O>: Sync {
    /// Name used in traces.
    fn stage_name(&self) -> &'static str;

    /// Processes one complete frame.
    fn process(
        &self,
        input: &mut dyn Iterator<Item = Vector<I>>,
        sink: &mut dyn Sink<O>,
    ) -> FilterResult<StreamStats>;
}

impl<I: Pixel, O: Pixel> StreamStage<I, O> for Filter<I, O> {
    fn stage_name(&self) -> &'static str {
        self.outputs
            .first()
            .map(|spec| spec.operator.name())
            .unwrap_or("filter")
    }

    fn process(
        &self,
        input: &mut dyn Iterator<Item = Vector<I>>,
        sink: &mut dyn Sink<O>,
    ) -> FilterResult<StreamStats> {
        self.run(input, sink)
    }
}

impl<T: Pixel> StreamStage<T, T> for SeparableFilter<T> {
    fn stage_name(&self) -> &'static str {
        self.operator().name()
    }

    fn process(
        &self,
        input: &mut dyn Iterator<Item = Vector<T>>,
        sink: &mut dyn Sink<T>,
    ) -> FilterResult<StreamStats> {
        self.run(input, sink)
    }
}

fn vectors<T: Send + 'static>(receiver: Receiver<StreamElement<T>>) -> impl Iterator<Item = Vector<T>> + Send {
    receiver.into_iter().map(|element| element.data)
}

fn root_cause(results: Vec<FilterResult<StreamStats>>) -> FilterResult<Vec<StreamStats>> {
    for (stage, err) in results
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    {
        trace_failure!(stage, err);
    }
    let first_error = results.iter().find_map(|r| r.as_ref().err()).cloned();
    let root = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .find(|e| !matches!(e, FilterError::ChannelClosed { .. }))
        .cloned();
    match root.or(first_error) {
        Some(err) => Err(err),
        None => Ok(results.into_iter().filter_map(Result::ok).collect()),
    }
}

/// Runs `first` and `second` concurrently, feeding `first`'s output into `second`.
///
/// Returns the statistics of both stages.
pub fn chain<A, B, C, In, S>(
    first: &dyn StreamStage<A, B>,
    second: &dyn StreamStage<B, C>,
    input: In,
    capacity: usize,
    mut sink: S,
) -> FilterResult<[StreamStats; 2]>
where
    A: Pixel,
    B: Pixel,
    C: Pixel,
    In: IntoIterator<Item = Vector<A>>,
    In::IntoIter: Send,
    S: Sink<C>,
{
    let _span = trace_span!(
        "pipeline_run",
        stages = 2usize,
        first = first.stage_name(),
        second = second.stage_name()
    )
    .entered();

    let results = thread::scope(|scope| {
        let (tx, rx) = sync_channel::<StreamElement<B>>(capacity.max(1));
        let mut source = input.into_iter();
        let producer = scope.spawn(move || {
            let mut tx = tx;
            first.process(&mut source, &mut tx)
        });
        let mut feed = vectors(rx);
        let last = second.process(&mut feed, &mut sink);
        drop(feed);
        let upstream = match producer.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        };
        vec![upstream, last]
    });

    let stats = root_cause(results)?;
    trace_event!("stream_complete", stages = stats.len());
    Ok([stats[0], stats[1]])
}

/// A linear chain of same-typed stages.
pub struct Pipeline<'a, T> {
    stages: Vec<&'a dyn StreamStage<T, T>>,
    capacity: usize,
}

impl<'a, T: Pixel> Default for Pipeline<'a, T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<'a, T: Pixel> Pipeline<'a, T> {
    /// Empty pipeline buffering `capacity` elements between stages.
    pub fn new(capacity: usize) -> Self {
        Self {
            stages: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a stage.
    pub fn stage(mut self, stage: &'a dyn StreamStage<T, T>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Streams one frame through every stage; returns per-stage statistics.
    pub fn run<In, S>(&self, input: In, mut sink: S) -> FilterResult<Vec<StreamStats>>
    where
        In: IntoIterator<Item = Vector<T>>,
        In::IntoIter: Send,
        S: Sink<T>,
    {
        let Some((last, upstream)) = self.stages.split_last() else {
            return Err(FilterError::UnsupportedOperator {
                operator: "pipeline",
                reason: "no stages configured",
            });
        };
        let _span = trace_span!(
            "pipeline_run",
            stages = self.stages.len(),
            capacity = self.capacity
        )
        .entered();

        let results = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(upstream.len());
            let mut feed: Box<dyn Iterator<Item = Vector<T>> + Send + '_> =
                Box::new(input.into_iter());
            for &stage in upstream {
                let (tx, rx) = sync_channel::<StreamElement<T>>(self.capacity);
                let mut source = feed;
                handles.push(scope.spawn(move || {
                    let mut tx = tx;
                    stage.process(&mut source, &mut tx)
                }));
                feed = Box::new(vectors(rx));
            }
            let last = last.process(&mut feed, &mut sink);
            drop(feed);

            let mut results: Vec<FilterResult<StreamStats>> = handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect();
            results.push(last);
            results
        });

        let stats = root_cause(results)?;
        trace_event!("stream_complete", stages = stats.len());
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::{chain, Pipeline};
    use crate::filter::Filter;
    use crate::image::ImageView;
    use crate::ops::Operator;
    use crate::stream::{collect_frame, vectorize, StreamElement, Vector};
    use crate::util::FilterError;

    fn erode(width: usize, height: usize) -> Filter<u8, u8> {
        Filter::builder(width, height)
            .kernel_size(3)
            .output(Operator::Erode)
            .build()
            .unwrap()
    }

    fn dilate(width: usize, height: usize) -> Filter<u8, u8> {
        Filter::builder(width, height)
            .kernel_size(3)
            .output(Operator::Dilate)
            .build()
            .unwrap()
    }

    #[test]
    fn chain_matches_sequential_application() {
        let (w, h) = (12, 9);
        let data: Vec<u8> = (0..w * h).map(|i| ((i * 29) % 256) as u8).collect();
        let view = ImageView::from_slice(&data, w, h).unwrap();
        let (first, second) = (erode(w, h), dilate(w, h));

        let mid = first.apply(view).unwrap().primary;
        let expected = second.apply(mid.view()).unwrap().primary;

        let mut out: Vec<StreamElement<u8>> = Vec::new();
        let stats = chain::<u8, u8, u8, _, _>(&first, &second, vectorize(view, 1), 4, &mut out).unwrap();
        assert_eq!(stats[0].emitted, w * h);
        assert_eq!(stats[1].consumed, w * h);
        assert_eq!(collect_frame(out, w, h).unwrap(), expected);
    }

    #[test]
    fn pipeline_reports_upstream_underrun() {
        let (first, second) = (erode(4, 4), dilate(4, 4));
        let pipeline = Pipeline::<u8>::new(2).stage(&first).stage(&second);
        let input = vec![Vector::from_slice(&[7u8]); 5];
        let mut out: Vec<StreamElement<u8>> = Vec::new();
        let err = pipeline.run(input, &mut out).err().unwrap();
        assert_eq!(err, FilterError::InputUnderrun { expected: 16, got: 5 });
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let pipeline = Pipeline::<u8>::default();
        let mut out: Vec<StreamElement<u8>> = Vec::new();
        assert!(pipeline.run(Vec::<Vector<u8>>::new(), &mut out).is_err());
    }
}
