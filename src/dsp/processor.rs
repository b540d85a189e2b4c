use crate::{
    config::ProcessSpec,
    dsp::{buffer::SampleBuffer, sample::Sample},
};

/// Input/output pair handed to a processor for one block.
///
/// - input: The block to read from
/// - output: The block to write to (same channel and sample counts)
/// - bypassed: When set, processors copy input to output untouched
pub struct ProcessContext<'a, T: Sample> {
    pub input: &'a SampleBuffer<T>,
    pub output: &'a mut SampleBuffer<T>,
    pub bypassed: bool,
}

impl<'a, T: Sample> ProcessContext<'a, T> {
    pub fn new(input: &'a SampleBuffer<T>, output: &'a mut SampleBuffer<T>) -> Self {
        assert_eq!(input.num_channels(), output.num_channels());
        assert_eq!(input.num_samples(), output.num_samples());

        Self {
            input,
            output,
            bypassed: false,
        }
    }

    pub fn bypassed(mut self, bypassed: bool) -> Self {
        self.bypassed = bypassed;
        self
    }
}

/// Core trait for block processors.
///
/// `prepare` may allocate and must run off the audio thread. `reset` and the
/// `process*` calls never allocate, lock or block.
pub trait Processor<T: Sample>: Send {
    fn prepare(&mut self, spec: &ProcessSpec);

    fn reset(&mut self);

    /// Process `block` in place.
    fn process_block(&mut self, block: &mut SampleBuffer<T>);

    /// Process from `context.input` into `context.output`.
    ///
    /// Default implementation copies the input across and runs
    /// `process_block` on the output.
    fn process(&mut self, context: ProcessContext<'_, T>) {
        context.output.make_copy_of(context.input);
        if context.bypassed {
            return;
        }
        self.process_block(context.output);
    }
}

/// Allow boxed processors to be used as processors (for dynamic dispatch)
impl<T: Sample> Processor<T> for Box<dyn Processor<T>> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        (**self).prepare(spec)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn process_block(&mut self, block: &mut SampleBuffer<T>) {
        (**self).process_block(block)
    }

    fn process(&mut self, context: ProcessContext<'_, T>) {
        (**self).process(context)
    }
}
