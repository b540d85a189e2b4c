//! Fractional delay line.

/*
Fractional Delay
================

A delay line remembers the last N samples per channel in a circular buffer.
Both cursors walk BACKWARDS through the buffer:

    push:  buffer[write] = x;  write = (write − 1) mod size
    pop:   read tap at (read + delay) mod size;  read = (read − 1) mod size

Because both cursors start at 0 and move in lockstep, the sample pushed
`d` steps ago sits exactly `d` slots "ahead" of the read cursor. A delay of
zero therefore returns the sample that was just pushed.

    size = max(4, max_delay + 1)

Interpolation
-------------

Delays are rarely whole numbers of samples (modulated chorus, a 3.7 ms
slapback). The delay is split into an integer tap and a fraction, and the two
neighbouring taps are blended linearly:

    v1 = buffer[read + delay_int]          (newer)
    v2 = buffer[read + delay_int + 1]      (one sample older)
    y  = v1 + frac × (v2 − v1)

Vector Samples
--------------

With a multi-lane sample type every lane may ask for its own delay (four
voices with detuned chorus times, say). When all lanes agree the shared tap
is used directly. Otherwise each lane resolves its own integer tap and
fraction, so lane differences are honoured exactly.
*/

use crate::{
    config::ProcessSpec,
    dsp::{buffer::SampleBuffer, processor::Processor, sample::Sample},
};

#[derive(Debug, Clone)]
pub struct DelayLine<T: Sample> {
    sample_rate: f64,
    total_size: usize,

    buffers: Vec<Vec<T>>,
    write_pos: Vec<usize>,
    read_pos: Vec<usize>,

    delay: T,
    delay_int: usize,
    delay_frac: T,
    uniform: bool,
}

impl<T: Sample> Default for DelayLine<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Sample> DelayLine<T> {
    /// Create a delay line able to delay by up to `max_delay_samples`.
    ///
    /// Channel storage is allocated by `prepare`.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            sample_rate: 44_100.0,
            total_size: (max_delay_samples + 1).max(4),
            buffers: Vec::new(),
            write_pos: Vec::new(),
            read_pos: Vec::new(),
            delay: T::zero(),
            delay_int: 0,
            delay_frac: T::zero(),
            uniform: true,
        }
    }

    /// Largest delay that can be set. May exceed the requested maximum for
    /// very short lines.
    #[inline]
    pub fn maximum_delay_in_samples(&self) -> usize {
        self.total_size - 1
    }

    /// Resize every channel's storage and clear the line. Allocates.
    pub fn set_maximum_delay_in_samples(&mut self, max_delay_samples: usize) {
        self.total_size = (max_delay_samples + 1).max(4);
        for buffer in &mut self.buffers {
            buffer.resize(self.total_size, T::zero());
        }
        self.reset();
        self.set_delay_lanes(self.delay);

        log::debug!("delay line capacity set to {} samples", self.total_size);
    }

    /// Set one delay for every lane, clamped to `[0, max]`.
    pub fn set_delay(&mut self, delay_samples: f64) {
        let max = self.maximum_delay_in_samples() as f64;
        let delay = if delay_samples.is_nan() { 0.0 } else { delay_samples.clamp(0.0, max) };

        let whole = delay.floor();
        self.delay = T::splat(delay);
        self.delay_int = whole as usize;
        self.delay_frac = T::splat(delay - whole);
        self.uniform = true;
    }

    /// Set an independent delay per lane, each clamped to `[0, max]`.
    pub fn set_delay_lanes(&mut self, delay_samples: T) {
        let max = self.maximum_delay_in_samples() as f64;
        let delay = delay_samples.clamp_lanes(0.0, max);
        let first = delay.lane(0);

        if (1..T::LANES).all(|lane| delay.lane(lane) == first) {
            self.set_delay(first);
            return;
        }

        self.delay = delay;
        self.delay_int = first.floor() as usize;
        self.delay_frac = T::from_fn(|lane| {
            let d = delay.lane(lane);
            d - d.floor()
        });
        self.uniform = false;
    }

    /// Set the delay in milliseconds at the prepared sample rate.
    pub fn set_delay_ms(&mut self, delay_ms: f64) {
        self.set_delay(delay_ms * 0.001 * self.sample_rate);
    }

    /// Current delay, per lane.
    pub fn delay(&self) -> T {
        self.delay
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.buffers.len()
    }

    /// Write one sample and step the write cursor.
    #[inline]
    pub fn push_sample(&mut self, channel: usize, sample: T) {
        let pos = self.write_pos[channel];
        self.buffers[channel][pos] = sample;
        self.write_pos[channel] = (pos + self.total_size - 1) % self.total_size;
    }

    /// Read one interpolated sample.
    ///
    /// - delay: Replaces the current delay first when given
    /// - update_read: Step the read cursor (pass `false` for extra taps read
    ///   at the same instant)
    #[inline]
    pub fn pop_sample(&mut self, channel: usize, delay: Option<f64>, update_read: bool) -> T {
        if let Some(delay) = delay {
            self.set_delay(delay);
        }
        self.pop(channel, update_read)
    }

    /// `pop_sample` with a per-lane delay.
    #[inline]
    pub fn pop_sample_lanes(&mut self, channel: usize, delay: Option<T>, update_read: bool) -> T {
        if let Some(delay) = delay {
            self.set_delay_lanes(delay);
        }
        self.pop(channel, update_read)
    }

    #[inline]
    fn pop(&mut self, channel: usize, update_read: bool) -> T {
        let result = if self.uniform {
            self.interpolate(channel)
        } else {
            self.interpolate_lanes(channel)
        };

        if update_read {
            let pos = self.read_pos[channel];
            self.read_pos[channel] = (pos + self.total_size - 1) % self.total_size;
        }

        result
    }

    #[inline]
    fn interpolate(&self, channel: usize) -> T {
        let buffer = &self.buffers[channel];
        let index1 = (self.read_pos[channel] + self.delay_int) % self.total_size;
        let index2 = (index1 + 1) % self.total_size;

        let v1 = buffer[index1];
        let v2 = buffer[index2];
        v1 + self.delay_frac * (v2 - v1)
    }

    fn interpolate_lanes(&self, channel: usize) -> T {
        let buffer = &self.buffers[channel];
        let read = self.read_pos[channel];

        T::from_fn(|lane| {
            let d = self.delay.lane(lane);
            let index1 = (read + d.floor() as usize) % self.total_size;
            let index2 = (index1 + 1) % self.total_size;

            let v1 = buffer[index1].lane(lane);
            let v2 = buffer[index2].lane(lane);
            v1 + self.delay_frac.lane(lane) * (v2 - v1)
        })
    }
}

impl<T: Sample> Processor<T> for DelayLine<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.num_channels > 0);

        self.sample_rate = spec.sample_rate;
        self.buffers = vec![vec![T::zero(); self.total_size]; spec.num_channels];
        self.write_pos = vec![0; spec.num_channels];
        self.read_pos = vec![0; spec.num_channels];

        log::debug!(
            "delay line prepared: {} ch x {} samples @ {} Hz",
            spec.num_channels,
            self.total_size,
            spec.sample_rate
        );
    }

    fn reset(&mut self) {
        self.write_pos.fill(0);
        self.read_pos.fill(0);
        for buffer in &mut self.buffers {
            buffer.fill(T::zero());
        }
    }

    /// Delay every channel by the current delay.
    fn process_block(&mut self, block: &mut SampleBuffer<T>) {
        assert!(
            block.num_channels() <= self.buffers.len(),
            "block has more channels than prepared state"
        );

        for (ch, samples) in block.channels_mut().enumerate() {
            for sample in samples.iter_mut() {
                self.push_sample(ch, *sample);
                *sample = self.pop(ch, true);
            }
        }
    }
}
