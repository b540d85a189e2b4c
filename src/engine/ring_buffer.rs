//! Fixed-size multichannel exchange buffer.

/*
RingBuffer
==========

A small FIFO of audio samples used to hand blocks between two parts of a
program running at different rates, for example an audio callback writing
every block and an analysis timer reading a snapshot now and then.

Cursors move backwards, the same way the delay line's do:

    write:  data[write] = x;  write = (write − 1) mod size
    read:   y = data[read];   read  = (read − 1) mod size

Because writer and reader walk the same direction from the same start, the
reader sees samples in the order they were written.

There is no synchronisation and no overrun detection. One writer and one
reader are assumed, the caller serialises them, and the buffer is sized
generously enough that the writer never laps the reader.
*/

use crate::{
    dsp::{buffer::SampleBuffer, sample::Sample},
    MAX_CHANNELS,
};

#[derive(Debug, Clone, Default)]
pub struct RingBuffer<T: Sample> {
    data: Vec<Vec<T>>,
    size: usize,
    write_pos: Vec<usize>,
    read_pos: Vec<usize>,
}

impl<T: Sample> RingBuffer<T> {
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        let mut ring = Self::default();
        ring.set_size(num_channels, num_samples);
        ring
    }

    /// Reallocate storage and rewind both cursors. Allocates.
    ///
    /// # Panics
    /// Panics if `num_channels` is zero or above `MAX_CHANNELS`, or if
    /// `num_samples` is zero.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        assert!(
            (1..=MAX_CHANNELS).contains(&num_channels),
            "channel count {num_channels} outside 1..={MAX_CHANNELS}"
        );
        assert!(num_samples > 0, "ring buffer must hold at least one sample");

        self.data = vec![vec![T::zero(); num_samples]; num_channels];
        self.size = num_samples;
        self.write_pos = vec![0; num_channels];
        self.read_pos = vec![0; num_channels];

        log::debug!("ring buffer resized to {num_channels} x {num_samples}");
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.data.len()
    }

    /// Write up to `size` samples of `input` into `channel`.
    ///
    /// Returns the number of samples written.
    pub fn write_channel(&mut self, channel: usize, input: &[T]) -> usize {
        let count = input.len().min(self.size);
        let data = &mut self.data[channel];
        let mut pos = self.write_pos[channel];

        for &sample in &input[..count] {
            data[pos] = sample;
            pos = (pos + self.size - 1) % self.size;
        }

        self.write_pos[channel] = pos;
        count
    }

    /// Fill `output` from `channel`, oldest sample first.
    pub fn read_channel(&mut self, channel: usize, output: &mut [T]) {
        let data = &self.data[channel];
        let mut pos = self.read_pos[channel];

        for sample in output.iter_mut() {
            *sample = data[pos];
            pos = (pos + self.size - 1) % self.size;
        }

        self.read_pos[channel] = pos;
    }

    /// Write the first `num_samples` of every shared channel of `input`.
    ///
    /// # Panics
    /// Panics if `num_samples` exceeds the block length.
    pub fn write_data(&mut self, input: &SampleBuffer<T>, num_samples: usize) {
        assert!(num_samples <= input.num_samples(), "write past end of block");

        for ch in 0..input.num_channels().min(self.num_channels()) {
            self.write_channel(ch, &input.read_channel(ch)[..num_samples]);
        }
    }

    /// Read `num_samples` into every shared channel of `output`.
    ///
    /// # Panics
    /// Panics if `num_samples` exceeds the block length.
    pub fn read_data(&mut self, output: &mut SampleBuffer<T>, num_samples: usize) {
        assert!(num_samples <= output.num_samples(), "read past end of block");

        for ch in 0..output.num_channels().min(self.num_channels()) {
            self.read_channel(ch, &mut output.write_channel(ch)[..num_samples]);
        }
    }

    /// Zero the stored samples. Cursors keep their positions.
    pub fn clear(&mut self) {
        for channel in &mut self.data {
            channel.fill(T::zero());
        }
    }
}
