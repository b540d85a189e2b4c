//! Multichannel sample storage.

/*
SampleBuffer
============

One contiguous allocation holds every channel back to back:

    [ ch0: s0 s1 ... sN-1 | ch1: s0 s1 ... sN-1 | ... ]

Channel `c` lives at `data[c * num_samples .. (c + 1) * num_samples]`, so a
channel is always a plain slice and the channel count can never exceed
`MAX_CHANNELS`.

The `cleared` Flag
------------------

`cleared` is true when every sample is known to be zero. It lets the common
"this bus is silent" case skip work:

  clear()       already cleared → nothing to do
  apply_gain()  cleared → nothing to scale
  add_from()    cleared → write (source × gain) directly instead of
                accumulating onto zeros

Handing out a mutable channel slice drops the flag, since the caller may
write anything through it.

Allocation
----------

`set_size` is the only method that allocates. Call it from prepare/setup
code, never from the audio callback.
*/

use crate::{dsp::sample::Sample, MAX_CHANNELS};

#[derive(Debug, Clone, Default)]
pub struct SampleBuffer<T: Sample> {
    data: Vec<T>,
    num_channels: usize,
    num_samples: usize,
    cleared: bool,
}

impl<T: Sample> SampleBuffer<T> {
    /// Create a buffer with pre-allocated, zeroed channels.
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        let mut buffer = Self::default();
        buffer.set_size(num_channels, num_samples);
        buffer
    }

    /// Build a buffer from per-channel slices of equal length.
    pub fn from_channels(channels: &[&[T]]) -> Self {
        let num_samples = channels.first().map_or(0, |c| c.len());
        let mut buffer = Self::new(channels.len(), num_samples);
        for (ch, source) in channels.iter().enumerate() {
            buffer.copy_from(ch, 0, source);
        }
        buffer
    }

    /// Reallocate all channel storage. Always allocates.
    ///
    /// # Panics
    /// Panics if `num_channels` is zero or above `MAX_CHANNELS`, or if
    /// `num_samples` is zero.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        assert!(
            (1..=MAX_CHANNELS).contains(&num_channels),
            "channel count {num_channels} outside 1..={MAX_CHANNELS}"
        );
        assert!(num_samples > 0, "buffer must hold at least one sample");

        self.data = vec![T::zero(); num_channels * num_samples];
        self.num_channels = num_channels;
        self.num_samples = num_samples;
        self.cleared = true;

        log::debug!("sample buffer resized to {num_channels} x {num_samples}");
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    #[inline]
    fn range(&self, channel: usize) -> std::ops::Range<usize> {
        assert!(
            channel < self.num_channels,
            "channel {channel} out of range ({} channels)",
            self.num_channels
        );
        let start = channel * self.num_samples;
        start..start + self.num_samples
    }

    /// Read-only view of one channel.
    #[inline]
    pub fn read_channel(&self, channel: usize) -> &[T] {
        let range = self.range(channel);
        &self.data[range]
    }

    /// Mutable view of one channel. Drops the cleared flag.
    #[inline]
    pub fn write_channel(&mut self, channel: usize) -> &mut [T] {
        let range = self.range(channel);
        self.cleared = false;
        &mut self.data[range]
    }

    /// Read-only iterator over every channel.
    pub fn channels(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks_exact(self.num_samples.max(1))
    }

    /// Mutable iterator over every channel. Drops the cleared flag.
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.cleared = false;
        self.data.chunks_exact_mut(self.num_samples.max(1))
    }

    /// Mutable views of channels 0 and 1 at once. Drops the cleared flag.
    ///
    /// # Panics
    /// Panics if the buffer has fewer than two channels.
    pub fn stereo_mut(&mut self) -> (&mut [T], &mut [T]) {
        assert!(self.num_channels >= 2, "stereo access needs two channels");
        self.cleared = false;

        let (left, rest) = self.data.split_at_mut(self.num_samples);
        (left, &mut rest[..self.num_samples])
    }

    /// Zero every channel unless the buffer is already known to be silent.
    pub fn clear(&mut self) {
        if self.cleared {
            return;
        }

        self.data.fill(T::zero());
        self.cleared = true;
    }

    /// Scale every sample. A zero gain clears the buffer.
    pub fn apply_gain(&mut self, gain: f64) {
        if gain == 1.0 || self.cleared {
            return;
        }

        if gain == 0.0 {
            self.clear();
            return;
        }

        let g = T::splat(gain);
        for sample in self.data.iter_mut() {
            *sample *= g;
        }
    }

    /// Replace samples in `dest_channel` starting at `start_sample`.
    ///
    /// # Panics
    /// Panics if the channel is out of range or `source` runs past the end.
    pub fn copy_from(&mut self, dest_channel: usize, start_sample: usize, source: &[T]) {
        let dest = self.dest_slice(dest_channel, start_sample, source.len());
        if source.is_empty() {
            return;
        }

        dest.copy_from_slice(source);
        self.cleared = false;
    }

    /// Accumulate `source × gain` into `dest_channel` starting at `start_sample`.
    ///
    /// When the buffer is cleared the scaled source is written directly.
    ///
    /// # Panics
    /// Panics if the channel is out of range or `source` runs past the end.
    pub fn add_from(&mut self, dest_channel: usize, start_sample: usize, source: &[T], gain: f64) {
        let was_cleared = self.cleared;
        let dest = self.dest_slice(dest_channel, start_sample, source.len());
        if gain == 0.0 || source.is_empty() {
            return;
        }

        let g = T::splat(gain);
        match (was_cleared, gain == 1.0) {
            (true, true) => dest.copy_from_slice(source),
            (true, false) => {
                for (d, &s) in dest.iter_mut().zip(source) {
                    *d = s * g;
                }
            }
            (false, true) => {
                for (d, &s) in dest.iter_mut().zip(source) {
                    *d += s;
                }
            }
            (false, false) => {
                for (d, &s) in dest.iter_mut().zip(source) {
                    *d += s * g;
                }
            }
        }

        self.cleared = false;
    }

    /// Copy another buffer's contents, channel by channel.
    ///
    /// Channels and samples beyond either buffer's size are left untouched.
    pub fn make_copy_of(&mut self, other: &SampleBuffer<T>) {
        if other.cleared {
            self.clear();
            return;
        }

        let channels = self.num_channels.min(other.num_channels);
        let samples = self.num_samples.min(other.num_samples);
        for ch in 0..channels {
            let range = self.range(ch);
            self.data[range][..samples].copy_from_slice(&other.read_channel(ch)[..samples]);
        }
        self.cleared = false;
    }

    /// True if any sample is NaN. Meant for debug assertions.
    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|s| s.is_nan())
    }

    fn dest_slice(&mut self, channel: usize, start_sample: usize, len: usize) -> &mut [T] {
        let range = self.range(channel);
        assert!(
            start_sample + len <= self.num_samples,
            "writing {len} samples at {start_sample} overruns capacity {}",
            self.num_samples
        );
        &mut self.data[range][start_sample..start_sample + len]
    }
}
