//! Windowed RMS level metering.

/*
Volume Metering
===============

A level meter should not flicker with every block. Each call to
`measure_block` computes the block's RMS per channel and stores its square in
a short circular window; the displayed level is the RMS over that window:

    window_len = window_seconds × sample_rate / block_size
    level      = sqrt(mean(window))

With the default 0.1 s window at 48 kHz and 512-sample blocks the window
holds 9 blocks. If the window rounds down to zero entries the meter simply
reports the latest block.

The same window doubles as a gain-reduction meter: `measure_gain_reduction`
records one linear gain value per block on channel 0.

Reading From Another Thread
---------------------------

The meter itself lives on the audio thread. A UI thread gets readings
through a wait-free SPSC queue (`with_feed`); when the reader falls behind
the queue fills up and new readings are dropped rather than blocking audio.
*/

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::{DspConfig, ProcessSpec},
    dsp::{buffer::SampleBuffer, sample::Sample},
};

/// One snapshot of the stereo meter.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterReading {
    pub rms: [f32; 2],
    pub peak: [f32; 2],
}

#[derive(Default)]
pub struct VolumeMeter {
    window: [Vec<f32>; 2],
    write_pos: [usize; 2],
    latest: [f32; 2],
    peak: [f32; 2],

    #[cfg(feature = "rtrb")]
    feed: Option<Producer<MeterReading>>,
}

impl VolumeMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a meter plus the reader half of its feed.
    #[cfg(feature = "rtrb")]
    pub fn with_feed(capacity: usize) -> (Self, MeterReader) {
        let (tx, rx) = RingBuffer::<MeterReading>::new(capacity);
        let meter = Self {
            feed: Some(tx),
            ..Self::default()
        };
        (meter, MeterReader { rx })
    }

    /// Size the averaging window. Allocates.
    pub fn prepare(&mut self, spec: &ProcessSpec, window_seconds: f64) {
        let len = (window_seconds * spec.sample_rate / spec.maximum_block_size as f64).max(0.0) as usize;

        for window in &mut self.window {
            window.clear();
            window.resize(len, 0.0);
        }
        self.write_pos = [0; 2];
        self.latest = [0.0; 2];
        self.peak = [0.0; 2];

        log::debug!("volume meter window: {len} blocks ({window_seconds} s)");
    }

    /// `prepare` with the window length from `config`.
    pub fn prepare_with_config(&mut self, spec: &ProcessSpec, config: &DspConfig) {
        self.prepare(spec, config.meter_window_seconds);
    }

    /// Number of blocks averaged per reading.
    pub fn window_len(&self) -> usize {
        self.window[0].len()
    }

    /// Record the RMS and peak of the first two channels of `buffer`.
    ///
    /// A mono buffer is metered on both sides. An empty buffer records
    /// nothing.
    pub fn measure_block<T: Sample>(&mut self, buffer: &SampleBuffer<T>) {
        if buffer.num_channels() == 0 {
            return;
        }

        for side in 0..2 {
            let ch = side.min(buffer.num_channels() - 1);
            let (rms, peak) = block_level(buffer.read_channel(ch));

            self.record(side, rms * rms);
            self.peak[side] = peak;
        }

        self.publish();
    }

    /// Record a linear gain-reduction value on channel 0.
    pub fn measure_gain_reduction(&mut self, gain: f32) {
        self.record(0, gain * gain);
        self.peak[0] = gain;
        self.publish();
    }

    /// RMS over the window for `channel` (0 or 1).
    pub fn average_rms(&self, channel: usize) -> f32 {
        let window = &self.window[channel];
        if window.is_empty() {
            return self.latest[channel].sqrt();
        }

        (window.iter().sum::<f32>() / window.len() as f32).sqrt()
    }

    /// Peak of the most recent block.
    pub fn peak(&self, channel: usize) -> f32 {
        self.peak[channel]
    }

    pub fn reading(&self) -> MeterReading {
        MeterReading {
            rms: [self.average_rms(0), self.average_rms(1)],
            peak: self.peak,
        }
    }

    fn record(&mut self, channel: usize, squared: f32) {
        self.latest[channel] = squared;

        let window = &mut self.window[channel];
        if window.is_empty() {
            return;
        }

        window[self.write_pos[channel]] = squared;
        self.write_pos[channel] = (self.write_pos[channel] + 1) % window.len();
    }

    #[cfg(feature = "rtrb")]
    fn publish(&mut self) {
        let reading = self.reading();
        if let Some(feed) = self.feed.as_mut() {
            // A full queue means the reader is behind; skip this reading.
            let _ = feed.push(reading);
        }
    }

    #[cfg(not(feature = "rtrb"))]
    fn publish(&mut self) {}
}

/// RMS and absolute peak over every lane of a channel.
fn block_level<T: Sample>(samples: &[T]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }

    let mut sum = 0.0;
    let mut peak = 0.0f64;
    for &s in samples {
        for lane in 0..T::LANES {
            let v = s.lane(lane);
            sum += v * v;
            peak = peak.max(v.abs());
        }
    }

    let count = (samples.len() * T::LANES) as f64;
    ((sum / count).sqrt() as f32, peak as f32)
}

/// Reader half of a meter feed, owned by the UI side.
#[cfg(feature = "rtrb")]
pub struct MeterReader {
    rx: Consumer<MeterReading>,
}

#[cfg(feature = "rtrb")]
impl MeterReader {
    /// Oldest unread reading.
    pub fn pop(&mut self) -> Option<MeterReading> {
        self.rx.pop().ok()
    }

    /// Drain the queue and keep only the newest reading.
    pub fn latest(&mut self) -> Option<MeterReading> {
        let mut newest = None;
        while let Ok(reading) = self.rx.pop() {
            newest = Some(reading);
        }
        newest
    }

    /// True once the meter has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.rx.is_abandoned()
    }
}
