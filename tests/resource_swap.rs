use std::{
    sync::{Arc, Weak},
    thread,
    time::{Duration, Instant},
};

use strix_dsp::{
    dsp::{Coefficients, IirFilter, Processor, SampleBuffer},
    engine::{ReleasePool, RingBuffer},
    DspConfig, ProcessSpec,
};

#[test]
fn retired_coefficients_are_freed_off_the_audio_path() {
    let pool = ReleasePool::new();
    let spec = ProcessSpec::stereo(48_000.0, 128).unwrap();

    let first = Arc::new(Coefficients::lowpass(48_000.0, 800.0, 0.707));
    pool.add(&first);

    let mut filter = IirFilter::<f32>::new(Arc::clone(&first));
    filter.prepare(&spec);
    let first_weak: Weak<Coefficients> = Arc::downgrade(&first);
    drop(first);

    let mut block = SampleBuffer::<f32>::new(2, 128);
    block.write_channel(0).fill(0.25);
    filter.process_block(&mut block);

    // Control side designs a replacement and registers it before the swap.
    let next = Arc::new(Coefficients::highpass(48_000.0, 800.0, 0.707));
    pool.add(&next);

    // Audio side swaps; dropping the old handle only decrements the count.
    let old = filter.set_coefficients(next);
    drop(old);
    assert!(first_weak.upgrade().is_some(), "pool must still own the old set");

    filter.process_block(&mut block);

    // Next sweep frees the old set and keeps the live one.
    assert_eq!(pool.sweep(), 1);
    assert!(first_weak.upgrade().is_none());
    assert_eq!(pool.len(), 1);
}

#[test]
fn background_pool_releases_without_manual_sweeps() {
    let config = DspConfig {
        release_interval: Duration::from_millis(10),
        ..DspConfig::default()
    };
    let pool = ReleasePool::from_config(&config).unwrap();
    assert!(pool.is_scheduled());

    let resource = Arc::new(vec![0.0f64; 4096]);
    let weak = Arc::downgrade(&resource);
    pool.add(&resource);

    // Still referenced: survives several sweeps.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pool.len(), 1);

    drop(resource);
    let deadline = Instant::now() + Duration::from_secs(5);
    while weak.upgrade().is_some() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(weak.upgrade().is_none());
    assert!(pool.is_empty());
}

#[test]
fn ring_buffer_hands_blocks_between_rates() {
    let mut ring = RingBuffer::<f32>::new(2, 1024);

    // Writer pushes four 64-sample blocks, reader pulls one 256-sample block.
    let mut counter = 0.0f32;
    for _ in 0..4 {
        let mut block = SampleBuffer::<f32>::new(2, 64);
        for i in 0..64 {
            block.write_channel(0)[i] = counter;
            block.write_channel(1)[i] = -counter;
            counter += 1.0;
        }
        ring.write_data(&block, 64);
    }

    let mut snapshot = SampleBuffer::<f32>::new(2, 256);
    ring.read_data(&mut snapshot, 256);

    for i in 0..256 {
        assert_eq!(snapshot.read_channel(0)[i], i as f32);
        assert_eq!(snapshot.read_channel(1)[i], -(i as f32));
    }
}
