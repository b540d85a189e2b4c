//! Non-audio plumbing shared with the audio thread.
//!
//! Nothing here runs a DSP recurrence. These types move data and ownership
//! between the realtime callback and the control side.

/// Sample exchange between two rates.
pub mod ring_buffer;
/// Deferred deallocation of shared objects.
pub mod release_pool;
/// Named periodic maintenance thread.
pub mod scheduler;

pub use release_pool::ReleasePool;
pub use ring_buffer::RingBuffer;
pub use scheduler::Scheduler;
