//! Lock-free SPSC ring buffer for captured PCM samples.
//!
//! Uses `ringbuf::HeapRb<i16>` which provides a wait-free `push_slice`
//! safe to call from the real-time audio callback.

pub mod assembler;
pub mod frame;

use ringbuf::{traits::Split, HeapRb};

pub use ringbuf::traits::{Consumer, Producer};

/// Type alias for the producer half — held by the audio callback thread.
pub type AudioProducer = ringbuf::HeapProd<i16>;

/// Type alias for the consumer half — held by the pipeline thread.
pub type AudioConsumer = ringbuf::HeapCons<i16>;

/// Buffer capacity: 2^19 = 524 288 i16 samples ≈ 32.7 s at 16 kHz.
/// Generous headroom over the engine's output period so a detection cooldown
/// never forces the capture callback to drop samples.
pub const RING_CAPACITY: usize = 1 << 19;

/// Create a matched producer/consumer pair backed by a heap-allocated ring buffer.
///
/// # Panics
/// Never panics — `HeapRb` construction cannot fail for reasonable capacities.
pub fn create_audio_ring() -> (AudioProducer, AudioConsumer) {
    HeapRb::<i16>::new(RING_CAPACITY).split()
}
