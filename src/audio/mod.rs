//! Microphone pipeline: cpal capture, pitch estimation, WAV takes.

pub mod capture;
pub mod processing;
pub mod take;

use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapRb};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

pub use capture::MicStream;
pub use processing::{MicPitchSource, PitchDetector};
pub use take::{TakeBuffer, WavTakeRecorder};

/// Roughly one second of mono audio at 48 kHz.
const RING_CAPACITY: usize = 48_000;

/// Opens the default input device and wires it to a pitch source that also
/// feeds `take`. The returned stream must be kept alive.
pub fn open_microphone(
    config: &EngineConfig,
    take: TakeBuffer,
) -> EngineResult<(MicStream, MicPitchSource<HeapCons<f32>>)> {
    let rb = HeapRb::<f32>::new(RING_CAPACITY);
    let (producer, consumer) = rb.split();

    let stream = MicStream::open(producer).map_err(|e| EngineError::Microphone(format!("{:#}", e)))?;
    let detector = PitchDetector::new(stream.sample_rate, config.min_hz, config.max_hz, config.silence_rms);
    let source = MicPitchSource::new(consumer, detector, take);

    Ok((stream, source))
}
