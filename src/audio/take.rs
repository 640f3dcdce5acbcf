use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use tracing::info;
use uuid::Uuid;

use crate::session::{AudioCapture, CapturedAudio};

#[derive(Debug, Default)]
struct TakeState {
    armed: bool,
    samples: Vec<f32>,
}

/// Shared between the microphone reader (writer) and the take recorder.
/// Samples are kept only while armed.
#[derive(Debug, Clone, Default)]
pub struct TakeBuffer {
    inner: Arc<Mutex<TakeState>>,
}

impl TakeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&self) -> anyhow::Result<()> {
        let mut state = self.inner.lock().map_err(|_| anyhow!("take buffer poisoned"))?;
        state.samples.clear();
        state.armed = true;
        Ok(())
    }

    /// Disarms and hands back everything captured since `arm`.
    pub fn finish(&self) -> anyhow::Result<Vec<f32>> {
        let mut state = self.inner.lock().map_err(|_| anyhow!("take buffer poisoned"))?;
        state.armed = false;
        Ok(std::mem::take(&mut state.samples))
    }

    pub fn append(&self, chunk: &[f32]) {
        if let Ok(mut state) = self.inner.lock() {
            if state.armed {
                state.samples.extend_from_slice(chunk);
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().map(|s| s.armed).unwrap_or(false)
    }
}

/// Writes each take to `<dir>/<session>-seg<NNN>.wav` as 16-bit mono.
pub struct WavTakeRecorder {
    dir: PathBuf,
    sample_rate: u32,
    session: Uuid,
    take: TakeBuffer,
}

impl WavTakeRecorder {
    pub fn new(dir: impl Into<PathBuf>, sample_rate: u32, session: Uuid, take: TakeBuffer) -> Self {
        Self {
            dir: dir.into(),
            sample_rate,
            session,
            take,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_wav(&self, path: &Path, samples: &[f32]) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

impl AudioCapture for WavTakeRecorder {
    fn on_recording_start(&mut self) -> anyhow::Result<()> {
        self.take.arm()
    }

    fn on_recording_stop(&mut self, segment: usize) -> anyhow::Result<CapturedAudio> {
        let samples = self.take.finish()?;
        if samples.is_empty() {
            return Ok(CapturedAudio::empty(segment));
        }

        let path = self.dir.join(format!("{}-seg{:03}.wav", self.session, segment));
        self.write_wav(&path, &samples)?;

        let duration_ms = if self.sample_rate == 0 {
            0
        } else {
            samples.len() as u64 * 1000 / self.sample_rate as u64
        };
        info!("Wrote take {} ({} samples)", path.display(), samples.len());

        Ok(CapturedAudio {
            segment,
            path: Some(path),
            sample_count: samples.len(),
            duration_ms,
        })
    }
}
