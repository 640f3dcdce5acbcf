use std::collections::VecDeque;

use ringbuf::traits::Consumer;
use tracing::debug;

use super::take::TakeBuffer;
use crate::session::PitchSource;

/// Smallest analysis window in samples.
const MIN_WINDOW_LEN: usize = 2048;

/// Minimum normalized autocorrelation for a frame to count as voiced.
const CLARITY_THRESHOLD: f32 = 0.6;

/// RMS silence gate followed by normalized autocorrelation over the
/// plausible voice band.
#[derive(Debug, Clone)]
pub struct PitchDetector {
    sample_rate: u32,
    min_hz: f32,
    max_hz: f32,
    silence_rms: f32,
}

impl PitchDetector {
    pub fn new(sample_rate: u32, min_hz: f32, max_hz: f32, silence_rms: f32) -> Self {
        Self {
            sample_rate,
            min_hz,
            max_hz,
            silence_rms,
        }
    }

    /// Longest lag the band needs, in samples.
    fn max_lag(&self) -> usize {
        (self.sample_rate as f32 / self.min_hz).ceil() as usize
    }

    /// Frame length that holds two periods of the lowest pitch at this
    /// sample rate. Grows with the device rate.
    pub fn window_len(&self) -> usize {
        (2 * self.max_lag() + 2).max(MIN_WINDOW_LEN).next_power_of_two()
    }

    pub fn rms(frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sq_sum: f32 = frame.iter().map(|&x| x * x).sum();
        (sq_sum / frame.len() as f32).sqrt()
    }

    /// Estimated fundamental in Hz, or `None` for silence and unvoiced frames.
    pub fn detect(&self, frame: &[f32]) -> Option<f32> {
        if Self::rms(frame) < self.silence_rms {
            return None;
        }

        let rate = self.sample_rate as f32;
        let min_lag = (rate / self.max_hz).floor().max(1.0) as usize;
        let max_lag = self.max_lag();
        if frame.len() < max_lag * 2 {
            return None;
        }

        let mut scores = vec![0.0f32; max_lag + 2];
        for lag in min_lag..=max_lag + 1 {
            scores[lag] = normalized_autocorrelation(frame, lag);
        }

        let peak = scores[min_lag..=max_lag].iter().cloned().fold(0.0f32, f32::max);
        if peak < CLARITY_THRESHOLD {
            return None;
        }

        // First local maximum close to the global peak, so a strong
        // sub-harmonic does not halve the estimate.
        let best_lag = (min_lag..=max_lag).find(|&lag| {
            let left = if lag > min_lag { scores[lag - 1] } else { f32::MIN };
            scores[lag] >= left && scores[lag] >= scores[lag + 1] && scores[lag] >= 0.9 * peak
        })?;

        // Parabolic interpolation around the peak.
        let mut lag = best_lag as f32;
        if best_lag > min_lag {
            let (a, b, c) = (scores[best_lag - 1], scores[best_lag], scores[best_lag + 1]);
            let denom = a - 2.0 * b + c;
            if denom.abs() > f32::EPSILON {
                lag += 0.5 * (a - c) / denom;
            }
        }

        let hz = rate / lag;
        if hz < self.min_hz || hz > self.max_hz {
            return None;
        }
        Some(hz)
    }
}

fn normalized_autocorrelation(frame: &[f32], lag: usize) -> f32 {
    let n = frame.len() - lag;
    let (mut cross, mut e0, mut e1) = (0.0f32, 0.0f32, 0.0f32);
    for i in 0..n {
        let (a, b) = (frame[i], frame[i + lag]);
        cross += a * b;
        e0 += a * a;
        e1 += b * b;
    }
    let denom = (e0 * e1).sqrt();
    if denom <= f32::EPSILON {
        0.0
    } else {
        cross / denom
    }
}

/// Pulls microphone samples from the ring buffer, mirrors them into the
/// current take, and estimates pitch over the most recent window.
pub struct MicPitchSource<C>
where
    C: Consumer<Item = f32>,
{
    consumer: C,
    detector: PitchDetector,
    take: TakeBuffer,
    window: VecDeque<f32>,
    window_len: usize,
    scratch: Vec<f32>,
}

impl<C> MicPitchSource<C>
where
    C: Consumer<Item = f32>,
{
    pub fn new(consumer: C, detector: PitchDetector, take: TakeBuffer) -> Self {
        let window_len = detector.window_len();
        debug!("Pitch window: {} samples", window_len);
        Self {
            consumer,
            detector,
            take,
            window: VecDeque::with_capacity(window_len),
            window_len,
            scratch: vec![0.0; 4096],
        }
    }

    fn drain(&mut self) {
        while self.consumer.occupied_len() > 0 {
            let n = self.consumer.pop_slice(&mut self.scratch);
            if n == 0 {
                break;
            }
            let chunk = &self.scratch[..n];
            self.take.append(chunk);

            for &sample in chunk {
                if self.window.len() == self.window_len {
                    self.window.pop_front();
                }
                self.window.push_back(sample);
            }
        }
    }
}

impl<C> PitchSource for MicPitchSource<C>
where
    C: Consumer<Item = f32>,
{
    fn next_hz(&mut self) -> Option<f32> {
        self.drain();
        if self.window.len() < self.window_len {
            return None;
        }
        let frame = self.window.make_contiguous();
        let hz = self.detector.detect(frame);
        debug!("Mic pitch: {:?}", hz);
        hz
    }
}
