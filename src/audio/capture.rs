use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::Producer;
use tracing::{error, info};

/// Live input stream writing mono `f32` samples into a ring buffer.
pub struct MicStream {
    _stream: cpal::Stream,
    pub sample_rate: u32,
    pub channels: u16,
}

impl MicStream {
    pub fn open<P>(mut producer: P) -> Result<Self, anyhow::Error>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No input device available"))?;

        info!("Audio Input Device: {}", device.name().unwrap_or_default());

        let config = device.default_input_config()?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        info!("Audio Config Selected: Rate={}Hz, Channels={}", sample_rate, channels);

        let err_fn = |err| error!("an error occurred on stream: {}", err);
        let stride = channels.max(1) as usize;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| write_input_data(data, stride, &mut producer),
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| write_input_data_i16(data, stride, &mut producer),
                err_fn,
                None,
            )?,
            _ => return Err(anyhow::anyhow!("Unsupported sample format")),
        };

        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }
}

/// Downmixes interleaved frames. Lossy when the ring is full.
fn write_input_data<P>(input: &[f32], stride: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    if stride == 1 {
        producer.push_slice(input);
        return;
    }
    for frame in input.chunks(stride) {
        let mono = frame.iter().sum::<f32>() / frame.len() as f32;
        let _ = producer.try_push(mono);
    }
}

fn write_input_data_i16<P>(input: &[i16], stride: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    for frame in input.chunks(stride) {
        let sum: f32 = frame.iter().map(|&s| s as f32 / i16::MAX as f32).sum();
        let _ = producer.try_push(sum / frame.len() as f32);
    }
}
