//! CPU reference engines for tone synthesis and mixing.
//!
//! These follow the exact arithmetic of the compute shaders (f32 phase,
//! period-bounded index, packed pairs, floor-average mixing), so a GPU run
//! can be checked against them sample by sample.

use std::f32::consts::TAU;

use rayon::prelude::*;

use super::buffer::SampleBuffer;
use super::codec;
use super::loader::AudioError;
use crate::config::ToneConfig;

/// Compute sample `i` of one wrap window.
///
/// `i` is the period-bounded sample index, `(idx % period) * 2` or one past
/// it. Because `sample_rate = period * frequency`, the phase
/// `frequency * i / sample_rate` equals `i / period`, which keeps the sine
/// argument small and makes every cycle bit-identical.
#[inline]
pub fn tone_sample(i: u32, period: u32, amplitude: f32) -> i16 {
    let phase = (i % period) as f32 / period as f32;
    let value = (amplitude * (TAU * phase).sin()).round();
    value.clamp(-amplitude, amplitude) as i16
}

/// Compute the packed lane for invocation `idx`.
#[inline]
pub fn tone_lane(idx: u64, period: u32, amplitude: f32) -> i32 {
    let period64 = u64::from(period);
    let i = ((idx % period64) * 2 % period64) as u32;
    codec::pack(
        tone_sample(i, period, amplitude),
        tone_sample(i + 1, period, amplitude),
    )
}

fn fill_lanes(out: &mut [i16], first_lane: u64, period: u32, amplitude: f32) {
    for (offset, pair) in out.chunks_exact_mut(2).enumerate() {
        let lane = tone_lane(first_lane + offset as u64, period, amplitude);
        pair[0] = codec::unpack_low(lane);
        pair[1] = codec::unpack_high(lane);
    }
}

/// Slice length per worker: the sample count split into `threads` contiguous
/// ranges, rounded up to a whole number of pairs.
fn slice_len(num_samples: usize, threads: usize) -> usize {
    let per_thread = num_samples.div_ceil(threads.max(1));
    (per_thread + per_thread % 2).max(2)
}

/// Generate a tone on the calling thread.
pub fn generate_tone(tone: &ToneConfig) -> Result<SampleBuffer, AudioError> {
    tone.validate()?;
    let mut samples = vec![0i16; (tone.lane_count() * 2) as usize];
    fill_lanes(&mut samples, 0, tone.period(), f32::from(tone.amplitude));
    Ok(SampleBuffer::from_even(samples, tone.sample_rate))
}

/// Generate a tone with the sample range split across `threads` workers.
///
/// Each worker owns one contiguous slice of the output; the buffer is
/// complete once the pool joins.
pub fn generate_tone_threaded(
    tone: &ToneConfig,
    threads: usize,
) -> Result<SampleBuffer, AudioError> {
    tone.validate()?;
    let mut samples = vec![0i16; (tone.lane_count() * 2) as usize];
    let chunk = slice_len(samples.len(), threads);
    let period = tone.period();
    let amplitude = f32::from(tone.amplitude);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("tone-worker-{}", i))
        .build()?;

    pool.install(|| {
        samples
            .par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(slice, out)| {
                let first_lane = (slice * chunk / 2) as u64;
                fill_lanes(out, first_lane, period, amplitude);
            });
    });

    Ok(SampleBuffer::from_even(samples, tone.sample_rate))
}

fn check_mixable(a: &SampleBuffer, b: &SampleBuffer) -> Result<(), AudioError> {
    if a.sample_rate() != b.sample_rate() {
        return Err(AudioError::SampleRateMismatch {
            expected: a.sample_rate(),
            got: b.sample_rate(),
        });
    }
    if a.len() != b.len() {
        return Err(AudioError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(AudioError::EmptyInput);
    }
    Ok(())
}

/// Mix two buffers sample by sample with a floor average.
pub fn mix_buffers(a: &SampleBuffer, b: &SampleBuffer) -> Result<SampleBuffer, AudioError> {
    check_mixable(a, b)?;
    let samples = a
        .samples()
        .iter()
        .zip(b.samples())
        .map(|(&x, &y)| codec::average(x, y))
        .collect();
    Ok(SampleBuffer::from_even(samples, a.sample_rate()))
}

/// Mix two buffers with the range split across `threads` workers.
pub fn mix_buffers_threaded(
    a: &SampleBuffer,
    b: &SampleBuffer,
    threads: usize,
) -> Result<SampleBuffer, AudioError> {
    check_mixable(a, b)?;
    let mut samples = vec![0i16; a.len()];
    let chunk = slice_len(samples.len(), threads);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("mix-worker-{}", i))
        .build()?;

    pool.install(|| {
        samples
            .par_chunks_mut(chunk)
            .zip(a.samples().par_chunks(chunk))
            .zip(b.samples().par_chunks(chunk))
            .for_each(|((out, left), right)| {
                for ((o, &x), &y) in out.iter_mut().zip(left).zip(right) {
                    *o = codec::average(x, y);
                }
            });
    });

    Ok(SampleBuffer::from_even(samples, a.sample_rate()))
}
