//! Integration tests for the sample-pair codec and CPU engines.

use tonegpu::audio::codec::average;
use tonegpu::audio::{
    generate_tone, generate_tone_threaded, mix_buffers, mix_buffers_threaded, mix_lanes, pack,
    pack_samples, unpack_high, unpack_lanes, unpack_low, SampleBuffer,
};
use tonegpu::ToneConfig;

#[test]
fn test_pack_examples() {
    assert_eq!(pack(0, 0), 0);
    assert_eq!(pack(-1, 0), 0x0000_FFFF);
    assert_eq!(pack(0, -1), 0xFFFF_0000_u32 as i32);
    assert_eq!(pack(1, 1), 0x0001_0001);

    let lane = pack(-32768, 32767);
    assert_eq!(unpack_low(lane), -32768);
    assert_eq!(unpack_high(lane), 32767);
}

#[test]
fn test_low_half_sign_extends() {
    // High half positive, low half negative: low must not borrow from high.
    let lane = pack(-2, 5);
    assert_eq!(unpack_low(lane), -2);
    assert_eq!(unpack_high(lane), 5);
}

#[test]
fn test_stream_layout_is_time_ordered() {
    let samples = [10i16, -20, 30, -40];
    let lanes = pack_samples(&samples);
    assert_eq!(lanes.len(), 2);
    assert_eq!(unpack_low(lanes[0]), 10);
    assert_eq!(unpack_high(lanes[0]), -20);
    assert_eq!(unpack_lanes(&lanes), samples);
}

#[test]
fn test_mix_lane_halves_independent() {
    let a = pack(-1, 32767);
    let b = pack(0, 32767);
    let mixed = mix_lanes(a, b);
    assert_eq!(unpack_low(mixed), -1);
    assert_eq!(unpack_high(mixed), 32767);
    assert_eq!(average(-3, 0), -2);
}

#[test]
fn test_cpu_engines_agree_on_long_tone() {
    let tone = ToneConfig {
        sample_rate: 44100,
        frequency: 441,
        duration_secs: 3,
        amplitude: 20000,
    };
    let single = generate_tone(&tone).unwrap();
    for threads in [1, 3, 8, 64] {
        assert_eq!(generate_tone_threaded(&tone, threads).unwrap(), single);
    }
    assert!(single.samples().iter().all(|s| s.unsigned_abs() <= 20000));
    assert_eq!(single.samples().iter().max(), Some(&20000));
}

#[test]
fn test_cpu_mixers_agree() {
    let a = SampleBuffer::new((0..1000).map(|i| (i * 37 % 2000 - 1000) as i16).collect(), 8000)
        .unwrap();
    let b = SampleBuffer::new((0..1000).map(|i| (i * 91 % 3000 - 1500) as i16).collect(), 8000)
        .unwrap();

    let single = mix_buffers(&a, &b).unwrap();
    assert_eq!(mix_buffers_threaded(&a, &b, 7).unwrap(), single);
    assert_eq!(mix_buffers(&b, &a).unwrap(), single);
}
