//! Sample-pair codec.
//!
//! A compute invocation can only write one 32-bit scalar, so every lane
//! carries two consecutive 16-bit samples:
//!
//! ```text
//!  31            16 15             0
//! +----------------+----------------+
//! | sample 2k + 1  |   sample 2k    |
//! +----------------+----------------+
//! ```
//!
//! On a little-endian host the lane bytes are exactly the bytes of the two
//! samples in time order, which keeps the packed buffer compatible with the
//! raw WAV payload.
//!
//! The same operations exist in `gpu/shaders/codec.wgsl`; both sides must use
//! arithmetic (sign-propagating) shifts on signed integers.

/// Pack two samples into one lane: `low` in bits 0..16, `high` in bits 16..32.
#[inline]
pub const fn pack(low: i16, high: i16) -> i32 {
    ((high as i32) << 16) | (low as u16 as i32)
}

/// Sign-extend the low half of a lane.
#[inline]
pub const fn unpack_low(lane: i32) -> i16 {
    ((lane << 16) >> 16) as i16
}

/// Sign-extend the high half of a lane.
#[inline]
pub const fn unpack_high(lane: i32) -> i16 {
    (lane >> 16) as i16
}

/// Floor average of two samples.
///
/// `(a + b) >> 1` rounds toward negative infinity, so `average(1, 0) == 0`
/// and `average(-1, 0) == -1`.
#[inline]
pub const fn average(a: i16, b: i16) -> i16 {
    ((a as i32 + b as i32) >> 1) as i16
}

/// Mix two lanes by averaging each half independently.
///
/// Commutative, but not associative: `mix(mix(a, b), c)` and
/// `mix(a, mix(b, c))` weight the inputs differently and lose different
/// low bits.
#[inline]
pub const fn mix_lanes(a: i32, b: i32) -> i32 {
    pack(
        average(unpack_low(a), unpack_low(b)),
        average(unpack_high(a), unpack_high(b)),
    )
}

/// Pack a sample slice into lanes. Trailing odd samples are ignored.
pub fn pack_samples(samples: &[i16]) -> Vec<i32> {
    samples
        .chunks_exact(2)
        .map(|pair| pack(pair[0], pair[1]))
        .collect()
}

/// Unpack lanes back into samples in time order.
pub fn unpack_lanes(lanes: &[i32]) -> Vec<i16> {
    let mut samples = Vec::with_capacity(lanes.len() * 2);
    for &lane in lanes {
        samples.push(unpack_low(lane));
        samples.push(unpack_high(lane));
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_extremes_do_not_bleed() {
        let lane = pack(i16::MIN, i16::MAX);
        assert_eq!(unpack_low(lane), i16::MIN);
        assert_eq!(unpack_high(lane), i16::MAX);

        let lane = pack(i16::MAX, i16::MIN);
        assert_eq!(unpack_low(lane), i16::MAX);
        assert_eq!(unpack_high(lane), i16::MIN);
    }

    #[test]
    fn test_negative_low_keeps_high_intact() {
        let lane = pack(-1, 0);
        assert_eq!(lane, 0x0000_FFFF);
        assert_eq!(unpack_low(lane), -1);
        assert_eq!(unpack_high(lane), 0);
    }

    #[test]
    fn test_round_trip_exhaustive_low() {
        for low in i16::MIN..=i16::MAX {
            for high in [i16::MIN, -1, 0, 1, i16::MAX] {
                let lane = pack(low, high);
                assert_eq!(unpack_low(lane), low);
                assert_eq!(unpack_high(lane), high);
            }
        }
    }

    #[test]
    fn test_round_trip_exhaustive_high() {
        for high in i16::MIN..=i16::MAX {
            for low in [i16::MIN, -1, 0, 1, i16::MAX] {
                let lane = pack(low, high);
                assert_eq!(unpack_low(lane), low);
                assert_eq!(unpack_high(lane), high);
            }
        }
    }

    #[test]
    fn test_lane_bytes_match_sample_bytes() {
        let samples = [-2i16, 300];
        let lanes = pack_samples(&samples);
        let lane_bytes = lanes[0].to_le_bytes();
        let mut sample_bytes = [0u8; 4];
        sample_bytes[..2].copy_from_slice(&samples[0].to_le_bytes());
        sample_bytes[2..].copy_from_slice(&samples[1].to_le_bytes());
        assert_eq!(lane_bytes, sample_bytes);
    }

    #[test]
    fn test_unpack_lanes_time_order() {
        let samples = vec![0, 23166, 32760, 23166, 0, -23166, -32760, -23166];
        assert_eq!(unpack_lanes(&pack_samples(&samples)), samples);
    }

    #[test]
    fn test_average_floors() {
        assert_eq!(average(1, 0), 0);
        assert_eq!(average(-1, 0), -1);
        assert_eq!(average(100, 50), 75);
        assert_eq!(average(-100, -50), -75);
        assert_eq!(average(i16::MAX, i16::MAX), i16::MAX);
        assert_eq!(average(i16::MIN, i16::MIN), i16::MIN);
        assert_eq!(average(i16::MIN, i16::MAX), -1);
    }

    #[test]
    fn test_mix_lanes_commutative() {
        let a = pack(100, -100);
        let b = pack(50, -50);
        assert_eq!(mix_lanes(a, b), mix_lanes(b, a));
        assert_eq!(unpack_lanes(&[mix_lanes(a, b)]), vec![75, -75]);
    }

    #[test]
    fn test_mix_lanes_not_associative() {
        let a = pack(3, 0);
        let b = pack(0, 0);
        let c = pack(0, 0);
        // ((3 + 0) >> 1 + 0) >> 1 = 0, but (3 + (0 + 0) >> 1) >> 1 = 1
        let left = mix_lanes(mix_lanes(a, b), c);
        let right = mix_lanes(a, mix_lanes(b, c));
        assert_eq!(unpack_low(left), 0);
        assert_eq!(unpack_low(right), 1);
    }
}
