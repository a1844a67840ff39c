//! Hardware Constants
//!
//! Lookup tables and fixed-point helpers shared by the synthesis stages.
//! All amplitudes are unsigned and scaled to the 12-bit output range.

/// Output sample width in bits
pub const SAMPLE_BITS: u32 = 12;

/// Largest output sample value
pub const SAMPLE_MAX: u16 = (1 << SAMPLE_BITS) - 1;

/// Largest value of an un-mixed channel amplitude
pub const CHANNEL_MAX: u32 = SAMPLE_MAX as u32;

/// Logarithmic volume curve (levels 0-15) scaled to 0..=4095
///
/// Derived from measured chip DAC levels; each step is roughly 3 dB, so
/// level 7 is about 5% of full scale rather than 47%. Level 0 is silent.
pub const VOLUME_TABLE: [u16; 16] = [
    0, 20, 33, 47, 72, 97, 144, 197, 282, 386, 571, 779, 1166, 1648, 2652, 4095,
];

/// Left gain per pan value (Q12, 4096 = unity); index 0 is reserved
///
/// Equal power law: `cos(theta)` with `theta = (pan - 1) / 14 * pi / 2`.
pub const PAN_LEFT: [u16; 16] = [
    0, 4096, 4070, 3993, 3866, 3690, 3468, 3202, 2896, 2554, 2179, 1777, 1353, 911, 459, 0,
];

/// Right gain per pan value (Q12), `sin(theta)`
pub const PAN_RIGHT: [u16; 16] = [
    0, 0, 459, 911, 1353, 1777, 2179, 2554, 2896, 3202, 3468, 3690, 3866, 3993, 4070, 4096,
];

/// Pan value of a centered channel
pub const PAN_CENTER: u8 = 8;

/// `ln(2) / 1200` in Q32: one cent as a relative frequency change
pub const CENT_RATIO_Q32: i64 = 2_480_870;

// Soft clip knee points (input, output)
const KNEE_IN: u32 = 3072;
const COMPRESS_IN: u32 = 5120;
const COMPRESS_OUT: u32 = KNEE_IN + (COMPRESS_IN - KNEE_IN) / 4;
const CEILING_IN: u32 = 3 * CHANNEL_MAX;

/// Volume of an amplitude register level (any u8, masked to 0-15)
#[inline]
pub fn volume(level: u8) -> u32 {
    VOLUME_TABLE[(level & 0x0F) as usize] as u32
}

/// Compress a summed amplitude into the output range
///
/// Piecewise linear: identity up to the knee, slope 1/4 through the first
/// compression segment, then a shallow segment reaching [`SAMPLE_MAX`] at
/// three full-scale channels. Monotonically non-decreasing, never above
/// `SAMPLE_MAX`.
#[inline]
pub fn soft_clip(x: u32) -> u16 {
    let y = if x <= KNEE_IN {
        x
    } else if x <= COMPRESS_IN {
        KNEE_IN + (x - KNEE_IN) / 4
    } else if x < CEILING_IN {
        COMPRESS_OUT
            + (x - COMPRESS_IN) * (SAMPLE_MAX as u32 - COMPRESS_OUT) / (CEILING_IN - COMPRESS_IN)
    } else {
        SAMPLE_MAX as u32
    };
    y.min(SAMPLE_MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_table_monotonic_increasing() {
        for i in 1..16 {
            assert!(
                VOLUME_TABLE[i] > VOLUME_TABLE[i - 1],
                "Volume table not monotonic at {i}"
            );
        }
        assert_eq!(volume(0), 0);
        assert_eq!(volume(15), CHANNEL_MAX);
    }

    #[test]
    fn test_volume_masks_level() {
        assert_eq!(volume(0x1F), volume(0x0F));
        assert_eq!(volume(0x87), volume(0x07));
    }

    #[test]
    fn test_pan_tables_are_complementary() {
        for pan in 1..16 {
            let l = PAN_LEFT[pan] as f64 / 4096.0;
            let r = PAN_RIGHT[pan] as f64 / 4096.0;
            assert!(
                (l * l + r * r - 1.0).abs() < 0.01,
                "pan {pan} not equal power: {l} {r}"
            );
            assert_eq!(PAN_LEFT[pan], PAN_RIGHT[16 - pan]);
        }
        assert_eq!(PAN_LEFT[PAN_CENTER as usize], PAN_RIGHT[PAN_CENTER as usize]);
    }

    #[test]
    fn test_soft_clip_identity_below_knee() {
        for x in [0u32, 1, 100, 2048, KNEE_IN] {
            assert_eq!(soft_clip(x) as u32, x);
        }
    }

    #[test]
    fn test_soft_clip_monotonic_and_bounded() {
        let mut prev = 0u16;
        for x in 0..=CEILING_IN + 100 {
            let y = soft_clip(x);
            assert!(y >= prev, "soft clip decreased at {x}: {y} < {prev}");
            assert!(y <= SAMPLE_MAX);
            prev = y;
        }
        assert_eq!(soft_clip(CEILING_IN), SAMPLE_MAX);
        assert_eq!(soft_clip(u32::MAX), SAMPLE_MAX);
    }

    #[test]
    fn test_soft_clip_segments_join() {
        assert_eq!(soft_clip(COMPRESS_IN) as u32, COMPRESS_OUT);
        assert!(soft_clip(CEILING_IN - 1) <= SAMPLE_MAX);
    }
}
