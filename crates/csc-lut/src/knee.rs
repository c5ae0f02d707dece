//! Knee LUT generation for HDR to SDR output.
//!
//! A 35-point knee curve is blended with a straight ramp by the policy's
//! knee factor, then expanded to 289 hardware samples. The first and last
//! control segments are expanded linearly; interior segments use the
//! selected [`KneeInterpolation`].

use csc_core::KneeInterpolation;
use csc_math::{cubic_phase, linear_phase};
use csc_transfer::TransferFunction;

use crate::{CurveKind, ToneCurve};

/// Control point count.
pub const KNEE_POINTS: usize = 35;

/// Largest knee code.
pub const KNEE_MAX: i32 = 0x3ff;

/// Highlight roll-off the knee factor blends toward.
const KNEE_SETTING: [i32; KNEE_POINTS] = [
    0, 16, 36, 59, 71, 96, 120, 145, 170, 204, 230, 258, 288, 320, 355, 390, 428, 470, 512, 554,
    598, 650, 720, 758, 790, 832, 864, 894, 920, 945, 968, 980, 1000, 1016, 1023,
];

/// Straight ramp: 0, 16, then steps of 31 up to 0x3f0, then full scale.
fn linear_setting() -> [i32; KNEE_POINTS] {
    let mut out = [0; KNEE_POINTS];
    for (i, v) in out.iter_mut().enumerate().skip(1).take(KNEE_POINTS - 2) {
        *v = 0x10 + 0x1f * (i as i32 - 1);
    }
    out[KNEE_POINTS - 1] = KNEE_MAX;
    out
}

/// Blends the knee curve into the ramp. `factor` is in 1/256 units.
pub fn control_points(factor: u32) -> [i32; KNEE_POINTS] {
    let factor = factor.min(256) as i32;
    let linear = linear_setting();
    let mut out = [0; KNEE_POINTS];
    for (i, v) in out.iter_mut().enumerate() {
        let blended = linear[i] + (((KNEE_SETTING[i] - linear[i]) * factor) >> 8);
        *v = blended.clamp(0, KNEE_MAX);
    }
    out
}

/// Builds the 289-sample knee table.
pub fn build(factor: u32, interpolation: KneeInterpolation) -> ToneCurve {
    let p = control_points(factor);
    let mut samples = Vec::with_capacity(CurveKind::Knee.len());

    for i in 0..16 {
        samples.push(linear_phase(p[0], p[1], i, 4));
    }
    for i in 16..272 {
        let k = 1 + ((i - 16) >> 3) as usize;
        let mu = ((i - 16) & 7) << 3;
        let v = match interpolation {
            KneeInterpolation::Linear => linear_phase(p[k], p[k + 1], mu, 6),
            KneeInterpolation::Cubic => cubic_phase([p[k - 1], p[k], p[k + 1], p[k + 2]], mu as u32),
        };
        samples.push(v.clamp(0, KNEE_MAX));
    }
    for i in 272..289 {
        samples.push(linear_phase(p[33], p[34], i - 272, 4));
    }

    ToneCurve::from_trusted(CurveKind::Knee, TransferFunction::Linear, samples)
}
