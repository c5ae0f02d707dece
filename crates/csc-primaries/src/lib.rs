//! # csc-primaries
//!
//! Colour primaries, RGB-XYZ matrix generation and the gamut matrix solver.
//!
//! # What this crate does
//!
//! - [`Primaries`] - chromaticities of three primaries plus white point
//! - [`rgb_to_xyz_matrix`] - solves the primaries-plus-white system
//! - [`rgb_to_rgb_matrix`] - `inverse(T_dst) * CAT * T_src`
//! - [`gamut`] - the solver producing fixed-point [`GamutMatrix`] values,
//!   failing closed to BT.2020 on implausible input
//! - [`ycbcr`] - Y'CbCr decode/encode matrices with range offsets
//!
//! # Usage
//!
//! ```rust
//! use csc_primaries::{gamut, BT2020, BT709};
//!
//! let m = gamut::solve(&BT2020, &BT709, 2048).unwrap();
//! let real = m.to_mat3();
//! assert!((real.m[0][0] - 1.6605).abs() < 0.002);
//! ```
//!
//! # Dependencies
//!
//! - `csc-core` - error taxonomy, signalled primaries
//! - `csc-math` - matrices, Bradford adaptation, fixed-point formats
//! - [`tracing`] - warnings when falling back to the reference gamut
//!
//! # Used By
//!
//! - `csc-engine` - bundle assembly

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod gamut;
pub mod ycbcr;

pub use gamut::{GamutMatrix, GAMUT_FORMAT};

use csc_core::{ColorPrimaries, DisplayPrimaries, Error, Result};
use csc_math::{adapt_matrix, Mat3, Vec3, BRADFORD};

/// RGB primaries definition.
///
/// # Example
///
/// ```rust
/// use csc_primaries::Primaries;
///
/// let my_space = Primaries {
///     r: (0.64, 0.33),
///     g: (0.30, 0.60),
///     b: (0.15, 0.06),
///     w: (0.3127, 0.3290),
///     name: "Custom",
/// };
/// assert!(my_space.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y) chromaticity
    pub r: (f64, f64),
    /// Green primary (x, y) chromaticity
    pub g: (f64, f64),
    /// Blue primary (x, y) chromaticity
    pub b: (f64, f64),
    /// White point (x, y) chromaticity
    pub w: (f64, f64),
    /// Name used in logs
    pub name: &'static str,
}

// ============================================================================
// Standard sets
// ============================================================================

/// D65 white point chromaticity.
pub const D65_XY: (f64, f64) = (0.31270, 0.32900);

/// BT.709 primaries.
pub const BT709: Primaries = Primaries {
    r: (0.6400, 0.3300),
    g: (0.3000, 0.6000),
    b: (0.1500, 0.0600),
    w: D65_XY,
    name: "BT.709",
};

/// BT.601 525-line (SMPTE 170M) primaries.
pub const BT601: Primaries = Primaries {
    r: (0.6300, 0.3400),
    g: (0.3100, 0.5950),
    b: (0.1550, 0.0700),
    w: D65_XY,
    name: "BT.601",
};

/// BT.2020 primaries. Also the fail-closed reference gamut.
pub const BT2020: Primaries = Primaries {
    r: (0.7080, 0.2920),
    g: (0.1700, 0.7970),
    b: (0.1310, 0.0460),
    w: D65_XY,
    name: "BT.2020",
};

/// Display P3 primaries (D65).
pub const DISPLAY_P3: Primaries = Primaries {
    r: (0.6800, 0.3200),
    g: (0.2650, 0.6900),
    b: (0.1500, 0.0600),
    w: D65_XY,
    name: "Display P3",
};

impl Primaries {
    /// Standard set for a signalled primaries code. Unknown codes map to BT.709.
    pub const fn for_code(code: ColorPrimaries) -> Self {
        match code {
            ColorPrimaries::Bt2020 => BT2020,
            ColorPrimaries::Bt601 => BT601,
            ColorPrimaries::Bt709 | ColorPrimaries::Other(_) => BT709,
        }
    }

    /// Reads signalled primaries in either G, B, R or R, G, B order.
    ///
    /// G, B, R is recognised by the first entry having the largest y and the
    /// last the largest x; R, G, B by the first having the largest x and the
    /// second the largest y. Anything else is malformed.
    pub fn from_display(display: &DisplayPrimaries, name: &'static str) -> Result<Self> {
        let p = display.primaries.map(|c| c.to_xy());
        let w = display.white_point.to_xy();

        let largest_x = |i: usize| (0..3).all(|j| j == i || p[i].0 > p[j].0);
        let largest_y = |i: usize| (0..3).all(|j| j == i || p[i].1 > p[j].1);

        let prims = if largest_y(0) && largest_x(2) {
            Self { r: p[2], g: p[0], b: p[1], w, name }
        } else if largest_x(0) && largest_y(1) {
            Self { r: p[0], g: p[1], b: p[2], w, name }
        } else {
            return Err(Error::MalformedPrimaries { reason: "unrecognised primaries order" });
        };
        prims.validate()?;
        Ok(prims)
    }

    /// Checks that the primaries span a real triangle containing the white point.
    pub fn validate(&self) -> Result<()> {
        let pts = [self.r, self.g, self.b, self.w];
        if pts.iter().any(|&(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(Error::MalformedPrimaries { reason: "non-finite chromaticity" });
        }
        if pts.iter().any(|&(x, y)| x < 0.0 || y <= 0.0 || x + y > 1.0) {
            return Err(Error::MalformedPrimaries { reason: "chromaticity outside the xy plane" });
        }

        let area = cross(self.r, self.g, self.b);
        if area.abs() < 1e-4 {
            return Err(Error::MalformedPrimaries { reason: "degenerate triangle" });
        }

        // Same sign against each edge as the third vertex.
        let s = area.signum();
        let inside = cross(self.r, self.g, self.w) * s > 0.0
            && cross(self.g, self.b, self.w) * s > 0.0
            && cross(self.b, self.r, self.w) * s > 0.0;
        if !inside {
            return Err(Error::MalformedPrimaries { reason: "white point outside gamut" });
        }
        Ok(())
    }

    /// White point as XYZ (Y=1).
    #[inline]
    pub fn white_xyz(&self) -> Vec3 {
        xy_to_xyz(self.w.0, self.w.1)
    }

    /// Signalled code of the standard set `self` matches, if any.
    pub fn standard_code(&self, tol: f64) -> Option<ColorPrimaries> {
        [
            (BT2020, ColorPrimaries::Bt2020),
            (BT709, ColorPrimaries::Bt709),
            (BT601, ColorPrimaries::Bt601),
        ]
        .into_iter()
        .find(|(p, _)| self.same_gamut(p, tol))
        .map(|(_, code)| code)
    }

    /// True when both sets describe the same gamut and white.
    pub fn same_gamut(&self, other: &Self, tol: f64) -> bool {
        let close = |a: (f64, f64), b: (f64, f64)| (a.0 - b.0).abs() <= tol && (a.1 - b.1).abs() <= tol;
        close(self.r, other.r) && close(self.g, other.g) && close(self.b, other.b) && close(self.w, other.w)
    }
}

/// z-component of (b - a) x (c - a).
fn cross(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Converts xy chromaticity to XYZ (with Y=1).
fn xy_to_xyz(x: f64, y: f64) -> Vec3 {
    if y.abs() < 1e-12 {
        Vec3::ZERO
    } else {
        Vec3::new(x / y, 1.0, (1.0 - x - y) / y)
    }
}

// ============================================================================
// Matrix generation
// ============================================================================

/// Computes the RGB to XYZ matrix for a set of primaries.
///
/// Primaries become matrix columns, scaled so that RGB (1, 1, 1) lands on
/// the white point.
pub fn rgb_to_xyz_matrix(primaries: &Primaries) -> Result<Mat3> {
    let r_xyz = xy_to_xyz(primaries.r.0, primaries.r.1);
    let g_xyz = xy_to_xyz(primaries.g.0, primaries.g.1);
    let b_xyz = xy_to_xyz(primaries.b.0, primaries.b.1);

    let m = Mat3::from_col_vecs(r_xyz, g_xyz, b_xyz);

    // M * S = W
    let m_inv = m
        .inverse()
        .ok_or(Error::SingularMatrix { context: "primaries to tristimulus" })?;
    let s = m_inv * primaries.white_xyz();

    Ok(Mat3::from_col_vecs(r_xyz * s.x, g_xyz * s.y, b_xyz * s.z))
}

/// Computes the XYZ to RGB matrix for a set of primaries.
pub fn xyz_to_rgb_matrix(primaries: &Primaries) -> Result<Mat3> {
    rgb_to_xyz_matrix(primaries)?
        .inverse()
        .ok_or(Error::SingularMatrix { context: "tristimulus to primaries" })
}

/// Computes the linear RGB to RGB matrix `inverse(T_dst) * CAT * T_src`.
///
/// The Bradford adaptation makes source white map onto destination white
/// when the two white points differ. With equal white points it is identity.
///
/// # Example
///
/// ```rust
/// use csc_primaries::{rgb_to_rgb_matrix, BT709};
///
/// let m = rgb_to_rgb_matrix(&BT709, &BT709).unwrap();
/// assert!(m.is_identity(1e-9));
/// ```
pub fn rgb_to_rgb_matrix(src: &Primaries, dst: &Primaries) -> Result<Mat3> {
    let src_to_xyz = rgb_to_xyz_matrix(src)?;
    let xyz_to_dst = xyz_to_rgb_matrix(dst)?;
    let cat = adapt_matrix(BRADFORD, src.white_xyz(), dst.white_xyz());
    Ok(xyz_to_dst * cat * src_to_xyz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csc_core::Chromaticity;

    #[test]
    fn test_bt709_matrix() {
        let m = rgb_to_xyz_matrix(&BT709).unwrap();
        assert!((m.m[0][0] - 0.4124564).abs() < 0.001);
        assert!((m.m[1][0] - 0.2126729).abs() < 0.001);
        let white = m * Vec3::ONE;
        assert!((white.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_xyz_roundtrip() {
        let to_xyz = rgb_to_xyz_matrix(&BT2020).unwrap();
        let to_rgb = xyz_to_rgb_matrix(&BT2020).unwrap();
        let rgb = Vec3::new(0.5, 0.3, 0.8);
        assert!((to_rgb * (to_xyz * rgb)).max_abs_diff(rgb) < 1e-9);
    }

    #[test]
    fn test_bt2020_to_bt709_reference() {
        let m = rgb_to_rgb_matrix(&BT2020, &BT709).unwrap();
        let expected = Mat3::from_rows([
            [1.6605, -0.5876, -0.0728],
            [-0.1246, 1.1329, -0.0083],
            [-0.0182, -0.1006, 1.1187],
        ]);
        assert!(m.max_abs_diff(&expected) < 1e-3, "{:?}", m);
    }

    #[test]
    fn test_white_preserved_across_white_points() {
        let dci = Primaries { w: (0.314, 0.351), name: "DCI-P3", ..DISPLAY_P3 };
        let m = rgb_to_rgb_matrix(&dci, &BT709).unwrap();
        assert!((m * Vec3::ONE).max_abs_diff(Vec3::ONE) < 1e-9);
    }

    #[test]
    fn test_from_display_gbr_and_rgb_orders() {
        let gbr = DisplayPrimaries::BT2020;
        let p = Primaries::from_display(&gbr, "master").unwrap();
        assert!(p.same_gamut(&BT2020, 1e-9));

        let rgb = DisplayPrimaries {
            primaries: [gbr.primaries[2], gbr.primaries[0], gbr.primaries[1]],
            white_point: gbr.white_point,
        };
        let p = Primaries::from_display(&rgb, "master").unwrap();
        assert!(p.same_gamut(&BT2020, 1e-9));

        let p3 = Primaries::from_display(&DisplayPrimaries::P3_D65, "master").unwrap();
        assert!(p3.same_gamut(&DISPLAY_P3, 1e-9));
    }

    #[test]
    fn test_from_display_rejects_garbage() {
        let bad = DisplayPrimaries {
            primaries: [Chromaticity::new(100, 100); 3],
            white_point: Chromaticity::new(15635, 16450),
        };
        assert!(matches!(
            Primaries::from_display(&bad, "master"),
            Err(Error::MalformedPrimaries { .. })
        ));
    }

    #[test]
    fn test_validate_white_outside() {
        let p = Primaries { w: (0.70, 0.29), ..BT709 };
        assert_eq!(
            p.validate(),
            Err(Error::MalformedPrimaries { reason: "white point outside gamut" })
        );
        let p = Primaries { g: (0.64, 0.33), ..BT709 };
        assert!(p.validate().is_err());
        let p = Primaries { r: (f64::NAN, 0.33), ..BT709 };
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_for_code() {
        assert_eq!(Primaries::for_code(ColorPrimaries::Bt2020).name, "BT.2020");
        assert_eq!(Primaries::for_code(ColorPrimaries::Other(22)).name, "BT.709");
        for p in [BT709, BT601, BT2020, DISPLAY_P3] {
            assert!(p.validate().is_ok(), "{}", p.name);
        }
    }

    #[test]
    fn test_standard_code() {
        for code in [ColorPrimaries::Bt709, ColorPrimaries::Bt601, ColorPrimaries::Bt2020] {
            assert_eq!(Primaries::for_code(code).standard_code(1e-4), Some(code));
        }
        assert_eq!(DISPLAY_P3.standard_code(1e-4), None);
    }
}
