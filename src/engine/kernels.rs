// Computation Kernels
// Per-(point, charge) field vectors and per-point log-magnitude reduction
use ndarray::ArrayView2;
use std::f64::consts::PI;

use crate::engine::charges::{ChargeKind, EncodedCharge, FieldVector};

/// Field contribution of one encoded charge at sample `(xp, yp)`.
///
/// Dispatches on the record's kind tag so every launched unit runs the
/// same code regardless of which charge it was handed.
#[inline]
pub fn field_vector(xp: f64, yp: f64, charge: &EncodedCharge) -> FieldVector {
    match charge.kind {
        ChargeKind::PointFlatland | ChargeKind::Point => {
            let dx = xp - charge.x0;
            let dy = yp - charge.y0;
            let r2 = dx * dx + dy * dy;
            if r2 == 0.0 {
                return FieldVector::default();
            }
            // r² gives 1/r falloff for flatland, r³ gives 1/r² for embedded points
            let b = if charge.kind == ChargeKind::PointFlatland {
                r2
            } else {
                r2.powf(1.5)
            };
            FieldVector::new(charge.q * dx / b, charge.q * dy / b)
        }
        ChargeKind::Line => line_field_vector(xp, yp, charge),
    }
}

/// Closed-form field of a finite uniform segment, split into components
/// parallel and perpendicular to the segment and rotated back to world axes.
fn line_field_vector(xp: f64, yp: f64, c: &EncodedCharge) -> FieldVector {
    let (x0, y0, x1, y1, lam) = (c.x0, c.y0, c.x1, c.y1, c.lambda);

    // 1. Distances from the sample to each endpoint, and segment length
    let (dx_0p, dy_0p) = (x0 - xp, y0 - yp);
    let (dx_1p, dy_1p) = (x1 - xp, y1 - yp);
    let (dx_10, dy_10) = (x1 - x0, y1 - y0);
    let norm_0p = dx_0p.hypot(dy_0p);
    let norm_1p = dx_1p.hypot(dy_1p);
    let norm_10 = dx_10.hypot(dy_10);
    if norm_10 == 0.0 || norm_0p == 0.0 || norm_1p == 0.0 {
        return FieldVector::default();
    }

    // 2. Angle at endpoint a between p and b; π minus angle at endpoint b between p and a
    let cos_a = (-(dx_0p * dx_10 + dy_0p * dy_10) / (norm_0p * norm_10)).clamp(-1.0, 1.0);
    let theta_a = cos_a.acos();
    let cos_b = ((dx_1p * dx_10 + dy_1p * dy_10) / (norm_1p * norm_10)).clamp(-1.0, 1.0);
    let theta_b = PI - cos_b.acos();

    // 3. Distance from p to the infinite line through the segment
    let (dx_p0, dy_p0) = (xp - x0, yp - y0);
    let (dx_p1, dy_p1) = (xp - x1, yp - y1);
    let cross_p01 = dx_p0 * dy_p1 - dy_p0 * dx_p1;
    let h = cross_p01.abs() / norm_10;

    // 4. Components in the segment frame
    let sign = if dx_0p * dy_1p - dx_1p * dy_0p > 0.0 {
        1.0
    } else {
        -1.0
    };
    let e_para = lam * (1.0 / norm_1p - 1.0 / norm_0p);
    let e_perp = if h != 0.0 {
        -sign * lam * (theta_b.cos() - theta_a.cos()) / h
    } else {
        0.0
    };

    // 5. Rotate back to world coordinates
    let (ux, uy) = (dx_10 / norm_10, dy_10 / norm_10);
    FieldVector::new(e_para * ux - e_perp * uy, e_perp * ux + e_para * uy)
}

/// Sums one `(C, 2)` row of per-charge vectors and returns `log10` of the norm.
#[inline]
pub fn reduce_magnitude(contributions: ArrayView2<'_, f64>) -> f64 {
    let (mut sum_x, mut sum_y) = (0.0, 0.0);
    for vector in contributions.rows() {
        sum_x += vector[0];
        sum_y += vector[1];
    }
    log_magnitude((sum_x * sum_x + sum_y * sum_y).sqrt())
}

/// `log10(magnitude)`, with a zero field mapped to `-inf`.
#[inline]
pub fn log_magnitude(magnitude: f64) -> f64 {
    if magnitude == 0.0 {
        f64::NEG_INFINITY
    } else {
        magnitude.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::charges::{
        Charge, ChargeField, LineCharge, PointCharge, PointChargeFlatland,
    };
    use ndarray::array;

    fn assert_close(a: FieldVector, b: FieldVector) {
        assert!((a - b).norm() <= 1e-12 * (1.0 + b.norm()), "{a} != {b}");
    }

    #[test]
    fn kernel_agrees_with_charge_model() {
        let charges: Vec<Charge> = vec![
            PointChargeFlatland::new(2.0, [0.0, 0.0]).into(),
            PointCharge::new(-1.0, [2.0, 1.0]).into(),
            LineCharge::new(1.0, [-1.0, -2.0], [-1.0, 2.0]).into(),
            LineCharge::new(-1.0, [1.0, 2.0], [1.0, -2.0]).into(),
        ];
        let samples = [[0.3, 0.7], [-3.0, 1.5], [5.0, -4.0], [-1.0, 5.0], [1.0, 0.0]];
        for charge in &charges {
            let encoded = charge.encode();
            for p in samples {
                assert_close(field_vector(p[0], p[1], &encoded), charge.field_at(p));
            }
        }
    }

    #[test]
    fn line_kernel_regression_value() {
        let encoded = Charge::from(LineCharge::new(1.0, [-1.0, -2.0], [-1.0, 2.0])).encode();
        let e = field_vector(0.0, 0.0, &encoded);
        assert!((e.re - 0.4472).abs() < 1e-4);
        assert!(e.im.abs() < 1e-4);
    }

    #[test]
    fn line_kernel_is_finite_on_the_extension_of_the_segment() {
        let encoded = Charge::from(LineCharge::new(1.0, [0.0, 0.0], [1e-3, 0.0])).encode();
        let e = field_vector(1e6, 0.0, &encoded);
        assert!(e.re.is_finite() && e.im.is_finite());
        assert_eq!(e.im, 0.0);
    }

    #[test]
    fn line_kernel_is_finite_just_off_the_extension_of_the_segment() {
        let line = LineCharge::new(1.0, [0.0, 0.0], [1e-3, 0.0]);
        let encoded = Charge::from(line).encode();
        for (xp, yp) in [(1e6, 1e-9), (1e6, -1e-9), (-1e6, 1e-12), (3.0, 1e-15)] {
            let e = field_vector(xp, yp, &encoded);
            assert!(e.re.is_finite() && e.im.is_finite(), "({xp}, {yp}) -> {e}");
            let model = line.field_at([xp, yp]);
            assert!(model.re.is_finite() && model.im.is_finite(), "({xp}, {yp}) -> {model}");
        }
    }

    #[test]
    fn reduction_sums_components_before_the_norm() {
        let row = array![[3.0, 1.0], [0.0, 3.0]];
        assert!((reduce_magnitude(row.view()) - 5.0_f64.log10()).abs() < 1e-15);
    }

    #[test]
    fn zero_total_field_maps_to_negative_infinity() {
        let row = array![[1.0, -2.0], [-1.0, 2.0]];
        assert_eq!(reduce_magnitude(row.view()), f64::NEG_INFINITY);
    }
}
