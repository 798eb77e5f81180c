// Charge Model & Encoder
use std::f64::consts::PI;

use ndarray::ArrayView2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Position in the sample plane, `[x, y]`.
pub type Point = [f64; 2];

/// 2D field vector: x component in `re`, y component in `im`.
///
/// Using a complex number lets the line-charge branch rotate its
/// segment-aligned components back to world axes with one multiply.
pub type FieldVector = Complex64;

/// Number of numeric fields in an [`EncodedCharge`] record.
pub const RECORD_WIDTH: usize = 7;

/// Relative slack allowed between a line record's `λ` and `q / length`,
/// wide enough for tables written in single precision.
pub const DENSITY_TOLERANCE: f64 = 1e-6;

#[inline]
fn to_complex(p: Point) -> Complex64 {
    Complex64::new(p[0], p[1])
}

/// Anything that produces a field contribution at a sample point.
pub trait ChargeField {
    fn field_at(&self, p: Point) -> FieldVector;
}

/// True 2D point source, field falls off as 1/r.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointChargeFlatland {
    pub q: f64,
    pub position: Point,
}

impl PointChargeFlatland {
    pub fn new(q: f64, position: Point) -> Self {
        Self { q, position }
    }
}

impl ChargeField for PointChargeFlatland {
    fn field_at(&self, p: Point) -> FieldVector {
        let d = to_complex(p) - to_complex(self.position);
        let r2 = d.norm_sqr();
        if r2 == 0.0 {
            return FieldVector::default();
        }
        d * (self.q / r2)
    }
}

/// Cross-section of a 3D point source, field falls off as 1/r².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCharge {
    pub q: f64,
    pub position: Point,
}

impl PointCharge {
    pub fn new(q: f64, position: Point) -> Self {
        Self { q, position }
    }
}

impl ChargeField for PointCharge {
    fn field_at(&self, p: Point) -> FieldVector {
        let d = to_complex(p) - to_complex(self.position);
        let r2 = d.norm_sqr();
        if r2 == 0.0 {
            return FieldVector::default();
        }
        d * (self.q / r2.powf(1.5))
    }
}

/// Finite segment from `a` to `b` carrying total charge `q`, spread uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineCharge {
    pub q: f64,
    pub a: Point,
    pub b: Point,
}

impl LineCharge {
    pub fn new(q: f64, a: Point, b: Point) -> Self {
        Self { q, a, b }
    }

    /// Builds a segment from its linear density instead of its total charge.
    pub fn with_density(linear_density: f64, a: Point, b: Point) -> Self {
        let length = (to_complex(b) - to_complex(a)).norm();
        Self::new(linear_density * length, a, b)
    }

    pub fn length(&self) -> f64 {
        (to_complex(self.b) - to_complex(self.a)).norm()
    }

    /// λ = q / |b - a|; zero for a zero-length segment.
    pub fn linear_density(&self) -> f64 {
        let length = self.length();
        if length == 0.0 {
            0.0
        } else {
            self.q / length
        }
    }
}

/// Angle at `vertex` between the rays towards `p` and towards `other`.
fn angle(p: Complex64, vertex: Complex64, other: Complex64) -> f64 {
    let (to_p, to_other) = (p - vertex, other - vertex);
    let dot = to_p.re * to_other.re + to_p.im * to_other.im;
    (dot / (to_p.norm() * to_other.norm())).clamp(-1.0, 1.0).acos()
}

/// z-component of the 2D cross product.
fn cross(u: Complex64, v: Complex64) -> f64 {
    u.re * v.im - u.im * v.re
}

impl ChargeField for LineCharge {
    fn field_at(&self, p: Point) -> FieldVector {
        let (p, a, b) = (to_complex(p), to_complex(self.a), to_complex(self.b));
        let segment = b - a;
        let length = segment.norm();
        let (r0, r1) = ((p - a).norm(), (p - b).norm());
        // On an endpoint, or no segment at all: no defined direction.
        if length == 0.0 || r0 == 0.0 || r1 == 0.0 {
            return FieldVector::default();
        }

        let lam = self.q / length;
        let theta_a = angle(p, a, b);
        let theta_b = PI - angle(p, b, a);
        let h = cross(p - a, p - b).abs() / length;
        let sign = if cross(a - p, b - p) > 0.0 { 1.0 } else { -1.0 };

        let e_para = lam * (1.0 / r1 - 1.0 / r0);
        let e_perp = if h != 0.0 {
            -sign * lam * (theta_b.cos() - theta_a.cos()) / h
        } else {
            0.0
        };

        Complex64::new(e_para, e_perp) * (segment / length)
    }
}

/// Closed set of supported charge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Charge {
    PointFlatland(PointChargeFlatland),
    Point(PointCharge),
    Line(LineCharge),
}

impl Charge {
    pub fn kind(&self) -> ChargeKind {
        match self {
            Charge::PointFlatland(_) => ChargeKind::PointFlatland,
            Charge::Point(_) => ChargeKind::Point,
            Charge::Line(_) => ChargeKind::Line,
        }
    }

    pub fn encode(&self) -> EncodedCharge {
        EncodedCharge::from(self)
    }
}

impl ChargeField for Charge {
    fn field_at(&self, p: Point) -> FieldVector {
        match self {
            Charge::PointFlatland(c) => c.field_at(p),
            Charge::Point(c) => c.field_at(p),
            Charge::Line(c) => c.field_at(p),
        }
    }
}

impl From<PointChargeFlatland> for Charge {
    fn from(c: PointChargeFlatland) -> Self {
        Charge::PointFlatland(c)
    }
}

impl From<PointCharge> for Charge {
    fn from(c: PointCharge) -> Self {
        Charge::Point(c)
    }
}

impl From<LineCharge> for Charge {
    fn from(c: LineCharge) -> Self {
        Charge::Line(c)
    }
}

/// Kind tag stored in field 0 of an encoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChargeKind {
    PointFlatland = 0,
    Point = 1,
    Line = 2,
}

impl ChargeKind {
    pub fn tag(self) -> f64 {
        self as u8 as f64
    }
}

impl TryFrom<f64> for ChargeKind {
    type Error = Error;

    fn try_from(tag: f64) -> Result<Self> {
        match tag {
            t if t == 0.0 => Ok(ChargeKind::PointFlatland),
            t if t == 1.0 => Ok(ChargeKind::Point),
            t if t == 2.0 => Ok(ChargeKind::Line),
            _ => Err(Error::UnsupportedChargeKind(tag)),
        }
    }
}

/// Fixed-width record `{kind, q, x0, y0, x1, y1, λ}` consumed by the uniform kernel.
///
/// Point kinds use `(x0, y0)` as the position and leave the last three
/// fields zero. Lines use both endpoints and the linear density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedCharge {
    pub kind: ChargeKind,
    pub q: f64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub lambda: f64,
}

impl EncodedCharge {
    pub fn to_record(&self) -> [f64; RECORD_WIDTH] {
        [
            self.kind.tag(),
            self.q,
            self.x0,
            self.y0,
            self.x1,
            self.y1,
            self.lambda,
        ]
    }

    /// Rebuilds the charge this record was encoded from.
    pub fn decode(&self) -> Charge {
        match self.kind {
            ChargeKind::PointFlatland => {
                PointChargeFlatland::new(self.q, [self.x0, self.y0]).into()
            }
            ChargeKind::Point => PointCharge::new(self.q, [self.x0, self.y0]).into(),
            ChargeKind::Line => {
                LineCharge::new(self.q, [self.x0, self.y0], [self.x1, self.y1]).into()
            }
        }
    }
}

impl From<&Charge> for EncodedCharge {
    fn from(charge: &Charge) -> Self {
        match charge {
            Charge::PointFlatland(PointChargeFlatland { q, position })
            | Charge::Point(PointCharge { q, position }) => Self {
                kind: charge.kind(),
                q: *q,
                x0: position[0],
                y0: position[1],
                x1: 0.0,
                y1: 0.0,
                lambda: 0.0,
            },
            Charge::Line(line) => Self {
                kind: ChargeKind::Line,
                q: line.q,
                x0: line.a[0],
                y0: line.a[1],
                x1: line.b[0],
                y1: line.b[1],
                lambda: line.linear_density(),
            },
        }
    }
}

impl TryFrom<[f64; RECORD_WIDTH]> for EncodedCharge {
    type Error = Error;

    /// Line records must carry `λ == q / |b - a|` (relative tolerance
    /// [`DENSITY_TOLERANCE`]); the kernel reads `λ` while the charge model
    /// derives it from `q`.
    fn try_from(record: [f64; RECORD_WIDTH]) -> Result<Self> {
        let [tag, q, x0, y0, x1, y1, lambda] = record;
        let kind = ChargeKind::try_from(tag)?;
        if kind == ChargeKind::Line {
            let expected = LineCharge::new(q, [x0, y0], [x1, y1]).linear_density();
            let scale = expected.abs().max(lambda.abs());
            let consistent = (lambda - expected).abs() <= DENSITY_TOLERANCE * scale;
            if !consistent {
                return Err(Error::LineDensityMismatch {
                    expected,
                    found: lambda,
                });
            }
        }
        Ok(Self {
            kind,
            q,
            x0,
            y0,
            x1,
            y1,
            lambda,
        })
    }
}

/// Flattens charges into records, preserving order.
pub fn encode_charges(charges: &[Charge]) -> Result<Vec<EncodedCharge>> {
    if charges.is_empty() {
        return Err(Error::EmptyChargeSet);
    }
    Ok(charges.iter().map(EncodedCharge::from).collect())
}

/// Decodes an `(n, 7)` record table. Any unknown kind tag rejects the whole table.
pub fn decode_records(records: ArrayView2<'_, f64>) -> Result<Vec<Charge>> {
    if records.ncols() != RECORD_WIDTH {
        return Err(Error::ShapeMismatch {
            expected: vec![records.nrows(), RECORD_WIDTH],
            found: records.shape().to_vec(),
        });
    }
    if records.nrows() == 0 {
        return Err(Error::EmptyChargeSet);
    }
    records
        .rows()
        .into_iter()
        .map(|row| {
            let mut record = [0.0; RECORD_WIDTH];
            record.iter_mut().zip(row.iter()).for_each(|(dst, src)| *dst = *src);
            EncodedCharge::try_from(record).map(|encoded| encoded.decode())
        })
        .collect()
}
