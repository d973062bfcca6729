use kurbo::{CubicBez, ParamCurve, ParamCurveDeriv};

use crate::foundation::core::{BezPath, Point, Vec2};
use crate::foundation::error::{StrobeError, StrobeResult};

/// Number of tessellation samples per cubic span.
pub const SAMPLES_PER_SPAN: usize = 32;

/// Visible portion of a curve in normalized travel distance.
///
/// For closed curves `start > end` wraps through the seam. For open curves it traverses the
/// curve backwards.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VisibleRange {
    /// Normalized distance where the visible part begins.
    pub start: f64,
    /// Normalized distance where the visible part ends.
    pub end: f64,
}

impl Default for VisibleRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl VisibleRange {
    /// The whole curve.
    pub const FULL: Self = Self {
        start: 0.0,
        end: 1.0,
    };

    /// Create a validated range; both ends are clamped into `[0, 1]`.
    pub fn new(start: f64, end: f64) -> StrobeResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(StrobeError::validation(
                "spline range start/end must be finite",
            ));
        }
        Ok(Self {
            start: start.clamp(0.0, 1.0),
            end: end.clamp(0.0, 1.0),
        })
    }

    /// Return `true` when the range covers the curve from 0 to 1.
    pub fn is_full(self) -> bool {
        self.start == 0.0 && self.end == 1.0
    }
}

/// Position and unit tangent at a point along a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplineSample {
    /// Position on the curve.
    pub position: Point,
    /// Unit tangent in the direction of travel.
    pub tangent: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct ArcSample {
    dist: f64,
    span: usize,
    t: f64,
}

/// Smooth curve through control points, sampled by normalized travel distance.
#[derive(Clone, Debug)]
pub struct SplineCurve {
    points: Vec<Point>,
    smoothness: f64,
    closed: bool,
    spans: Vec<CubicBez>,
    table: Vec<ArcSample>,
    length: f64,
    range: VisibleRange,
}

impl SplineCurve {
    /// Fit a curve through `points`.
    ///
    /// `smoothness` is clamped into `[0, 1]` and scales the tangent handles; `0` yields a
    /// polyline.
    pub fn build(points: &[Point], smoothness: f64, closed: bool) -> StrobeResult<Self> {
        if points.len() < 2 {
            return Err(StrobeError::InsufficientPoints { got: points.len() });
        }
        if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(StrobeError::validation(
                "spline control points must be finite",
            ));
        }
        if !smoothness.is_finite() {
            return Err(StrobeError::validation(format!(
                "spline smoothness must be finite, got {smoothness}"
            )));
        }
        let smoothness = smoothness.clamp(0.0, 1.0);

        let spans = fit_spans(points, smoothness, closed);
        let table = tessellate(&spans);
        let length = table.last().map(|s| s.dist).unwrap_or(0.0);

        Ok(Self {
            points: points.to_vec(),
            smoothness,
            closed,
            spans,
            table,
            length,
            range: VisibleRange::FULL,
        })
    }

    /// Restrict sampling to `[start, end]`.
    pub fn with_range(mut self, start: f64, end: f64) -> StrobeResult<Self> {
        self.range = VisibleRange::new(start, end)?;
        Ok(self)
    }

    /// Copy of this curve restricted to `range`.
    pub fn view(&self, range: VisibleRange) -> StrobeResult<Self> {
        self.clone().with_range(range.start, range.end)
    }

    /// Currently visible range.
    pub fn range(&self) -> VisibleRange {
        self.range
    }

    /// Control points the curve passes through.
    pub fn control_points(&self) -> &[Point] {
        &self.points
    }

    /// Smoothness used at build time.
    pub fn smoothness(&self) -> f64 {
        self.smoothness
    }

    /// Return `true` when the curve loops back to its first point.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cubic spans, one per pair of consecutive control points.
    pub fn spans(&self) -> &[CubicBez] {
        &self.spans
    }

    /// Approximate arc length of the full curve.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Sample the visible range at normalized travel distance `u`.
    ///
    /// Open curves clamp `u` into `[0, 1]`; closed curves wrap it.
    pub fn point_at_percentage(&self, u: f64) -> SplineSample {
        self.sample_in(self.range, u)
    }

    /// Sample `range` at normalized travel distance `u`, ignoring the stored range.
    pub fn sample_in(&self, range: VisibleRange, u: f64) -> SplineSample {
        let u = self.normalize_u(u);
        let full = self.remap(range, u);
        self.sample_full(full)
    }

    /// Kurbo path of the visible range.
    pub fn visible_path(&self) -> BezPath {
        self.path_in(self.range)
    }

    /// Kurbo path of `range`.
    pub fn path_in(&self, range: VisibleRange) -> BezPath {
        let mut path = BezPath::new();
        if range.is_full() {
            path.move_to(self.points[0]);
            for span in &self.spans {
                path.curve_to(span.p1, span.p2, span.p3);
            }
            if self.closed {
                path.close_path();
            }
            return path;
        }

        let d0 = range.start * self.length;
        let d1 = range.end * self.length;
        if self.closed && range.start > range.end {
            self.append_span(&mut path, d0, self.length, true);
            self.append_span(&mut path, 0.0, d1, false);
        } else {
            self.append_span(&mut path, d0.min(d1), d0.max(d1), true);
        }
        path
    }

    fn normalize_u(&self, u: f64) -> f64 {
        if u.is_nan() {
            return 0.0;
        }
        if self.closed {
            if u == 1.0 { 1.0 } else { u.rem_euclid(1.0) }
        } else {
            u.clamp(0.0, 1.0)
        }
    }

    fn remap(&self, range: VisibleRange, u: f64) -> f64 {
        if range.is_full() {
            return u;
        }
        if self.closed && range.start > range.end {
            let span = range.end + 1.0 - range.start;
            let v = range.start + span * u;
            return if v > 1.0 { v - 1.0 } else { v };
        }
        range.start + (range.end - range.start) * u
    }

    fn sample_full(&self, u: f64) -> SplineSample {
        let (span, t) = if u <= 0.0 {
            (0, 0.0)
        } else if u >= 1.0 {
            (self.spans.len() - 1, 1.0)
        } else {
            self.locate(u * self.length)
        };

        let position = if u <= 0.0 {
            self.points[0]
        } else if u >= 1.0 {
            self.spans[span].p3
        } else {
            self.spans[span].eval(t)
        };

        SplineSample {
            position,
            tangent: tangent_at(&self.spans[span], t),
        }
    }

    // Maps an absolute distance onto (span index, span parameter).
    fn locate(&self, d: f64) -> (usize, f64) {
        if self.length <= 0.0 {
            return (0, 0.0);
        }
        let idx = self.table.partition_point(|s| s.dist < d);
        if idx == 0 {
            return (self.table[0].span, self.table[0].t);
        }
        if idx >= self.table.len() {
            let last = self.table[self.table.len() - 1];
            return (last.span, last.t);
        }

        let a = self.table[idx - 1];
        let b = self.table[idx];
        let (span, t0) = if a.span == b.span {
            (a.span, a.t)
        } else {
            (b.span, 0.0)
        };
        let denom = b.dist - a.dist;
        let frac = if denom > 0.0 {
            ((d - a.dist) / denom).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (span, t0 + (b.t - t0) * frac)
    }

    fn append_span(&self, path: &mut BezPath, d0: f64, d1: f64, start_new: bool) {
        let (s0, t0) = self.locate(d0);
        let (s1, t1) = self.locate(d1);
        if start_new {
            path.move_to(self.spans[s0].eval(t0));
        }
        for idx in s0..=s1 {
            let from = if idx == s0 { t0 } else { 0.0 };
            let to = if idx == s1 { t1 } else { 1.0 };
            if to <= from {
                continue;
            }
            let piece = self.spans[idx].subsegment(from..to);
            path.curve_to(piece.p1, piece.p2, piece.p3);
        }
    }
}

fn fit_spans(points: &[Point], smoothness: f64, closed: bool) -> Vec<CubicBez> {
    let n = points.len();
    let neighbour = |i: usize, offset: isize| -> Point {
        let j = i as isize + offset;
        if closed {
            points[j.rem_euclid(n as isize) as usize]
        } else {
            points[j.clamp(0, n as isize - 1) as usize]
        }
    };
    let directions: Vec<Vec2> = (0..n)
        .map(|i| {
            let d = neighbour(i, 1) - neighbour(i, -1);
            let len = d.hypot();
            if len > 0.0 { d / len } else { Vec2::ZERO }
        })
        .collect();

    let span_count = if closed { n } else { n - 1 };
    (0..span_count)
        .map(|i| {
            let j = (i + 1) % n;
            let (p0, p3) = (points[i], points[j]);
            let handle = smoothness * (p3 - p0).hypot() / 3.0;
            CubicBez::new(
                p0,
                p0 + directions[i] * handle,
                p3 - directions[j] * handle,
                p3,
            )
        })
        .collect()
}

fn tessellate(spans: &[CubicBez]) -> Vec<ArcSample> {
    let mut table = Vec::with_capacity(spans.len() * SAMPLES_PER_SPAN + 1);
    table.push(ArcSample {
        dist: 0.0,
        span: 0,
        t: 0.0,
    });
    let mut dist = 0.0;
    for (span_idx, span) in spans.iter().enumerate() {
        let mut prev = span.p0;
        for k in 1..=SAMPLES_PER_SPAN {
            let t = k as f64 / SAMPLES_PER_SPAN as f64;
            let p = span.eval(t);
            dist += (p - prev).hypot();
            prev = p;
            table.push(ArcSample {
                dist,
                span: span_idx,
                t,
            });
        }
    }
    table
}

fn tangent_at(span: &CubicBez, t: f64) -> Vec2 {
    let d = span.deriv().eval(t).to_vec2();
    let len = d.hypot();
    if len > 1e-12 {
        return d / len;
    }
    let chord = span.p3 - span.p0;
    let len = chord.hypot();
    if len > 1e-12 {
        chord / len
    } else {
        Vec2::new(1.0, 0.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spline/curve.rs"]
mod tests;
