use std::cell::RefCell;
use std::rc::Rc;

use crate::foundation::core::Point;
use crate::foundation::error::StrobeResult;
use crate::signal::handle::Signal;
use crate::signal::runtime::Runtime;
use crate::spline::curve::SplineCurve;

#[derive(Clone, Debug)]
struct CacheKey {
    points: Vec<Point>,
    smoothness_bits: u64,
    closed: bool,
}

impl CacheKey {
    fn matches(&self, points: &[Point], smoothness: f64, closed: bool) -> bool {
        self.closed == closed
            && self.smoothness_bits == smoothness.to_bits()
            && self.points.as_slice() == points
    }
}

/// Memoizes the last fitted curve and rebuilds only when its inputs change by value.
#[derive(Debug, Default)]
pub struct SplineCache {
    last: Option<(CacheKey, Rc<SplineCurve>)>,
    builds: u64,
}

impl SplineCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Curve for the given inputs, reusing the previous build when they are unchanged.
    pub fn get(
        &mut self,
        points: &[Point],
        smoothness: f64,
        closed: bool,
    ) -> StrobeResult<Rc<SplineCurve>> {
        if let Some((key, curve)) = &self.last
            && key.matches(points, smoothness, closed)
        {
            return Ok(curve.clone());
        }

        let curve = Rc::new(SplineCurve::build(points, smoothness, closed)?);
        self.builds += 1;
        tracing::debug!(
            points = points.len(),
            smoothness,
            closed,
            builds = self.builds,
            "spline rebuilt"
        );
        self.last = Some((
            CacheKey {
                points: points.to_vec(),
                smoothness_bits: smoothness.to_bits(),
                closed,
            },
            curve.clone(),
        ));
        Ok(curve)
    }

    /// Number of times a curve was actually fitted.
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

/// Derived signal producing a curve from signal-driven control points.
///
/// The curve is refitted only when the points or smoothness change by value.
pub fn spline_signal(
    rt: &Runtime,
    name: impl Into<String>,
    points: Signal<Vec<Point>>,
    smoothness: Signal<f64>,
    closed: bool,
) -> Signal<Rc<SplineCurve>> {
    let cache = RefCell::new(SplineCache::new());
    rt.derived(name, move || {
        let pts = points.read()?;
        let s = smoothness.read()?;
        cache.borrow_mut().get(&pts, s, closed)
    })
}
