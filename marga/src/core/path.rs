//! Polyline path with arc-length parameterization.
//!
//! Provides the geometric primitives the provider consumes:
//! - Total length
//! - Sampling by arc length (linear interpolation, clamped to the path)
//! - Projection of a point to (s, l) coordinates
//! - Slicing an arc-length window

use super::point::Point2D;

/// Consecutive points closer than this are merged.
const MIN_POINT_SPACING: f64 = 1e-6;

/// Result of projecting a point onto a path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathProjection {
    /// Arc length of the closest point on the path
    pub s: f64,
    /// Signed lateral offset (positive = left of travel direction)
    pub l: f64,
}

/// Polyline with cumulative arc length per vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    points: Vec<Point2D>,
    accumulated_s: Vec<f64>,
}

impl Path {
    /// Build a path from ordered points.
    ///
    /// Non-finite points and duplicate consecutive points are dropped, so the
    /// accumulated arc length is always finite.
    pub fn new(points: Vec<Point2D>) -> Self {
        let mut deduped: Vec<Point2D> = Vec::with_capacity(points.len());
        for point in points.into_iter().filter(Point2D::is_finite) {
            match deduped.last() {
                Some(last) if last.distance(&point) <= MIN_POINT_SPACING => {}
                _ => deduped.push(point),
            }
        }

        let mut accumulated_s = Vec::with_capacity(deduped.len());
        let mut s = 0.0;
        for (i, point) in deduped.iter().enumerate() {
            if i > 0 {
                s += deduped[i - 1].distance(point);
            }
            accumulated_s.push(s);
        }

        Self {
            points: deduped,
            accumulated_s,
        }
    }

    /// Path vertices.
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Cumulative arc length at each vertex.
    pub fn accumulated_s(&self) -> &[f64] {
        &self.accumulated_s
    }

    /// Number of vertices.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// True when the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length in meters.
    pub fn length(&self) -> f64 {
        self.accumulated_s.last().copied().unwrap_or(0.0)
    }

    /// Point at arc length `s`, clamped to [0, length].
    ///
    /// Returns `None` for an empty path.
    pub fn point_at(&self, s: f64) -> Option<Point2D> {
        match self.points.len() {
            0 => None,
            1 => Some(self.points[0]),
            n => {
                // max/min rather than clamp: a NaN `s` maps to the start
                let s = s.max(0.0).min(self.length());
                let upper = self
                    .accumulated_s
                    .partition_point(|&acc| acc <= s)
                    .clamp(1, n - 1);
                let lower = upper - 1;
                let span = self.accumulated_s[upper] - self.accumulated_s[lower];
                let t = if span > 0.0 {
                    (s - self.accumulated_s[lower]) / span
                } else {
                    0.0
                };
                Some(self.points[lower].lerp(&self.points[upper], t))
            }
        }
    }

    /// Project a point onto the closest location of the path.
    ///
    /// Returns `None` when the path has fewer than two vertices or the point
    /// is not finite.
    pub fn project(&self, point: &Point2D) -> Option<PathProjection> {
        if self.points.len() < 2 || !point.is_finite() {
            return None;
        }

        let mut best: Option<(f64, PathProjection)> = None;
        for (i, pair) in self.points.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let segment = b - a;
            let segment_len_sq = segment.dot(&segment);
            let t = ((*point - a).dot(&segment) / segment_len_sq).clamp(0.0, 1.0);
            let foot = a.lerp(&b, t);
            let dist_sq = foot.distance_squared(point);

            let closer = match &best {
                Some((best_sq, _)) => dist_sq < *best_sq,
                None => true,
            };
            if closer {
                let dist = dist_sq.sqrt();
                let l = if segment.cross(&(*point - a)) < 0.0 {
                    -dist
                } else {
                    dist
                };
                let s = self.accumulated_s[i] + t * segment_len_sq.sqrt();
                best = Some((dist_sq, PathProjection { s, l }));
            }
        }

        best.map(|(_, projection)| projection)
    }

    /// Sub-path covering arc lengths [start_s, end_s] (clamped to the path).
    pub fn slice(&self, start_s: f64, end_s: f64) -> Path {
        let length = self.length();
        let start = start_s.max(0.0).min(length);
        let end = end_s.max(start).min(length);

        let mut points = Vec::new();
        points.extend(self.point_at(start));
        points.extend(
            self.points
                .iter()
                .zip(&self.accumulated_s)
                .filter(|&(_, &s)| s > start && s < end)
                .map(|(p, _)| *p),
        );
        points.extend(self.point_at(end));

        Path::new(points)
    }
}

impl From<Vec<Point2D>> for Path {
    fn from(points: Vec<Point2D>) -> Self {
        Path::new(points)
    }
}
