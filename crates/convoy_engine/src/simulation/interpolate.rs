use crate::geopoint::GeoPoint;

/// Marker position along `path` for a progress fraction.
///
/// Picks the point at `floor(progress * (len - 1))`, a step function over
/// point indices. Movement is not distance proportional: on a path with
/// unevenly spaced points the marker visibly changes speed.
///
/// `progress` is clamped to `[0, 1]`, NaN counts as `0`. Returns `None`
/// only for an empty path.
pub fn position_at(path: &[GeoPoint], progress: f64) -> Option<GeoPoint> {
    let last = path.len().checked_sub(1)?;
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };

    let index = (progress * last as f64).floor() as usize;
    path.get(index.min(last)).copied()
}
