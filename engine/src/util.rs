use std::cmp::Ordering;

pub mod in_range_option;

/// Totally ordered wrapper for float weights, used as priority queue keys.
/// Weights in this crate are never NaN, infinity is a regular (largest) value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct NonNan(f64);

impl NonNan {
    pub fn new(val: f64) -> Option<NonNan> {
        if val.is_nan() {
            None
        } else {
            Some(NonNan(val))
        }
    }

    /// Wrap a weight that is known to be a number.
    #[inline(always)]
    pub fn key(val: f64) -> NonNan {
        debug_assert!(!val.is_nan());
        NonNan(val)
    }

    #[inline(always)]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Eq for NonNan {}

impl Ord for NonNan {
    #[inline]
    fn cmp(&self, other: &NonNan) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Mean earth radius in meters.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Great circle distance in meters between two coordinates given in degrees.
pub fn haversine_distance((lat1, lng1): (f64, f64), (lat2, lng2): (f64, f64)) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().asin()
}
