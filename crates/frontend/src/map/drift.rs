//! Slow idle camera drift: eastward longitude creep with a latitude sweep.
use peaceboard_shared::models::LngLat;

/// Degrees of longitude per millisecond.
const LNG_PER_MS: f64 = 0.001;
/// One full latitude sweep takes half an hour.
const LAT_PERIOD_MS: f64 = 1_800_000.0;
const LAT_LIMIT: f64 = 75.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Drift {
    lng: f64,
    elapsed_ms: f64,
    last_ms: Option<f64>,
}

impl Drift {
    pub fn starting_at(lng: f64) -> Self {
        Drift {
            lng,
            elapsed_ms: 0.0,
            last_ms: None,
        }
    }

    /// Advance to `now_ms` and return the new center. The first call only
    /// anchors the clock.
    pub fn step(&mut self, now_ms: f64) -> LngLat {
        let dt = match self.last_ms {
            Some(last) if now_ms > last => now_ms - last,
            _ => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.elapsed_ms += dt;
        self.lng = (self.lng + LNG_PER_MS * dt) % 360.0;

        let sweep = LAT_LIMIT * (std::f64::consts::TAU * self.elapsed_ms / LAT_PERIOD_MS).sin();
        LngLat {
            lng: self.lng,
            lat: sweep.clamp(-LAT_LIMIT, LAT_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_anchors() {
        let mut drift = Drift::starting_at(5.0);
        assert_eq!(drift.step(10_000.0), LngLat { lng: 5.0, lat: 0.0 });
    }

    #[test]
    fn test_longitude_creeps_east() {
        let mut drift = Drift::starting_at(0.0);
        drift.step(0.0);
        let at = drift.step(1_000.0);
        assert!((at.lng - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_wraps() {
        let mut drift = Drift::starting_at(359.5);
        drift.step(0.0);
        assert!(drift.step(1_000.0).lng < 1.0);
    }

    #[test]
    fn test_latitude_peaks_at_quarter_period() {
        let mut drift = Drift::starting_at(0.0);
        drift.step(0.0);
        let at = drift.step(LAT_PERIOD_MS / 4.0);
        assert!((at.lat - LAT_LIMIT).abs() < 1e-9);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut drift = Drift::starting_at(10.0);
        drift.step(5_000.0);
        assert_eq!(drift.step(1_000.0).lng, 10.0);
    }
}
