// Distance approximation and the distance-to-score curve.

use crate::domain::coords::GeoPoint;

/// Ceiling of the reference curve; other ceilings scale it proportionally.
pub const REFERENCE_MAX_SCORE: u32 = 500;

// Planar approximation constant; only valid at campus scale.
const METERS_PER_DEGREE: f64 = 111_000.0;

// Guesses at or inside this radius always earn the full score.
const PERFECT_RADIUS_M: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
struct Segment {
    min_dist: f64,
    max_dist: f64,
    max_score: f64,
    min_score: f64,
}

impl Segment {
    const fn new(min_dist: f64, max_dist: f64, max_score: f64, min_score: f64) -> Self {
        Self {
            min_dist,
            max_dist,
            max_score,
            min_score,
        }
    }

    fn interpolate(&self, distance: f64) -> f64 {
        let gradient = (self.min_score - self.max_score) / (self.max_dist - self.min_dist);
        // Distances in the gap before `min_dist` take the segment's top score.
        let offset = (distance - self.min_dist).max(0.0);
        self.max_score + gradient * offset
    }
}

const SEGMENTS: [Segment; 6] = [
    Segment::new(4.0, 25.0, 495.0, 450.0),
    Segment::new(26.0, 50.0, 447.0, 350.0),
    Segment::new(51.0, 250.0, 345.0, 200.0),
    Segment::new(251.0, 300.0, 198.0, 100.0),
    Segment::new(301.0, 500.0, 98.0, 10.0),
    Segment::new(501.0, 700.0, 10.0, 0.0),
];

/// Planar distance in meters between two points.
///
/// The longitude term is scaled by the cosine of `from`'s latitude; pass the actual location first.
pub fn distance_meters(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let d_lat = (to.latitude - from.latitude) * METERS_PER_DEGREE;
    let d_lng =
        (to.longitude - from.longitude) * METERS_PER_DEGREE * from.latitude.to_radians().cos();
    (d_lat * d_lat + d_lng * d_lng).sqrt()
}

fn reference_score(distance: f64) -> f64 {
    if !distance.is_finite() {
        return 0.0;
    }
    let distance = distance.max(0.0);
    if distance <= PERFECT_RADIUS_M {
        return REFERENCE_MAX_SCORE as f64;
    }

    SEGMENTS
        .iter()
        .find(|segment| distance <= segment.max_dist)
        .map_or(0.0, |segment| segment.interpolate(distance))
}

/// Pure distance-to-score function with a configurable ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringEngine {
    max_score: u32,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(REFERENCE_MAX_SCORE)
    }
}

impl ScoringEngine {
    pub fn new(max_score: u32) -> Self {
        Self { max_score }
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Score for a guess `distance` meters away, rounded half away from zero.
    pub fn score(&self, distance: f64) -> u32 {
        let scale = f64::from(self.max_score) / f64::from(REFERENCE_MAX_SCORE);
        let scaled = (reference_score(distance) * scale).round();
        scaled.clamp(0.0, f64::from(self.max_score)) as u32
    }

    pub fn distance(&self, actual: &GeoPoint, guess: &GeoPoint) -> f64 {
        distance_meters(actual, guess)
    }
}
