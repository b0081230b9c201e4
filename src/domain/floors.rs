// Human-readable labels for building floors and parking levels.

use crate::domain::errors::FloorError;

pub const DEFAULT_MIN_FLOOR: i32 = -4;
pub const DEFAULT_MAX_FLOOR: i32 = 6;

const PARKING_LABELS: [&str; 4] = ["P1", "P2", "P3", "P4"];

/// Bounded floor range for the indoor map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorTable {
    min: i32,
    max: i32,
}

impl Default for FloorTable {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_FLOOR,
            max: DEFAULT_MAX_FLOOR,
        }
    }
}

impl FloorTable {
    pub fn new(min: i32, max: i32) -> Result<Self, FloorError> {
        if min > max {
            return Err(FloorError::InvertedBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, level: i32) -> bool {
        (self.min..=self.max).contains(&level)
    }

    /// Returns the display label for `level`, rejecting levels outside the configured range.
    pub fn label(&self, level: i32) -> Result<String, FloorError> {
        if !self.contains(level) {
            return Err(FloorError::OutOfRange {
                level,
                min: self.min,
                max: self.max,
            });
        }

        let label = match level {
            // -1 is the shallowest parking level.
            l if l < 0 => PARKING_LABELS
                .get(l.unsigned_abs() as usize - 1)
                .map_or_else(|| format!("P{}", l.unsigned_abs()), |s| (*s).to_string()),
            0 => "Lower Ground".to_string(),
            1 => "Ground".to_string(),
            l => format!("Level {}", l - 1),
        };
        Ok(label)
    }
}
