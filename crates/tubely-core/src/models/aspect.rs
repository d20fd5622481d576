//! Aspect ratio classification of a video stream.

use crate::constants::ASPECT_RATIO_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

/// Coarse orientation of a video, used to pick a storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClassification {
    Landscape16x9,
    Portrait9x16,
    Other,
}

impl AspectClassification {
    /// Classify a stream by its width / height ratio.
    ///
    /// Both dimensions must be positive; a zero height yields `Other`.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectClassification::Other;
        }

        let ratio = f64::from(width) / f64::from(height);
        if (ratio - LANDSCAPE_RATIO).abs() < ASPECT_RATIO_TOLERANCE {
            AspectClassification::Landscape16x9
        } else if (ratio - PORTRAIT_RATIO).abs() < ASPECT_RATIO_TOLERANCE {
            AspectClassification::Portrait9x16
        } else {
            AspectClassification::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectClassification::Landscape16x9 => "16:9",
            AspectClassification::Portrait9x16 => "9:16",
            AspectClassification::Other => "other",
        }
    }
}

impl Display for AspectClassification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
