//! Per-class line counts.

use serde::{Deserialize, Serialize};

use palmline_pipeline::{LineCandidate, LineClass};

/// Line counts by class, plus the classes in the order they first occur.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSummary {
    /// `major_vertical` lines.
    pub major_vertical: usize,
    /// `major_horizontal` lines.
    pub major_horizontal: usize,
    /// `medium` lines.
    pub medium: usize,
    /// `minor` lines.
    pub minor: usize,
    /// Distinct classes present, in first-appearance order.
    pub line_types: Vec<LineClass>,
}

impl LineSummary {
    /// Count the classes of `lines`.
    #[must_use]
    pub fn from_lines(lines: &[LineCandidate]) -> Self {
        let mut summary = Self::default();
        for line in lines {
            let class = line.class();
            *summary.count_mut(class) += 1;
            if !summary.line_types.contains(&class) {
                summary.line_types.push(class);
            }
        }
        summary
    }

    /// Lines of `class`.
    #[must_use]
    pub const fn count(&self, class: LineClass) -> usize {
        match class {
            LineClass::MajorVertical => self.major_vertical,
            LineClass::MajorHorizontal => self.major_horizontal,
            LineClass::Medium => self.medium,
            LineClass::Minor => self.minor,
        }
    }

    const fn count_mut(&mut self, class: LineClass) -> &mut usize {
        match class {
            LineClass::MajorVertical => &mut self.major_vertical,
            LineClass::MajorHorizontal => &mut self.major_horizontal,
            LineClass::Medium => &mut self.medium,
            LineClass::Minor => &mut self.minor,
        }
    }

    /// Vertical plus horizontal major lines.
    #[must_use]
    pub const fn major_lines(&self) -> usize {
        self.major_vertical + self.major_horizontal
    }

    /// All counted lines.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.major_lines() + self.medium + self.minor
    }
}
