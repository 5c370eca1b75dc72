use serde::Serialize;

/// Axis-aligned box in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            width: (right - left).max(0) as u32,
            height: (bottom - top).max(0) as u32,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_edges(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Whether the horizontal extents of the two boxes intersect.
    pub fn overlaps_horizontally(&self, other: &BoundingBox) -> bool {
        self.left < other.right() && other.left < self.right()
    }
}

/// One piece of recognized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionSpan {
    pub text: String,
    /// In `[0, 1]`. Engines that do not score their output report 1.0.
    pub confidence: f32,
    pub bounds: Option<BoundingBox>,
}

impl RecognitionSpan {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// Per-request hints for a recognizer.
#[derive(Debug, Clone, Default)]
pub struct RecognitionHints {
    /// Requested language code. Only the cloud engine honours it.
    pub language: Option<String>,
}

impl RecognitionHints {
    pub fn with_language(language: Option<&str>) -> Self {
        Self {
            language: language.map(str::to_string),
        }
    }
}
