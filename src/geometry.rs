//! Watermark anchor placement relative to page rotation
//!
//! Text is drawn in the page's unrotated content-stream coordinates. A viewer
//! then applies the page's `/Rotate` on top, so each quadrant needs its own
//! inverse placement for the watermark to read upright and start near the
//! same visual corner (bottom-left for an unrotated page).

/// The four 90° rotation states a page can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    /// 0° (also any angle that does not round to 1, 2 or 3 quarter turns)
    Zero,
    /// 90°
    Quarter,
    /// 180°
    Half,
    /// 270°
    ThreeQuarter,
}

impl Quadrant {
    /// Classify a `/Rotate` angle in degrees.
    ///
    /// Negative angles are shifted once by 360; larger angles are not
    /// reduced. Anything that does not round to 1, 2 or 3 quarter turns,
    /// including 360° itself, falls back to [`Quadrant::Zero`].
    pub fn from_degrees(angle: f32) -> Self {
        let normalized = if angle < 0.0 { angle + 360.0 } else { angle };
        match (normalized / 90.0).round() as i64 {
            1 => Quadrant::Quarter,
            2 => Quadrant::Half,
            3 => Quadrant::ThreeQuarter,
            _ => Quadrant::Zero,
        }
    }

    /// Nominal page rotation in degrees
    pub fn degrees(self) -> i32 {
        match self {
            Quadrant::Zero => 0,
            Quadrant::Quarter => 90,
            Quadrant::Half => 180,
            Quadrant::ThreeQuarter => 270,
        }
    }
}

/// Size, origin and rotation of a page's media box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Lower-left x of the media box
    pub origin_x: f32,
    /// Lower-left y of the media box
    pub origin_y: f32,
    /// Declared `/Rotate` in degrees
    pub rotation: f32,
}

impl PageGeometry {
    pub fn quadrant(&self) -> Quadrant {
        Quadrant::from_degrees(self.rotation)
    }
}

/// Where to start the watermark text and how to turn it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPosition {
    pub x: f32,
    pub y: f32,
    /// Text rotation in degrees, counter-clockwise
    pub rotation: f32,
}

/// Per-quadrant placement rule.
///
/// The anchor is `origin + width * w + height * h + em * e` on each axis.
struct Placement {
    x: (f32, f32, f32),
    y: (f32, f32, f32),
    rotation: f32,
}

const fn placement(quadrant: Quadrant) -> Placement {
    match quadrant {
        Quadrant::Quarter => Placement {
            x: (1.0, 0.0, 0.0),
            y: (0.0, 0.0, 1.0),
            rotation: 180.0,
        },
        Quadrant::Half => Placement {
            x: (1.0, 0.0, -1.0),
            y: (0.0, 1.0, 0.0),
            rotation: -90.0,
        },
        Quadrant::ThreeQuarter => Placement {
            x: (0.0, 0.0, 0.0),
            y: (0.0, 1.0, -1.0),
            rotation: 0.0,
        },
        Quadrant::Zero => Placement {
            x: (0.0, 0.0, 1.0),
            y: (0.0, 0.0, 0.0),
            rotation: 90.0,
        },
    }
}

/// Resolve the watermark anchor and text rotation for a page.
///
/// `em` is the text size in points; it keeps the baseline one text height
/// in from the page edge.
pub fn resolve(page: &PageGeometry, em: f32) -> TextPosition {
    let rule = placement(page.quadrant());
    let (wx, hx, ex) = rule.x;
    let (wy, hy, ey) = rule.y;

    TextPosition {
        x: page.origin_x + page.width * wx + page.height * hx + em * ex,
        y: page.origin_y + page.width * wy + page.height * hy + em * ey,
        rotation: rule.rotation,
    }
}
