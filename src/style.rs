//! Drawing style: colors, line width and global alpha.

/// Straight (non-premultiplied) RGBA, each channel in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color: hex, `rgb()`/`rgba()`, `hsl()`/`hsla()` or
    /// any CSS color keyword.
    ///
    /// Anything unrecognised is black, like a canvas ignoring a bad
    /// `fillStyle` string.
    pub fn parse(value: &str) -> Color {
        parse_color(value).unwrap_or(Color::BLACK)
    }

    /// Channels scaled by `alpha`'s opacity, as drawn.
    pub fn with_alpha(self, alpha: f32) -> Color {
        Color {
            a: self.a * alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

fn parse_color(value: &str) -> Option<Color> {
    let parsed: svgtypes::Color = value.trim().parse().ok()?;
    Some(Color::from(parsed))
}

impl From<svgtypes::Color> for Color {
    fn from(c: svgtypes::Color) -> Self {
        let unit = |v: u8| v as f32 / 255.0;
        Color::rgba(unit(c.red), unit(c.green), unit(c.blue), unit(c.alpha))
    }
}

/// Style a path is filled and stroked with.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub line_width: f64,
    pub global_alpha: f32,
}

impl Default for DrawingStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
            global_alpha: 1.0,
        }
    }
}

impl DrawingStyle {
    pub fn set_fill_style(&mut self, value: &str) {
        self.fill_color = Color::parse(value);
    }

    pub fn set_stroke_style(&mut self, value: &str) {
        self.stroke_color = Color::parse(value);
    }

    /// Fill color with the global alpha applied.
    pub fn effective_fill(&self) -> Color {
        self.fill_color.with_alpha(self.global_alpha)
    }

    /// Stroke color with the global alpha applied.
    pub fn effective_stroke(&self) -> Color {
        self.stroke_color.with_alpha(self.global_alpha)
    }
}
