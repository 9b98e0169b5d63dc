/// All tessellation tolerances and knobs in one struct.
/// Adjustable at runtime; `Default` holds the stock tolerances.
#[derive(Debug, Clone)]
pub struct TessConfig {
    // -- Curve classification --
    /// Values of the Loop-Blinn invariants (d1, d2, d3) and the
    /// discriminant within this distance of zero are snapped to zero.
    pub curve_epsilon: f64,

    // -- Point comparison --
    /// Tolerance for "the contour returned to its start point".
    pub close_epsilon: f64,
    /// Tolerance for removing coincident neighbours from the interior polygon.
    pub dedup_epsilon: f64,

    // -- Overlap resolution --
    /// Halves whose control-polygon area is at or below this are not
    /// subdivided further. Stops bisection of near-degenerate slivers.
    pub overlap_area_floor: f64,
    /// Hard cap on the subdivision depth reached by overlap resolution.
    pub max_subdivision_level: u32,

    // -- Stroke --
    /// Stroke sampling: one forward-difference step per this many
    /// units of (scaled) control polygon length.
    pub stroke_step_length: f64,
    /// Miter joins longer than `miter_limit * width / 2` are clamped.
    /// `None` keeps the unbounded `width / (2 cos θ)` offset.
    pub miter_limit: Option<f64>,

    // -- Arcs --
    /// Radius at which an arc gets one cubic per 45 degrees.
    /// Larger radii get proportionally more segments (never fewer than 4).
    pub arc_segment_radius: f64,
}

impl Default for TessConfig {
    fn default() -> Self {
        Self {
            curve_epsilon: 5e-5,
            close_epsilon: 1e-5,
            dedup_epsilon: 0.1,
            overlap_area_floor: 1.0,
            max_subdivision_level: 16,
            stroke_step_length: 4.0,
            miter_limit: Some(10.0),
            arc_segment_radius: 50.0,
        }
    }
}
