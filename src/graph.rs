use crate::series::RateSeries;

/// Target drawing area, in pixels. The origin is the top-left corner;
/// y grows downward as in most raster surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Send: plotted growing up from the bottom edge.
    Up,
    /// Receive: plotted growing down from the top edge.
    Down,
}

/// Vertical scaling policy. `Split` compresses each direction's dynamic
/// range with a square root so a spike on one side does not flatten the
/// other; `Linear` maps both against one shared ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePolicy {
    Linear,
    Split,
}

impl ScalePolicy {
    pub fn toggled(self) -> Self {
        match self {
            ScalePolicy::Linear => ScalePolicy::Split,
            ScalePolicy::Split => ScalePolicy::Linear,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScalePolicy::Linear => "linear",
            ScalePolicy::Split => "split",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

/// Per-direction vertical ceilings, in bytes/second, that values are
/// linearly mapped against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalScale {
    pub up_max: f64,
    pub down_max: f64,
}

/// The floor on the square-rooted maxima keeps a near-idle direction from
/// amplifying noise into a full-height plot.
const SPLIT_SQRT_FLOOR: f64 = 32.0;

pub fn vertical_scale(policy: ScalePolicy, max_up: u64, max_down: u64) -> VerticalScale {
    match policy {
        ScalePolicy::Linear => {
            let shared = max_up.max(max_down) as f64;
            VerticalScale { up_max: shared, down_max: shared }
        }
        ScalePolicy::Split => {
            let sq_up = (max_up as f64).sqrt().max(SPLIT_SQRT_FLOOR);
            let sq_down = (max_down as f64).sqrt().max(SPLIT_SQRT_FLOOR);
            let combined = sq_up + sq_down;
            VerticalScale {
                up_max: combined * max_up as f64 / sq_up,
                down_max: combined * max_down as f64 / sq_down,
            }
        }
    }
}

/// Projects a series into a closed polygon inside `rect`.
///
/// The rightmost column is the newest point; older points are placed by
/// elapsed seconds at `rect.width / elapsed` pixels per second (1:1 when the
/// window is degenerate or shorter than the width), walking newest to oldest
/// and stopping at the first point left of the rectangle. Two baseline
/// vertices close the fill area. Empty input or a non-positive scale yields
/// an empty list.
pub fn project(series: &RateSeries, scale_max: f64, rect: PixelRect, dir: Direction) -> Vec<Vertex> {
    let newest = match series.newest() {
        Some(point) => *point,
        None => return Vec::new(),
    };
    if scale_max <= 0.0 || rect.width <= 0.0 || rect.height <= 0.0 {
        return Vec::new();
    }

    let elapsed = series.span_seconds();
    let pixels_per_second = if elapsed > 0.0 && elapsed < rect.width {
        rect.width / elapsed
    } else {
        1.0
    };

    let baseline = match dir {
        Direction::Up => rect.height,
        Direction::Down => 0.0,
    };

    let mut vertices = Vec::with_capacity(series.len() + 2);
    let mut oldest_x = rect.width;
    for point in series.iter().rev() {
        let td = newest.stamp.saturating_duration_since(point.stamp).as_secs_f64();
        let x = rect.width - td * pixels_per_second;
        if x < 0.0 {
            break;
        }
        let scaled = point.bytes_per_sec as f64 * rect.height / scale_max;
        let y = match dir {
            Direction::Up => rect.height - scaled,
            Direction::Down => scaled,
        };
        vertices.push(Vertex { x, y });
        oldest_x = x;
    }

    vertices.push(Vertex { x: oldest_x, y: baseline });
    vertices.push(Vertex { x: rect.width, y: baseline });
    vertices
}
