/// A position in surface-local logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// On-screen bounding box of the drawing surface, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A single pointer position as reported by the host, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawPointer {
    pub client_x: f64,
    pub client_y: f64,
    /// Touch force or pen pressure, when the device reports one.
    pub pressure: Option<f64>,
}

impl RawPointer {
    pub fn at(client_x: f64, client_y: f64) -> Self {
        RawPointer {
            client_x,
            client_y,
            pressure: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Mouse(RawPointer),
    /// All active touch points. Only the first one is read.
    Touch(Vec<RawPointer>),
}

/// What the host observed happening to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The pointer left the surface. Ends the stroke like `Up`.
    Leave,
}

/// A host input event together with the surface bounds at the time it fired.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub phase: PointerPhase,
    pub pointer: PointerEvent,
    pub rect: BoundingRect,
    /// Milliseconds on the host's monotonic event clock.
    pub timestamp_ms: u64,
}

/// An input event translated into local coordinates. Never stored as a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    pub point: Point,
    pub pressure: Option<f64>,
    pub timestamp_ms: u64,
}

/// Translate a pointer event into surface-local coordinates.
///
/// For touch events only the primary point is used, extra touches are ignored.
/// Returns `None` for a touch event that carries no touch points.
pub fn map_to_local(event: &PointerEvent, rect: &BoundingRect) -> Option<(Point, Option<f64>)> {
    let raw = match event {
        PointerEvent::Mouse(raw) => raw,
        PointerEvent::Touch(touches) => touches.first()?,
    };
    Some((
        Point::new(raw.client_x - rect.left, raw.client_y - rect.top),
        raw.pressure,
    ))
}
