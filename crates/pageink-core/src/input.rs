//! Pointer input events and device routing.

use crate::annotation::PageId;
use crate::tools::ToolSession;
use kurbo::Point;
use std::time::Instant;

/// Class of the device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Stylus,
    Mouse,
    Touch,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The platform aborted the pointer; treated like `Up`.
    Cancel,
}

/// A pointer event in page-local raster coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub device: DeviceClass,
    pub phase: PointerPhase,
    /// Page under the pointer.
    pub page: PageId,
    pub position: Point,
    pub pressure: f64,
    pub timestamp: Instant,
}

impl PointerEvent {
    pub fn new(device: DeviceClass, phase: PointerPhase, page: impl Into<PageId>, position: Point) -> Self {
        Self {
            device,
            phase,
            page: page.into(),
            position,
            pressure: 1.0,
            timestamp: Instant::now(),
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Where a pointer event goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Consumed by the annotation engine; the host must not scroll or zoom.
    Intercept,
    /// Left to the host view for native pan/zoom.
    FallThrough,
}

/// Decide whether an event from `device` is handled by the annotation engine.
///
/// Touch always falls through so the host keeps native panning; stylus and
/// mouse are intercepted only while a tool is selected.
pub fn route(device: DeviceClass, session: &ToolSession) -> Routing {
    match device {
        DeviceClass::Touch => Routing::FallThrough,
        DeviceClass::Stylus | DeviceClass::Mouse if session.tool().is_some() => Routing::Intercept,
        DeviceClass::Stylus | DeviceClass::Mouse => Routing::FallThrough,
    }
}
