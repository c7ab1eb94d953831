use crate::core::geo::{LonLat, Point};
use crate::prelude::{HashMap, VecDeque};
use serde::{Deserialize, Serialize};

/// Pointer input delivered by the host, in widget pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Move { position: Point },
    Up { position: Point, button: MouseButton },
    /// Wheel rotation; only the sign of `delta` matters
    Wheel { delta: f64, position: Point },
    DoubleClick { position: Point },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Wheel { position, .. }
            | PointerEvent::DoubleClick { position } => *position,
        }
    }
}

/// Mouse button types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Notifications for the host
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    CenterChanged { center: LonLat },
    ZoomChanged { zoom: u8 },
    /// The pointer moved over the map
    PointerMoved { position: LonLat },
    /// The host should call `paint` again
    RepaintRequested,
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::CenterChanged { .. } => EventKind::CenterChanged,
            MapEvent::ZoomChanged { .. } => EventKind::ZoomChanged,
            MapEvent::PointerMoved { .. } => EventKind::PointerMoved,
            MapEvent::RepaintRequested => EventKind::RepaintRequested,
        }
    }
}

/// Listener key for [`EventManager::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CenterChanged,
    ZoomChanged,
    PointerMoved,
    RepaintRequested,
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Callback registry for map notifications.
///
/// Events are queued by [`EventManager::emit`] and delivered, in emission
/// order, by [`EventManager::process_events`].
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<EventKind, Vec<EventCallback>>,
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: EventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        self.event_queue.push_back(event);
    }

    /// Delivers every queued event to its listeners and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(&event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}
