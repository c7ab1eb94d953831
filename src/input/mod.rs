pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{EventCallback, EventKind, EventManager, MapEvent, MouseButton, PointerEvent};
pub use handler::{Action, DragState, InteractionHandler};
