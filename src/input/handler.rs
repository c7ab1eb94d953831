use crate::core::geo::Point;
use crate::input::events::{MouseButton, PointerEvent};

/// What the map should do in response to an input event
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Make sure the render buffer is current before a drag starts
    EnsureRendered,
    /// Repaint from the existing buffer; nothing is fetched
    Repaint,
    /// A drag ended: move the center by this screen-space offset
    CommitPan { dx: f64, dy: f64 },
    /// Change zoom by exactly this many levels
    ZoomBy(i32),
    /// Center on the given widget pixel and zoom in one level
    CenterAndZoomIn { position: Point },
    /// The pointer is over this widget pixel
    PointerMoved { position: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        last: Point,
        /// Accumulated offset, opposite to the pointer motion
        offset: Point,
    },
}

/// Pointer state machine.
///
/// A left-button press starts a drag; moves only accumulate an offset and
/// request repaints; the release commits the whole offset at once. Wheel
/// and double-click zoom independently of the drag, except that a
/// double-click during a drag is ignored.
pub struct InteractionHandler {
    state: DragState,
}

impl Default for InteractionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionHandler {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Current drag offset, if a drag is in progress
    pub fn drag_offset(&self) -> Option<Point> {
        match self.state {
            DragState::Dragging { offset, .. } => Some(offset),
            DragState::Idle => None,
        }
    }

    /// Abandons a drag without committing it
    pub fn cancel_drag(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    pub fn handle_event(&mut self, event: PointerEvent) -> Vec<Action> {
        let mut actions = vec![];

        match event {
            PointerEvent::Down {
                position,
                button: MouseButton::Left,
            } => {
                if !self.is_dragging() {
                    self.state = DragState::Dragging {
                        last: position,
                        offset: Point::default(),
                    };
                    actions.push(Action::EnsureRendered);
                }
            }
            PointerEvent::Move { position } => {
                if let DragState::Dragging { last, offset } = self.state {
                    self.state = DragState::Dragging {
                        last: position,
                        offset: offset.subtract(&position.subtract(&last)),
                    };
                    actions.push(Action::Repaint);
                }
                actions.push(Action::PointerMoved { position });
            }
            PointerEvent::Up {
                button: MouseButton::Left,
                ..
            } => {
                if let DragState::Dragging { offset, .. } = self.state {
                    self.state = DragState::Idle;
                    actions.push(Action::CommitPan {
                        dx: offset.x,
                        dy: offset.y,
                    });
                    actions.push(Action::Repaint);
                }
            }
            PointerEvent::Down { .. } | PointerEvent::Up { .. } => {}
            PointerEvent::Wheel { delta, .. } => {
                if delta != 0.0 {
                    actions.push(Action::ZoomBy(if delta > 0.0 { 1 } else { -1 }));
                }
            }
            PointerEvent::DoubleClick { position } => {
                if !self.is_dragging() {
                    actions.push(Action::CenterAndZoomIn { position });
                }
            }
        }

        actions
    }
}
