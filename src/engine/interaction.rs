use eframe::egui::{Pos2, Vec2};

use crate::config::InteractionConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<String>,
    pub hovered: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Press {
    pub last: Pos2,
    pub travelled: f32,
    pub started_at: f64,
}

impl Press {
    fn new(screen: Pos2, time: f64) -> Self {
        Self {
            last: screen,
            travelled: 0.0,
            started_at: time,
        }
    }

    fn advanced(self, screen: Pos2) -> Self {
        Self {
            last: screen,
            travelled: self.travelled + (screen - self.last).length(),
            ..self
        }
    }

    fn is_click(&self, released_at: f64, config: &InteractionConfig) -> bool {
        self.travelled < config.click_max_distance
            && (released_at - self.started_at) < config.click_max_secs
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    DraggingNode {
        index: usize,
        press: Press,
    },
    Panning {
        press: Press,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down {
        screen: Pos2,
        target: Option<usize>,
        time: f64,
    },
    Move {
        screen: Pos2,
    },
    Up {
        time: f64,
    },
}

/// What a transition asks the session to do. Pins are retained until `Unpin`; nothing here
/// touches hover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    PinInPlace(usize),
    Reheat,
    MovePin { index: usize, screen: Pos2 },
    Unpin(usize),
    ReleaseHeat,
    Pan(Vec2),
    Click(Option<usize>),
}

pub fn transition(
    gesture: Gesture,
    event: PointerEvent,
    config: &InteractionConfig,
) -> (Gesture, Vec<Effect>) {
    match (gesture, event) {
        (
            Gesture::Idle,
            PointerEvent::Down {
                screen,
                target: Some(index),
                time,
            },
        ) => (
            Gesture::DraggingNode {
                index,
                press: Press::new(screen, time),
            },
            vec![Effect::PinInPlace(index), Effect::Reheat],
        ),
        (
            Gesture::Idle,
            PointerEvent::Down {
                screen,
                target: None,
                time,
            },
        ) => (
            Gesture::Panning {
                press: Press::new(screen, time),
            },
            Vec::new(),
        ),
        (Gesture::DraggingNode { index, press }, PointerEvent::Move { screen }) => (
            Gesture::DraggingNode {
                index,
                press: press.advanced(screen),
            },
            vec![Effect::MovePin { index, screen }],
        ),
        (Gesture::Panning { press }, PointerEvent::Move { screen }) => (
            Gesture::Panning {
                press: press.advanced(screen),
            },
            vec![Effect::Pan(screen - press.last)],
        ),
        (Gesture::DraggingNode { index, press }, PointerEvent::Up { time }) => {
            let mut effects = vec![Effect::Unpin(index), Effect::ReleaseHeat];
            if press.is_click(time, config) {
                effects.push(Effect::Click(Some(index)));
            }
            (Gesture::Idle, effects)
        }
        (Gesture::Panning { press }, PointerEvent::Up { time }) => {
            let effects = if press.is_click(time, config) {
                vec![Effect::Click(None)]
            } else {
                Vec::new()
            };
            (Gesture::Idle, effects)
        }
        (gesture, _) => (gesture, Vec::new()),
    }
}

pub struct InteractionController {
    config: InteractionConfig,
    gesture: Gesture,
    selection: SelectionState,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
            selection: SelectionState::default(),
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.gesture, Gesture::DraggingNode { .. })
    }

    pub fn dragged_index(&self) -> Option<usize> {
        match self.gesture {
            Gesture::DraggingNode { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: PointerEvent) -> Vec<Effect> {
        let (next, effects) = transition(self.gesture, event, &self.config);
        self.gesture = next;
        effects
    }

    /// Returns true when the selection actually changed.
    pub fn click(&mut self, target: Option<String>) -> bool {
        let changed = self.selection.selected != target;
        self.selection.selected = target;
        changed
    }

    pub fn hover(&mut self, target: Option<String>) {
        self.selection.hovered = target;
    }

    /// Abandons any gesture in flight, returning the node that was still pinned by it.
    pub fn cancel(&mut self) -> Option<usize> {
        let dragged = self.dragged_index();
        self.gesture = Gesture::Idle;
        self.selection.hovered = None;
        dragged
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn config() -> InteractionConfig {
        InteractionConfig::default()
    }

    #[test]
    fn pressing_a_node_pins_and_reheats() {
        let (gesture, effects) = transition(
            Gesture::Idle,
            PointerEvent::Down {
                screen: pos2(10.0, 10.0),
                target: Some(3),
                time: 0.0,
            },
            &config(),
        );
        assert!(matches!(gesture, Gesture::DraggingNode { index: 3, .. }));
        assert_eq!(effects, vec![Effect::PinInPlace(3), Effect::Reheat]);
    }

    #[test]
    fn long_drag_release_is_not_a_click() {
        let mut controller = InteractionController::new(config());
        controller.handle(PointerEvent::Down {
            screen: pos2(0.0, 0.0),
            target: Some(1),
            time: 0.0,
        });
        let moved = controller.handle(PointerEvent::Move {
            screen: pos2(40.0, 0.0),
        });
        assert_eq!(
            moved,
            vec![Effect::MovePin {
                index: 1,
                screen: pos2(40.0, 0.0)
            }]
        );

        let released = controller.handle(PointerEvent::Up { time: 0.1 });
        assert_eq!(released, vec![Effect::Unpin(1), Effect::ReleaseHeat]);
        assert_eq!(controller.gesture(), Gesture::Idle);
    }

    #[test]
    fn quick_small_press_is_a_click() {
        let mut controller = InteractionController::new(config());
        controller.handle(PointerEvent::Down {
            screen: pos2(5.0, 5.0),
            target: Some(2),
            time: 1.0,
        });
        controller.handle(PointerEvent::Move {
            screen: pos2(7.0, 5.0),
        });
        let released = controller.handle(PointerEvent::Up { time: 1.1 });
        assert_eq!(
            released,
            vec![
                Effect::Unpin(2),
                Effect::ReleaseHeat,
                Effect::Click(Some(2))
            ]
        );
    }

    #[test]
    fn slow_press_is_not_a_click() {
        let mut controller = InteractionController::new(config());
        controller.handle(PointerEvent::Down {
            screen: pos2(5.0, 5.0),
            target: None,
            time: 1.0,
        });
        assert!(controller.handle(PointerEvent::Up { time: 1.6 }).is_empty());
    }

    #[test]
    fn background_drag_pans_by_incremental_deltas() {
        let mut controller = InteractionController::new(config());
        controller.handle(PointerEvent::Down {
            screen: pos2(100.0, 100.0),
            target: None,
            time: 0.0,
        });
        let first = controller.handle(PointerEvent::Move {
            screen: pos2(110.0, 95.0),
        });
        let second = controller.handle(PointerEvent::Move {
            screen: pos2(130.0, 95.0),
        });
        assert_eq!(first, vec![Effect::Pan(vec2(10.0, -5.0))]);
        assert_eq!(second, vec![Effect::Pan(vec2(20.0, 0.0))]);
        assert!(controller.handle(PointerEvent::Up { time: 0.05 }).is_empty());
    }

    #[test]
    fn quick_background_press_clears_selection() {
        let mut controller = InteractionController::new(config());
        controller.handle(PointerEvent::Down {
            screen: pos2(1.0, 1.0),
            target: None,
            time: 0.0,
        });
        assert_eq!(
            controller.handle(PointerEvent::Up { time: 0.05 }),
            vec![Effect::Click(None)]
        );
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut controller = InteractionController::new(config());
        assert!(controller
            .handle(PointerEvent::Move {
                screen: pos2(3.0, 3.0)
            })
            .is_empty());
        assert!(controller.handle(PointerEvent::Up { time: 0.0 }).is_empty());

        controller.handle(PointerEvent::Down {
            screen: pos2(0.0, 0.0),
            target: Some(0),
            time: 0.0,
        });
        assert!(controller
            .handle(PointerEvent::Down {
                screen: pos2(0.0, 0.0),
                target: Some(4),
                time: 0.0,
            })
            .is_empty());
        assert_eq!(controller.dragged_index(), Some(0));
    }

    #[test]
    fn selection_and_hover_are_independent() {
        let mut controller = InteractionController::new(config());
        assert!(controller.click(Some("b".to_owned())));
        assert!(!controller.click(Some("b".to_owned())));
        controller.hover(Some("c".to_owned()));
        assert_eq!(controller.selection().selected.as_deref(), Some("b"));
        assert_eq!(controller.selection().hovered.as_deref(), Some("c"));

        assert!(controller.click(None));
        controller.hover(None);
        assert_eq!(controller.selection(), &SelectionState::default());
    }
}
