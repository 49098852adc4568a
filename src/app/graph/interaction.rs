use eframe::egui::{self, Rect, Ui, Vec2};

use super::super::ViewModel;

impl ViewModel {
    /// Feeds raw pointer input to the session in canvas-local coordinates.
    pub(in crate::app) fn route_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let (pressed, released, moved, pointer, time, scroll) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.delta() != Vec2::ZERO,
                input.pointer.latest_pos(),
                input.time,
                input.raw_scroll_delta.y,
            )
        });
        let local = pointer.map(|position| position - rect.min.to_vec2());

        if response.hovered()
            && scroll.abs() > f32::EPSILON
            && let Some(local) = local
        {
            // egui reports scrolling up as positive; the wheel contract is the other way round.
            session.wheel(-scroll, local);
        }

        if pressed
            && response.hovered()
            && let Some(local) = local
        {
            let target = session.node_at(local).map(str::to_owned);
            session.pointer_down(local, target.as_deref(), time);
            self.pointer_captured = true;
        } else if self.pointer_captured
            && moved
            && let Some(local) = local
        {
            session.pointer_move(local);
        }

        if released && self.pointer_captured {
            session.pointer_up(time);
            self.pointer_captured = false;
        }

        let hovered = if response.hovered() && !self.pointer_captured {
            local
                .and_then(|local| session.node_at(local))
                .map(str::to_owned)
        } else {
            None
        };
        session.hover(hovered.as_deref());

        if self.pointer_captured {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
        } else if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
    }
}
