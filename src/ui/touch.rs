/// On-screen touch buttons, driven by the mouse.
///
/// Layout (bottom row of the terminal):
///   [ ◀ ] [ ▶ ]                                   [ JUMP ]
///
/// Pointer semantics:
///   Down on a button      →  press it
///   Up                    →  release whatever the pointer pressed
///   Drag off the button   →  release it (pointer left)
///
/// Only the jump button has edge semantics; see `TouchInputState::press_jump`.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::domain::input::TouchInputState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TouchButton {
    Left,
    Right,
    Jump,
}

pub const LEFT_LABEL: &str = "[ ◀ ]";
pub const RIGHT_LABEL: &str = "[ ▶ ]";
pub const JUMP_LABEL: &str = "[ JUMP ]";

/// Button column spans on the bottom row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchLayout {
    pub row: u16,
    pub left: (u16, u16),
    pub right: (u16, u16),
    pub jump: (u16, u16),
}

impl TouchLayout {
    pub fn new(term_w: u16, term_h: u16) -> Self {
        let w = |s: &str| s.chars().count() as u16;
        let left = (1, 1 + w(LEFT_LABEL));
        let right = (left.1 + 1, left.1 + 1 + w(RIGHT_LABEL));
        let jump_start = term_w.saturating_sub(w(JUMP_LABEL) + 1).max(right.1 + 1);
        TouchLayout {
            row: term_h.saturating_sub(1),
            left,
            right,
            jump: (jump_start, jump_start + w(JUMP_LABEL)),
        }
    }

    pub fn hit(&self, col: u16, row: u16) -> Option<TouchButton> {
        if row != self.row {
            return None;
        }
        let inside = |(a, b): (u16, u16)| col >= a && col < b;
        if inside(self.left) {
            Some(TouchButton::Left)
        } else if inside(self.right) {
            Some(TouchButton::Right)
        } else if inside(self.jump) {
            Some(TouchButton::Jump)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct TouchSurface {
    /// Button the pointer went down on, if still pressed.
    pressed: Option<TouchButton>,
}

impl TouchSurface {
    pub fn new() -> Self {
        TouchSurface::default()
    }

    pub fn pressed(&self) -> Option<TouchButton> {
        self.pressed
    }

    /// Apply one mouse event. Returns true if it landed on a button.
    pub fn handle(&mut self, ev: &MouseEvent, layout: &TouchLayout, touch: &mut TouchInputState) -> bool {
        match ev.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(button) = layout.hit(ev.column, ev.row) else {
                    return false;
                };
                if let Some(prev) = self.pressed.take() {
                    release(prev, touch);
                }
                press(button, touch);
                self.pressed = Some(button);
                true
            }
            MouseEventKind::Up(MouseButton::Left) => match self.pressed.take() {
                Some(button) => {
                    release(button, touch);
                    true
                }
                None => false,
            },
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(button) = self.pressed {
                    if layout.hit(ev.column, ev.row) != Some(button) {
                        release(button, touch);
                        self.pressed = None;
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Surface going away: nothing stays held.
    pub fn reset(&mut self, touch: &mut TouchInputState) {
        self.pressed = None;
        touch.release_all();
    }
}

fn press(button: TouchButton, touch: &mut TouchInputState) {
    match button {
        TouchButton::Left => touch.left = true,
        TouchButton::Right => touch.right = true,
        TouchButton::Jump => touch.press_jump(),
    }
}

fn release(button: TouchButton, touch: &mut TouchInputState) {
    match button {
        TouchButton::Left => touch.left = false,
        TouchButton::Right => touch.right = false,
        TouchButton::Jump => touch.release_jump(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    fn setup() -> (TouchLayout, TouchSurface, TouchInputState) {
        (TouchLayout::new(80, 24), TouchSurface::new(), TouchInputState::default())
    }

    #[test]
    fn layout_places_buttons_on_bottom_row() {
        let l = TouchLayout::new(80, 24);
        assert_eq!(l.row, 23);
        assert_eq!(l.hit(l.left.0, 23), Some(TouchButton::Left));
        assert_eq!(l.hit(l.right.0, 23), Some(TouchButton::Right));
        assert_eq!(l.hit(l.jump.1 - 1, 23), Some(TouchButton::Jump));
        assert_eq!(l.hit(40, 23), None);
        assert_eq!(l.hit(l.left.0, 22), None);
    }

    #[test]
    fn movement_button_is_held_until_release() {
        let (l, mut s, mut t) = setup();
        assert!(s.handle(&mouse(MouseEventKind::Down(MouseButton::Left), l.left.0, l.row), &l, &mut t));
        assert!(t.left);
        s.handle(&mouse(MouseEventKind::Up(MouseButton::Left), 0, 0), &l, &mut t);
        assert!(!t.left);
    }

    #[test]
    fn jump_press_arms_one_shot_once() {
        let (l, mut s, mut t) = setup();
        s.handle(&mouse(MouseEventKind::Down(MouseButton::Left), l.jump.0, l.row), &l, &mut t);
        assert!(t.jump && t.jump_just_pressed);
        assert!(t.take_jump_press());
        s.handle(&mouse(MouseEventKind::Up(MouseButton::Left), l.jump.0, l.row), &l, &mut t);
        assert!(!t.jump);
        assert!(!t.jump_just_pressed);
    }

    #[test]
    fn dragging_off_a_button_releases_it() {
        let (l, mut s, mut t) = setup();
        s.handle(&mouse(MouseEventKind::Down(MouseButton::Left), l.right.0, l.row), &l, &mut t);
        s.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), l.right.0 + 1, l.row), &l, &mut t);
        assert!(t.right);
        s.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 40, 10), &l, &mut t);
        assert!(!t.right);
        assert_eq!(s.pressed(), None);
    }

    #[test]
    fn clicks_elsewhere_are_ignored() {
        let (l, mut s, mut t) = setup();
        assert!(!s.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 40, 5), &l, &mut t));
        assert_eq!(t, TouchInputState::default());
    }
}
