/// Logical player input.
///
/// Two sources feed every level:
///   - the keyboard-equivalent snapshot (keyboard + gamepad, merged by the UI
///     layer once per tick) with its own edge detection
///   - the touch record, written by the on-screen buttons
///
/// `InputAggregator` merges both into one `Actions` value per tick.
/// Movement is held (OR of both sources); jump is an edge that fires at most
/// once per physical press, whichever source produced it.

/// Keyboard-equivalent state for one tick.
/// `*_pressed` fields are edges (released → pressed since the last tick).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    pub left: bool,
    pub right: bool,
    pub jump_held: bool,
    pub jump_pressed: bool,
    pub restart_pressed: bool,
    pub pause_pressed: bool,
}

/// Shared touch record. Written by the touch surface, read (and the one-shot
/// flag consumed) by the active level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchInputState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// One-shot: set on a fresh jump press, cleared when a level consumes it.
    pub jump_just_pressed: bool,
}

impl TouchInputState {
    /// Jump button went down. Only a released → pressed transition arms the
    /// one-shot flag.
    pub fn press_jump(&mut self) {
        if !self.jump {
            self.jump_just_pressed = true;
        }
        self.jump = true;
    }

    /// Jump button released or pointer left the button.
    pub fn release_jump(&mut self) {
        self.jump = false;
    }

    /// Read-then-clear of the one-shot flag as a single step.
    pub fn take_jump_press(&mut self) -> bool {
        std::mem::take(&mut self.jump_just_pressed)
    }

    /// Drop every held button (surface torn down, focus lost).
    pub fn release_all(&mut self) {
        *self = TouchInputState::default();
    }
}

/// Merged movement for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Actions {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Per-tick view over both input sources.
///
/// Built fresh each tick by the level; `gated` is the intro lock.
pub struct InputAggregator<'a> {
    keys: &'a KeySnapshot,
    touch: Option<&'a mut TouchInputState>,
    gated: bool,
}

impl<'a> InputAggregator<'a> {
    /// `touch == None` means no touch surface exists; treated as no touch input.
    pub fn new(keys: &'a KeySnapshot, touch: Option<&'a mut TouchInputState>) -> Self {
        InputAggregator { keys, touch, gated: false }
    }

    /// Hard input gate: while set, every query reports nothing pressed.
    pub fn gated(mut self, locked: bool) -> Self {
        self.gated = locked;
        self
    }

    /// Sample movement + jump edge. Consumes the touch one-shot jump.
    ///
    /// While gated, a pending touch press is discarded as well, so a tap made
    /// during the intro cannot turn into a jump once the gate lifts.
    pub fn sample(&mut self) -> Actions {
        let touch_jump = self.touch.as_deref_mut()
            .map(TouchInputState::take_jump_press)
            .unwrap_or(false);

        if self.gated {
            return Actions::default();
        }

        let touch = self.touch.as_deref().copied().unwrap_or_default();
        Actions {
            left: self.keys.left || touch.left,
            right: self.keys.right || touch.right,
            jump: self.keys.jump_pressed || touch_jump,
        }
    }

    /// Jump held on either source, independent of the edge flag.
    pub fn is_jump_held(&self) -> bool {
        if self.gated {
            return false;
        }
        let touch_held = self.touch.as_deref().map_or(false, |t| t.jump);
        self.keys.jump_held || touch_held
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
