/// HUD surface state.
///
/// Rebuilt purely from bridge events; the core never reads it back.
/// The only way back into the core is the player clicking PLAY AGAIN, which
/// the main loop turns into a session command.

use std::cell::RefCell;
use std::rc::Rc;

use crate::domain::catalog::DEFAULT_OBJECTIVE;
use crate::sim::bridge::{HudBridge, SubscriptionId};
use crate::sim::event::HudEvent;

#[derive(Clone, Debug, PartialEq)]
pub struct HudDisplay {
    elapsed_ms: u64,
    paused: bool,
    pub floors: u32,
    pub level_number: u32,
    pub total_levels: u32,
    pub objective: String,
    pub play_again: bool,
}

impl Default for HudDisplay {
    fn default() -> Self {
        HudDisplay {
            elapsed_ms: 0,
            paused: false,
            floors: 0,
            level_number: 1,
            total_levels: 1,
            objective: DEFAULT_OBJECTIVE.to_string(),
            play_again: false,
        }
    }
}

impl HudDisplay {
    /// Subscribe a fresh display to the bridge.
    pub fn attach(bridge: &mut HudBridge) -> (Rc<RefCell<HudDisplay>>, SubscriptionId) {
        let hud = Rc::new(RefCell::new(HudDisplay::default()));
        let sink = Rc::clone(&hud);
        let id = bridge.subscribe(move |ev| sink.borrow_mut().apply(ev));
        (hud, id)
    }

    pub fn apply(&mut self, event: &HudEvent) {
        match event {
            HudEvent::LevelChanged { level_number, objective, total_levels } => {
                self.level_number = *level_number;
                self.total_levels = *total_levels;
                self.objective = if objective.is_empty() {
                    DEFAULT_OBJECTIVE.to_string()
                } else {
                    objective.clone()
                };
                self.play_again = false;
                self.elapsed_ms = 0;
            }
            HudEvent::ProgressChanged { progress } => self.floors = *progress,
            HudEvent::TimerReset => {
                self.elapsed_ms = 0;
                self.floors = 0;
                self.paused = false;
            }
            HudEvent::TimerPause => self.paused = true,
            HudEvent::TimerResume => self.paused = false,
            HudEvent::RunEnded => self.play_again = true,
        }
    }

    /// Advance the on-screen clock.
    pub fn tick(&mut self, dt_ms: u32) {
        if !self.paused && !self.play_again {
            self.elapsed_ms += dt_ms as u64;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn timer_text(&self) -> String {
        format!("{:.1}s", self.elapsed_ms as f64 / 1000.0)
    }

    pub fn status_line(&self) -> String {
        let mut line = format!(
            " ⏱ {:>7}  Floors {:<3}  Level {}/{}  Objective: {}",
            self.timer_text(),
            self.floors,
            self.level_number,
            self.total_levels,
            self.objective,
        );
        if self.paused {
            line.push_str("  ⏸ PAUSED");
        }
        line
    }
}

/// Screen cells of the PLAY AGAIN button: (x, y, width).
pub fn play_again_button(term_w: usize, term_h: usize) -> (usize, usize, usize) {
    const LABEL_W: usize = 18;
    (term_w.saturating_sub(LABEL_W) / 2, term_h / 2, LABEL_W)
}

pub fn hits_play_again(col: u16, row: u16, term_w: usize, term_h: usize) -> bool {
    let (x, y, w) = play_again_button(term_w, term_h);
    let (col, row) = (col as usize, row as usize);
    row == y && col >= x && col < x + w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_change_refreshes_labels_and_resets_clock() {
        let mut bridge = HudBridge::new();
        let (hud, _) = HudDisplay::attach(&mut bridge);
        hud.borrow_mut().tick(1500);
        bridge.publish(HudEvent::LevelChanged {
            level_number: 3,
            objective: "Climb 12 floors.".into(),
            total_levels: 5,
        });
        let h = hud.borrow();
        assert_eq!(h.timer_text(), "0.0s");
        assert!(h.status_line().contains("Level 3/5"));
        assert!(h.status_line().contains("Objective: Climb 12 floors."));
    }

    #[test]
    fn clock_stops_while_paused() {
        let mut hud = HudDisplay::default();
        hud.tick(1234);
        hud.apply(&HudEvent::TimerPause);
        hud.tick(5000);
        assert_eq!(hud.timer_text(), "1.2s");
        assert!(hud.status_line().ends_with("PAUSED"));
        hud.apply(&HudEvent::TimerResume);
        hud.tick(100);
        assert_eq!(hud.timer_text(), "1.3s");
    }

    #[test]
    fn timer_reset_clears_a_stale_pause() {
        let mut hud = HudDisplay::default();
        hud.apply(&HudEvent::TimerPause);
        hud.apply(&HudEvent::TimerReset);
        assert!(!hud.is_paused());
        hud.tick(500);
        assert_eq!(hud.timer_text(), "0.5s");
        assert!(!hud.status_line().contains("PAUSED"));
    }

    #[test]
    fn run_end_shows_play_again_until_next_level() {
        let mut hud = HudDisplay::default();
        hud.apply(&HudEvent::ProgressChanged { progress: 7 });
        assert_eq!(hud.floors, 7);
        hud.apply(&HudEvent::RunEnded);
        assert!(hud.play_again);
        hud.apply(&HudEvent::LevelChanged { level_number: 1, objective: String::new(), total_levels: 5 });
        assert!(!hud.play_again);
        assert_eq!(hud.objective, DEFAULT_OBJECTIVE);
    }

    #[test]
    fn play_again_hit_box() {
        let (x, y, w) = play_again_button(80, 24);
        assert!(hits_play_again(x as u16, y as u16, 80, 24));
        assert!(hits_play_again((x + w - 1) as u16, y as u16, 80, 24));
        assert!(!hits_play_again((x + w) as u16, y as u16, 80, 24));
        assert!(!hits_play_again(x as u16, (y + 1) as u16, 80, 24));
    }
}
