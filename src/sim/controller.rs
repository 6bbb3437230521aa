/// Level controller: the lifecycle state machine every level runs through.
///
///   Init ──create──▶ IntroLock ──intro done──▶ Playing ◀──pause──▶ Paused
///                          (skipped when the config disables it)
///   Playing ──win/fail (first only)──▶ Resolving ──settle delay──▶ request
///
/// A concrete level is this controller plus a `LevelKit`; nothing here knows
/// about particular geometry.
///
/// Per-tick order inside `update`:
///   1. Scheduler (intro freeze/complete, resolve delay)
///   2. Restart command (returns immediately)
///   3. Pause toggle
///   4. Input sampling (gated while the intro lock is held)
///   5. Movement + physics + camera
///   6. Win/fail evaluation
///   7. HUD publication (progress)
///
/// The controller never calls the sequencer. A finished resolve (or the
/// restart command) comes back as a `LevelRequest` for the owner to act on.

use std::rc::Rc;

use crate::config::TimingConfig;
use crate::domain::catalog::LevelConfig;
use crate::domain::input::{InputAggregator, KeySnapshot};
use crate::domain::levels::{ClimbTracker, LevelKit};
use crate::domain::physics::Stage;
use crate::sim::bridge::HudBridge;
use crate::sim::context::Context;
use crate::sim::event::{Cue, HudEvent};
use crate::sim::scheduler::{Scheduler, TimerHandle};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Init,
    IntroLock,
    Playing,
    Paused,
    Resolving,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Win,
    Fail,
}

/// What the owner should do with this level next.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelRequest {
    /// Level won and settled: move on.
    Advance,
    /// Level failed and settled, or the player asked for a restart.
    Restart,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LevelTimer {
    IntroFreeze,
    IntroComplete,
    Resolve(Outcome),
}

// ── Overlays ──

/// Title card shown during the intro lock.
#[derive(Clone, Debug)]
pub struct IntroCard {
    pub title: String,
    shown_at: u64,
    in_ms: u32,
    hold_ms: u32,
    out_ms: u32,
}

impl IntroCard {
    /// (alpha, scale) at scheduler time `now`.
    /// In: alpha 0→1, scale 2→1 with overshoot. Hold. Out: alpha 1→0, scale 1→0.55.
    pub fn appearance(&self, now: u64) -> (f32, f32) {
        let t = now.saturating_sub(self.shown_at) as f32;
        let (fin, hold, fout) = (self.in_ms as f32, self.hold_ms as f32, self.out_ms as f32);
        if t < fin {
            let p = t / fin;
            (p, 2.0 - ease_back_out(p))
        } else if t < fin + hold {
            (1.0, 1.0)
        } else if t < fin + hold + fout {
            let p = (t - fin - hold) / fout;
            let q = p * p;
            (1.0 - q, 1.0 - 0.45 * q)
        } else {
            (0.0, 0.55)
        }
    }
}

fn ease_back_out(p: f32) -> f32 {
    const C1: f32 = 1.70158;
    const C3: f32 = C1 + 1.0;
    let x = p - 1.0;
    1.0 + C3 * x * x * x + C1 * x * x
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flash {
    pub outcome: Outcome,
    remaining_ms: u32,
    total_ms: u32,
}

impl Flash {
    /// 1.0 at the start, fading to 0.0.
    pub fn strength(&self) -> f32 {
        self.remaining_ms as f32 / self.total_ms.max(1) as f32
    }
}

#[derive(Debug)]
struct PauseOverlay {
    visible: bool,
}

// ── Controller ──

#[derive(Debug)]
pub struct LevelController {
    config: Rc<LevelConfig>,
    kit: LevelKit,
    stage: Stage,
    tracker: ClimbTracker,
    timing: TimingConfig,
    timers: Scheduler<LevelTimer>,

    phase: Phase,
    intro_locked: bool,
    outcome_guard: bool,
    paused: bool,
    outcome: Option<Outcome>,

    elapsed_ms: u64,
    floors: u32,
    published_floors: Option<u32>,

    intro_freeze: Option<TimerHandle>,
    intro: Option<IntroCard>,
    pause_overlay: Option<PauseOverlay>,
    flash: Option<Flash>,
    cues: Vec<Cue>,
}

impl LevelController {
    pub fn new(config: Rc<LevelConfig>, kit: LevelKit, timing: TimingConfig) -> Self {
        let stage = kit.build_stage(&config);
        let tracker = ClimbTracker::new(stage.player.y);
        LevelController {
            config,
            kit,
            stage,
            tracker,
            timing,
            timers: Scheduler::new(),
            phase: Phase::Init,
            intro_locked: false,
            outcome_guard: false,
            paused: false,
            outcome: None,
            elapsed_ms: 0,
            floors: 0,
            published_floors: None,
            intro_freeze: None,
            intro: None,
            pause_overlay: None,
            flash: None,
            cues: Vec::new(),
        }
    }

    /// Init → IntroLock (or straight to Playing when the intro is disabled).
    pub fn create(&mut self, bridge: &mut HudBridge) {
        if self.phase != Phase::Init {
            return;
        }
        self.pause_overlay = Some(PauseOverlay { visible: false });
        bridge.publish(HudEvent::TimerReset);

        if self.config.disable_intro {
            self.phase = Phase::Playing;
        } else {
            self.start_intro();
        }
        log::info!(
            "level {} created ({}, intro {})",
            self.config.level_number,
            self.kit.kind.name(),
            if self.intro_locked { "on" } else { "off" },
        );
    }

    fn start_intro(&mut self) {
        // Never stack two cards.
        self.intro = None;
        if let Some(h) = self.intro_freeze.take() {
            self.timers.cancel(h);
        }

        self.intro_locked = true;
        self.phase = Phase::IntroLock;
        self.intro_freeze = Some(self.timers.every(self.timing.intro_freeze_interval_ms, LevelTimer::IntroFreeze));
        self.timers.once(self.timing.intro_total_ms(), LevelTimer::IntroComplete);
        self.intro = Some(IntroCard {
            title: self.config.title(),
            shown_at: self.timers.now(),
            in_ms: self.timing.intro_in_ms,
            hold_ms: self.timing.intro_hold_ms,
            out_ms: self.timing.intro_out_ms,
        });
        self.cues.push(Cue::IntroShown);
    }

    fn finish_intro(&mut self) {
        self.intro_locked = false;
        if let Some(h) = self.intro_freeze.take() {
            self.timers.cancel(h);
        }
        self.intro = None;
        if self.phase == Phase::IntroLock {
            self.phase = Phase::Playing;
        }
    }

    /// Run one tick. See the module docs for the ordering.
    pub fn update(&mut self, dt_ms: u32, keys: &KeySnapshot, ctx: &mut Context) -> Option<LevelRequest> {
        if self.phase == Phase::Init {
            return None;
        }

        // 1. Timers
        self.timers.advance(dt_ms);
        while let Some(timer) = self.timers.poll() {
            match timer {
                LevelTimer::IntroFreeze => {
                    if self.intro_locked {
                        self.stage.player.halt_horizontal();
                    }
                }
                LevelTimer::IntroComplete => self.finish_intro(),
                LevelTimer::Resolve(Outcome::Win) => return Some(LevelRequest::Advance),
                LevelTimer::Resolve(Outcome::Fail) => return Some(LevelRequest::Restart),
            }
        }
        if let Some(flash) = self.flash.as_mut() {
            flash.remaining_ms = flash.remaining_ms.saturating_sub(dt_ms);
            if flash.remaining_ms == 0 {
                self.flash = None;
            }
        }

        // 2. Restart bypasses everything else. A pause is undone first.
        if keys.restart_pressed {
            if self.phase == Phase::Paused {
                self.toggle_pause(&mut ctx.bridge);
            }
            log::info!("level {} restart requested", self.config.level_number);
            return Some(LevelRequest::Restart);
        }

        // 3. Pause
        if keys.pause_pressed {
            self.toggle_pause(&mut ctx.bridge);
        }
        if self.phase == Phase::Paused {
            return None;
        }
        if matches!(self.phase, Phase::IntroLock | Phase::Playing) {
            self.elapsed_ms += dt_ms as u64;
        }

        // 4. Input
        let mut input = InputAggregator::new(keys, ctx.touch.as_mut()).gated(self.intro_locked);
        let actions = input.sample();
        let jump_held = input.is_jump_held();

        // 5. Movement + physics
        let grounded = self.stage.player.blocked_down;
        self.kit.movement.apply(&mut self.stage.player, actions);
        if actions.jump && grounded {
            self.cues.push(Cue::Jumped);
        }
        if let Some(landing) = self.stage.step(dt_ms) {
            let boost = self.kit.landing_boost.and_then(|b| b.boost(landing.impact_vy, jump_held));
            if let Some(vy) = boost {
                self.stage.player.vy = -vy;
                self.stage.player.blocked_down = false;
                self.cues.push(Cue::Boosted);
            }
        }
        self.tracker.observe(self.stage.player.y);
        self.kit.update_camera(&mut self.stage, &self.tracker);

        // 6. Win / fail
        self.floors = self.kit.floors(&self.stage, &self.tracker);
        if self.phase == Phase::Playing {
            if self.kit.is_won(&self.stage, self.floors) {
                self.win();
            } else if self.kit.is_failed(&self.stage) {
                self.fail();
            }
        }

        // 7. HUD
        if self.published_floors != Some(self.floors) {
            self.published_floors = Some(self.floors);
            ctx.bridge.publish(HudEvent::ProgressChanged { progress: self.floors });
        }

        None
    }

    /// Flip Playing ⇄ Paused. Ignored in any other phase.
    pub fn toggle_pause(&mut self, bridge: &mut HudBridge) -> bool {
        match self.phase {
            Phase::Playing => {
                self.phase = Phase::Paused;
                self.paused = true;
                self.stage.frozen = true;
                self.set_pause_overlay(true);
                bridge.publish(HudEvent::TimerPause);
                log::info!("level {} paused", self.config.level_number);
            }
            Phase::Paused => {
                self.phase = Phase::Playing;
                self.paused = false;
                self.stage.frozen = false;
                self.set_pause_overlay(false);
                bridge.publish(HudEvent::TimerResume);
                log::info!("level {} resumed", self.config.level_number);
            }
            _ => return false,
        }
        true
    }

    fn set_pause_overlay(&mut self, visible: bool) {
        if let Some(overlay) = self.pause_overlay.as_mut() {
            overlay.visible = visible;
        }
    }

    /// Decide the level won. Only the first decision counts.
    pub fn win(&mut self) -> bool {
        self.resolve(Outcome::Win)
    }

    /// Decide the level failed. Only the first decision counts.
    pub fn fail(&mut self) -> bool {
        self.resolve(Outcome::Fail)
    }

    fn resolve(&mut self, outcome: Outcome) -> bool {
        if self.outcome_guard || self.phase != Phase::Playing {
            return false;
        }
        self.outcome_guard = true;
        self.outcome = Some(outcome);
        self.phase = Phase::Resolving;

        let (cue, settle) = match outcome {
            Outcome::Win => (Cue::Success, self.timing.win_settle_ms),
            Outcome::Fail => (Cue::Failure, self.timing.fail_settle_ms),
        };
        self.cues.push(cue);
        self.flash = Some(Flash {
            outcome,
            remaining_ms: self.timing.flash_ms,
            total_ms: self.timing.flash_ms,
        });
        self.timers.once(settle, LevelTimer::Resolve(outcome));
        log::info!("level {} resolved: {:?}", self.config.level_number, outcome);
        true
    }

    /// Cancel every pending timer and destroy overlays. Safe to call twice.
    pub fn teardown(&mut self) {
        self.timers.cancel_all();
        self.intro_freeze = None;
        if self.intro.take().is_some() {
            log::debug!("level {} intro card destroyed", self.config.level_number);
        }
        if self.pause_overlay.take().is_some() {
            log::debug!("level {} pause overlay destroyed", self.config.level_number);
        }
        self.flash = None;
    }

    // ── Queries ──

    pub fn phase(&self) -> Phase { self.phase }
    pub fn is_intro_locked(&self) -> bool { self.intro_locked }
    pub fn is_paused(&self) -> bool { self.paused }
    pub fn outcome_guard(&self) -> bool { self.outcome_guard }
    pub fn outcome(&self) -> Option<Outcome> { self.outcome }
    pub fn elapsed_ms(&self) -> u64 { self.elapsed_ms }
    pub fn floors(&self) -> u32 { self.floors }
    pub fn kit(&self) -> &LevelKit { &self.kit }
    pub fn stage(&self) -> &Stage { &self.stage }
    pub fn flash(&self) -> Option<Flash> { self.flash }
    pub fn pending_timers(&self) -> usize { self.timers.pending() }

    pub fn level_number(&self) -> u32 {
        self.config.level_number
    }

    pub fn pause_overlay_visible(&self) -> bool {
        self.pause_overlay.as_ref().map_or(false, |o| o.visible)
    }

    /// Title text with its current (alpha, scale), while the card is up.
    pub fn intro_card(&self) -> Option<(&str, f32, f32)> {
        self.intro.as_ref().map(|card| {
            let (alpha, scale) = card.appearance(self.timers.now());
            (card.title.as_str(), alpha, scale)
        })
    }

    /// Cues emitted since the last call.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    #[cfg(test)]
    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::levels::LevelKind;
    use std::cell::RefCell;

    const TICK: u32 = 16;

    fn context() -> (Context, Rc<RefCell<Vec<HudEvent>>>) {
        let mut ctx = Context::new(TimingConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        ctx.bridge.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));
        (ctx, seen)
    }

    fn controller(intro: bool) -> LevelController {
        let mut cfg = LevelConfig::new(1, "Reach the flag.").with_param("floors", 4);
        cfg.disable_intro = !intro;
        let kit = LevelKind::IcyTower.kit(&cfg);
        LevelController::new(Rc::new(cfg), kit, TimingConfig::default())
    }

    fn idle() -> KeySnapshot {
        KeySnapshot::default()
    }

    fn pause() -> KeySnapshot {
        KeySnapshot { pause_pressed: true, ..idle() }
    }

    /// Create and let the body settle on the ground.
    fn playing(ctx: &mut Context) -> LevelController {
        let mut c = controller(false);
        c.create(&mut ctx.bridge);
        for _ in 0..60 {
            assert_eq!(c.update(TICK, &idle(), ctx), None);
        }
        c
    }

    #[test]
    fn create_resets_timer_and_enters_intro() {
        let (mut ctx, seen) = context();
        let mut c = controller(true);
        assert_eq!(c.phase(), Phase::Init);
        c.create(&mut ctx.bridge);
        assert_eq!(c.phase(), Phase::IntroLock);
        assert!(c.is_intro_locked());
        assert_eq!(seen.borrow()[0], HudEvent::TimerReset);
        assert_eq!(c.intro_card().map(|(t, _, _)| t.to_string()), Some("LEVEL 1".into()));
        assert_eq!(c.take_cues(), vec![Cue::IntroShown]);
    }

    #[test]
    fn disabled_intro_goes_straight_to_playing() {
        let (mut ctx, _) = context();
        let mut c = controller(false);
        c.create(&mut ctx.bridge);
        assert_eq!(c.phase(), Phase::Playing);
        assert!(c.intro_card().is_none());
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn intro_lock_gates_input_until_release() {
        let (mut ctx, _) = context();
        let mut c = controller(true);
        c.create(&mut ctx.bridge);
        let start_x = c.stage().player.x;
        let mashing = KeySnapshot { left: true, jump_pressed: true, jump_held: true, ..idle() };

        let mut ticks = 0;
        while c.phase() == Phase::IntroLock {
            assert_eq!(c.update(TICK, &mashing, &mut ctx), None);
            ticks += 1;
            if c.phase() == Phase::IntroLock {
                assert_eq!(c.stage().player.x, start_x);
                assert_eq!(c.stage().player.vx, 0.0);
                assert!(c.stage().player.vy >= 0.0, "no jump while locked");
            }
            assert!(ticks < 1000);
        }
        // Lock lifts on the tick where 2400ms have passed.
        assert_eq!(ticks, (2400 + TICK - 1) / TICK);
        assert!(!c.is_intro_locked());
        assert!(c.intro_card().is_none());

        c.update(TICK, &mashing, &mut ctx);
        assert!(c.stage().player.vx < 0.0);
        assert!(c.stage().player.x < start_x);
        assert_eq!(c.pending_timers(), 0);
    }

    #[test]
    fn intro_freeze_zeroes_horizontal_motion() {
        let (mut ctx, _) = context();
        let mut c = controller(true);
        c.create(&mut ctx.bridge);
        c.stage_mut().player.vx = 300.0;
        c.stage_mut().player.ax = 900.0;
        for _ in 0..4 {
            c.update(TICK, &idle(), &mut ctx);
        }
        assert_eq!(c.stage().player.vx, 0.0);
        assert_eq!(c.stage().player.ax, 0.0);
    }

    #[test]
    fn outcome_resolves_only_once() {
        let (mut ctx, _) = context();
        let mut c = playing(&mut ctx);
        c.take_cues();

        assert!(c.win());
        assert!(!c.win());
        assert!(!c.fail());
        assert_eq!(c.phase(), Phase::Resolving);
        assert!(c.outcome_guard());
        assert_eq!(c.outcome(), Some(Outcome::Win));
        assert_eq!(c.take_cues(), vec![Cue::Success]);
        assert!(c.flash().is_some());

        let mut requests = vec![];
        for _ in 0..100 {
            if let Some(r) = c.update(TICK, &idle(), &mut ctx) {
                requests.push(r);
            }
            assert!(!c.fail());
        }
        assert_eq!(requests, vec![LevelRequest::Advance]);
        assert!(c.take_cues().is_empty());
    }

    #[test]
    fn win_settles_after_delay() {
        let (mut ctx, _) = context();
        let mut c = playing(&mut ctx);
        c.win();
        let mut waited = 0;
        loop {
            waited += TICK;
            if c.update(TICK, &idle(), &mut ctx).is_some() {
                break;
            }
        }
        assert!(waited >= 450 && waited < 450 + TICK);
    }

    #[test]
    fn fail_requests_restart_after_shorter_delay() {
        let (mut ctx, _) = context();
        let mut c = playing(&mut ctx);
        assert!(c.fail());
        assert!(!c.win());
        let mut got = None;
        for _ in 0..((200 + TICK - 1) / TICK) {
            got = c.update(TICK, &idle(), &mut ctx);
        }
        assert_eq!(got, Some(LevelRequest::Restart));
    }

    #[test]
    fn falling_out_of_view_fails_by_itself() {
        let (mut ctx, _) = context();
        let mut c = playing(&mut ctx);
        // View scrolled to the top, body well below it but above the floor.
        c.stage_mut().camera.scroll_y = 0.0;
        let player = &mut c.stage_mut().player;
        player.y = 740.0;
        player.vy = 0.0;
        c.update(TICK, &idle(), &mut ctx);
        assert_eq!(c.outcome(), Some(Outcome::Fail));
    }

    #[test]
    fn touching_the_goal_wins() {
        let (mut ctx, _) = context();
        let mut c = playing(&mut ctx);
        let goal = c.stage().goal.unwrap();
        let player = &mut c.stage_mut().player;
        player.x = goal.x + goal.w / 2.0;
        player.y = goal.y + goal.h / 2.0;
        player.vy = 0.0;
        c.update(TICK, &idle(), &mut ctx);
        assert_eq!(c.outcome(), Some(Outcome::Win));
    }

    #[test]
    fn double_pause_restores_playing_and_freezes_timer() {
        let (mut ctx, seen) = context();
        let mut c = playing(&mut ctx);
        seen.borrow_mut().clear();

        let before = c.elapsed_ms();
        c.update(TICK, &pause(), &mut ctx);
        assert_eq!(c.phase(), Phase::Paused);
        assert!(c.stage().frozen);
        assert!(c.pause_overlay_visible());
        let at_pause = c.elapsed_ms();
        assert_eq!(at_pause, before);

        let body = c.stage().player.clone();
        for _ in 0..30 {
            c.update(TICK, &idle(), &mut ctx);
        }
        assert_eq!(c.elapsed_ms(), at_pause);
        assert_eq!(c.stage().player, body);

        c.update(TICK, &pause(), &mut ctx);
        assert_eq!(c.phase(), Phase::Playing);
        assert!(!c.stage().frozen);
        assert!(!c.pause_overlay_visible());
        assert!(c.elapsed_ms() >= at_pause);
        assert_eq!(*seen.borrow(), vec![HudEvent::TimerPause, HudEvent::TimerResume]);
    }

    #[test]
    fn pause_is_unreachable_during_intro_and_resolve() {
        let (mut ctx, _) = context();
        let mut c = controller(true);
        c.create(&mut ctx.bridge);
        c.update(TICK, &pause(), &mut ctx);
        assert_eq!(c.phase(), Phase::IntroLock);

        let mut c = playing(&mut ctx);
        c.fail();
        assert!(!c.toggle_pause(&mut ctx.bridge));
        assert_eq!(c.phase(), Phase::Resolving);
    }

    #[test]
    fn restart_bypasses_everything() {
        let (mut ctx, _) = context();
        let mut c = controller(true);
        c.create(&mut ctx.bridge);
        let restart = KeySnapshot { restart_pressed: true, ..idle() };
        assert_eq!(c.update(TICK, &restart, &mut ctx), Some(LevelRequest::Restart));
        assert!(!c.outcome_guard());
    }

    #[test]
    fn restart_while_paused_resumes_first() {
        let (mut ctx, seen) = context();
        let mut c = playing(&mut ctx);
        c.update(TICK, &pause(), &mut ctx);
        assert!(c.is_paused());
        seen.borrow_mut().clear();

        let restart = KeySnapshot { restart_pressed: true, ..idle() };
        assert_eq!(c.update(TICK, &restart, &mut ctx), Some(LevelRequest::Restart));
        assert!(!c.is_paused());
        assert!(!c.stage().frozen);
        assert_eq!(*seen.borrow(), vec![HudEvent::TimerResume]);
    }

    #[test]
    fn winning_tick_publishes_the_deciding_progress() {
        let (mut ctx, seen) = context();
        let mut cfg = LevelConfig::new(2, "Climb.").with_param("targetFloors", 1);
        cfg.disable_intro = true;
        let kit = LevelKind::VerticalClimb.kit(&cfg);
        let mut c = LevelController::new(Rc::new(cfg), kit, TimingConfig::default());
        c.create(&mut ctx.bridge);
        c.update(TICK, &idle(), &mut ctx);
        assert_eq!(c.outcome(), None);
        seen.borrow_mut().clear();

        c.tracker.highest_y = c.tracker.start_y - 10_000.0;
        c.update(TICK, &idle(), &mut ctx);

        assert_eq!(c.outcome(), Some(Outcome::Win));
        assert!(c.floors() >= 1);
        assert_eq!(*seen.borrow(), vec![HudEvent::ProgressChanged { progress: c.floors() }]);
    }

    #[test]
    fn teardown_cancels_pending_callbacks() {
        let (mut ctx, _) = context();
        let mut c = controller(true);
        c.create(&mut ctx.bridge);
        assert_eq!(c.pending_timers(), 2);
        c.teardown();
        assert_eq!(c.pending_timers(), 0);
        assert!(c.intro_card().is_none());
        c.teardown();

        let mut c = playing(&mut ctx);
        c.win();
        c.teardown();
        for _ in 0..100 {
            assert_eq!(c.update(TICK, &idle(), &mut ctx), None);
        }
    }

    #[test]
    fn progress_is_published_on_first_tick_and_on_change_only() {
        let (mut ctx, seen) = context();
        let mut c = controller(false);
        c.create(&mut ctx.bridge);
        for _ in 0..10 {
            c.update(TICK, &idle(), &mut ctx);
        }
        let progress: Vec<_> = seen.borrow().iter()
            .filter(|e| matches!(e, HudEvent::ProgressChanged { .. }))
            .cloned()
            .collect();
        assert_eq!(progress, vec![HudEvent::ProgressChanged { progress: 0 }]);
    }

    #[test]
    fn intro_card_choreography() {
        let card = IntroCard { title: "T".into(), shown_at: 0, in_ms: 480, hold_ms: 1500, out_ms: 420 };
        let (a, s) = card.appearance(0);
        assert_eq!(a, 0.0);
        assert!((s - 2.0).abs() < 1e-4);
        assert_eq!(card.appearance(1000), (1.0, 1.0));
        let (a, s) = card.appearance(480 + 1500 + 210);
        assert!(a > 0.0 && a < 1.0);
        assert!(s < 1.0 && s > 0.55);
        assert_eq!(card.appearance(5000), (0.0, 0.55));
    }
}
