/// Session: the top of the core. Owns the context, the sequencer (or a lone
/// standalone level), and which screen is showing.
///
/// Routes level requests:
///   Sequenced:  Advance → next level, or end of run on the last level
///               Restart → restart current level
///   Standalone: Advance → back to the menu
///               Restart → fresh controller for the same level

use std::rc::Rc;

use crate::domain::catalog::LevelConfig;
use crate::domain::input::KeySnapshot;
use crate::domain::levels::LevelKind;
use crate::sim::context::{level_surface, Context, HUD_SURFACE};
use crate::sim::controller::{LevelController, LevelRequest};
use crate::sim::event::{Cue, HudEvent};
use crate::sim::sequencer::{LevelSequencer, SequencerError};

#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
    Menu,
    InLevel,
    /// Fatal startup error, shown instead of a blank screen.
    LoadFailed(String),
}

#[derive(Debug)]
struct Standalone {
    config: Rc<LevelConfig>,
    kind: LevelKind,
    controller: Option<LevelController>,
}

#[derive(Debug)]
enum Mode {
    Sequenced { sequencer: LevelSequencer, start_at: u32 },
    Standalone(Standalone),
    Failed,
}

#[derive(Debug)]
pub struct Session {
    pub ctx: Context,
    mode: Mode,
    screen: Screen,
    run_ended: bool,
}

impl Session {
    pub fn sequenced(ctx: Context, sequencer: LevelSequencer, start_at: u32) -> Self {
        Session {
            ctx,
            mode: Mode::Sequenced { sequencer, start_at },
            screen: Screen::Menu,
            run_ended: false,
        }
    }

    /// A single level with no sequencer behind it.
    pub fn standalone(ctx: Context, config: Rc<LevelConfig>, kind: LevelKind) -> Self {
        Session {
            ctx,
            mode: Mode::Standalone(Standalone { config, kind, controller: None }),
            screen: Screen::Menu,
            run_ended: false,
        }
    }

    pub fn load_failed(ctx: Context, message: String) -> Self {
        Session { ctx, mode: Mode::Failed, screen: Screen::LoadFailed(message), run_ended: false }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn run_ended(&self) -> bool {
        self.run_ended
    }

    pub fn sequencer(&self) -> Option<&LevelSequencer> {
        match &self.mode {
            Mode::Sequenced { sequencer, .. } => Some(sequencer),
            _ => None,
        }
    }

    pub fn active(&self) -> Option<&LevelController> {
        match &self.mode {
            Mode::Sequenced { sequencer, .. } => sequencer.active(),
            Mode::Standalone(s) => s.controller.as_ref(),
            Mode::Failed => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut LevelController> {
        match &mut self.mode {
            Mode::Sequenced { sequencer, .. } => sequencer.active_mut(),
            Mode::Standalone(s) => s.controller.as_mut(),
            Mode::Failed => None,
        }
    }

    /// Menu confirm: begin the run.
    pub fn start(&mut self) -> Result<(), SequencerError> {
        if self.screen != Screen::Menu {
            return Ok(());
        }
        match &mut self.mode {
            Mode::Sequenced { sequencer, start_at } => sequencer.start_level(*start_at, &mut self.ctx)?,
            Mode::Standalone(s) => s.spawn(&mut self.ctx),
            Mode::Failed => return Ok(()),
        }
        self.run_ended = false;
        self.screen = Screen::InLevel;
        Ok(())
    }

    /// HUD "play again" after the run ended.
    pub fn play_again(&mut self) -> Result<(), SequencerError> {
        if !self.run_ended {
            return Ok(());
        }
        if let Mode::Sequenced { sequencer, .. } = &mut self.mode {
            sequencer.start_level(1, &mut self.ctx)?;
            self.run_ended = false;
            log::info!("run restarted from level 1");
        }
        Ok(())
    }

    /// One tick of the live level, then act on whatever it asked for.
    pub fn tick(&mut self, dt_ms: u32, keys: &KeySnapshot) -> Result<(), SequencerError> {
        if self.screen != Screen::InLevel {
            return Ok(());
        }
        let request = match &mut self.mode {
            Mode::Sequenced { sequencer, .. } => sequencer.active_mut()
                .and_then(|c| c.update(dt_ms, keys, &mut self.ctx)),
            Mode::Standalone(s) => s.controller.as_mut()
                .and_then(|c| c.update(dt_ms, keys, &mut self.ctx)),
            Mode::Failed => None,
        };
        match request {
            Some(request) => self.handle(request),
            None => Ok(()),
        }
    }

    fn handle(&mut self, request: LevelRequest) -> Result<(), SequencerError> {
        match &mut self.mode {
            Mode::Sequenced { sequencer, .. } => match request {
                LevelRequest::Advance if sequencer.is_last_level() => {
                    sequencer.stop_active(&mut self.ctx);
                    self.run_ended = true;
                    self.ctx.bridge.publish(HudEvent::RunEnded);
                    log::info!("run complete ({} levels)", sequencer.total_levels());
                }
                LevelRequest::Advance => sequencer.next_level(&mut self.ctx)?,
                LevelRequest::Restart => sequencer.restart_level(&mut self.ctx)?,
            },
            Mode::Standalone(s) => match request {
                LevelRequest::Advance => {
                    s.stop(&mut self.ctx);
                    self.screen = Screen::Menu;
                }
                LevelRequest::Restart => s.spawn(&mut self.ctx),
            },
            Mode::Failed => {}
        }
        Ok(())
    }

    /// Leave the level (if any) and tear everything down.
    pub fn shutdown(&mut self) {
        match &mut self.mode {
            Mode::Sequenced { sequencer, .. } => sequencer.stop_active(&mut self.ctx),
            Mode::Standalone(s) => s.stop(&mut self.ctx),
            Mode::Failed => {}
        }
        self.ctx.surfaces.stop(HUD_SURFACE);
    }

    /// Presentation cues from the live level since the last call.
    pub fn take_cues(&mut self) -> Vec<Cue> {
        self.active_mut().map(LevelController::take_cues).unwrap_or_default()
    }
}

impl Standalone {
    /// Replace any running controller with a fresh one.
    fn spawn(&mut self, ctx: &mut Context) {
        self.stop(ctx);
        let n = self.config.level_number;
        ctx.surfaces.launch(HUD_SURFACE);
        ctx.surfaces.launch(&level_surface(n));
        let mut controller = LevelController::new(
            Rc::clone(&self.config),
            self.kind.kit(&self.config),
            ctx.timing.clone(),
        );
        controller.create(&mut ctx.bridge);
        self.controller = Some(controller);
        ctx.bridge.publish(HudEvent::LevelChanged {
            level_number: n,
            objective: self.config.announced_objective().to_string(),
            total_levels: 1,
        });
        log::info!("standalone level {n} ({})", self.kind.name());
    }

    fn stop(&mut self, ctx: &mut Context) {
        if let Some(mut old) = self.controller.take() {
            old.teardown();
            ctx.surfaces.stop(&level_surface(old.level_number()));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::catalog::LevelCatalog;
    use crate::sim::controller::Phase;
    use crate::ui::hud::HudDisplay;
    use std::cell::RefCell;

    const TICK: u32 = 16;

    fn quick(n: u32) -> LevelConfig {
        let mut cfg = LevelConfig::new(n, "Go.").with_param("floors", 3);
        cfg.disable_intro = true;
        cfg
    }

    fn recorded_context() -> (Context, Rc<RefCell<Vec<HudEvent>>>) {
        let mut ctx = Context::new(TimingConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        ctx.bridge.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));
        (ctx, seen)
    }

    fn sequenced(total: u32) -> (Session, Rc<RefCell<Vec<HudEvent>>>) {
        let (ctx, seen) = recorded_context();
        let catalog = LevelCatalog::from_configs((1..=total).map(quick).collect()).unwrap();
        let mut session = Session::sequenced(ctx, LevelSequencer::new(catalog), 1);
        session.start().unwrap();
        (session, seen)
    }

    /// Tick until the live controller is replaced or removed.
    fn settle(session: &mut Session) {
        let idle = KeySnapshot::default();
        for _ in 0..60 {
            session.tick(TICK, &idle).unwrap();
        }
    }

    fn current(session: &Session) -> Option<u32> {
        session.active().map(LevelController::level_number)
    }

    #[test]
    fn win_advances_and_last_win_ends_the_run() {
        let (mut session, seen) = sequenced(2);
        assert_eq!(current(&session), Some(1));

        assert!(session.active_mut().unwrap().win());
        settle(&mut session);
        assert_eq!(current(&session), Some(2));

        assert!(session.active_mut().unwrap().win());
        settle(&mut session);
        assert!(session.run_ended());
        assert_eq!(current(&session), None);
        assert_eq!(seen.borrow().iter().filter(|e| **e == HudEvent::RunEnded).count(), 1);
        assert_eq!(session.ctx.surfaces.active_levels().count(), 0);

        session.play_again().unwrap();
        assert!(!session.run_ended());
        assert_eq!(current(&session), Some(1));
    }

    #[test]
    fn fail_restarts_the_same_level() {
        let (mut session, seen) = sequenced(3);
        session.active_mut().unwrap().fail();
        settle(&mut session);
        assert_eq!(current(&session), Some(1));
        let changes = seen.borrow().iter()
            .filter(|e| matches!(e, HudEvent::LevelChanged { .. }))
            .count();
        assert_eq!(changes, 2);
    }

    #[test]
    fn restart_key_restarts_immediately() {
        let (mut session, _) = sequenced(3);
        settle(&mut session);
        let before = session.active().unwrap().elapsed_ms();
        assert!(before > 0);
        session.tick(TICK, &KeySnapshot { restart_pressed: true, ..Default::default() }).unwrap();
        assert_eq!(session.active().unwrap().elapsed_ms(), 0);
    }

    #[test]
    fn restart_from_pause_leaves_the_hud_running() {
        let (mut session, _) = sequenced(3);
        let (hud, _) = HudDisplay::attach(&mut session.ctx.bridge);
        settle(&mut session);

        session.tick(TICK, &KeySnapshot { pause_pressed: true, ..Default::default() }).unwrap();
        assert!(hud.borrow().is_paused());
        session.tick(TICK, &KeySnapshot { restart_pressed: true, ..Default::default() }).unwrap();

        let idle = KeySnapshot::default();
        for _ in 0..60 {
            session.tick(TICK, &idle).unwrap();
            hud.borrow_mut().tick(TICK);
        }
        let c = session.active().unwrap();
        assert_eq!(c.phase(), Phase::Playing);
        assert!(!c.stage().frozen);
        let h = hud.borrow();
        assert!(!h.is_paused());
        assert_eq!(h.timer_text(), "1.0s");
        assert!(!h.status_line().contains("PAUSED"));
    }

    #[test]
    fn play_again_is_ignored_mid_run() {
        let (mut session, _) = sequenced(3);
        session.active_mut().unwrap().win();
        settle(&mut session);
        session.play_again().unwrap();
        assert_eq!(current(&session), Some(2));
    }

    #[test]
    fn standalone_win_returns_to_menu() {
        let (ctx, _) = recorded_context();
        let mut session = Session::standalone(ctx, Rc::new(quick(4)), LevelKind::VerticalClimb);
        session.start().unwrap();
        assert_eq!(session.screen(), &Screen::InLevel);
        assert!(session.sequencer().is_none());
        session.active_mut().unwrap().win();
        settle(&mut session);
        assert_eq!(session.screen(), &Screen::Menu);
        assert!(session.active().is_none());
    }

    #[test]
    fn standalone_fail_restarts_the_controller() {
        let (ctx, _) = recorded_context();
        let mut session = Session::standalone(ctx, Rc::new(quick(4)), LevelKind::VerticalClimb);
        session.start().unwrap();
        session.active_mut().unwrap().fail();
        settle(&mut session);
        assert_eq!(session.screen(), &Screen::InLevel);
        let c = session.active().unwrap();
        assert_eq!(c.level_number(), 4);
        assert!(!c.outcome_guard());
    }

    #[test]
    fn failed_load_stays_on_the_failure_screen() {
        let mut session = Session::load_failed(Context::new(TimingConfig::default()), "boom".into());
        session.start().unwrap();
        session.tick(TICK, &KeySnapshot::default()).unwrap();
        assert_eq!(session.screen(), &Screen::LoadFailed("boom".into()));
        assert!(session.active().is_none());
    }
}
