/// Entry point and game loop.
///
/// Usage:
///   gauntlet [--level N] [--standalone N] [--strict]
///
///   --level N       start the run at level N (clamped to the catalog)
///   --standalone N  play level N alone, without a sequencer
///   --strict        unregistered level numbers are an error, not a fallback

mod config;
mod domain;
mod sim;
mod ui;

use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, MouseButton, MouseEventKind};

use config::GameConfig;
use domain::catalog::{LevelCatalog, LevelConfig, DEFAULT_OBJECTIVE};
use domain::input::KeySnapshot;
use sim::context::Context;
use sim::sequencer::LevelSequencer;
use sim::session::{Screen, Session};
use ui::gamepad::GamepadState;
use ui::hud::{hits_play_again, HudDisplay};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{play_cues, SoundEngine};
use ui::touch::TouchSurface;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

// ── Command line ──

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CliArgs {
    level: Option<u32>,
    standalone: Option<u32>,
    strict: bool,
}

fn parse_args(args: &[String]) -> CliArgs {
    let mut cli = CliArgs::default();
    let mut it = args.iter().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--level" => cli.level = it.next().and_then(|v| v.parse().ok()),
            "--standalone" => cli.standalone = it.next().and_then(|v| v.parse().ok()),
            "--strict" => cli.strict = true,
            other => eprintln!("ignoring unknown argument: {other}"),
        }
    }
    cli
}

/// Log to a file; stderr belongs to the terminal UI.
fn init_logging(path: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match File::create(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("log file {} unavailable ({e}), logging disabled", path.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn build_session(config: &GameConfig, cli: &CliArgs) -> Session {
    let mut ctx = Context::new(config.timing.clone());
    ctx.strict_registry = config.strict_registry || cli.strict;

    if let Some(n) = cli.standalone {
        let level = match LevelCatalog::load(&config.catalog_path) {
            Ok(catalog) => catalog.get(n).ok(),
            Err(e) => {
                log::warn!("{e}; standalone level {n} uses defaults");
                None
            }
        };
        let level = level.unwrap_or_else(|| Rc::new(LevelConfig::new(n, DEFAULT_OBJECTIVE)));
        let kind = ctx.registry.get(n).unwrap_or_else(|| ctx.registry.default_kind());
        return Session::standalone(ctx, level, kind);
    }

    match LevelSequencer::load_catalog(&config.catalog_path) {
        Ok(sequencer) => {
            log::info!(
                "catalog {} loaded: {} levels",
                config.catalog_path.display(),
                sequencer.total_levels()
            );
            Session::sequenced(ctx, sequencer, cli.level.unwrap_or(1))
        }
        Err(e) => {
            log::error!("{e}");
            Session::load_failed(ctx, e.to_string())
        }
    }
}

fn main() {
    let config = GameConfig::load();
    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args);
    init_logging(&config.log_file);

    let mut session = build_session(&config, &cli);

    let mut renderer = Renderer::new();
    let honor_release = match renderer.init() {
        Ok(enhanced) => enhanced,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            std::process::exit(1);
        }
    };

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config, honor_release);
    session.shutdown();

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        log::error!("fatal: {e}");
        eprintln!("Game error: {e}");
        std::process::exit(1);
    }

    println!();
    println!("Thanks for playing Gauntlet!");
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn tick_dt_ms(tick_rate_ms: u64) -> u32 {
    u32::try_from(tick_rate_ms).unwrap_or(u32::MAX)
}

/// The HUD clock only runs while a level is on screen.
fn advance_hud_clock(hud: &mut HudDisplay, screen: &Screen, dt_ms: u32) {
    if *screen == Screen::InLevel {
        hud.tick(dt_ms);
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> Result<(), Box<dyn Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new(&config.gamepad);
    let mut touch_surface = TouchSurface::new();
    let (hud, hud_sub) = HudDisplay::attach(&mut session.ctx.bridge);

    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let dt_ms = tick_dt_ms(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    // Edges seen between ticks, consumed by the next tick.
    let mut latched = KeySnapshot::default();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }

        match session.screen().clone() {
            Screen::LoadFailed(message) => {
                if kb.any_key_pressed() || gp.confirm_pressed() {
                    return Err(message.into());
                }
            }
            Screen::Menu => {
                if kb.any_pressed(&[KeyCode::Esc]) {
                    break;
                }
                let clicked = kb.mouse_events.iter()
                    .any(|m| matches!(m.kind, MouseEventKind::Down(MouseButton::Left)));
                if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() || clicked {
                    session.start()?;
                    latched = KeySnapshot::default();
                }
            }
            Screen::InLevel => {
                let layout = renderer.touch_layout();
                let (tw, th) = renderer.size();
                let run_ended = session.run_ended();
                let mut again = run_ended && (kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed());

                if let Some(touch) = session.ctx.touch.as_mut() {
                    if kb.focus_lost {
                        touch_surface.reset(touch);
                    }
                    for ev in &kb.mouse_events {
                        if run_ended
                            && matches!(ev.kind, MouseEventKind::Down(MouseButton::Left))
                            && hits_play_again(ev.column, ev.row, tw as usize, th as usize)
                        {
                            again = true;
                            continue;
                        }
                        touch_surface.handle(ev, &layout, touch);
                    }
                }

                if again {
                    session.play_again()?;
                    latched = KeySnapshot::default();
                } else {
                    latched.jump_pressed |= kb.any_pressed(KEYS_JUMP) || gp.jump_pressed();
                    latched.restart_pressed |= kb.any_pressed(KEYS_RESTART) || gp.restart_pressed();
                    latched.pause_pressed |= kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed();
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            let keys = KeySnapshot {
                left: kb.any_held(KEYS_LEFT) || gp.left_held(),
                right: kb.any_held(KEYS_RIGHT) || gp.right_held(),
                jump_held: kb.any_held(KEYS_JUMP) || gp.jump_held(),
                ..std::mem::take(&mut latched)
            };
            session.tick(dt_ms, &keys)?;
            play_cues(sound, &session.take_cues());
            advance_hud_clock(&mut hud.borrow_mut(), session.screen(), dt_ms);
            last_tick = Instant::now();
        }

        renderer.render(session, &hud.borrow(), touch_surface.pressed())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    session.ctx.bridge.unsubscribe(hud_sub);
    Ok(())
}
