/// The explicit context handed to everything that used to reach into a
/// process-wide store: level registry, touch record, HUD bridge,
/// presentation surfaces and timing. Built once at startup.

use std::collections::{BTreeSet, HashMap};

use crate::config::TimingConfig;
use crate::domain::input::TouchInputState;
use crate::domain::levels::LevelKind;
use crate::sim::bridge::HudBridge;

pub const HUD_SURFACE: &str = "HUD";

pub fn level_surface(level_number: u32) -> String {
    format!("Level{level_number}")
}

// ── Registry ──

/// Level number → level kind, with a designated default kind.
#[derive(Clone, Debug)]
pub struct ControllerRegistry {
    kinds: HashMap<u32, LevelKind>,
    default_kind: LevelKind,
}

impl ControllerRegistry {
    pub fn new(default_kind: LevelKind) -> Self {
        ControllerRegistry { kinds: HashMap::new(), default_kind }
    }

    /// The built-in table: the icy tower opens, climbs follow.
    pub fn builtin() -> Self {
        let mut reg = ControllerRegistry::new(LevelKind::IcyTower);
        reg.register(1, LevelKind::IcyTower);
        for n in 2..=5 {
            reg.register(n, LevelKind::VerticalClimb);
        }
        reg
    }

    pub fn register(&mut self, level_number: u32, kind: LevelKind) {
        self.kinds.insert(level_number, kind);
    }

    pub fn get(&self, level_number: u32) -> Option<LevelKind> {
        self.kinds.get(&level_number).copied()
    }

    pub fn default_kind(&self) -> LevelKind {
        self.default_kind
    }
}

// ── Surfaces ──

/// Named presentation surfaces that are currently running.
#[derive(Clone, Debug, Default)]
pub struct Surfaces {
    active: BTreeSet<String>,
}

impl Surfaces {
    /// Returns false if the surface was already running.
    pub fn launch(&mut self, name: &str) -> bool {
        let fresh = self.active.insert(name.to_string());
        if fresh {
            log::debug!("surface {name} launched");
        }
        fresh
    }

    /// Returns false if the surface was not running.
    pub fn stop(&mut self, name: &str) -> bool {
        let was = self.active.remove(name);
        if was {
            log::debug!("surface {name} stopped");
        }
        was
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn active_levels(&self) -> impl Iterator<Item = &str> {
        self.active.iter().map(String::as_str).filter(|s| s.starts_with("Level"))
    }
}

// ── Context ──

#[derive(Debug)]
pub struct Context {
    pub registry: ControllerRegistry,
    /// `None` when no touch surface exists.
    pub touch: Option<TouchInputState>,
    pub bridge: HudBridge,
    pub surfaces: Surfaces,
    pub timing: TimingConfig,
    pub strict_registry: bool,
}

impl Context {
    pub fn new(timing: TimingConfig) -> Self {
        Context {
            registry: ControllerRegistry::builtin(),
            touch: Some(TouchInputState::default()),
            bridge: HudBridge::new(),
            surfaces: Surfaces::default(),
            timing,
            strict_registry: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_covers_first_five_levels() {
        let reg = ControllerRegistry::builtin();
        assert_eq!(reg.get(1), Some(LevelKind::IcyTower));
        assert_eq!(reg.get(5), Some(LevelKind::VerticalClimb));
        assert_eq!(reg.get(6), None);
        assert_eq!(reg.default_kind(), LevelKind::IcyTower);
    }

    #[test]
    fn surfaces_track_launch_and_stop() {
        let mut s = Surfaces::default();
        assert!(s.launch(HUD_SURFACE));
        assert!(!s.launch(HUD_SURFACE));
        assert!(s.launch(&level_surface(2)));
        assert_eq!(s.active_levels().collect::<Vec<_>>(), vec!["Level2"]);
        assert!(s.stop("Level2"));
        assert!(!s.stop("Level2"));
        assert!(s.is_active(HUD_SURFACE));
    }
}
