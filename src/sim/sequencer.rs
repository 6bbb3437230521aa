/// Level sequencer: which level is live, and swapping levels in and out.
///
/// Owns the catalog and the current-level cursor (always within
/// [1, total]). At most one level controller is active; starting any level
/// tears the previous one down first, cancelling its timers.
///
/// Whether the run is over is the caller's business: `next_level` on the
/// last level simply restarts it.

use std::path::Path;

use thiserror::Error;

use crate::domain::catalog::{CatalogError, LevelCatalog};
use crate::sim::context::{level_surface, Context, HUD_SURFACE};
use crate::sim::controller::LevelController;
use crate::sim::event::HudEvent;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("no level kind registered for level {0}")]
    Unregistered(u32),
}

#[derive(Debug)]
pub struct LevelSequencer {
    catalog: LevelCatalog,
    current: u32,
    active: Option<LevelController>,
}

impl LevelSequencer {
    pub fn new(catalog: LevelCatalog) -> Self {
        LevelSequencer { catalog, current: 1, active: None }
    }

    /// Load the catalog file and build a sequencer over it.
    pub fn load_catalog(path: &Path) -> Result<Self, SequencerError> {
        Ok(Self::new(LevelCatalog::load(path)?))
    }

    pub fn total_levels(&self) -> u32 {
        self.catalog.total_levels()
    }

    pub fn current_level(&self) -> u32 {
        self.current
    }

    pub fn is_last_level(&self) -> bool {
        self.current == self.total_levels()
    }

    pub fn set_current(&mut self, level_number: u32) {
        self.current = self.clamp(level_number);
    }

    fn clamp(&self, level_number: u32) -> u32 {
        level_number.clamp(1, self.total_levels().max(1))
    }

    pub fn active(&self) -> Option<&LevelController> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut LevelController> {
        self.active.as_mut()
    }

    /// Clamp, resolve the level kind, swap controllers, announce.
    pub fn start_level(&mut self, level_number: u32, ctx: &mut Context) -> Result<(), SequencerError> {
        let n = self.clamp(level_number);
        let config = self.catalog.get(n)?;

        let kind = match ctx.registry.get(n) {
            Some(kind) => kind,
            None if ctx.strict_registry => return Err(SequencerError::Unregistered(n)),
            None => {
                let fallback = ctx.registry.default_kind();
                log::warn!("level {n} has no registered kind, falling back to {}", fallback.name());
                fallback
            }
        };

        self.set_current(n);

        if !ctx.surfaces.is_active(HUD_SURFACE) {
            ctx.surfaces.launch(HUD_SURFACE);
        }

        self.stop_active(ctx);
        let stale: Vec<String> = ctx.surfaces.active_levels().map(str::to_string).collect();
        for name in stale {
            ctx.surfaces.stop(&name);
        }

        ctx.surfaces.launch(&level_surface(n));
        let kit = kind.kit(&config);
        let mut controller = LevelController::new(config.clone(), kit, ctx.timing.clone());
        controller.create(&mut ctx.bridge);
        self.active = Some(controller);
        log::info!("started level {n}/{} ({})", self.total_levels(), kind.name());

        ctx.bridge.publish(HudEvent::LevelChanged {
            level_number: n,
            objective: config.announced_objective().to_string(),
            total_levels: self.total_levels(),
        });
        Ok(())
    }

    pub fn restart_level(&mut self, ctx: &mut Context) -> Result<(), SequencerError> {
        self.start_level(self.current, ctx)
    }

    pub fn next_level(&mut self, ctx: &mut Context) -> Result<(), SequencerError> {
        let next = (self.current + 1).min(self.total_levels());
        self.start_level(next, ctx)
    }

    /// Tear down the active controller (if any) and stop its surface.
    pub fn stop_active(&mut self, ctx: &mut Context) {
        if let Some(mut old) = self.active.take() {
            old.teardown();
            ctx.surfaces.stop(&level_surface(old.level_number()));
            log::info!("level {} torn down", old.level_number());
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
