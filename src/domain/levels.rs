/// Level kits: everything that makes one level different from another.
///
/// A level is not a subclass. It is the generic controller configured with
/// a `LevelKit`:
///   - movement profile   (how input turns into acceleration / jumps)
///   - geometry builder   (platforms, goal, spawn, world size)
///   - camera rule        (follow, or climb-only)
///   - progress rule      (how floors are counted)
///   - win / fail rules   (pure predicates over the stage)
///   - optional landing boost (hold jump to spring off a landing)
///
/// `LevelKind` is the registry value: a level number maps to a kind, and the
/// kind plus that level's config produce the kit.

use crate::domain::catalog::LevelConfig;
use crate::domain::input::Actions;
use crate::domain::physics::{Body, Rect, Stage, VIEW_H, VIEW_W};

const PLATFORM_W: f32 = 64.0;
const PLATFORM_H: f32 = 16.0;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LevelKind {
    /// Tall tower of icy ledges with a flag at the top.
    IcyTower,
    /// Evenly spaced wide platforms; win by climbing N floors.
    VerticalClimb,
}

impl LevelKind {
    pub fn name(self) -> &'static str {
        match self {
            LevelKind::IcyTower => "icy-tower",
            LevelKind::VerticalClimb => "vertical-climb",
        }
    }

    /// Build the kit for a concrete level.
    pub fn kit(self, cfg: &LevelConfig) -> LevelKit {
        match self {
            LevelKind::IcyTower => icy_tower(cfg),
            LevelKind::VerticalClimb => vertical_climb(cfg),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementProfile {
    pub accel: f32,
    pub jump_velocity: f32,
    pub drag_x: f32,
    pub max_vx: f32,
    pub max_vy: f32,
}

impl MovementProfile {
    /// Prepare a freshly spawned body for this profile.
    pub fn configure(&self, body: &mut Body) {
        body.drag_x = self.drag_x;
        body.max_vx = self.max_vx;
        body.max_vy = self.max_vy;
    }

    /// Turn one tick of input into acceleration and (grounded) jumps.
    pub fn apply(&self, body: &mut Body, input: Actions) {
        body.ax = if input.left {
            -self.accel
        } else if input.right {
            self.accel
        } else {
            0.0
        };
        if input.jump && body.blocked_down {
            body.vy = -self.jump_velocity;
        }
    }
}

/// Hold jump while landing hard to bounce back up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandingBoost {
    pub min_impact: f32,
    pub factor: f32,
    pub min: f32,
    pub max: f32,
}

impl LandingBoost {
    /// Upward speed to apply, if the landing qualifies.
    pub fn boost(&self, impact_vy: f32, jump_held: bool) -> Option<f32> {
        if jump_held && impact_vy > self.min_impact {
            Some((impact_vy * self.factor).clamp(self.min, self.max))
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraRule {
    Follow { lerp: f32 },
    ClimbOnly { anchor: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressRule {
    pub floor_spacing: f32,
    /// Count from the highest point reached instead of the current height.
    pub track_highest: bool,
    pub cap: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WinRule {
    ReachGoal,
    ClimbFloors(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FailRule {
    /// Body center fell `margin` below the bottom edge of the camera.
    BelowCamera { margin: f32 },
}

pub type GeometryBuilder = fn(&LevelConfig) -> Stage;

#[derive(Clone)]
pub struct LevelKit {
    pub kind: LevelKind,
    pub movement: MovementProfile,
    pub geometry: GeometryBuilder,
    pub camera: CameraRule,
    pub progress: ProgressRule,
    pub win: WinRule,
    pub fail: FailRule,
    pub landing_boost: Option<LandingBoost>,
}

impl std::fmt::Debug for LevelKit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelKit")
            .field("kind", &self.kind)
            .field("movement", &self.movement)
            .field("camera", &self.camera)
            .field("progress", &self.progress)
            .field("win", &self.win)
            .field("fail", &self.fail)
            .field("landing_boost", &self.landing_boost)
            .finish_non_exhaustive()
    }
}

/// Running height bookkeeping for the progress rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClimbTracker {
    pub start_y: f32,
    pub highest_y: f32,
}

impl ClimbTracker {
    pub fn new(start_y: f32) -> Self {
        ClimbTracker { start_y, highest_y: start_y }
    }

    pub fn observe(&mut self, y: f32) {
        if y < self.highest_y {
            self.highest_y = y;
        }
    }
}

impl LevelKit {
    /// Build the stage and prepare body + camera.
    pub fn build_stage(&self, cfg: &LevelConfig) -> Stage {
        let mut stage = (self.geometry)(cfg);
        self.movement.configure(&mut stage.player);
        stage.camera.center_on(stage.player.y, stage.height);
        stage
    }

    pub fn update_camera(&self, stage: &mut Stage, tracker: &ClimbTracker) {
        match self.camera {
            CameraRule::Follow { lerp } => {
                let (y, h) = (stage.player.y, stage.height);
                stage.camera.follow(y, lerp, h);
            }
            CameraRule::ClimbOnly { anchor } => stage.camera.climb_only(tracker.highest_y, anchor),
        }
    }

    pub fn floors(&self, stage: &Stage, tracker: &ClimbTracker) -> u32 {
        let y = if self.progress.track_highest { tracker.highest_y } else { stage.player.y };
        let climbed = ((tracker.start_y - y) / self.progress.floor_spacing).floor().max(0.0) as u32;
        match self.progress.cap {
            Some(cap) => climbed.min(cap),
            None => climbed,
        }
    }

    pub fn is_won(&self, stage: &Stage, floors: u32) -> bool {
        match self.win {
            WinRule::ReachGoal => stage.player_touches_goal(),
            WinRule::ClimbFloors(target) => floors >= target,
        }
    }

    pub fn is_failed(&self, stage: &Stage) -> bool {
        match self.fail {
            FailRule::BelowCamera { margin } => stage.player.y > stage.camera.bottom() + margin,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Icy tower
// ══════════════════════════════════════════════════════════════

fn icy_tower(cfg: &LevelConfig) -> LevelKit {
    let floors = cfg.param_u32("floors").unwrap_or(20).max(1);
    LevelKit {
        kind: LevelKind::IcyTower,
        movement: MovementProfile {
            accel: 980.0,
            jump_velocity: 680.0,
            drag_x: 140.0,
            max_vx: 420.0,
            max_vy: 920.0,
        },
        geometry: build_icy_tower,
        camera: CameraRule::Follow { lerp: 0.12 },
        progress: ProgressRule { floor_spacing: ICY_SPACING, track_highest: false, cap: Some(floors) },
        win: WinRule::ReachGoal,
        fail: FailRule::BelowCamera { margin: 120.0 },
        landing_boost: None,
    }
}

const ICY_SPACING: f32 = 220.0;

fn build_icy_tower(cfg: &LevelConfig) -> Stage {
    let floors = cfg.param_u32("floors").unwrap_or(20).max(1);
    let (w, h) = (VIEW_W, VIEW_H);
    let world_h = h + floors as f32 * ICY_SPACING + 260.0;

    let mut stage = Stage::new(w, world_h, Body::new(w / 2.0, world_h - 110.0));

    // Ground
    let ground_y = world_h - 28.0;
    stage.platforms.push(Rect::centered(w / 2.0, ground_y, w, PLATFORM_H));

    // Ledges: deterministic per floor.
    let margin = 110.0;
    let (min_scale, max_scale) = (1.2, 2.2);
    for floor in 1..=floors {
        let y = world_h - 80.0 - floor as f32 * ICY_SPACING;
        let a = (floor * 37) % 97;
        let b = (floor * 61) % 89;

        let x1 = margin + (a as f32 / 96.0) * (w - margin * 2.0);
        let x2 = margin + (b as f32 / 88.0) * (w - margin * 2.0);
        let s1 = min_scale + ((a % 10) as f32 / 10.0) * (max_scale - min_scale);
        let s2 = min_scale + ((b % 10) as f32 / 10.0) * (max_scale - min_scale);

        stage.platforms.push(Rect::centered(x1, y, PLATFORM_W * s1, PLATFORM_H));
        if floor % 2 == 0 || floor % 5 == 0 {
            stage.platforms.push(Rect::centered(x2, y - 60.0, PLATFORM_W * s2, PLATFORM_H));
        }
        // Bridge every 4 floors
        if floor % 4 == 0 {
            stage.platforms.push(Rect::centered(w / 2.0, y - 120.0, PLATFORM_W * 1.9, PLATFORM_H));
        }
    }

    let goal_y = world_h - 80.0 - floors as f32 * ICY_SPACING - 160.0;
    stage.goal = Some(Rect::centered(w / 2.0, goal_y, 32.0, 48.0));
    stage
}

// ══════════════════════════════════════════════════════════════
// Vertical climb
// ══════════════════════════════════════════════════════════════

const CLIMB_SPACING: f32 = 75.0;
const CLIMB_EXTRA_FLOORS: u32 = 8;

fn climb_target(cfg: &LevelConfig) -> u32 {
    cfg.param_u32("targetFloors").unwrap_or(20).max(1)
}

fn vertical_climb(cfg: &LevelConfig) -> LevelKit {
    LevelKit {
        kind: LevelKind::VerticalClimb,
        movement: MovementProfile {
            accel: 1100.0,
            jump_velocity: 900.0,
            drag_x: 900.0,
            max_vx: 380.0,
            max_vy: 1050.0,
        },
        geometry: build_vertical_climb,
        camera: CameraRule::ClimbOnly { anchor: 0.45 },
        progress: ProgressRule { floor_spacing: CLIMB_SPACING, track_highest: true, cap: None },
        win: WinRule::ClimbFloors(climb_target(cfg)),
        fail: FailRule::BelowCamera { margin: 28.0 },
        landing_boost: Some(LandingBoost { min_impact: 240.0, factor: 0.9, min: 540.0, max: 900.0 }),
    }
}

fn build_vertical_climb(cfg: &LevelConfig) -> Stage {
    let total = climb_target(cfg) + CLIMB_EXTRA_FLOORS;
    let (w, h) = (VIEW_W, VIEW_H);
    let world_h = h + total as f32 * CLIMB_SPACING;
    let ground_y = world_h - 30.0;

    let mut stage = Stage::new(w, world_h, Body::new(120.0, ground_y - 80.0));
    stage.platforms.push(Rect::centered(w / 2.0, ground_y, w, PLATFORM_H));

    // Scatter platforms, never stacking two floors right above each other.
    let (lo, hi) = (140.0, w - 140.0);
    let mut seed = cfg.level_number.wrapping_mul(2_654_435_761) | 1;
    let mut prev_x = 120.0;
    for i in 1..=total {
        let y = ground_y - i as f32 * CLIMB_SPACING;
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let mut x = lo + (seed % 1000) as f32 / 999.0 * (hi - lo);
        if (x - prev_x).abs() < 120.0 {
            x = (x + if x < prev_x { -160.0 } else { 160.0 }).clamp(lo, hi);
        }
        prev_x = x;
        stage.platforms.push(Rect::centered(x, y, PLATFORM_W * 2.5, PLATFORM_H));
    }
    stage
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded() -> Body {
        let mut b = Body::new(0.0, 0.0);
        b.blocked_down = true;
        b
    }

    #[test]
    fn movement_prefers_left_over_right() {
        let kit = LevelKind::VerticalClimb.kit(&LevelConfig::new(2, ""));
        let mut b = grounded();
        kit.movement.apply(&mut b, Actions { left: true, right: true, jump: false });
        assert_eq!(b.ax, -1100.0);
    }

    #[test]
    fn jump_needs_ground() {
        let kit = LevelKind::IcyTower.kit(&LevelConfig::new(1, ""));
        let mut b = Body::new(0.0, 0.0);
        kit.movement.apply(&mut b, Actions { jump: true, ..Default::default() });
        assert_eq!(b.vy, 0.0);
        b.blocked_down = true;
        kit.movement.apply(&mut b, Actions { jump: true, ..Default::default() });
        assert_eq!(b.vy, -680.0);
    }

    #[test]
    fn landing_boost_requires_hold_and_hard_impact() {
        let boost = LandingBoost { min_impact: 240.0, factor: 0.9, min: 540.0, max: 900.0 };
        assert_eq!(boost.boost(600.0, false), None);
        assert_eq!(boost.boost(200.0, true), None);
        assert_eq!(boost.boost(300.0, true), Some(540.0));
        assert_eq!(boost.boost(2000.0, true), Some(900.0));
    }

    #[test]
    fn icy_tower_is_deterministic_and_has_goal_above_top_floor() {
        let cfg = LevelConfig::new(1, "").with_param("floors", 5);
        let a = build_icy_tower(&cfg);
        let b = build_icy_tower(&cfg);
        assert_eq!(a.platforms, b.platforms);
        let goal = a.goal.unwrap();
        let top_ledge = a.platforms.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        assert!(goal.y < top_ledge);
        assert!(a.player.y > top_ledge);
    }

    #[test]
    fn climb_target_comes_from_config() {
        let kit = LevelKind::VerticalClimb.kit(&LevelConfig::new(3, "").with_param("targetFloors", 7));
        assert_eq!(kit.win, WinRule::ClimbFloors(7));
        let stage = kit.build_stage(&LevelConfig::new(3, "").with_param("targetFloors", 7));
        // ground + target + extra
        assert_eq!(stage.platforms.len(), 1 + 7 + CLIMB_EXTRA_FLOORS as usize);
        assert!(stage.platforms.iter().all(|p| p.x >= 140.0 - p.w / 2.0 - 0.01));
    }

    #[test]
    fn floors_count_from_highest_point_when_tracking() {
        let kit = LevelKind::VerticalClimb.kit(&LevelConfig::new(2, ""));
        let mut stage = kit.build_stage(&LevelConfig::new(2, ""));
        let mut tracker = ClimbTracker::new(stage.player.y);
        tracker.observe(stage.player.y - CLIMB_SPACING * 3.5);
        stage.player.y -= CLIMB_SPACING; // dropped back down
        assert_eq!(kit.floors(&stage, &tracker), 3);
    }

    #[test]
    fn icy_floors_are_capped() {
        let cfg = LevelConfig::new(1, "").with_param("floors", 2);
        let kit = LevelKind::IcyTower.kit(&cfg);
        let mut stage = kit.build_stage(&cfg);
        let tracker = ClimbTracker::new(stage.player.y);
        stage.player.y -= ICY_SPACING * 10.0;
        assert_eq!(kit.floors(&stage, &tracker), 2);
    }

    #[test]
    fn falling_below_camera_fails() {
        let kit = LevelKind::VerticalClimb.kit(&LevelConfig::new(2, ""));
        let mut stage = kit.build_stage(&LevelConfig::new(2, ""));
        assert!(!kit.is_failed(&stage));
        stage.player.y = stage.camera.bottom() + 29.0;
        assert!(kit.is_failed(&stage));
    }

    #[test]
    fn reach_goal_wins() {
        let cfg = LevelConfig::new(1, "").with_param("floors", 3);
        let kit = LevelKind::IcyTower.kit(&cfg);
        let mut stage = kit.build_stage(&cfg);
        assert!(!kit.is_won(&stage, 0));
        let goal = stage.goal.unwrap();
        stage.player.x = goal.x + goal.w / 2.0;
        stage.player.y = goal.y + goal.h / 2.0;
        assert!(kit.is_won(&stage, 0));
    }
}
