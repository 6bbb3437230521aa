/// Arcade physics for a single-player platform stage.
///
/// ## Model
///   - World units are pixels of a fixed 960×540 viewport; +y points down.
///   - One dynamic body (the player) with acceleration, horizontal drag and
///     a velocity cap; constant gravity.
///   - Static platforms are one-way: the body lands on them from above and
///     passes through from below or the sides.
///   - The world floor and side walls are solid.
///
/// Stepping order per tick:
///   1. Integrate velocity (acceleration, drag when not accelerating, gravity)
///   2. Clamp velocity
///   3. Integrate position
///   4. Resolve world bounds, then platform landings
///
/// `frozen` suspends stepping entirely (pause).

pub const GRAVITY: f32 = 1200.0;
pub const VIEW_W: f32 = 960.0;
pub const VIEW_H: f32 = 540.0;

/// Tolerance when deciding whether the body was above a platform last tick.
const LANDING_SLOP: f32 = 0.5;

/// Axis-aligned rectangle, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Rectangle of size (w, h) centered on (cx, cy).
    pub fn centered(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Rect { x: cx - w / 2.0, y: cy - h / 2.0, w, h }
    }

    pub fn right(&self) -> f32 { self.x + self.w }
    pub fn bottom(&self) -> f32 { self.y + self.h }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right()
            && self.y < other.bottom() && other.y < self.bottom()
    }
}

/// The dynamic body. Position is the body center.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vx: f32,
    pub vy: f32,
    pub ax: f32,
    pub drag_x: f32,
    pub max_vx: f32,
    pub max_vy: f32,
    /// Resting on a platform or the floor after the last step.
    pub blocked_down: bool,
}

impl Body {
    pub fn new(x: f32, y: f32) -> Self {
        Body {
            x, y,
            w: 28.0,
            h: 36.0,
            vx: 0.0,
            vy: 0.0,
            ax: 0.0,
            drag_x: 0.0,
            max_vx: 10_000.0,
            max_vy: 10_000.0,
            blocked_down: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, self.w, self.h)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h / 2.0
    }

    /// Kill all horizontal motion (intro freeze).
    pub fn halt_horizontal(&mut self) {
        self.ax = 0.0;
        self.vx = 0.0;
    }
}

/// Vertical-scrolling camera over the stage.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// World Y of the top of the view.
    pub scroll_y: f32,
    pub view_h: f32,
}

impl Camera {
    pub fn new(view_h: f32) -> Self {
        Camera { scroll_y: 0.0, view_h }
    }

    /// World Y of the bottom edge of the view.
    pub fn bottom(&self) -> f32 {
        self.scroll_y + self.view_h
    }

    /// Smoothly center on `target_y`, clamped to the world.
    pub fn follow(&mut self, target_y: f32, lerp: f32, world_h: f32) {
        let goal = target_y - self.view_h / 2.0;
        self.scroll_y += (goal - self.scroll_y) * lerp;
        self.clamp(world_h);
    }

    /// Snap to center on `target_y` (level start).
    pub fn center_on(&mut self, target_y: f32, world_h: f32) {
        self.scroll_y = target_y - self.view_h / 2.0;
        self.clamp(world_h);
    }

    /// Only ever scroll up: keep `highest_y` at `anchor` of the view height.
    pub fn climb_only(&mut self, highest_y: f32, anchor: f32) {
        let target = highest_y - self.view_h * anchor;
        self.scroll_y = self.scroll_y.min(target).max(0.0);
    }

    fn clamp(&mut self, world_h: f32) {
        let max = (world_h - self.view_h).max(0.0);
        self.scroll_y = self.scroll_y.clamp(0.0, max);
    }
}

/// Reported when the body comes to rest on a surface during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landing {
    /// Downward speed just before the contact.
    pub impact_vy: f32,
}

/// A complete level surface: bounds, geometry, the player and the camera.
#[derive(Clone, Debug)]
pub struct Stage {
    pub width: f32,
    pub height: f32,
    pub player: Body,
    pub platforms: Vec<Rect>,
    pub goal: Option<Rect>,
    pub camera: Camera,
    pub frozen: bool,
}

impl Stage {
    pub fn new(width: f32, height: f32, player: Body) -> Self {
        Stage {
            width,
            height,
            player,
            platforms: vec![],
            goal: None,
            camera: Camera::new(VIEW_H),
            frozen: false,
        }
    }

    /// Advance physics by `dt_ms`. Returns the landing, if any.
    pub fn step(&mut self, dt_ms: u32) -> Option<Landing> {
        if self.frozen || dt_ms == 0 {
            return None;
        }
        let dt = dt_ms as f32 / 1000.0;
        let p = &mut self.player;

        // 1. Velocity
        if p.ax != 0.0 {
            p.vx += p.ax * dt;
        } else if p.drag_x > 0.0 {
            let slow = p.drag_x * dt;
            p.vx = if p.vx.abs() <= slow { 0.0 } else { p.vx - slow * p.vx.signum() };
        }
        p.vy += GRAVITY * dt;

        // 2. Clamp
        p.vx = p.vx.clamp(-p.max_vx, p.max_vx);
        p.vy = p.vy.clamp(-p.max_vy, p.max_vy);

        // 3. Position
        let prev_bottom = p.bottom();
        p.x += p.vx * dt;
        p.y += p.vy * dt;
        p.blocked_down = false;

        // 4a. World bounds
        let half_w = p.w / 2.0;
        let half_h = p.h / 2.0;
        if p.x < half_w {
            p.x = half_w;
            p.vx = 0.0;
        } else if p.x > self.width - half_w {
            p.x = self.width - half_w;
            p.vx = 0.0;
        }
        if p.y < half_h {
            p.y = half_h;
            p.vy = p.vy.max(0.0);
        }

        let mut landing = None;
        if p.bottom() >= self.height {
            landing = Some(Landing { impact_vy: p.vy });
            p.y = self.height - half_h;
            p.vy = 0.0;
            p.blocked_down = true;
        }

        // 4b. One-way platforms: highest top crossed this step wins.
        if p.vy >= 0.0 && !p.blocked_down {
            let left = p.x - half_w;
            let right = p.x + half_w;
            let bottom = p.bottom();
            let hit = self.platforms.iter()
                .filter(|r| left < r.right() && r.x < right)
                .filter(|r| prev_bottom <= r.y + LANDING_SLOP && bottom >= r.y)
                .map(|r| r.y)
                .fold(None, |best: Option<f32>, top| Some(best.map_or(top, |b| b.min(top))));
            if let Some(top) = hit {
                landing = Some(Landing { impact_vy: p.vy });
                p.y = top - half_h;
                p.vy = 0.0;
                p.blocked_down = true;
            }
        }

        landing
    }

    pub fn player_touches_goal(&self) -> bool {
        self.goal.map_or(false, |g| self.player.bounds().overlaps(&g))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_with_ledge() -> Stage {
        // Ledge top at y=400, player resting on it.
        let mut s = Stage::new(VIEW_W, 2000.0, Body::new(480.0, 382.0));
        s.platforms.push(Rect::new(400.0, 400.0, 160.0, 16.0));
        s
    }

    fn run(stage: &mut Stage, ticks: u32) -> Vec<Landing> {
        (0..ticks).filter_map(|_| stage.step(16)).collect()
    }

    #[test]
    fn resting_body_stays_on_ledge() {
        let mut s = stage_with_ledge();
        run(&mut s, 60);
        assert!(s.player.blocked_down);
        assert!((s.player.bottom() - 400.0).abs() < 0.01);
    }

    #[test]
    fn body_falls_to_floor_without_support() {
        let mut s = Stage::new(VIEW_W, 600.0, Body::new(100.0, 100.0));
        let landings = run(&mut s, 120);
        assert!(!landings.is_empty());
        assert!(landings[0].impact_vy > 240.0);
        assert!((s.player.bottom() - 600.0).abs() < 0.01);
    }

    #[test]
    fn ledges_are_passable_from_below() {
        let mut s = stage_with_ledge();
        s.player.y = 440.0; // just under the ledge
        s.player.vy = -700.0;
        s.step(16);
        assert!(s.player.y < 440.0);
        assert!(!s.player.blocked_down);
    }

    #[test]
    fn drag_stops_an_unpowered_body() {
        let mut s = stage_with_ledge();
        s.player.drag_x = 900.0;
        s.player.vx = 200.0;
        run(&mut s, 30);
        assert_eq!(s.player.vx, 0.0);
    }

    #[test]
    fn velocity_is_capped() {
        let mut s = stage_with_ledge();
        s.player.max_vx = 380.0;
        s.player.ax = 5000.0;
        run(&mut s, 30);
        assert!(s.player.vx <= 380.0);
    }

    #[test]
    fn frozen_stage_does_not_move() {
        let mut s = Stage::new(VIEW_W, 2000.0, Body::new(100.0, 100.0));
        s.player.vx = 300.0;
        s.frozen = true;
        let before = s.player.clone();
        assert!(s.step(16).is_none());
        assert_eq!(s.player, before);
    }

    #[test]
    fn side_walls_stop_the_body() {
        let mut s = stage_with_ledge();
        s.player.x = 20.0;
        s.player.vx = -400.0;
        s.step(16);
        assert_eq!(s.player.x, s.player.w / 2.0);
        assert_eq!(s.player.vx, 0.0);
    }

    #[test]
    fn climb_only_camera_never_scrolls_down() {
        let mut cam = Camera::new(VIEW_H);
        cam.scroll_y = 1000.0;
        cam.climb_only(1400.0, 0.45);
        assert_eq!(cam.scroll_y, 1000.0);
        cam.climb_only(900.0, 0.45);
        assert!((cam.scroll_y - (900.0 - VIEW_H * 0.45)).abs() < 0.01);
    }

    #[test]
    fn follow_camera_is_clamped_to_world() {
        let mut cam = Camera::new(VIEW_H);
        cam.center_on(10.0, 3000.0);
        assert_eq!(cam.scroll_y, 0.0);
        cam.center_on(2990.0, 3000.0);
        assert_eq!(cam.scroll_y, 3000.0 - VIEW_H);
    }
}
