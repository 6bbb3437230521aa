/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout while in a level:
///   row 0        HUD status line
///   rows 1..h-2  stage viewport (world scaled to the terminal)
///   row h-1      touch buttons
///
/// The renderer only reads the session and the HUD display; it never
/// mutates the core.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::physics::{Rect, Stage, VIEW_H};
use crate::sim::context::{level_surface, HUD_SURFACE};
use crate::sim::controller::{LevelController, Outcome};
use crate::sim::session::{Screen, Session};
use crate::ui::hud::{play_again_button, HudDisplay};
use crate::ui::touch::{TouchButton, TouchLayout, JUMP_LABEL, LEFT_LABEL, RIGHT_LABEL};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// inter-row gap color on VTE terminals matches the cells.
    const BASE_BG: Color = Color::Rgb { r: 14, g: 20, b: 38 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Centered on the row.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', Color::White, bg));
        }
    }

    fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, ch: char, fg: Color, bg: Color) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.set(x, y, Cell::from_char(ch, fg, bg));
            }
        }
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 30, b: 70 };
const TOUCH_BG: Color = Color::Rgb { r: 24, g: 24, b: 40 };
const ICE_FG: Color = Color::Rgb { r: 190, g: 235, b: 255 };
const ICE_BG: Color = Color::Rgb { r: 70, g: 120, b: 170 };
const GOAL_FG: Color = Color::Rgb { r: 255, g: 220, b: 60 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 120, b: 90 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 120 };
const RED: Color = Color::Rgb { r: 255, g: 70, b: 70 };

fn rgb(c: Color) -> (f32, f32, f32) {
    match c {
        Color::Rgb { r, g, b } => (r as f32, g as f32, b as f32),
        _ => (0.0, 0.0, 0.0),
    }
}

/// Linear blend from `a` toward `b` by `t` (0..=1).
fn mix(a: Color, b: Color, t: f32) -> Color {
    let ((ar, ag, ab), (br, bg, bb)) = (rgb(a), rgb(b));
    let t = t.clamp(0.0, 1.0);
    Color::Rgb {
        r: (ar + (br - ar) * t) as u8,
        g: (ag + (bg - ag) * t) as u8,
        b: (ab + (bb - ab) * t) as u8,
    }
}

// ── Viewport mapping ──

/// Maps world coordinates into the terminal's stage area.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    top: usize,
    rows: usize,
    cols: usize,
    world_w: f32,
    scroll_y: f32,
}

impl Viewport {
    fn col(&self, x: f32) -> isize {
        (x / self.world_w * self.cols as f32).floor() as isize
    }

    fn row(&self, y: f32) -> isize {
        self.top as isize + ((y - self.scroll_y) / VIEW_H * self.rows as f32).floor() as isize
    }

    /// Inclusive terminal cell span of a world rect, clipped to the stage area.
    fn span(&self, r: &Rect) -> Option<(usize, usize, usize, usize)> {
        let (c0, c1) = (self.col(r.x).max(0), self.col(r.right() - 0.01).min(self.cols as isize - 1));
        let (r0, r1) = (
            self.row(r.y).max(self.top as isize),
            self.row(r.bottom() - 0.01).min((self.top + self.rows) as isize - 1),
        );
        if c0 > c1 || r0 > r1 {
            return None;
        }
        Some((c0 as usize, c1 as usize, r0 as usize, r1 as usize))
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const STAGE_TOP: usize = 1;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            enhanced_keys: false,
        }
    }

    /// Raw mode, alternate screen, mouse capture. Returns whether the
    /// terminal reports key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture,
            EnableFocusChange,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("keyboard release events: {}", self.enhanced_keys);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableFocusChange,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Terminal size as of the last frame.
    pub fn size(&self) -> (u16, u16) {
        (self.term_w as u16, self.term_h as u16)
    }

    pub fn touch_layout(&self) -> TouchLayout {
        TouchLayout::new(self.term_w as u16, self.term_h as u16)
    }

    pub fn render(&mut self, session: &Session, hud: &HudDisplay, touch_pressed: Option<TouchButton>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clean transition
        if self.last_screen.as_ref() != Some(session.screen()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(session.screen().clone());
        }

        self.front.clear();

        match session.screen() {
            Screen::Menu => self.compose_menu(session),
            Screen::LoadFailed(message) => self.compose_load_failed(message),
            Screen::InLevel => {
                let surfaces = &session.ctx.surfaces;
                if let Some(level) = session.active() {
                    if surfaces.is_active(&level_surface(level.level_number())) {
                        self.compose_level(level);
                    }
                }
                if surfaces.is_active(HUD_SURFACE) {
                    self.compose_hud(hud);
                }
                self.compose_touch(touch_pressed);
                if hud.play_again {
                    self.compose_play_again(hud);
                }
            }
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let (mut last_x, mut last_y) = (0usize, 0usize);

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: level ──

    fn viewport(&self, stage: &Stage) -> Viewport {
        Viewport {
            top: STAGE_TOP,
            rows: self.term_h.saturating_sub(2).max(1),
            cols: self.term_w.max(1),
            world_w: stage.width.max(1.0),
            scroll_y: stage.camera.scroll_y,
        }
    }

    fn compose_level(&mut self, level: &LevelController) {
        let stage = level.stage();
        let vp = self.viewport(stage);

        let bg = match level.flash() {
            Some(flash) => {
                let tint = match flash.outcome {
                    Outcome::Win => Color::Rgb { r: 40, g: 160, b: 80 },
                    Outcome::Fail => Color::Rgb { r: 180, g: 40, b: 40 },
                };
                mix(Cell::BASE_BG, tint, flash.strength() * 0.8)
            }
            None => Cell::BASE_BG,
        };
        if bg != Cell::BASE_BG {
            self.front.fill_rect(0, vp.top, vp.cols, vp.rows, ' ', Color::White, bg);
        }

        for platform in &stage.platforms {
            if let Some((c0, c1, r0, r1)) = vp.span(platform) {
                self.front.fill_rect(c0, r0, c1 - c0 + 1, r1 - r0 + 1, '▀', ICE_FG, ICE_BG);
            }
        }

        // World floor
        let floor_row = vp.row(stage.height);
        if floor_row >= vp.top as isize && (floor_row as usize) < vp.top + vp.rows {
            self.front.fill_rect(0, floor_row as usize, vp.cols, 1, '▓', ICE_FG, ICE_BG);
        }

        if let Some(goal) = &stage.goal {
            if let Some((c0, c1, r0, r1)) = vp.span(goal) {
                self.front.fill_rect(c0, r0, c1 - c0 + 1, r1 - r0 + 1, '⚑', GOAL_FG, bg);
            }
        }

        let body = stage.player.bounds();
        if let Some((c0, c1, r0, r1)) = vp.span(&body) {
            let glyph = if stage.player.blocked_down { '█' } else { '▓' };
            self.front.fill_rect(c0, r0, c1 - c0 + 1, r1 - r0 + 1, glyph, PLAYER_FG, bg);
        }

        if let Some((title, alpha, scale)) = level.intro_card() {
            self.compose_intro_card(&vp, title, alpha, scale);
        }
        if level.pause_overlay_visible() {
            self.compose_pause_overlay(&vp);
        }
    }

    /// Title card: alpha fades the color, scale spreads letters apart while
    /// above 1 and trims the text from both ends while below.
    fn compose_intro_card(&mut self, vp: &Viewport, title: &str, alpha: f32, scale: f32) {
        if alpha <= 0.02 {
            return;
        }
        let chars: Vec<char> = title.chars().collect();
        let gap = ((scale - 1.0) * 2.0).round().clamp(0.0, 2.0) as usize;
        let shown = ((chars.len() as f32 * scale.min(1.0)).round() as usize).min(chars.len());
        let skip = (chars.len() - shown) / 2;

        let mut text = String::new();
        for (i, ch) in chars.iter().skip(skip).take(shown).enumerate() {
            if i > 0 {
                text.extend(std::iter::repeat(' ').take(gap));
            }
            text.push(*ch);
        }

        let row = vp.top + vp.rows / 2;
        let fg = mix(Cell::BASE_BG, GOLD, alpha);
        let band = mix(Cell::BASE_BG, Color::Rgb { r: 10, g: 10, b: 20 }, alpha);
        self.front.fill_row(row, band);
        self.front.put_centered(row, &text, fg, band);
    }

    fn compose_pause_overlay(&mut self, vp: &Viewport) {
        let dim = Color::Rgb { r: 40, g: 40, b: 48 };
        let lines = [
            "╔══════════════════════╗",
            "║        PAUSED        ║",
            "╚══════════════════════╝",
            "",
            "  Esc / P   Resume",
            "  R         Restart",
            "  Q         Quit",
        ];
        let box_w = 26.min(vp.cols);
        let box_h = (lines.len() + 2).min(vp.rows);
        let x0 = vp.cols.saturating_sub(box_w) / 2;
        let y0 = vp.top + vp.rows.saturating_sub(box_h) / 2;
        self.front.fill_rect(x0, y0, box_w, box_h, ' ', Color::White, dim);
        for (i, line) in lines.iter().enumerate() {
            let fg = if i < 3 { GOLD } else { Color::Rgb { r: 180, g: 200, b: 220 } };
            self.front.put_str(x0 + 1, y0 + 1 + i, line, fg, dim);
        }
    }

    fn compose_hud(&mut self, hud: &HudDisplay) {
        self.front.fill_row(HUD_ROW, HUD_BG);
        let fg = if hud.is_paused() { Color::DarkGrey } else { Color::White };
        self.front.put_str(0, HUD_ROW, &hud.status_line(), fg, HUD_BG);
    }

    fn compose_touch(&mut self, pressed: Option<TouchButton>) {
        let layout = self.touch_layout();
        let row = layout.row as usize;
        self.front.fill_row(row, TOUCH_BG);
        for (button, label, span) in [
            (TouchButton::Left, LEFT_LABEL, layout.left),
            (TouchButton::Right, RIGHT_LABEL, layout.right),
            (TouchButton::Jump, JUMP_LABEL, layout.jump),
        ] {
            let (fg, bg) = if pressed == Some(button) {
                (Color::Black, ICE_FG)
            } else {
                (ICE_FG, TOUCH_BG)
            };
            self.front.put_str(span.0 as usize, row, label, fg, bg);
        }
    }

    fn compose_play_again(&mut self, hud: &HudDisplay) {
        let (x, y, w) = play_again_button(self.term_w, self.term_h);
        let banner = format!("★ ALL {} LEVELS CLEARED ★", hud.total_levels);
        self.front.put_centered(y.saturating_sub(2), &banner, GOLD, Color::Reset);
        self.front.fill_rect(x, y, w, 1, ' ', Color::Black, GREEN);
        let label = "PLAY AGAIN";
        let lx = x + w.saturating_sub(label.len()) / 2;
        self.front.put_str(lx, y, label, Color::Black, GREEN);
        self.front.put_centered(y + 2, "click or press Enter", Color::DarkGrey, Color::Reset);
    }

    // ── Compose: static screens ──

    fn compose_menu(&mut self, session: &Session) {
        let title = [
            r"  ___   _   _   _ _  _ _____ _    ___ _____ ",
            r" / __| /_\ | | | | \| |_   _| |  | __|_   _|",
            r"| (_ |/ _ \| |_| | .` | | | | |__| _|  | |  ",
            r" \___/_/ \_\\___/|_|\_| |_| |____|___| |_|  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, ICE_FG, Color::Reset);
        }
        self.front.put_centered(7, "━━━ a marathon of micro-levels ━━━", GOLD, Color::Reset);

        let run = match session.sequencer() {
            Some(seq) => format!("{} levels", seq.total_levels()),
            None => "single level".to_string(),
        };
        self.front.put_centered(9, &run, Color::DarkGrey, Color::Reset);

        let menu_x = self.term_w.saturating_sub(34) / 2;
        self.front.put_str(menu_x, 11, "ENTER   Start", GREEN, Color::Reset);
        self.front.put_str(menu_x, 12, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  ←→ / A D        Move",
            "  ↑ / W / Space   Jump (hold for boost)",
            "  R               Restart level",
            "  Esc / P         Pause",
            "  Mouse           On-screen buttons",
        ];
        for (i, line) in help.iter().enumerate() {
            let fg = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(menu_x, 14 + i, line, fg, Color::Reset);
        }
    }

    fn compose_load_failed(&mut self, message: &str) {
        let box_art = [
            "╔════════════════════════════════╗",
            "║   ✕ LEVELS FAILED TO LOAD  ✕   ║",
            "╚════════════════════════════════╝",
        ];
        for (i, line) in box_art.iter().enumerate() {
            self.front.put_centered(3 + i, line, RED, Color::Reset);
        }
        // Wrap the message to the terminal width.
        let width = self.term_w.saturating_sub(8).max(20);
        let mut row = 8;
        let mut line = String::new();
        for word in message.split_whitespace() {
            if !line.is_empty() && line.chars().count() + word.chars().count() + 1 > width {
                self.front.put_str(4, row, &line, Color::White, Color::Reset);
                row += 1;
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            self.front.put_str(4, row, &line, Color::White, Color::Reset);
            row += 1;
        }
        self.front.put_str(4, row + 1, "Press any key to exit", Color::DarkGrey, Color::Reset);
    }
}
