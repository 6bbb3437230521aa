/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub catalog_path: PathBuf,
    pub strict_registry: bool,
    pub log_file: PathBuf,
}

/// Every duration the level lifecycle depends on, in milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub intro_in_ms: u32,      // title card fades/scales in
    pub intro_hold_ms: u32,    // title card fully visible
    pub intro_out_ms: u32,     // title card fades/scales out
    pub intro_freeze_interval_ms: u32,
    pub win_settle_ms: u32,
    pub fail_settle_ms: u32,
    pub flash_ms: u32,
}

impl TimingConfig {
    /// Length of the whole intro lock.
    pub fn intro_total_ms(&self) -> u32 {
        self.intro_in_ms
            .saturating_add(self.intro_hold_ms)
            .saturating_add(self.intro_out_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let t = TomlTiming::default();
        TimingConfig {
            tick_rate_ms: t.tick_rate_ms,
            intro_in_ms: t.intro_in_ms,
            intro_hold_ms: t.intro_hold_ms,
            intro_out_ms: t.intro_out_ms,
            intro_freeze_interval_ms: t.intro_freeze_interval_ms,
            win_settle_ms: t.win_settle_ms,
            fail_settle_ms: t.fail_settle_ms,
            flash_ms: t.flash_ms,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub restart: Vec<String>,
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_intro_in")]
    intro_in_ms: u32,
    #[serde(default = "default_intro_hold")]
    intro_hold_ms: u32,
    #[serde(default = "default_intro_out")]
    intro_out_ms: u32,
    #[serde(default = "default_freeze_interval")]
    intro_freeze_interval_ms: u32,
    #[serde(default = "default_win_settle")]
    win_settle_ms: u32,
    #[serde(default = "default_fail_settle")]
    fail_settle_ms: u32,
    #[serde(default = "default_flash")]
    flash_ms: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_catalog")]
    catalog: String,
    #[serde(default)]
    strict_registry: bool,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }
fn default_intro_in() -> u32 { 480 }
fn default_intro_hold() -> u32 { 1500 }
fn default_intro_out() -> u32 { 420 }
fn default_freeze_interval() -> u32 { 50 }
fn default_win_settle() -> u32 { 450 }
fn default_fail_settle() -> u32 { 200 }
fn default_flash() -> u32 { 120 }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Y".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Start".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_catalog() -> String { "assets/levels.json".into() }
fn default_log_file() -> String { "gauntlet.log".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            intro_in_ms: default_intro_in(),
            intro_hold_ms: default_intro_hold(),
            intro_out_ms: default_intro_out(),
            intro_freeze_interval_ms: default_freeze_interval(),
            win_settle_ms: default_win_settle(),
            fail_settle_ms: default_fail_settle(),
            flash_ms: default_flash(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            restart: default_pad_restart(),
            pause: default_pad_pause(),
            confirm: default_pad_confirm(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            catalog: default_catalog(),
            strict_registry: false,
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Unknown keys are ignored.
    #[allow(dead_code)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_toml(toml_cfg, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let catalog_path = resolve_data_path(&toml_cfg.general.catalog, search_dirs);

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                intro_in_ms: toml_cfg.timing.intro_in_ms,
                intro_hold_ms: toml_cfg.timing.intro_hold_ms,
                intro_out_ms: toml_cfg.timing.intro_out_ms,
                intro_freeze_interval_ms: toml_cfg.timing.intro_freeze_interval_ms.max(1),
                win_settle_ms: toml_cfg.timing.win_settle_ms,
                fail_settle_ms: toml_cfg.timing.fail_settle_ms,
                flash_ms: toml_cfg.timing.flash_ms,
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                restart: toml_cfg.gamepad.restart,
                pause: toml_cfg.gamepad.pause,
                confirm: toml_cfg.gamepad.confirm,
            },
            catalog_path,
            strict_registry: toml_cfg.general.strict_registry,
            log_file: PathBuf::from(toml_cfg.general.log_file),
        }
    }
}

/// Absolute paths are kept; relative ones are looked up in the search dirs
/// and fall back to CWD-relative.
fn resolve_data_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(raw))
        .find(|p| p.is_file())
        .unwrap_or_else(|| PathBuf::from(raw))
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/gauntlet)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gauntlet");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/gauntlet)
    let sys = PathBuf::from("/usr/share/gauntlet");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.timing.win_settle_ms, 450);
        assert_eq!(cfg.timing.fail_settle_ms, 200);
        assert_eq!(cfg.timing.intro_freeze_interval_ms, 50);
        assert_eq!(cfg.timing.intro_total_ms(), 2400);
        assert!(!cfg.strict_registry);
        assert_eq!(cfg.catalog_path, PathBuf::from("assets/levels.json"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[timing]\nwin_settle_ms = 900\n\n[general]\nstrict_registry = true\n",
        ).unwrap();
        assert_eq!(cfg.timing.win_settle_ms, 900);
        assert_eq!(cfg.timing.fail_settle_ms, 200);
        assert!(cfg.strict_registry);
        assert_eq!(cfg.gamepad.pause, vec!["Start".to_string()]);
    }

    #[test]
    fn huge_intro_phases_saturate() {
        let cfg = GameConfig::parse(
            "[timing]\nintro_in_ms = 4294967295\nintro_hold_ms = 10\n",
        ).unwrap();
        assert_eq!(cfg.timing.intro_total_ms(), u32::MAX);
    }

    #[test]
    fn zero_intervals_are_raised_to_one() {
        let cfg = GameConfig::parse(
            "[timing]\ntick_rate_ms = 0\nintro_freeze_interval_ms = 0\n",
        ).unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 1);
        assert_eq!(cfg.timing.intro_freeze_interval_ms, 1);
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(GameConfig::parse("[timing\nwin_settle_ms = ").is_err());
    }
}
