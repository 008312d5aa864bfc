use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const MAX_WORKSPACES: usize = 32;
const MIN_SELECTED_TAB_WIDTH: i32 = 200;

pub fn config_file() -> Option<PathBuf> { dirs::home_dir().map(|home| home.join(".tabtile.toml")) }

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Give focus to the most recently focused window when the focused one
    /// goes away.
    #[serde(default = "yes")]
    pub auto_refocus: bool,
    /// Keep notebooks without a selected tab when the selected one is
    /// removed, and let a click on the selected tab iconify it.
    #[serde(default = "no")]
    pub enable_shade_windows: bool,
    /// Focus follows the pointer.
    #[serde(default = "no")]
    pub mouse_focus: bool,
    /// Seconds a newly mapped window takes to fade in.
    #[serde(default = "default_fade_in_time")]
    pub fade_in_time: f64,
    #[serde(default = "yes")]
    pub animate: bool,
    /// Seconds a tab strip scroll takes to settle.
    #[serde(default = "default_scroll_duration")]
    pub scroll_duration: f64,
    #[serde(default)]
    pub animation_easing: AnimationEasing,
    #[serde(default = "default_arrow_scroll_step")]
    pub arrow_scroll_step: i32,
    #[serde(default = "default_wheel_scroll_step")]
    pub wheel_scroll_step: i32,
    #[serde(default = "default_workspace_count")]
    pub workspace_count: usize,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimationEasing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseOutCubic,
    EaseInOutCubic,
}

impl AnimationEasing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            AnimationEasing::Linear => t,
            AnimationEasing::EaseInQuad => t * t,
            AnimationEasing::EaseOutQuad => t * (2.0 - t),
            AnimationEasing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            AnimationEasing::EaseOutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            AnimationEasing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct Margins {
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub right: i32,
}

impl Margins {
    pub const fn uniform(v: i32) -> Self { Margins { top: v, bottom: v, left: v, right: v } }

    pub fn horizontal(&self) -> i32 { self.left + self.right }

    pub fn vertical(&self) -> i32 { self.top + self.bottom }

    fn validate(&self, section: &str) -> Vec<String> {
        let mut issues = Vec::new();
        for (name, value) in
            [("top", self.top), ("bottom", self.bottom), ("left", self.left), ("right", self.right)]
        {
            if value < 0 {
                issues.push(format!("{section}.margin.{name} must be non-negative, got {value}"));
            }
        }
        issues
    }

    fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;
        for value in [&mut self.top, &mut self.bottom, &mut self.left, &mut self.right] {
            if *value < 0 {
                *value = 0;
                fixes += 1;
            }
        }
        fixes
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Theme {
    #[serde(default)]
    pub notebook: NotebookTheme,
    #[serde(default)]
    pub split: SplitTheme,
    #[serde(default)]
    pub floating: FloatingTheme,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct NotebookTheme {
    #[serde(default = "default_notebook_margin")]
    pub margin: Margins,
    #[serde(default = "default_tab_height")]
    pub tab_height: i32,
    #[serde(default = "default_iconic_tab_width")]
    pub iconic_tab_width: i32,
    #[serde(default = "default_selected_close_width")]
    pub selected_close_width: i32,
    #[serde(default = "default_small_button_width")]
    pub selected_unbind_width: i32,
    #[serde(default = "default_menu_button_width")]
    pub menu_button_width: i32,
    #[serde(default = "default_close_width")]
    pub close_width: i32,
    #[serde(default = "default_small_button_width")]
    pub hsplit_width: i32,
    #[serde(default = "default_small_button_width")]
    pub vsplit_width: i32,
    #[serde(default = "default_small_button_width")]
    pub mark_width: i32,
    #[serde(default = "default_scroll_arrow_width")]
    pub left_scroll_arrow_width: i32,
    #[serde(default = "default_scroll_arrow_width")]
    pub right_scroll_arrow_width: i32,
}

impl NotebookTheme {
    /// Total width of the fixed buttons of the tab strip.
    pub fn buttons_width(&self) -> i32 {
        self.close_width + self.hsplit_width + self.vsplit_width + self.mark_width
            + self.menu_button_width
    }

    /// Tab strip layout with every button and arrow removed.
    pub fn bare(iconic_tab_width: i32, tab_height: i32) -> Self {
        NotebookTheme {
            margin: Margins::default(),
            tab_height,
            iconic_tab_width,
            selected_close_width: 0,
            selected_unbind_width: 0,
            menu_button_width: 0,
            close_width: 0,
            hsplit_width: 0,
            vsplit_width: 0,
            mark_width: 0,
            left_scroll_arrow_width: 0,
            right_scroll_arrow_width: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct SplitTheme {
    #[serde(default)]
    pub margin: Margins,
    #[serde(default = "default_split_width")]
    pub width: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FloatingTheme {
    #[serde(default = "default_floating_margin")]
    pub margin: Margins,
    #[serde(default = "default_tab_height")]
    pub title_height: i32,
    #[serde(default = "default_close_width")]
    pub close_width: i32,
    #[serde(default = "default_small_button_width")]
    pub bind_width: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_refocus: true,
            enable_shade_windows: false,
            mouse_focus: false,
            fade_in_time: default_fade_in_time(),
            animate: true,
            scroll_duration: default_scroll_duration(),
            animation_easing: AnimationEasing::default(),
            arrow_scroll_step: default_arrow_scroll_step(),
            wheel_scroll_step: default_wheel_scroll_step(),
            workspace_count: default_workspace_count(),
        }
    }
}

impl Default for NotebookTheme {
    fn default() -> Self {
        Self {
            margin: default_notebook_margin(),
            tab_height: default_tab_height(),
            iconic_tab_width: default_iconic_tab_width(),
            selected_close_width: default_selected_close_width(),
            selected_unbind_width: default_small_button_width(),
            menu_button_width: default_menu_button_width(),
            close_width: default_close_width(),
            hsplit_width: default_small_button_width(),
            vsplit_width: default_small_button_width(),
            mark_width: default_small_button_width(),
            left_scroll_arrow_width: default_scroll_arrow_width(),
            right_scroll_arrow_width: default_scroll_arrow_width(),
        }
    }
}

impl Default for SplitTheme {
    fn default() -> Self {
        Self {
            margin: Margins::default(),
            width: default_split_width(),
        }
    }
}

impl Default for FloatingTheme {
    fn default() -> Self {
        Self {
            margin: default_floating_margin(),
            title_height: default_tab_height(),
            close_width: default_close_width(),
            bind_width: default_small_button_width(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.fade_in_time < 0.0 {
            issues.push(format!("fade_in_time must be non-negative, got {}", self.fade_in_time));
        }

        if self.scroll_duration < 0.0 {
            issues.push(format!(
                "scroll_duration must be non-negative, got {}",
                self.scroll_duration
            ));
        }

        if self.arrow_scroll_step <= 0 {
            issues.push(format!(
                "arrow_scroll_step must be positive, got {}",
                self.arrow_scroll_step
            ));
        }

        if self.wheel_scroll_step <= 0 {
            issues.push(format!(
                "wheel_scroll_step must be positive, got {}",
                self.wheel_scroll_step
            ));
        }

        if self.workspace_count == 0 {
            issues.push("workspace_count must be at least 1".to_string());
        }
        if self.workspace_count > MAX_WORKSPACES {
            issues.push(format!("workspace_count should not exceed {}", MAX_WORKSPACES));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.fade_in_time < 0.0 {
            self.fade_in_time = default_fade_in_time();
            fixes += 1;
        }

        if self.scroll_duration < 0.0 {
            self.scroll_duration = default_scroll_duration();
            fixes += 1;
        }

        if self.arrow_scroll_step <= 0 {
            self.arrow_scroll_step = default_arrow_scroll_step();
            fixes += 1;
        }

        if self.wheel_scroll_step <= 0 {
            self.wheel_scroll_step = default_wheel_scroll_step();
            fixes += 1;
        }

        if self.workspace_count == 0 {
            self.workspace_count = 1;
            fixes += 1;
        }
        if self.workspace_count > MAX_WORKSPACES {
            self.workspace_count = MAX_WORKSPACES;
            fixes += 1;
        }

        fixes
    }
}

impl Theme {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.notebook.validate());
        issues.extend(self.split.validate());
        issues.extend(self.floating.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.notebook.auto_fix_values() + self.split.auto_fix_values()
            + self.floating.auto_fix_values()
    }
}

impl NotebookTheme {
    fn widths(&self) -> [(&'static str, i32); 11] {
        [
            ("tab_height", self.tab_height),
            ("iconic_tab_width", self.iconic_tab_width),
            ("selected_close_width", self.selected_close_width),
            ("selected_unbind_width", self.selected_unbind_width),
            ("menu_button_width", self.menu_button_width),
            ("close_width", self.close_width),
            ("hsplit_width", self.hsplit_width),
            ("vsplit_width", self.vsplit_width),
            ("mark_width", self.mark_width),
            ("left_scroll_arrow_width", self.left_scroll_arrow_width),
            ("right_scroll_arrow_width", self.right_scroll_arrow_width),
        ]
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.margin.validate("notebook");

        for (name, value) in self.widths() {
            if value < 0 {
                issues.push(format!("notebook.{name} must be non-negative, got {value}"));
            }
        }

        if self.tab_height == 0 {
            issues.push("notebook.tab_height must be positive".to_string());
        }

        if self.selected_close_width + self.selected_unbind_width > MIN_SELECTED_TAB_WIDTH {
            issues.push(format!(
                "selected tab buttons do not fit in a {MIN_SELECTED_TAB_WIDTH}px selected tab"
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.margin.auto_fix_values();
        let defaults = NotebookTheme::default();

        if self.tab_height <= 0 {
            self.tab_height = defaults.tab_height;
            fixes += 1;
        }

        for (value, default) in [
            (&mut self.iconic_tab_width, defaults.iconic_tab_width),
            (&mut self.selected_close_width, defaults.selected_close_width),
            (&mut self.selected_unbind_width, defaults.selected_unbind_width),
            (&mut self.menu_button_width, defaults.menu_button_width),
            (&mut self.close_width, defaults.close_width),
            (&mut self.hsplit_width, defaults.hsplit_width),
            (&mut self.vsplit_width, defaults.vsplit_width),
            (&mut self.mark_width, defaults.mark_width),
            (&mut self.left_scroll_arrow_width, defaults.left_scroll_arrow_width),
            (&mut self.right_scroll_arrow_width, defaults.right_scroll_arrow_width),
        ] {
            if *value < 0 {
                *value = default;
                fixes += 1;
            }
        }

        fixes
    }
}

impl SplitTheme {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.margin.validate("split");
        if self.width < 0 {
            issues.push(format!("split.width must be non-negative, got {}", self.width));
        }
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.margin.auto_fix_values();
        if self.width < 0 {
            self.width = default_split_width();
            fixes += 1;
        }
        fixes
    }
}

impl FloatingTheme {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.margin.validate("floating");
        for (name, value) in [
            ("title_height", self.title_height),
            ("close_width", self.close_width),
            ("bind_width", self.bind_width),
        ] {
            if value < 0 {
                issues.push(format!("floating.{name} must be non-negative, got {value}"));
            }
        }
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = self.margin.auto_fix_values();
        let defaults = FloatingTheme::default();
        for (value, default) in [
            (&mut self.title_height, defaults.title_height),
            (&mut self.close_width, defaults.close_width),
            (&mut self.bind_width, defaults.bind_width),
        ] {
            if *value < 0 {
                *value = default;
                fixes += 1;
            }
        }
        fixes
    }
}

fn yes() -> bool { true }

fn no() -> bool { false }

fn default_fade_in_time() -> f64 { 0.2 }

fn default_scroll_duration() -> f64 { 0.2 }

fn default_arrow_scroll_step() -> i32 { 30 }

fn default_wheel_scroll_step() -> i32 { 15 }

fn default_workspace_count() -> usize { 1 }

fn default_notebook_margin() -> Margins { Margins::uniform(4) }

fn default_floating_margin() -> Margins { Margins::uniform(6) }

fn default_tab_height() -> i32 { 22 }

fn default_iconic_tab_width() -> i32 { 33 }

fn default_selected_close_width() -> i32 { 48 }

fn default_small_button_width() -> i32 { 20 }

fn default_menu_button_width() -> i32 { 40 }

fn default_close_width() -> i32 { 48 }

fn default_scroll_arrow_width() -> i32 { 16 }

fn default_split_width() -> i32 { 6 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads the user's config file, falling back to the built-in defaults
    /// when there is none.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
        match path {
            Some(path) if path.exists() => Self::read(path),
            _ => Ok(Config::default()),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.settings.validate());
        issues.extend(self.theme.validate());

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        self.settings.auto_fix_values() + self.theme.auto_fix_values()
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(buf)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_file_matches_builtin_defaults() {
        let parsed = Config::parse(include_str!("../../tabtile.default.toml")).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let config = Config::parse(
            r#"
            [settings]
            enable_shade_windows = true

            [theme.notebook]
            iconic_tab_width = 80

            [theme.split]
            width = 10
            "#,
        )
        .unwrap();

        assert!(config.settings.enable_shade_windows);
        assert!(config.settings.auto_refocus);
        assert_eq!(config.theme.notebook.iconic_tab_width, 80);
        assert_eq!(config.theme.notebook.tab_height, 22);
        assert_eq!(config.theme.split.width, 10);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[settings]\nshade = true\n").is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        let issues = config.validate();
        assert!(issues.is_empty());

        config.settings.fade_in_time = -1.0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("fade_in_time must be non-negative"));

        let fixes = config.auto_fix_values();
        assert_eq!(fixes, 1);
        assert_eq!(config.settings.fade_in_time, 0.2);

        config.theme.notebook.margin.left = -3;
        config.theme.split.width = -1;
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues[0].contains("notebook.margin.left"));
        assert!(issues[1].contains("split.width"));

        let fixes = config.auto_fix_values();
        assert_eq!(fixes, 2);
        assert_eq!(config.theme.notebook.margin.left, 0);
        assert_eq!(config.theme.split.width, 6);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn save_then_read_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tabtile.toml");

        let mut config = Config::default();
        config.settings.mouse_focus = true;
        config.settings.animation_easing = AnimationEasing::EaseOutCubic;
        config.theme.notebook.close_width = 12;
        config.save(&path).unwrap();

        assert_eq!(Config::read(&path).unwrap(), config);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(Config::load_or_default(Some(&path)).unwrap(), Config::default());
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }

    #[test]
    fn easing_curves_hit_endpoints() {
        for easing in [
            AnimationEasing::Linear,
            AnimationEasing::EaseInQuad,
            AnimationEasing::EaseOutQuad,
            AnimationEasing::EaseInOutQuad,
            AnimationEasing::EaseOutCubic,
            AnimationEasing::EaseInOutCubic,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-9, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{easing:?}");
        }
        assert_eq!(AnimationEasing::Linear.apply(2.0), 1.0);
    }
}
