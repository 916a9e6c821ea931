use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ratatui::style::Color;
use serde::Deserialize;

const USER_THEME_APP_DIR: &str = "snake-arcade";

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("classic", include_str!("../themes/classic.json")),
    ("neon", include_str!("../themes/neon.json")),
    ("dark", include_str!("../themes/dark.json")),
];

/// Colors for every element the renderer draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub snake_head: Color,
    pub snake_body: Color,
    pub food: Color,
    pub special_food: Color,
    pub power_up: Color,
    pub play_bg: Color,
    pub border: Color,
    pub hud_text: Color,
    pub accent: Color,
    pub muted: Color,
    /// Eat and collision bursts.
    pub burst: Color,
}

/// Used when nothing else parses, and for tokens a theme file leaves out.
#[must_use]
pub fn fallback_theme() -> Theme {
    Theme {
        name: "Fallback".to_owned(),
        snake_head: Color::White,
        snake_body: Color::Green,
        food: Color::Red,
        special_food: Color::Yellow,
        power_up: Color::Cyan,
        play_bg: Color::Black,
        border: Color::DarkGray,
        hud_text: Color::White,
        accent: Color::Green,
        muted: Color::DarkGray,
        burst: Color::LightYellow,
    }
}

#[derive(Debug, Clone)]
pub struct ThemeItem {
    pub id: String,
    pub theme: Theme,
}

/// Skins in cycle order with one selected.
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: Vec<ThemeItem>,
    selected_idx: usize,
}

impl ThemeCatalog {
    /// Loads bundled skins, then overlays `*.json` files from the user theme dir.
    #[must_use]
    pub fn load() -> Self {
        Self::load_with_user_dir(user_theme_dir().as_deref())
    }

    #[must_use]
    pub fn load_with_user_dir(user_dir: Option<&Path>) -> Self {
        let mut order = Vec::<String>::new();
        let mut by_id = HashMap::<String, Theme>::new();

        for &(id, content) in BUILTIN_THEMES {
            match parse_theme(id, content) {
                Ok(theme) => insert_theme(&mut order, &mut by_id, id.to_owned(), theme),
                Err(error) => tracing::warn!(id, %error, "invalid built-in theme; skipping"),
            }
        }

        if let Some(path) = user_dir {
            merge_theme_dir(path, &mut order, &mut by_id);
        }

        if by_id.is_empty() {
            insert_theme(&mut order, &mut by_id, "fallback".to_owned(), fallback_theme());
        }

        let themes: Vec<ThemeItem> = order
            .into_iter()
            .filter_map(|id| by_id.remove(&id).map(|theme| ThemeItem { id, theme }))
            .collect();

        Self {
            themes,
            selected_idx: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.themes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    #[must_use]
    pub fn current_theme(&self) -> &Theme {
        &self.themes[self.selected_idx].theme
    }

    #[must_use]
    pub fn current_id(&self) -> &str {
        &self.themes[self.selected_idx].id
    }

    #[must_use]
    pub fn items(&self) -> &[ThemeItem] {
        &self.themes
    }

    pub fn select_next(&mut self) {
        self.selected_idx = (self.selected_idx + 1) % self.themes.len();
    }

    pub fn select_previous(&mut self) {
        self.selected_idx = if self.selected_idx == 0 {
            self.themes.len() - 1
        } else {
            self.selected_idx - 1
        };
    }

    /// Selects the skin with `id`; returns false and keeps the selection otherwise.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        if let Some(idx) = self.themes.iter().position(|item| item.id == id) {
            self.selected_idx = idx;
            return true;
        }

        false
    }
}

fn user_theme_dir() -> Option<PathBuf> {
    let mut dir = dirs::config_dir()?;
    dir.push(USER_THEME_APP_DIR);
    dir.push("themes");
    Some(dir)
}

fn insert_theme(
    order: &mut Vec<String>,
    by_id: &mut HashMap<String, Theme>,
    id: String,
    theme: Theme,
) {
    if !by_id.contains_key(&id) {
        order.push(id.clone());
    }
    by_id.insert(id, theme);
}

fn merge_theme_dir(path: &Path, order: &mut Vec<String>, by_id: &mut HashMap<String, Theme>) {
    let Ok(entries) = fs::read_dir(path) else {
        return;
    };

    let mut theme_paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .collect();
    theme_paths.sort();

    for file_path in theme_paths {
        let Some(id) = file_path
            .file_stem()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
        else {
            continue;
        };

        let content = match fs::read_to_string(&file_path) {
            Ok(content) => content,
            Err(error) => {
                tracing::warn!(path = %file_path.display(), %error, "failed to read theme file");
                continue;
            }
        };

        match parse_theme(&id, &content) {
            Ok(theme) => insert_theme(order, by_id, id, theme),
            Err(error) => {
                tracing::warn!(path = %file_path.display(), %error, "invalid theme file; skipping");
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    name: Option<String>,
    colors: HashMap<String, ColorValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ColorValue {
    Named(String),
    Ansi(u8),
}

impl ColorValue {
    fn to_color(&self) -> Option<Color> {
        match self {
            Self::Named(value) => Color::from_str(value).ok(),
            Self::Ansi(code) => Some(Color::Indexed(*code)),
        }
    }
}

fn parse_theme(id: &str, raw: &str) -> Result<Theme, serde_json::Error> {
    let file = serde_json::from_str::<ThemeFile>(raw)?;
    let fallback = fallback_theme();
    let token = |name: &str, default: Color| {
        file.colors
            .get(name)
            .and_then(ColorValue::to_color)
            .unwrap_or(default)
    };

    Ok(Theme {
        name: file.name.clone().unwrap_or_else(|| display_name(id)),
        snake_head: token("snake_head", fallback.snake_head),
        snake_body: token("snake_body", fallback.snake_body),
        food: token("food", fallback.food),
        special_food: token("special_food", fallback.special_food),
        power_up: token("power_up", fallback.power_up),
        play_bg: token("play_bg", fallback.play_bg),
        border: token("border", fallback.border),
        hud_text: token("hud_text", fallback.hud_text),
        accent: token("accent", fallback.accent),
        muted: token("muted", fallback.muted),
        burst: token("burst", fallback.burst),
    })
}

fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
