//! Light/dark theme
//!
//! The preference lives under the app-level `theme` key as `light` or
//! `dark`. Hosts apply [`Theme::root_class`] to the document root and may
//! inject [`CssVariables::generate`].
//!
//! # Usage
//!
//! ```rust
//! use playdeck_core::theme::{CssVariables, Theme};
//!
//! let theme = Theme::Dark;
//! assert_eq!(theme.root_class(), Some("dark"));
//! assert!(CssVariables::generate(theme).contains("--playdeck-background: #111827"));
//! ```

use crate::storage::{AppKey, Persistence};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Class the document root carries for this theme
    pub fn root_class(&self) -> Option<&'static str> {
        match self {
            Theme::Light => None,
            Theme::Dark => Some("dark"),
        }
    }

    pub fn palette(&self) -> ThemePalette {
        match self {
            Theme::Light => ThemePalette {
                background: "#f3f4f6",
                surface: "#ffffff",
                surface_hover: "#e5e7eb",
                active_row: "#d1d5db",
                text: "#111827",
                text_soft: "#4b5563",
                accent: "#facc15",
            },
            Theme::Dark => ThemePalette {
                background: "#111827",
                surface: "#1f2937",
                surface_hover: "#374151",
                active_row: "#4b5563",
                text: "#f9fafb",
                text_soft: "#9ca3af",
                accent: "#fef08a",
            },
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colours of one theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePalette {
    /// Page background
    pub background: &'static str,
    /// List rows and panels
    pub surface: &'static str,
    pub surface_hover: &'static str,
    /// Highlighted playlist row
    pub active_row: &'static str,
    pub text: &'static str,
    pub text_soft: &'static str,
    /// Theme toggle icon
    pub accent: &'static str,
}

/// CSS custom properties for web hosts
pub struct CssVariables;

impl CssVariables {
    pub fn generate(theme: Theme) -> String {
        let p = theme.palette();
        format!(
            r#":root {{
  --playdeck-background: {};
  --playdeck-surface: {};
  --playdeck-surface-hover: {};
  --playdeck-active-row: {};
  --playdeck-text: {};
  --playdeck-text-soft: {};
  --playdeck-accent: {};
  --playdeck-gradient-controls: linear-gradient(to top, #000000, transparent);
}}"#,
            p.background, p.surface, p.surface_hover, p.active_row, p.text, p.text_soft, p.accent,
        )
    }
}

/// Persisted theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThemeToggle {
    theme: Theme,
}

impl ThemeToggle {
    /// Read the stored preference; unknown values fall back to light
    pub fn load(persistence: &Persistence) -> Self {
        let theme = match persistence.load_app(AppKey::Theme) {
            Some(raw) => Theme::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unknown stored theme; using light");
                Theme::Light
            }),
            None => Theme::Light,
        };
        Self { theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip the theme and persist it
    pub fn toggle(&mut self, persistence: &mut Persistence) -> Theme {
        self.theme = self.theme.toggled();
        persistence.save_app(AppKey::Theme, self.theme.as_str());
        info!(theme = %self.theme, "Theme changed");
        self.theme
    }
}
