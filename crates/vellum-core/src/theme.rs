//! Theme value objects.
//!
//! A theme is a static, immutable record: id, display name, light/dark
//! classification and a fixed palette of named colors. Themes are selected
//! by id and never partially mutated.

use serde::{Deserialize, Serialize};

/// Color representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// The fixed palette every theme provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Color,
    pub background_secondary: Color,
    pub background_tertiary: Color,
    pub foreground: Color,
    pub foreground_secondary: Color,
    pub foreground_muted: Color,
    pub accent: Color,
    pub selection: Color,
    pub line_highlight: Color,
    pub border: Color,
    pub divider: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub success: Color,
    pub tab_active: Color,
    pub tab_inactive: Color,
    pub status_bar: Color,
    pub terminal_background: Color,
    pub terminal_foreground: Color,
}

/// Editor theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub is_dark: bool,
    pub palette: Palette,
}

impl Theme {
    /// The default dark theme.
    pub fn dark() -> Self {
        Self {
            id: "dark".to_string(),
            name: "Vellum Dark".to_string(),
            is_dark: true,
            palette: Palette {
                background: Color::rgb(0.10, 0.10, 0.12),
                background_secondary: Color::rgb(0.12, 0.12, 0.14),
                background_tertiary: Color::rgb(0.15, 0.15, 0.17),
                foreground: Color::rgb(0.9, 0.9, 0.9),
                foreground_secondary: Color::rgb(0.7, 0.7, 0.7),
                foreground_muted: Color::rgb(0.5, 0.5, 0.5),
                accent: Color::rgb(0.4, 0.6, 1.0),
                selection: Color::rgba(0.3, 0.5, 0.8, 0.3),
                line_highlight: Color::rgba(1.0, 1.0, 1.0, 0.05),
                border: Color::rgb(0.25, 0.25, 0.28),
                divider: Color::rgb(0.2, 0.2, 0.22),
                error: Color::rgb(0.9, 0.4, 0.4),
                warning: Color::rgb(0.9, 0.8, 0.5),
                info: Color::rgb(0.5, 0.7, 0.9),
                success: Color::rgb(0.6, 0.8, 0.5),
                tab_active: Color::rgb(0.15, 0.15, 0.17),
                tab_inactive: Color::rgb(0.12, 0.12, 0.14),
                status_bar: Color::rgb(0.12, 0.12, 0.14),
                terminal_background: Color::rgb(0.08, 0.08, 0.10),
                terminal_foreground: Color::rgb(0.85, 0.85, 0.85),
            },
        }
    }

    /// The default light theme.
    pub fn light() -> Self {
        Self {
            id: "light".to_string(),
            name: "Vellum Light".to_string(),
            is_dark: false,
            palette: Palette {
                background: Color::rgb(1.0, 1.0, 1.0),
                background_secondary: Color::rgb(0.97, 0.97, 0.97),
                background_tertiary: Color::rgb(0.95, 0.95, 0.95),
                foreground: Color::rgb(0.1, 0.1, 0.1),
                foreground_secondary: Color::rgb(0.3, 0.3, 0.3),
                foreground_muted: Color::rgb(0.5, 0.5, 0.5),
                accent: Color::rgb(0.2, 0.4, 0.8),
                selection: Color::rgba(0.3, 0.5, 0.8, 0.2),
                line_highlight: Color::rgba(0.0, 0.0, 0.0, 0.03),
                border: Color::rgb(0.85, 0.85, 0.85),
                divider: Color::rgb(0.9, 0.9, 0.9),
                error: Color::rgb(0.8, 0.2, 0.2),
                warning: Color::rgb(0.7, 0.5, 0.1),
                info: Color::rgb(0.2, 0.4, 0.7),
                success: Color::rgb(0.3, 0.6, 0.3),
                tab_active: Color::rgb(1.0, 1.0, 1.0),
                tab_inactive: Color::rgb(0.95, 0.95, 0.95),
                status_bar: Color::rgb(0.97, 0.97, 0.97),
                terminal_background: Color::rgb(0.98, 0.98, 0.98),
                terminal_foreground: Color::rgb(0.15, 0.15, 0.15),
            },
        }
    }

    /// All built-in themes, in picker order.
    pub fn builtin() -> Vec<Theme> {
        vec![Theme::dark(), Theme::light()]
    }

    /// Resolves a theme by id.
    pub fn by_id(id: &str) -> Option<Theme> {
        Theme::builtin().into_iter().find(|t| t.id == id)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
