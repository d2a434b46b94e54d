use std::collections::HashMap;

use ratatui::style::Color;
use serde::de::{value, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
    HighContrast,
}

/// Reads a theme name, falling back to [`ThemeName::Dark`] for names this build does not know.
pub fn deserialize_theme<'de, D>(deserializer: D) -> Result<ThemeName, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let parsed: Result<ThemeName, value::Error> = ThemeName::deserialize(raw.as_str().into_deserializer());
    Ok(parsed.unwrap_or_else(|_| {
        tracing::warn!(theme = %raw, "unknown theme in config, falling back to dark");
        ThemeName::Dark
    }))
}

/// Colors the renderer pulls from; one per theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub highlight: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub success: Color,
    pub error: Color,
    pub fruta: Color,
    pub legume: Color,
    pub verdura: Color,
}

impl Palette {
    pub fn category_color(&self, categoria: &str) -> Color {
        match categoria {
            "Fruta" => self.fruta,
            "Legume" => self.legume,
            "Verdura" => self.verdura,
            _ => self.muted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    palettes: HashMap<ThemeName, Palette>,
}

impl ThemeRegistry {
    pub fn contains(&self, theme: &ThemeName) -> bool {
        self.palettes.contains_key(theme)
    }

    pub fn palette(&self, theme: ThemeName) -> Palette {
        self.palettes
            .get(&theme)
            .or_else(|| self.palettes.get(&ThemeName::Dark))
            .copied()
            .unwrap_or(DARK)
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let palettes = [
            (ThemeName::Dark, DARK),
            (ThemeName::Light, LIGHT),
            (ThemeName::HighContrast, HIGH_CONTRAST),
        ]
        .into_iter()
        .collect();
        Self { palettes }
    }
}

const DARK: Palette = Palette {
    accent: Color::Green,
    text: Color::White,
    muted: Color::Gray,
    highlight: Color::Yellow,
    selection_bg: Color::Green,
    selection_fg: Color::Black,
    success: Color::LightGreen,
    error: Color::LightRed,
    fruta: Color::LightYellow,
    legume: Color::LightRed,
    verdura: Color::LightGreen,
};

const LIGHT: Palette = Palette {
    accent: Color::Blue,
    text: Color::Black,
    muted: Color::DarkGray,
    highlight: Color::Magenta,
    selection_bg: Color::LightBlue,
    selection_fg: Color::Black,
    success: Color::Green,
    error: Color::Red,
    fruta: Color::Yellow,
    legume: Color::Red,
    verdura: Color::Green,
};

const HIGH_CONTRAST: Palette = Palette {
    accent: Color::White,
    text: Color::White,
    muted: Color::White,
    highlight: Color::Yellow,
    selection_bg: Color::White,
    selection_fg: Color::Black,
    success: Color::White,
    error: Color::Yellow,
    fruta: Color::White,
    legume: Color::White,
    verdura: Color::White,
};
