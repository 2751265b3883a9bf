//! Day/night colour variables.

use std::fmt;

use bookconnect_core::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTriple(pub u8, pub u8, pub u8);

pub const INK: ColorTriple = ColorTriple(10, 10, 20);
pub const PAPER: ColorTriple = ColorTriple(255, 255, 255);

impl fmt::Display for ColorTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.0, self.1, self.2)
    }
}

/// The two colour variables the visual layer reads. `color_dark` is the
/// foreground, `color_light` the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeVars {
    pub color_dark: ColorTriple,
    pub color_light: ColorTriple,
}

impl ThemeVars {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Night => Self {
                color_dark: PAPER,
                color_light: INK,
            },
            Theme::Day => Self {
                color_dark: INK,
                color_light: PAPER,
            },
        }
    }

    pub fn apply(&mut self, theme: Theme) {
        *self = Self::for_theme(theme);
    }
}

impl Default for ThemeVars {
    fn default() -> Self {
        Self::for_theme(Theme::Day)
    }
}
