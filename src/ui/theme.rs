//! Theme color definitions for the UI
//!
//! Provides dark and light color palettes selected from the config.

use crate::config::Theme;
use ratatui::style::Color;

/// Complete color palette for the UI
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    /// Main background
    pub bg: Color,
    /// Primary foreground text
    pub fg: Color,
    /// Dimmed/secondary text
    pub dim: Color,
    /// Accent color (headings, active tab)
    pub cyan: Color,
    /// Good score / correct
    pub green: Color,
    /// Middling score
    pub yellow: Color,
    /// Poor score / error
    pub red: Color,
    /// Bar backgrounds (tabs, status)
    pub bar: Color,
    /// Stimulus text while a trial is visible
    pub stimulus: Color,
    /// Countdown digits
    pub countdown: Color,
}

impl ThemeColors {
    /// Create a color palette for the given theme variant
    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(22, 22, 30),
            fg: Color::Rgb(200, 200, 210),
            dim: Color::Rgb(90, 90, 110),
            cyan: Color::Rgb(80, 200, 220),
            green: Color::Rgb(80, 200, 120),
            yellow: Color::Rgb(240, 180, 80),
            red: Color::Rgb(240, 90, 100),
            bar: Color::Rgb(55, 55, 70),
            stimulus: Color::Rgb(245, 245, 250),
            countdown: Color::Rgb(240, 180, 80),
        }
    }

    /// High contrast for bright terminals
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(245, 245, 248),
            fg: Color::Rgb(30, 30, 40),
            dim: Color::Rgb(130, 130, 150),
            cyan: Color::Rgb(0, 130, 160),
            green: Color::Rgb(30, 150, 70),
            yellow: Color::Rgb(180, 120, 0),
            red: Color::Rgb(200, 50, 60),
            bar: Color::Rgb(200, 200, 212),
            stimulus: Color::Rgb(10, 10, 20),
            countdown: Color::Rgb(180, 120, 0),
        }
    }

    /// Color for a 0-100 score, following the performance tiers
    pub fn score_color(&self, score: f64) -> Color {
        match score {
            s if s >= 75.0 => self.green,
            s if s >= 60.0 => self.yellow,
            _ => self.red,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_theme_creates_palette() {
        let colors = ThemeColors::dark();
        assert_eq!(colors.bg, Color::Rgb(22, 22, 30));
        assert_eq!(colors.green, Color::Rgb(80, 200, 120));
    }

    #[test]
    fn from_theme_selects_correct_palette() {
        let dark = ThemeColors::from_theme(Theme::Dark);
        let light = ThemeColors::from_theme(Theme::Light);

        // Dark and light should have different backgrounds
        assert_ne!(dark.bg, light.bg);
    }

    #[test]
    fn score_color_follows_tiers() {
        let colors = ThemeColors::dark();
        assert_eq!(colors.score_color(90.0), colors.green);
        assert_eq!(colors.score_color(75.0), colors.green);
        assert_eq!(colors.score_color(60.0), colors.yellow);
        assert_eq!(colors.score_color(12.0), colors.red);
    }
}
