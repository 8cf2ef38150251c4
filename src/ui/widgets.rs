//! Custom TUI widgets

use super::theme::ThemeColors;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// How a result row should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Good,
    Warning,
    Poor,
    Info,
}

/// One labelled value in a results panel
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub label: String,
    pub value: String,
    pub status: RowStatus,
}

impl ResultRow {
    pub fn info(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, RowStatus::Info)
    }

    pub fn new(label: impl Into<String>, value: impl Into<String>, status: RowStatus) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            status,
        }
    }

    /// Row for a 0-100 score, coloured by performance tier
    pub fn score(label: impl Into<String>, score: f64) -> Self {
        let status = match score {
            s if s.is_nan() => RowStatus::Info,
            s if s >= 75.0 => RowStatus::Good,
            s if s >= 60.0 => RowStatus::Warning,
            _ => RowStatus::Poor,
        };
        let value = if score.is_nan() {
            "n/a".to_string()
        } else {
            format!("{:.1}%", score)
        };
        Self::new(label, value, status)
    }
}

/// Widget for displaying result rows
pub struct ResultsPanel<'a> {
    rows: &'a [ResultRow],
    title: &'a str,
    colors: ThemeColors,
}

impl<'a> ResultsPanel<'a> {
    pub fn new(rows: &'a [ResultRow], title: &'a str, colors: ThemeColors) -> Self {
        Self {
            rows,
            title,
            colors,
        }
    }

    fn status_style(&self, status: RowStatus) -> (Style, &'static str) {
        let (color, symbol) = match status {
            RowStatus::Good => (self.colors.green, "[OK]"),
            RowStatus::Warning => (self.colors.yellow, "[!!]"),
            RowStatus::Poor => (self.colors.red, "[XX]"),
            RowStatus::Info => (self.colors.cyan, "[--]"),
        };
        (Style::default().fg(color), symbol)
    }
}

impl<'a> Widget for ResultsPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.dim));

        let inner = block.inner(area);
        block.render(area, buf);

        for (row, y) in self.rows.iter().zip(inner.y..inner.y + inner.height) {
            let (style, symbol) = self.status_style(row.status);
            let line = Line::from(vec![
                Span::styled(format!("{} ", symbol), style),
                Span::styled(
                    format!("{}: ", row.label),
                    Style::default()
                        .fg(self.colors.fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(row.value.as_str(), style),
            ]);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

/// What the stimulus surface currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusView {
    Instructions {
        title: String,
        description: String,
        controls: String,
    },
    Countdown(u32),
    /// Test running, nothing on screen
    Blank,
    Stimulus(String),
    Finished {
        score: f64,
        level: &'static str,
    },
}

/// Centre panel where stimuli appear
pub struct StimulusPanel {
    view: StimulusView,
    colors: ThemeColors,
}

impl StimulusPanel {
    pub fn new(view: StimulusView, colors: ThemeColors) -> Self {
        Self { view, colors }
    }

    fn centered(buf: &mut Buffer, area: Rect, y: u16, text: &str, style: Style) {
        if y >= area.y + area.height {
            return;
        }
        let width = text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(width) / 2;
        buf.set_stringn(x, y, text, area.width as usize, style);
    }
}

impl Widget for StimulusPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.dim));
        let inner = block.inner(area);
        block.render(area, buf);

        let mid = inner.y + inner.height / 2;
        let bold = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);

        match &self.view {
            StimulusView::Instructions {
                title,
                description,
                controls,
            } => {
                let top = mid.saturating_sub(1);
                let text = Style::default().fg(self.colors.fg);
                let hint = Style::default().fg(self.colors.dim);
                Self::centered(buf, inner, top, title, bold(self.colors.cyan));
                Self::centered(buf, inner, top + 1, description, text);
                Self::centered(buf, inner, top + 3, controls, hint);
                Self::centered(buf, inner, top + 4, "Press Enter to begin", hint);
            }
            StimulusView::Countdown(n) => {
                Self::centered(buf, inner, mid, &n.to_string(), bold(self.colors.countdown));
            }
            StimulusView::Blank => {
                Self::centered(buf, inner, mid, "+", Style::default().fg(self.colors.dim));
            }
            StimulusView::Stimulus(text) => {
                Self::centered(buf, inner, mid, text, bold(self.colors.stimulus));
            }
            StimulusView::Finished { score, level } => {
                let headline = if score.is_nan() {
                    "No scorable trials".to_string()
                } else {
                    format!("{:.1}%  {}", score, level)
                };
                let color = if score.is_nan() {
                    self.colors.dim
                } else {
                    self.colors.score_color(*score)
                };
                Self::centered(buf, inner, mid, &headline, bold(color));
                Self::centered(
                    buf,
                    inner,
                    mid + 2,
                    "Enter: continue   r: retake",
                    Style::default().fg(self.colors.dim),
                );
            }
        }
    }
}

/// Widget for the help screen
pub struct HelpPanel {
    colors: ThemeColors,
}

impl HelpPanel {
    pub fn new(colors: ThemeColors) -> Self {
        Self { colors }
    }
}

impl Widget for HelpPanel {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Help - Cognitive TestKit")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.colors.cyan));

        let inner = block.inner(area);
        block.render(area, buf);

        let help_text = [
            "",
            " NAVIGATION",
            " -----------",
            " Tab / Shift+Tab  : Switch between views",
            " 1-6              : Jump to specific view",
            " q / Esc          : Quit application",
            "",
            " CONTROLS",
            " -----------",
            " Enter            : Start test / continue after results",
            " Space            : Respond (SART, N-back, PVT)",
            " Left / Right     : Respond (Flanker)",
            " Mouse click      : Respond on the stimulus panel",
            " r                : Reset current test",
            " n / s            : New individual / sequential session",
            " e                : Export report to JSON",
            " ?                : Show this help",
            "",
            " TESTS",
            " -----------",
            " SART             : Respond to every digit except the no-go digit",
            " Flanker          : Press the arrow matching the centre arrow",
            " N-back           : Respond when the letter matches n steps back",
            " PVT              : Respond as soon as the counter appears",
        ];

        for (line, y) in help_text.iter().zip(inner.y..inner.y + inner.height) {
            let style = if line.contains("---") {
                Style::default().fg(self.colors.dim)
            } else if line.trim_start().starts_with(|c: char| c.is_uppercase())
                && !line.contains(':')
            {
                Style::default()
                    .fg(self.colors.yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.colors.fg)
            };
            buf.set_string(inner.x, y, line, style);
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    phase: &'a str,
    view: &'a str,
    elapsed: &'a str,
    completed: usize,
    message: Option<&'a str>,
    colors: ThemeColors,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        phase: &'a str,
        view: &'a str,
        elapsed: &'a str,
        completed: usize,
        colors: ThemeColors,
    ) -> Self {
        Self {
            phase,
            view,
            elapsed,
            completed,
            message: None,
            colors,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }
}

impl<'a> Widget for StatusBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg_style = Style::default().bg(self.colors.bar).fg(self.colors.fg);
        for x in area.x..area.x + area.width {
            buf.set_string(x, area.y, " ", bg_style);
        }

        let left = format!(" {} | {} ", self.phase.to_uppercase(), self.view);
        buf.set_string(area.x, area.y, &left, bg_style.add_modifier(Modifier::BOLD));

        if let Some(msg) = self.message {
            let msg_style = bg_style.fg(self.colors.yellow);
            let msg_x = area.x + (area.width / 2).saturating_sub(msg.len() as u16 / 2);
            buf.set_string(msg_x, area.y, msg, msg_style);
        }

        let right = format!(" {} | Completed: {}/4 ", self.elapsed, self.completed);
        let right_x = area.x + area.width.saturating_sub(right.len() as u16);
        buf.set_string(right_x, area.y, &right, bg_style);
    }
}

/// Tab bar widget
pub struct TabBar<'a> {
    tabs: &'a [&'a str],
    selected: usize,
    colors: ThemeColors,
}

impl<'a> TabBar<'a> {
    pub fn new(tabs: &'a [&'a str], selected: usize, colors: ThemeColors) -> Self {
        Self {
            tabs,
            selected,
            colors,
        }
    }
}

impl<'a> Widget for TabBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut x = area.x;
        let bar = Style::default().fg(self.colors.fg).bg(self.colors.bar);

        for (i, tab) in self.tabs.iter().enumerate() {
            let style = if i == self.selected {
                Style::default()
                    .fg(self.colors.bg)
                    .bg(self.colors.cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                bar
            };

            let label = format!(" {} ", tab);
            let width = label.len() as u16;
            if x + width > area.x + area.width {
                break;
            }
            buf.set_string(x, area.y, &label, style);
            x += width;

            if i + 1 < self.tabs.len() && x < area.x + area.width {
                buf.set_string(x, area.y, "|", bar.fg(self.colors.dim));
                x += 1;
            }
        }

        for fill_x in x..area.x + area.width {
            buf.set_string(fill_x, area.y, " ", bar);
        }
    }
}
