use asb_core::{AlertSeverity, FeatureStatus};
use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Rgb(142, 192, 124))
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(131, 165, 152))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const FLASH_STYLE: Style = Style::new()
    .fg(Color::Rgb(184, 187, 38))
    .add_modifier(Modifier::BOLD);
pub const PAUSED_STYLE: Style = Style::new().fg(Color::Rgb(250, 189, 47));
pub const DIM_STYLE: Style = Style::new().fg(Color::Rgb(146, 131, 116));

pub fn zebra_row_style(index: usize) -> Style {
    let bg = if index % 2 == 0 {
        Color::Rgb(18, 20, 26)
    } else {
        Color::Rgb(24, 27, 34)
    };
    Style::new().bg(bg)
}

pub fn status_color(status: FeatureStatus) -> Color {
    match status {
        FeatureStatus::Completed => Color::Rgb(184, 187, 38),
        FeatureStatus::InProgress => Color::Rgb(131, 165, 152),
        FeatureStatus::Blocked => Color::Rgb(254, 128, 25),
        FeatureStatus::Open => Color::Rgb(146, 131, 116),
    }
}

pub fn status_icon(status: FeatureStatus) -> &'static str {
    match status {
        FeatureStatus::Completed => icons::COMPLETED,
        FeatureStatus::InProgress => icons::IN_PROGRESS,
        FeatureStatus::Blocked => icons::BLOCKED,
        FeatureStatus::Open => icons::OPEN,
    }
}

pub fn severity_color(severity: AlertSeverity) -> Color {
    match severity {
        AlertSeverity::Critical => Color::Rgb(254, 128, 25),
        AlertSeverity::Warning => Color::Rgb(250, 189, 47),
        AlertSeverity::Info => Color::Rgb(131, 165, 152),
    }
}

pub mod icons {
    pub const COMPLETED: &str = "x";
    pub const OPEN: &str = ".";
    pub const IN_PROGRESS: &str = ">";
    pub const BLOCKED: &str = "!";
}
