use ratatui::style::{Color, Modifier, Style};

use repomirror_core::models::ActivityStatus;
use repomirror_core::notifications::NotificationKind;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn card_value_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

pub fn chart_bar_style() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn notification_style(kind: NotificationKind) -> Style {
    match kind {
        NotificationKind::Success => success_style(),
        NotificationKind::Error => error_style(),
        NotificationKind::Warning => highlight_style(),
        NotificationKind::Info => Style::default().fg(PRIMARY),
    }
}

pub fn activity_status_style(status: ActivityStatus) -> Style {
    match status {
        ActivityStatus::Success => success_style(),
        ActivityStatus::Error => error_style(),
        ActivityStatus::Pending | ActivityStatus::InProgress => highlight_style(),
        ActivityStatus::Unknown => muted_style(),
    }
}

/// Repository status strings come straight from the backend
pub fn repository_status_style(status: &str) -> Style {
    match status {
        "success" | "completed" | "ok" => success_style(),
        "error" | "failed" => error_style(),
        "pending" | "in_progress" | "running" => highlight_style(),
        _ => muted_style(),
    }
}
