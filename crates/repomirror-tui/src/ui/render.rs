use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use repomirror_core::utils::{format_date, truncate_string};

use crate::app::{App, AppState, LoginFocus, UserMenuItem, View};

use super::styles;
use super::tabs::{dashboard, repositories};

/// Width of the notification stack in the top-right corner
const NOTIFICATION_WIDTH: u16 = 44;

/// Maximum notifications drawn at once
const MAX_VISIBLE_NOTIFICATIONS: usize = 4;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ShowingSecurity => render_security_overlay(frame, app),
        AppState::ShowingUserMenu => render_user_menu(frame, app, chunks[0]),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }

    render_notifications(frame, app);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  RepoMirror";

    let (badge, badge_style) = if app.security.is_secure {
        ("● secure", styles::success_style())
    } else {
        ("▲ insecure", styles::error_style())
    };
    let user_label = match app.user {
        Some(ref user) => format!("[m] {}", user.initials()),
        None => "[m] --".to_string(),
    };
    let right = format!("{}  {}  [?] Help", badge, user_label);

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + right.chars().count() + 2),
        )),
        Span::styled(badge, badge_style),
        Span::styled(format!("  {}  [?] Help", user_label), styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, view) in View::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        if *view == app.current_view {
            spans.push(Span::styled(view.tab_label(), styles::tab_style(true)));
        } else {
            spans.push(Span::styled(view.tab_label(), styles::muted_style()));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_view {
        View::Dashboard => dashboard::render(frame, app, area),
        View::Repositories => repositories::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = format!(" Updated {} ", app.last_updated);
    let right_text = " [u]pdate | [s]ecurity | [m]enu | [q]uit ";

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(50, 21, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  RepoMirror", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-2", "Switch views"),
        help_line("←/→", "Previous/next view"),
        help_line("↑/↓", "Navigate list"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_line("u", "Update current view"),
        help_line("s", "Security status"),
        help_line("m", "User menu"),
        help_line("x", "Dismiss notification"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_security_overlay(frame: &mut Frame, app: &App) {
    let warnings = &app.security.warnings;
    let height = (warnings.len() as u16 * 3 + 7).clamp(9, 24);
    let area = centered_rect_fixed(60, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from(Span::styled(
        format!(" Last check: {}", format_date(app.security.last_check.as_deref())),
        styles::muted_style(),
    ))];
    lines.push(Line::from(""));

    if warnings.is_empty() {
        lines.push(Line::from(Span::styled(
            " No security problems detected.",
            styles::success_style(),
        )));
    } else {
        for warning in warnings {
            lines.push(Line::from(Span::styled(
                format!(" ⚠ {}", warning.title),
                styles::error_style(),
            )));
            lines.push(Line::from(Span::styled(
                format!("   {}", warning.message),
                styles::help_desc_style(),
            )));
            lines.push(Line::from(""));
        }
    }

    lines.push(Line::from(vec![
        Span::styled(" Press ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(" Security Status ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Drop-down anchored under the user label on the title bar
fn render_user_menu(frame: &mut Frame, app: &App, title_area: Rect) {
    let width = 30;
    let height = UserMenuItem::ALL.len() as u16 + 4;
    let x = title_area.right().saturating_sub(width + 10);
    let area = Rect::new(x, title_area.bottom(), width, height).intersection(frame.area());
    frame.render_widget(Clear, area);

    let mut lines = Vec::new();
    if let Some(ref user) = app.user {
        lines.push(Line::from(Span::styled(
            format!(" {}", truncate_string(&user.username, 26)),
            styles::highlight_style(),
        )));
    }
    lines.push(Line::from(""));

    for (i, item) in UserMenuItem::ALL.iter().enumerate() {
        let style = if i == app.user_menu_selection {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        lines.push(Line::from(Span::styled(format!(" {:<27}", item.label()), style)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    // Fixed size dialog - compact
    let height = if app.login_error.is_some() { 11 } else { 9 };
    let area = centered_rect_fixed(46, height, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled("  Sign in to RepoMirror", styles::title_style())),
        Line::from(""),
    ];

    // Username field
    let username_focused = app.login_focus == LoginFocus::Username;
    let username_style = if username_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let username_display = format!("{:<16}", truncate_string(&app.login_username, 16));
    let cursor = if username_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Username: [", styles::muted_style()),
        Span::styled(format!("{}{}", username_display, cursor), username_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Password field
    let password_focused = app.login_focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let password_masked: String = "*".repeat(app.login_password.chars().count().min(16));
    let password_display = format!("{:<16}", password_masked);
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("      "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(format!("{}{}", password_display, cursor), password_style),
        Span::styled("]", styles::muted_style()),
    ]));

    // Login button
    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let button_label = if button_focused { " ▶ Login ◀ " } else { "   Login   " };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("            ["),
        Span::styled(button_label, button_style),
        Span::raw("]"),
    ]));

    // Error message
    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Newest notifications stacked down the top-right corner
fn render_notifications(frame: &mut Frame, app: &App) {
    let screen = frame.area();
    let width = NOTIFICATION_WIDTH.min(screen.width);
    let x = screen.right().saturating_sub(width + 1);
    let mut y = screen.y + 1;

    let visible: Vec<_> = app.notifications.iter().collect();
    let skip = visible.len().saturating_sub(MAX_VISIBLE_NOTIFICATIONS);

    for notification in visible.into_iter().skip(skip) {
        let area = Rect::new(x, y, width, 4).intersection(screen);
        if area.height < 3 {
            break;
        }
        frame.render_widget(Clear, area);

        let style = styles::notification_style(notification.kind);
        let block = Block::default()
            .title(format!(" {} {} ", notification.kind.icon(), notification.title))
            .title_style(style)
            .borders(Borders::ALL)
            .border_style(style);
        let paragraph = Paragraph::new(Line::from(Span::styled(
            notification.message.clone(),
            styles::help_desc_style(),
        )))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        y = y.saturating_add(area.height);
    }
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fixed() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect_fixed(46, 10, outer);
        assert_eq!(inner, Rect::new(27, 15, 46, 10));
    }

    #[test]
    fn test_centered_rect_clamps_to_parent() {
        let outer = Rect::new(0, 0, 30, 8);
        let inner = centered_rect_fixed(46, 10, outer);
        assert_eq!(inner.width, 30);
        assert_eq!(inner.height, 8);
    }
}
