use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use repomirror_core::dashboard::SummaryCard;
use repomirror_core::utils::{format_date, format_storage, truncate_string};

use crate::app::App;
use crate::ui::styles;

/// Width of the text bars in the storage distribution panel
const STORAGE_BAR_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    // Vertical layout:
    // 1. Summary cards (four across)
    // 2. Backup history | Storage distribution (60/40)
    // 3. Recent activity
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Min(5),
        ])
        .split(area);

    render_cards(frame, app, main_chunks[0]);

    let chart_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_chunks[1]);

    render_backup_history(frame, app, chart_chunks[0]);
    render_storage_distribution(frame, app, chart_chunks[1]);
    render_activity(frame, app, main_chunks[2]);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (card, chunk) in app.dashboard.cards().iter().zip(chunks.iter()) {
        render_card(frame, card, app.dashboard.has_data(), *chunk);
    }
}

fn render_card(frame: &mut Frame, card: &SummaryCard, has_data: bool, area: Rect) {
    let value = if has_data { card.value.as_str() } else { "--" };

    let block = Block::default()
        .title(format!(" {} ", card.label))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!(" {}", value),
        styles::card_value_style(),
    )))
    .block(block);
    frame.render_widget(paragraph, area);
}

/// "2024-03-01" renders as "03-01" under its bar
fn short_date(date: &str) -> &str {
    if date.len() == 10 {
        date.get(5..).unwrap_or(date)
    } else {
        date
    }
}

fn render_backup_history(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(
            " Backups per day ({}) ",
            app.dashboard.stats.total_backups_in_history()
        ))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let series: Vec<(&str, u64)> = app
        .dashboard
        .backup_series()
        .into_iter()
        .map(|(date, count)| (short_date(date), count))
        .collect();

    if series.is_empty() {
        let paragraph = Paragraph::new(Span::styled(" No backup history yet", styles::muted_style()))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let chart = BarChart::default()
        .block(block)
        .data(series.as_slice())
        .bar_width(5)
        .bar_gap(1)
        .bar_style(styles::chart_bar_style())
        .value_style(styles::selected_style())
        .label_style(styles::muted_style());
    frame.render_widget(chart, area);
}

fn render_storage_distribution(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![];

    let series = app.dashboard.storage_series();
    let shares = app.dashboard.storage_shares();

    if shares.is_empty() {
        lines.push(Line::from(Span::styled(" No storage data", styles::muted_style())));
    }

    for ((kind, size), (_, percent)) in series.iter().zip(shares.iter()) {
        let filled = (*percent as usize * STORAGE_BAR_WIDTH) / 100;
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<8}", truncate_string(kind, 8)), styles::highlight_style()),
            Span::styled(format!(" {}", format_storage(*size)), styles::help_desc_style()),
            Span::styled(format!(" ({}%)", percent), styles::muted_style()),
        ]));
        lines.push(Line::from(vec![
            Span::raw(" "),
            Span::styled("█".repeat(filled), styles::chart_bar_style()),
            Span::styled("░".repeat(STORAGE_BAR_WIDTH - filled), styles::muted_style()),
        ]));
    }

    let block = Block::default()
        .title(" Storage distribution ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let activities = &app.dashboard.activities;
    let description_width = (area.width as usize).saturating_sub(40).max(10);

    let items: Vec<ListItem> = if activities.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            " No recent activity",
            styles::muted_style(),
        )))]
    } else {
        activities
            .iter()
            .map(|activity| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", activity.kind.icon()), styles::highlight_style()),
                    Span::styled(
                        format!("{:<width$}", truncate_string(&activity.description, description_width), width = description_width),
                        styles::list_item_style(),
                    ),
                    Span::styled(
                        format!(" {:<12}", activity.status.label()),
                        styles::activity_status_style(activity.status),
                    ),
                    Span::styled(format_date(Some(&activity.timestamp)), styles::muted_style()),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Recent activity ({}) ", activities.len()))
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true)),
    );
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_date() {
        assert_eq!(short_date("2024-03-01"), "03-01");
        assert_eq!(short_date("Mon"), "Mon");
    }
}
