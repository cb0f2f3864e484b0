use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use repomirror_core::utils::format_date;

use crate::app::App;
use crate::ui::styles;

/// Render the Repositories view - one row per mirrored repository
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Repositories ({}) ", app.repositories.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.repositories.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            " No repositories yet. Press [u] to refresh.",
            styles::muted_style(),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("URL"),
        Cell::from("Last backup"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = app
        .repositories
        .iter()
        .enumerate()
        .map(|(i, repo)| {
            let style = if i == app.repository_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new([
                Cell::from(repo.name.clone()),
                Cell::from(Span::styled(repo.url.clone(), styles::muted_style())),
                Cell::from(format_date(repo.last_backup.as_deref())),
                Cell::from(Span::styled(
                    repo.status.clone(),
                    styles::repository_status_style(&repo.status),
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(25),
        Constraint::Percentage(40),
        Constraint::Length(20),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.repository_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
