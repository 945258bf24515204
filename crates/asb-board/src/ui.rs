use crate::state::{App, Page};
use crate::theme;
use asb_core::platform;
use asb_core::schedule::SchedulerPhase;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &mut App) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    match app.page {
        Page::Board => render_board(f, app, chunks[1]),
        Page::Alerts => render_alerts(f, app, chunks[1]),
        Page::Learnings => render_learnings(f, app, chunks[1]),
    }
    render_footer(f, app, chunks[2]);

    if app.show_help {
        render_help(f, area);
    }
    if app.palette_open {
        render_palette(f, app, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();
    for (idx, page) in [Page::Board, Page::Alerts, Page::Learnings].iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
        }
        let style = if *page == app.page {
            theme::SELECTED_STYLE
        } else {
            theme::DIM_STYLE
        };
        spans.push(Span::styled(format!(" {} ", page.label()), style));
    }

    spans.push(Span::raw("   "));
    spans.push(refresh_indicator(app));

    if app.sounds.is_muted() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("muted", theme::DIM_STYLE));
    }
    if let Some(signal) = app.last_signal {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("last change: {}", signal.as_str()),
            theme::DIM_STYLE,
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Agent Status Board")
        .border_style(theme::HEADER_STYLE);
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn refresh_indicator(app: &App) -> Span<'static> {
    if app.scheduler.is_flashing() {
        return Span::styled("refreshed", theme::FLASH_STYLE);
    }
    let state = app.scheduler.state();
    match state.phase {
        SchedulerPhase::Paused => Span::styled("paused", theme::PAUSED_STYLE),
        SchedulerPhase::Active => Span::raw(format!("next refresh in {}s", state.countdown)),
        SchedulerPhase::Inactive => Span::styled("auto-refresh off", theme::DIM_STYLE),
    }
}

fn render_board(f: &mut Frame, app: &mut App, area: Rect) {
    let features = app
        .feed
        .as_ref()
        .map(|feed| feed.features.as_slice())
        .unwrap_or(&[]);
    if features.is_empty() {
        render_empty(f, app, area, "Features", "No features in feed");
        return;
    }

    let rows: Vec<Row> = features
        .iter()
        .enumerate()
        .map(|(idx, feature)| {
            let color = theme::status_color(feature.status);
            Row::new(vec![
                Cell::from(Span::styled(
                    theme::status_icon(feature.status),
                    Style::default().fg(color),
                )),
                Cell::from(feature.id.clone()),
                Cell::from(feature.name.clone()),
                Cell::from(Span::styled(
                    feature.status.as_str(),
                    Style::default().fg(color),
                )),
                Cell::from(feature.owner.clone().unwrap_or_default()),
                Cell::from(feature.updated_at.clone().unwrap_or_default()),
            ])
            .style(theme::zebra_row_style(idx))
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(20),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["", "ID", "Feature", "Status", "Owner", "Updated"]).style(theme::HEADER_STYLE))
        .block(Block::default().borders(Borders::ALL).title("Features"))
        .highlight_style(theme::SELECTED_STYLE);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_alerts(f: &mut Frame, app: &mut App, area: Rect) {
    let alerts = app
        .feed
        .as_ref()
        .map(|feed| feed.alerts.as_slice())
        .unwrap_or(&[]);
    if alerts.is_empty() {
        render_empty(f, app, area, "Alerts", "No alerts in feed");
        return;
    }

    let rows: Vec<Row> = alerts
        .iter()
        .enumerate()
        .map(|(idx, alert)| {
            let color = theme::severity_color(alert.severity);
            Row::new(vec![
                Cell::from(Span::styled(
                    alert.severity.as_str(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )),
                Cell::from(alert.id.clone()),
                Cell::from(alert.message.clone()),
            ])
            .style(theme::zebra_row_style(idx))
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Severity", "ID", "Message"]).style(theme::HEADER_STYLE))
        .block(Block::default().borders(Borders::ALL).title("Alerts"))
        .highlight_style(theme::SELECTED_STYLE);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_learnings(f: &mut Frame, app: &mut App, area: Rect) {
    let learnings = app
        .feed
        .as_ref()
        .map(|feed| feed.learnings.as_slice())
        .unwrap_or(&[]);
    if learnings.is_empty() {
        render_empty(f, app, area, "Learnings", "No learnings in feed");
        return;
    }

    let rows: Vec<Row> = learnings
        .iter()
        .enumerate()
        .map(|(idx, learning)| {
            Row::new(vec![
                Cell::from(learning.id.clone()),
                Cell::from(learning.title.clone()),
                Cell::from(learning.summary.clone()),
            ])
            .style(theme::zebra_row_style(idx))
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(30),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["ID", "Title", "Summary"]).style(theme::HEADER_STYLE))
        .block(Block::default().borders(Borders::ALL).title("Learnings"))
        .highlight_style(theme::SELECTED_STYLE);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn render_empty(f: &mut Frame, app: &App, area: Rect, title: &str, fallback: &str) {
    let message = app
        .last_error
        .clone()
        .unwrap_or_else(|| fallback.to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let text = vec![
        Line::from(Span::styled(message, Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(format!("feed: {}", app.paths.feed_path.display())),
        Line::from(""),
        Line::from("Press r to retry, q to quit."),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let shortcut = platform::palette_shortcut_label(app.platform);
    let hints = format!(
        "{shortcut} palette | Tab page | j/k move | r refresh | p pause | m mute | ? help | q quit"
    );
    f.render_widget(Paragraph::new(hints).style(theme::DIM_STYLE), area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 50, 70);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("j / Down", Color::Cyan),
            Span::raw("   Next row"),
        ]),
        Line::from(vec![
            Span::styled("k / Up", Color::Cyan),
            Span::raw("     Previous row"),
        ]),
        Line::from(vec![
            Span::styled("Tab", Color::Cyan),
            Span::raw("        Next page"),
        ]),
        Line::from(vec![
            Span::styled("1 / 2 / 3", Color::Cyan),
            Span::raw("  Board / Alerts / Learnings"),
        ]),
        Line::from(vec![
            Span::styled("Ctrl+K", Color::Cyan),
            Span::raw("     Command palette"),
        ]),
        Line::from(vec![
            Span::styled("r", Color::Cyan),
            Span::raw("          Refresh now"),
        ]),
        Line::from(vec![
            Span::styled("p", Color::Cyan),
            Span::raw("          Pause/resume auto-refresh"),
        ]),
        Line::from(vec![
            Span::styled("m", Color::Cyan),
            Span::raw("          Mute/unmute sounds"),
        ]),
        Line::from(vec![
            Span::styled("?", Color::Cyan),
            Span::raw("          Toggle help"),
        ]),
        Line::from(vec![
            Span::styled("q", Color::Cyan),
            Span::raw("          Quit"),
        ]),
    ];
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn render_palette(f: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(area, 60, 60);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            "Go to ({})",
            platform::palette_shortcut_label(app.platform)
        ))
        .border_style(theme::HEADER_STYLE);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    f.render_widget(
        Paragraph::new(format!("> {}", app.palette_query)),
        chunks[0],
    );

    let matches = app.palette_matches();
    if matches.is_empty() {
        f.render_widget(
            Paragraph::new("No matches").style(theme::DIM_STYLE),
            chunks[1],
        );
        return;
    }

    let lines: Vec<Line> = matches
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let style = if idx == app.palette_selected {
                theme::SELECTED_STYLE
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(
                    format!("{:<9}", entry.kind.label()),
                    Style::default().fg(Color::Rgb(131, 165, 152)),
                ),
                Span::styled(entry.label.clone(), style),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[1]);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
