// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use ratatui::{prelude::*, widgets::*};

use crate::tui::formatters::*;
use crate::tui::label::LabelSnapshot;
use crate::tui::layout::{calculate_layout, LayoutContext};
use crate::tui::tree::TreeMathHelper;

use crate::app::{App, AppState, ContentView, Focus};
use crate::config::default_config_path;
use crate::jenkins::client::JobInfo;
use crate::jenkins::RemoteLoader;
use crate::theme;

static APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_ROWS: &[(&str, &[(&str, &str)])] = &[
    (
        "global",
        &[
            ("back / dismiss", "Esc"),
            ("toggle help", "?"),
            ("search", "Ctrl+K"),
            ("refresh", "r"),
            ("quit", "q"),
        ],
    ),
    (
        "navigation",
        &[
            ("navigate", "↑ ↓"),
            ("toggle folder", "← →"),
            ("select", "Enter"),
        ],
    ),
    (
        "search",
        &[
            ("next suggestion", "Tab"),
            ("accept suggestion", "→"),
            ("go to job", "Enter"),
        ],
    ),
];

pub fn draw<L: RemoteLoader>(f: &mut Frame, app: &App<L>) {
    let app_state = &app.app_state;
    let area = f.area();
    let ctx = LayoutContext::new(area, app_state, app.settings.sidebar_width);
    let plan = calculate_layout(area, &ctx);

    if let Some(search_area) = plan.search {
        draw_search_bar(f, app_state, search_area);
    }
    draw_tree(f, app, plan.tree);
    if plan.warning_message.is_none() {
        draw_content(f, app, plan.content);
    }
    draw_footer(f, app_state, plan.warning_message.as_deref(), plan.footer);

    if app_state.show_help {
        draw_help_popup(f);
    }
}

fn draw_search_bar(f: &mut Frame, app_state: &AppState, area: Rect) {
    let search = &app_state.search;
    let line = Line::from(vec![
        Span::styled(search.value.clone(), Style::default().fg(theme::TEXT)),
        Span::styled("▏", Style::default().fg(theme::MAUVE)),
        Span::styled(
            search.ghost_text(),
            Style::default().fg(theme::GREEN).add_modifier(Modifier::DIM),
        ),
    ]);
    let block = Block::default()
        .title(" 🔍 search ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::MAUVE));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_tree<L: RemoteLoader>(f: &mut Frame, app: &App<L>, area: Rect) {
    let app_state = &app.app_state;
    let has_focus = app_state.focus == Focus::Tree && !app_state.search.active;
    let border_color = if has_focus {
        theme::MAUVE
    } else {
        theme::SURFACE2
    };
    let block = Block::default()
        .title(Span::styled(" jobs ", Style::default().fg(theme::PEACH)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let height = inner.height as usize;
    app_state.tree_height.set(height);

    let store = app.navigator.store();
    let items = TreeMathHelper::get_visible_slice(store, &app_state.tree, height);
    let mut labels = app_state.labels.borrow_mut();
    let width = inner.width as usize;
    let lines: Vec<Line> = items
        .iter()
        .map(|item| {
            let snapshot = LabelSnapshot::of(
                item.node,
                item.is_cursor,
                has_focus,
                app.navigator.is_loading(item.node.id),
            );
            let mut line = labels.line(snapshot);
            let guide = tree_guide(item.depth, item.is_last);
            line.spans.insert(
                0,
                Span::styled(
                    truncate_with_ellipsis(&guide, width),
                    Style::default().fg(theme::SURFACE2),
                ),
            );
            line
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_content<L: RemoteLoader>(f: &mut Frame, app: &App<L>, area: Rect) {
    let app_state = &app.app_state;
    let border_color = if app_state.focus == Focus::Content {
        theme::MAUVE
    } else {
        theme::SURFACE2
    };

    let (title, lines) = match &app_state.content {
        ContentView::Home => (" home ".to_string(), home_lines(app)),
        ContentView::Job {
            name, url, info, ..
        } => (format!(" {} ", name), job_lines(url, info.as_ref())),
    };

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(theme::PEACH).bold()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn home_lines<L: RemoteLoader>(app: &App<L>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            "Jenkins",
            Style::default().fg(theme::BLUE).bold(),
        )),
        Line::from(""),
        field_line("Server", app.settings.url.clone()),
    ];
    match &app.app_state.server_info {
        Some(info) => {
            lines.push(field_line("Version", info.version.clone()));
            if !info.description.is_empty() {
                lines.push(field_line("Description", strip_html(&info.description)));
            }
        }
        None => lines.push(field_line("Version", "connecting…".to_string())),
    }
    let jobs = app.navigator.store().len().saturating_sub(1);
    lines.push(field_line("Items loaded", jobs.to_string()));
    lines.push(field_line(
        "Searchable",
        app.navigator.index().len().to_string(),
    ));
    lines
}

fn job_lines(url: &str, info: Option<&JobInfo>) -> Vec<Line<'static>> {
    let mut lines = vec![field_line("URL", url.to_string())];
    let Some(info) = info else {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Loading…",
            Style::default().fg(theme::YELLOW).italic(),
        )));
        return lines;
    };

    lines.push(field_line("Name", info.display_name.clone()));
    if let Some(description) = info.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(field_line("Description", strip_html(description)));
    }
    if !info.health_report.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Health",
            Style::default().fg(theme::GREEN).bold(),
        )));
        for report in &info.health_report {
            lines.push(Line::from(vec![
                Span::styled("  • ", Style::default().fg(theme::SURFACE2)),
                Span::styled(report.description.clone(), Style::default().fg(theme::TEXT)),
            ]));
        }
    }
    lines
}

fn field_line(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", name), Style::default().fg(theme::TEXT)),
        Span::styled(value, Style::default().fg(theme::SUBTEXT0)),
    ])
}

fn draw_footer(f: &mut Frame, app_state: &AppState, warning: Option<&str>, footer_chunk: Rect) {
    let line = if let Some(error) = &app_state.system_error {
        Line::from(vec![
            Span::styled(error.clone(), Style::default().fg(theme::RED).bold()),
            Span::styled("  [Esc to dismiss]", Style::default().fg(theme::SUBTEXT1)),
        ])
    } else if let Some(warning) = warning {
        Line::from(Span::styled(warning.to_string(), Style::default().fg(theme::YELLOW)))
    } else {
        Line::from(vec![
            Span::styled(
                format!("jenkins-tui v{}", APP_VERSION),
                Style::default().fg(theme::SUBTEXT1),
            ),
            Span::styled(" | ", Style::default().fg(theme::SURFACE2)),
            Span::styled("?", Style::default().fg(theme::PEACH).bold()),
            Span::styled(" help  ", Style::default().fg(theme::SUBTEXT0)),
            Span::styled("Ctrl+K", Style::default().fg(theme::PEACH).bold()),
            Span::styled(" search  ", Style::default().fg(theme::SUBTEXT0)),
            Span::styled("r", Style::default().fg(theme::PEACH).bold()),
            Span::styled(" refresh  ", Style::default().fg(theme::SUBTEXT0)),
            Span::styled("q", Style::default().fg(theme::PEACH).bold()),
            Span::styled(" quit", Style::default().fg(theme::SUBTEXT0)),
        ])
    };
    f.render_widget(Paragraph::new(line), footer_chunk);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(50, 70, f.area());
    f.render_widget(Clear, area);

    let chunks = Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).split(area);

    let mut rows = Vec::new();
    for (category, shortcuts) in HELP_ROWS {
        rows.push(Row::new(vec![Cell::from(Span::styled(
            *category,
            Style::default().fg(theme::GREEN).bold(),
        ))]));
        for (action, key) in shortcuts.iter() {
            rows.push(Row::new(vec![
                Cell::from(Span::styled(*action, Style::default().fg(theme::SUBTEXT0))),
                Cell::from(Span::styled(*key, Style::default().fg(theme::PEACH).bold())),
            ]));
        }
        rows.push(Row::new(vec![Cell::from("")]));
    }
    let table = Table::new(rows, [Constraint::Percentage(60), Constraint::Percentage(40)]).block(
        Block::default()
            .title(" help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::MAUVE)),
    );
    f.render_widget(table, chunks[0]);

    let config_path_str = default_config_path()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown location".to_string());
    let footer_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::SURFACE2));
    let footer_inner_area = footer_block.inner(chunks[1]);
    f.render_widget(footer_block, chunks[1]);
    let footer_line = Line::from(vec![
        Span::styled("Settings: ", Style::default().fg(theme::TEXT)),
        Span::styled(
            truncate_with_ellipsis(
                &config_path_str,
                (footer_inner_area.width as usize).saturating_sub(10),
            ),
            Style::default().fg(theme::SUBTEXT0),
        ),
    ]);
    f.render_widget(Paragraph::new(footer_line), footer_inner_area);
}
