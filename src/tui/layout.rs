// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::app::AppState;
use ratatui::prelude::*;

pub const MIN_SIDEBAR_WIDTH: u16 = 20;
pub const SEARCH_HEIGHT: u16 = 3;

#[derive(Default, Debug, PartialEq)]
pub struct LayoutPlan {
    pub tree: Rect,
    pub content: Rect,
    pub footer: Rect,

    pub search: Option<Rect>,

    pub warning_message: Option<String>,
}

pub struct LayoutContext {
    pub width: u16,
    pub height: u16,
    pub sidebar_width: u16,
    pub searching: bool,
}

impl LayoutContext {
    pub fn new(area: Rect, app_state: &AppState, sidebar_width: u16) -> Self {
        Self {
            width: area.width,
            height: area.height,
            sidebar_width,
            searching: app_state.search.active,
        }
    }
}

pub fn calculate_layout(area: Rect, ctx: &LayoutContext) -> LayoutPlan {
    let mut plan = LayoutPlan::default();

    let main = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(area);
    plan.footer = main[1];

    if ctx.width < 40 || ctx.height < 10 {
        plan.tree = main[0];
        plan.warning_message = Some("Window too small".to_string());
        return plan;
    }

    // Never let the sidebar squeeze the content pane below half the screen.
    let sidebar_width = ctx
        .sidebar_width
        .max(MIN_SIDEBAR_WIDTH)
        .min(ctx.width / 2);
    let columns =
        Layout::horizontal([Constraint::Length(sidebar_width), Constraint::Min(0)]).split(main[0]);
    plan.content = columns[1];

    if ctx.searching {
        let sidebar =
            Layout::vertical([Constraint::Length(SEARCH_HEIGHT), Constraint::Min(0)]).split(columns[0]);
        plan.search = Some(sidebar[0]);
        plan.tree = sidebar[1];
    } else {
        plan.tree = columns[0];
    }

    plan
}
