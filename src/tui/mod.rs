// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod events;
pub mod formatters;
pub mod label;
pub mod layout;
pub mod search_bar;
pub mod tree;
pub mod view;

pub use view::draw;
