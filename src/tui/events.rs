// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::app::{App, Focus};
use crate::jenkins::RemoteLoader;
use crate::tui::tree::{TreeAction, TreeCommand, TreeMathHelper};

use ratatui::crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

pub fn handle_event<L: RemoteLoader>(event: CrosstermEvent, app: &mut App<L>) {
    match event {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, app),
        CrosstermEvent::Resize(..) => app.app_state.ui_needs_redraw = true,
        _ => {}
    }
}

fn handle_key<L: RemoteLoader>(key: KeyEvent, app: &mut App<L>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        app.app_state.should_quit = true;
        return;
    }
    app.app_state.ui_needs_redraw = true;

    if app.app_state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            app.app_state.show_help = false;
        }
        return;
    }

    if ctrl && key.code == KeyCode::Char('k') {
        if app.app_state.search.active {
            app.app_state.search.close();
        } else {
            app.app_state.search.open();
        }
        return;
    }

    if app.app_state.search.active {
        handle_search_key(key, app);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.app_state.should_quit = true,
        KeyCode::Char('?') => app.app_state.show_help = true,
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Esc => {
            if app.app_state.system_error.is_some() {
                app.app_state.system_error = None;
            } else {
                app.app_state.focus = Focus::Tree;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => apply_tree_action(app, TreeAction::Up),
        KeyCode::Down | KeyCode::Char('j') => apply_tree_action(app, TreeAction::Down),
        KeyCode::Left | KeyCode::Char('h') => apply_tree_action(app, TreeAction::Left),
        KeyCode::Right | KeyCode::Char('l') => apply_tree_action(app, TreeAction::Right),
        KeyCode::Enter => apply_tree_action(app, TreeAction::Activate),
        _ => {}
    }
}

fn handle_search_key<L: RemoteLoader>(key: KeyEvent, app: &mut App<L>) {
    if key.code == KeyCode::Enter {
        app.submit_search();
        return;
    }

    let search = &mut app.app_state.search;
    let index = app.navigator.index_mut();
    match key.code {
        KeyCode::Esc => search.close(),
        KeyCode::Backspace => search.backspace(index),
        KeyCode::Tab => search.next_prediction(index),
        KeyCode::Right => {
            search.accept_prediction();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => search.push(c, index),
        _ => {}
    }
}

fn apply_tree_action<L: RemoteLoader>(app: &mut App<L>, action: TreeAction) {
    app.app_state.focus = Focus::Tree;
    let height = app.app_state.tree_height.get();
    let command = TreeMathHelper::apply_action(
        &mut app.app_state.tree,
        app.navigator.store(),
        action,
        height,
    );
    if let TreeCommand::Activate(id) = command {
        app.activate(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ContentView;
    use crate::config::Settings;
    use crate::jenkins::JenkinsClient;
    use crate::navigator::testing::{folder, job, MockLoader};

    async fn loaded_app(loader: &MockLoader) -> App<MockLoader> {
        let settings = Settings {
            url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        };
        let client = JenkinsClient::new(&settings).unwrap();
        let mut app = App::with_loader(settings, client, loader.clone());
        let root = app.navigator.root();
        app.navigator.ensure_loaded(root).await.unwrap();
        app.app_state.tree_height.set(20);
        app
    }

    fn press(app: &mut App<MockLoader>, code: KeyCode) {
        handle_event(CrosstermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)), app);
    }

    fn ctrl(app: &mut App<MockLoader>, c: char) {
        handle_event(
            CrosstermEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)),
            app,
        );
    }

    fn type_text(app: &mut App<MockLoader>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_arrows_walk_and_expand_the_tree() {
        let loader = MockLoader::new();
        loader.respond(None, vec![folder("infra", vec![job("terraform")])]);
        let mut app = loaded_app(&loader).await;
        let infra = app.navigator.store().find_by_name("infra").unwrap();

        press(&mut app, KeyCode::Down);
        assert_eq!(app.app_state.tree.cursor, Some(infra));

        press(&mut app, KeyCode::Right);
        assert!(app.navigator.store().get(infra).unwrap().expanded);

        press(&mut app, KeyCode::Right);
        let terraform = app.navigator.store().find_by_name("infra/terraform").unwrap();
        assert_eq!(app.app_state.tree.cursor, Some(terraform));

        press(&mut app, KeyCode::Enter);
        assert!(matches!(&app.app_state.content, ContentView::Job { node, .. } if *node == terraform));

        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert!(!app.navigator.store().get(infra).unwrap().expanded);
    }

    #[tokio::test]
    async fn test_search_keys_complete_and_submit() {
        let loader = MockLoader::new();
        loader.respond(None, vec![folder("teamA", vec![job("build-service")])]);
        let mut app = loaded_app(&loader).await;

        ctrl(&mut app, 'k');
        assert!(app.app_state.search.active);
        type_text(&mut app, "build-s");
        press(&mut app, KeyCode::Right);
        assert_eq!(app.app_state.search.value, "teama/build-service");

        press(&mut app, KeyCode::Enter);
        let target = app.navigator.store().find_by_name("teamA/build-service").unwrap();
        assert!(!app.app_state.search.active);
        assert_eq!(app.app_state.tree.cursor, Some(target));
    }

    #[tokio::test]
    async fn test_q_types_into_search_but_quits_outside() {
        let loader = MockLoader::new();
        let mut app = loaded_app(&loader).await;

        ctrl(&mut app, 'k');
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.app_state.should_quit);
        assert_eq!(app.app_state.search.value, "q");

        press(&mut app, KeyCode::Esc);
        assert!(!app.app_state.search.active);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.app_state.should_quit);
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("a")]);
        let mut app = loaded_app(&loader).await;

        press(&mut app, KeyCode::Char('?'));
        assert!(app.app_state.show_help);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.app_state.tree.cursor, None);

        press(&mut app, KeyCode::Esc);
        assert!(!app.app_state.show_help);
    }

    #[tokio::test]
    async fn test_refresh_key_reloads_root() {
        let loader = MockLoader::new();
        loader.respond(None, vec![job("a")]);
        let mut app = loaded_app(&loader).await;
        press(&mut app, KeyCode::Down);

        press(&mut app, KeyCode::Char('r'));

        assert_eq!(app.app_state.tree.cursor, None);
        assert!(app.navigator.store().find_by_name("a").is_none());
        assert!(app.navigator.is_loading(app.navigator.root()));
    }
}
