// SPDX-FileCopyrightText: 2025 The jenkins-tui Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::navigator::SearchIndex;

/// Input state of the search bar. Completion works on the last space-separated word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBar {
    pub active: bool,
    pub value: String,
    pub current_prediction: String,
    pub last_word: String,
}

impl SearchBar {
    pub fn open(&mut self) {
        self.active = true;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn push(&mut self, c: char, index: &mut SearchIndex) {
        self.value.push(c);
        self.refresh_predictions(index);
    }

    pub fn backspace(&mut self, index: &mut SearchIndex) {
        self.value.pop();
        self.refresh_predictions(index);
    }

    /// Moves to the next candidate for the word being typed.
    pub fn next_prediction(&mut self, index: &mut SearchIndex) {
        if let Some(prediction) = index.cycle_prediction() {
            self.current_prediction = prediction.to_string();
        }
    }

    /// Replaces the word being typed with the current prediction.
    pub fn accept_prediction(&mut self) -> bool {
        if self.current_prediction.is_empty() || self.value.ends_with(' ') {
            return false;
        }
        self.value = replace_last(&self.value, &self.last_word, &self.current_prediction);
        self.last_word = self.current_prediction.clone();
        true
    }

    /// The greyed-out prediction shown after the cursor. A prefix match shows only the
    /// missing rest; any other match shows the whole key it would be replaced with.
    pub fn ghost_text(&self) -> String {
        if self.value.ends_with(' ') || self.current_prediction == self.last_word {
            return String::new();
        }
        match self.current_prediction.strip_prefix(self.last_word.as_str()) {
            Some(rest) => rest.to_string(),
            None => format!(" → {}", self.current_prediction),
        }
    }

    fn refresh_predictions(&mut self, index: &mut SearchIndex) {
        self.last_word = self.value.rsplit(' ').next().unwrap_or("").to_string();
        if self.last_word.is_empty() {
            self.current_prediction.clear();
            return;
        }
        let candidates = index.suggest(&self.last_word);
        if candidates.is_empty() {
            return;
        }
        self.next_prediction(index);
    }
}

/// Replaces the last occurrence of `old` in `text` with `new`.
pub fn replace_last(text: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return format!("{}{}", text, new);
    }
    match text.rfind(old) {
        Some(pos) => format!("{}{}{}", &text[..pos], new, &text[pos + old.len()..]),
        None => text.to_string(),
    }
}
