//! Character-by-character reveal of a dialogue view's delta text.

use std::rc::Rc;

use tracing::trace;

use crate::dialogue::DialogueView;
use crate::store::{Store, TypewriterState};

/// Reveals `delta_text` one character at a time; `stable_text` is always
/// fully visible.
#[derive(Debug)]
pub struct Typewriter {
    view: Rc<DialogueView>,
    /// Byte offsets of every character boundary in the delta text.
    boundaries: Vec<usize>,
    revealed: usize,
    elapsed_ms: u64,
    store: Store<TypewriterState>,
}

impl Typewriter {
    pub fn new(view: Rc<DialogueView>, store: Store<TypewriterState>) -> Self {
        let boundaries = view
            .delta_text
            .char_indices()
            .map(|(index, _)| index)
            .skip(1)
            .chain(std::iter::once(view.delta_text.len()))
            .collect::<Vec<_>>();
        let typewriter = Self {
            view,
            boundaries,
            revealed: 0,
            elapsed_ms: 0,
            store,
        };
        if !typewriter.is_complete() {
            typewriter.store.update(|state| state.in_progress = true);
        }
        typewriter
    }

    /// Advances the animation clock; returns true once everything is shown.
    pub fn tick(&mut self, elapsed_ms: u64) -> bool {
        if self.is_complete() {
            return true;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        let delay = self.store.read(|state| state.delay_ms);
        let target = if delay == 0 {
            self.total_chars()
        } else {
            usize::try_from(self.elapsed_ms / delay).unwrap_or(usize::MAX)
        };
        self.revealed = target.min(self.total_chars());
        trace!(revealed = self.revealed, total = self.total_chars(), "typewriter tick");
        self.finish_if_complete()
    }

    /// Shows the rest of the line immediately.
    pub fn skip(&mut self) {
        self.revealed = self.total_chars();
        self.finish_if_complete();
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.total_chars()
    }

    pub fn revealed_delta(&self) -> &str {
        match self.revealed {
            0 => "",
            count => &self.view.delta_text[..self.boundaries[count - 1]],
        }
    }

    pub fn visible_text(&self) -> String {
        format!("{}{}", self.view.stable_text, self.revealed_delta())
    }

    fn total_chars(&self) -> usize {
        if self.view.delta_text.is_empty() {
            0
        } else {
            self.boundaries.len()
        }
    }

    fn finish_if_complete(&mut self) -> bool {
        let complete = self.is_complete();
        if complete && self.store.read(|state| state.in_progress) {
            self.store.update(|state| state.in_progress = false);
        }
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(stable: &str, delta: &str) -> Rc<DialogueView> {
        Rc::new(DialogueView {
            stable_text: stable.to_string(),
            delta_text: delta.to_string(),
            speaker: None,
        })
    }

    fn store(delay_ms: u64) -> Store<TypewriterState> {
        Store::new(TypewriterState {
            delay_ms,
            in_progress: false,
        })
    }

    #[test]
    fn reveals_one_character_per_delay() {
        let store = store(10);
        let mut typewriter = Typewriter::new(view("Hello", " you"), store.clone());
        assert!(store.get().in_progress);
        assert_eq!(typewriter.visible_text(), "Hello");

        assert!(!typewriter.tick(25));
        assert_eq!(typewriter.visible_text(), "Hello y");

        assert!(typewriter.tick(100));
        assert_eq!(typewriter.visible_text(), "Hello you");
        assert!(!store.get().in_progress);
    }

    #[test]
    fn multibyte_characters_are_not_split() {
        let mut typewriter = Typewriter::new(view("", "héllo"), store(5));
        typewriter.tick(10);
        assert_eq!(typewriter.revealed_delta(), "hé");
    }

    #[test]
    fn empty_delta_is_complete_without_animating() {
        let store = store(10);
        let seen = Rc::new(std::cell::Cell::new(0));
        let counter = Rc::clone(&seen);
        store.subscribe(move |_| counter.set(counter.get() + 1));

        let typewriter = Typewriter::new(view("Already shown", ""), store.clone());
        assert!(typewriter.is_complete());
        assert_eq!(typewriter.visible_text(), "Already shown");
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn skip_reveals_everything() {
        let store = store(50);
        let mut typewriter = Typewriter::new(view("", "A long line."), store.clone());
        typewriter.skip();
        assert!(typewriter.is_complete());
        assert_eq!(typewriter.visible_text(), "A long line.");
        assert!(!store.get().in_progress);
    }
}
