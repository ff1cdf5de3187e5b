use ratatui::widgets::{ListItem, ListState, ScrollbarState};
use std::collections::VecDeque;

/// A bounded list drawn bottom-to-top, newest item first, with a scrollbar.
pub struct ScrollableList {
    max_items: usize,
    pub list_items: VecDeque<ListItem<'static>>,
    pub list_state: ListState,
    pub scroll_state: ScrollbarState,
}

impl ScrollableList {
    pub fn new(max_items: usize) -> Self {
        Self {
            max_items,
            list_items: VecDeque::with_capacity(max_items),
            list_state: ListState::default(),
            scroll_state: ScrollbarState::default(),
        }
    }

    pub fn clear(&mut self) {
        self.list_items.clear();
        self.list_state.select(None);
        self.scroll_state = ScrollbarState::default();
    }

    /// Add an item; the oldest one falls off once the list is full.
    pub fn push(&mut self, item: ListItem<'static>) {
        if self.list_items.len() == self.max_items {
            self.list_items.pop_back();
        }
        self.list_items.push_front(item);
        self.scroll_state = self.scroll_state.content_length(self.list_items.len());
        self.jump_to_last();
    }

    /// Oldest item, drawn at the top.
    pub fn jump_to_first(&mut self) {
        if let Some(last) = self.list_items.len().checked_sub(1) {
            self.select(last);
        }
    }

    /// Newest item, drawn at the bottom.
    pub fn jump_to_last(&mut self) {
        if !self.list_items.is_empty() {
            self.select(0);
        }
    }

    pub fn move_up(&mut self) {
        let next = self.list_state.selected().map_or(0, |idx| idx + 1);
        if next < self.list_items.len() {
            self.select(next);
        }
    }

    pub fn move_down(&mut self) {
        if let Some(idx) = self.list_state.selected().and_then(|idx| idx.checked_sub(1)) {
            self.select(idx);
        }
    }

    fn select(&mut self, idx: usize) {
        self.list_state.select(Some(idx));
        // The scrollbar counts from the top, the list from the bottom.
        let position = self.list_items.len().saturating_sub(idx + 1);
        self.scroll_state = self.scroll_state.position(position);
    }
}

/// Single-line text input with a character cursor.
#[derive(Debug, Default)]
pub struct UserInput {
    pub value: String,
    pub char_idx: usize,
}

impl UserInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn byte_idx(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.char_idx)
            .map_or(self.value.len(), |(idx, _)| idx)
    }

    pub fn input(&mut self, c: char) {
        let idx = self.byte_idx();
        self.value.insert(idx, c);
        self.char_idx += 1;
    }

    pub fn backspace(&mut self) {
        if self.char_idx > 0 {
            self.char_idx -= 1;
            let idx = self.byte_idx();
            self.value.remove(idx);
        }
    }

    pub fn delete(&mut self) {
        if self.char_idx < self.value.chars().count() {
            let idx = self.byte_idx();
            self.value.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.char_idx = self.char_idx.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.char_idx = (self.char_idx + 1).min(self.value.chars().count());
    }

    pub fn jump_to_first(&mut self) {
        self.char_idx = 0;
    }

    pub fn jump_to_last(&mut self) {
        self.char_idx = self.value.chars().count();
    }

    /// Take the current value and reset the input.
    pub fn submit(&mut self) -> String {
        self.char_idx = 0;
        std::mem::take(&mut self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === UserInput ===

    #[test]
    fn test_input_edits_at_cursor() {
        let mut input = UserInput::new();
        for c in "lgin".chars() {
            input.input(c);
        }
        input.jump_to_first();
        input.move_right();
        input.input('o');
        assert_eq!(input.value, "login");
        assert_eq!(input.char_idx, 2);

        input.jump_to_last();
        input.backspace();
        assert_eq!(input.value, "logi");
        input.jump_to_first();
        input.delete();
        assert_eq!(input.value, "ogi");
    }

    #[test]
    fn test_input_handles_multibyte_chars() {
        let mut input = UserInput::new();
        for c in "café".chars() {
            input.input(c);
        }
        input.backspace();
        assert_eq!(input.value, "caf");
        input.move_left();
        input.input('é');
        assert_eq!(input.value, "caéf");
    }

    #[test]
    fn test_submit_resets() {
        let mut input = UserInput::new();
        input.input('y');
        assert_eq!(input.submit(), "y");
        assert!(input.value.is_empty());
        assert_eq!(input.char_idx, 0);
    }

    // === ScrollableList ===

    #[test]
    fn test_list_is_bounded() {
        let mut list = ScrollableList::new(2);
        for text in ["a", "b", "c"] {
            list.push(ListItem::new(text));
        }
        assert_eq!(list.list_items.len(), 2);
        assert_eq!(list.list_state.selected(), Some(0));
    }

    #[test]
    fn test_list_navigation_stays_in_range() {
        let mut list = ScrollableList::new(8);
        list.move_up();
        assert_eq!(list.list_state.selected(), None);

        for text in ["a", "b", "c"] {
            list.push(ListItem::new(text));
        }
        list.move_up();
        list.move_up();
        list.move_up();
        assert_eq!(list.list_state.selected(), Some(2));
        list.move_down();
        assert_eq!(list.list_state.selected(), Some(1));
        list.jump_to_last();
        list.move_down();
        assert_eq!(list.list_state.selected(), Some(0));
    }
}
