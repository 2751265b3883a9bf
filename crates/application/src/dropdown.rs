//! Selector option lists for the search form.

use bookconnect_core::{IdNameMap, Selection};

pub const ALL_GENRES_LABEL: &str = "All Genres";
pub const ALL_AUTHORS_LABEL: &str = "All Authors";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<K> {
    pub value: Selection<K>,
    pub label: String,
}

impl<K: AsRef<str>> SelectOption<K> {
    pub fn value_str(&self) -> &str {
        self.value.as_value()
    }
}

/// The "any" sentinel first, then one option per map entry in map order.
pub fn build_options<K: Clone>(map: &IdNameMap<K>, default_label: &str) -> Vec<SelectOption<K>> {
    let mut options = Vec::with_capacity(map.len() + 1);
    options.push(SelectOption {
        value: Selection::Any,
        label: default_label.to_string(),
    });
    options.extend(map.iter().map(|(id, name)| SelectOption {
        value: Selection::Only(id.clone()),
        label: name.to_string(),
    }));
    options
}

/// A live selector holding an attached option batch and the chosen entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select<K> {
    options: Vec<SelectOption<K>>,
    selected: usize,
}

impl<K> Default for Select<K> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            selected: 0,
        }
    }
}

impl<K: Clone> Select<K> {
    pub fn attach(&mut self, batch: Vec<SelectOption<K>>) {
        self.options.extend(batch);
    }

    pub fn options(&self) -> &[SelectOption<K>] {
        &self.options
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&SelectOption<K>> {
        self.options.get(self.selected)
    }

    /// Current value; an empty selector reads as "any".
    pub fn value(&self) -> Selection<K> {
        self.selected()
            .map(|option| option.value.clone())
            .unwrap_or_default()
    }

    pub fn select(&mut self, idx: usize) {
        if idx < self.options.len() {
            self.selected = idx;
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.options.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}
