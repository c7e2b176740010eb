use serde::Serialize;

use crate::models::ClothingItem;

pub const MAX_SELECTION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Added,
    Removed,
    AtCapacity,
}

/// Ordered, de-duplicated set of chosen clothing items, never larger than
/// [`MAX_SELECTION`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    items: Vec<ClothingItem>,
}

impl SelectionSet {
    pub fn toggle(&mut self, item: &ClothingItem) -> Toggle {
        if let Some(pos) = self.items.iter().position(|i| i.id == item.id) {
            self.items.remove(pos);
            return Toggle::Removed;
        }
        if self.items.len() >= MAX_SELECTION {
            return Toggle::AtCapacity;
        }
        self.items.push(item.clone());
        Toggle::Added
    }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn items(&self) -> &[ClothingItem] { &self.items }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: &str) -> ClothingItem {
        ClothingItem { id: id.into(), name: id.to_uppercase(), src: format!("/clothes/{id}.jpg") }
    }

    fn ids(set: &SelectionSet) -> Vec<String> {
        set.items().iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn select_then_deselect_restores_order() {
        let mut set = SelectionSet::default();
        set.toggle(&item("a"));
        set.toggle(&item("b"));
        set.toggle(&item("c"));
        let before = set.clone();

        assert_eq!(set.toggle(&item("d")), Toggle::Added);
        assert_eq!(set.toggle(&item("d")), Toggle::Removed);
        assert_eq!(set, before);

        assert_eq!(set.toggle(&item("b")), Toggle::Removed);
        assert_eq!(ids(&set), vec!["a", "c"]);
    }

    #[test]
    fn fifth_item_is_refused() {
        let mut set = SelectionSet::default();
        for id in ["a", "b", "c", "d"] {
            assert_eq!(set.toggle(&item(id)), Toggle::Added);
        }
        let before = set.clone();
        assert_eq!(set.toggle(&item("e")), Toggle::AtCapacity);
        assert_eq!(set, before);
        assert_eq!(set.items().len(), MAX_SELECTION);

        // removing still works at the cap
        assert_eq!(set.toggle(&item("a")), Toggle::Removed);
        assert_eq!(set.toggle(&item("e")), Toggle::Added);
        assert_eq!(ids(&set), vec!["b", "c", "d", "e"]);
    }
}
