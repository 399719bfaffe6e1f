use std::hash::Hash;

use dashmap::DashMap;

/// Identity of a row style once colors are resolved by the sink.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StyleKey<C> {
    pub foreground: C,
    pub background: Option<C>,
    pub bold: bool,
}

/// Memoized style handles for one write operation.
///
/// The factory passed to [`StyleCache::get_or_create`] runs at most once per
/// key, also when several threads ask for the same key at the same time.
pub struct StyleCache<C, S> {
    styles: DashMap<StyleKey<C>, S>,
}

impl<C, S> StyleCache<C, S>
where
    C: Eq + Hash,
    S: Clone,
{
    pub fn new() -> Self {
        Self {
            styles: DashMap::new(),
        }
    }

    pub fn get_or_create<F>(&self, key: StyleKey<C>, factory: F) -> S
    where
        F: FnOnce() -> S,
    {
        if let Some(style) = self.styles.get(&key) {
            return style.value().clone();
        }
        // the entry holds the shard lock while the factory runs
        self.styles.entry(key).or_insert_with(factory).value().clone()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl<C, S> Default for StyleCache<C, S>
where
    C: Eq + Hash,
    S: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
