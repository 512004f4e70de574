use crate::compiler::item::Item;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type ItemHandle = Rc<RefCell<Item>>;

/// A single entry in the dictionary: the name it was defined under and the item it resolves to.
struct Entry {
    name: String,
    item: ItemHandle,
}

/// The word dictionary.  Entries are inserted at the front, and lookup scans front-to-back, so a
/// redefinition shadows everything defined before it without disturbing the earlier entry — any
/// reference already resolved against the older definition keeps pointing at it, since compiled
/// references are snapshotted at compile time rather than re-looked-up.
///
/// A small alias table sits in front of the entry list: `cells`/`cell` alias to `2*`, and `not`
/// aliases to `0=`.
pub struct Dictionary {
    entries: Vec<Entry>,
    aliases: HashMap<String, String>,
}

impl Dictionary {
    pub fn new() -> Dictionary {
        let mut aliases = HashMap::new();
        aliases.insert("cells".to_string(), "2*".to_string());
        aliases.insert("cell".to_string(), "2*".to_string());
        aliases.insert("not".to_string(), "0=".to_string());

        Dictionary {
            entries: Vec::new(),
            aliases,
        }
    }

    /// Insert a newly defined item at the front of the dictionary, so it immediately shadows
    /// anything already defined under the same name.
    pub fn insert(&mut self, name: String, item: ItemHandle) {
        self.entries.insert(0, Entry { name, item });
    }

    /// Resolve aliases, then scan front-to-back for the first matching name.
    pub fn find(&self, name: &str) -> Option<ItemHandle> {
        let resolved = self.aliases.get(name).map(String::as_str).unwrap_or(name);

        self.entries
            .iter()
            .find(|entry| entry.name == resolved)
            .map(|entry| entry.item.clone())
    }

    /// Resolve the alias for `name`, if any — exposed for the `cells`/`cell`/`not` round-trip
    /// tests, which check that an aliased name and its target resolve to the same entry.
    pub fn resolve_alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}
