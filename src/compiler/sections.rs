use crate::compiler::item::Item;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Ordered list of section names the emitted assembly is organized into, plus a cursor for
/// sections referenced by `[text-section]`/`[data-section]` that weren't named on the command
/// line — those are appended after the requested order, in the order they're first seen, so
/// referencing an unlisted section doesn't silently drop its contents.
pub struct Sections {
    requested: Vec<String>,
    extra: Vec<String>,
    known: HashSet<String>,
}

impl Sections {
    pub fn new(requested: Vec<String>) -> Sections {
        let known = requested.iter().cloned().collect();
        Sections {
            requested,
            extra: Vec::new(),
            known,
        }
    }

    /// Make sure `name` will be emitted, adding it to the tail of the order if it hasn't been
    /// seen before.
    pub fn note(&mut self, name: &str) {
        if self.known.insert(name.to_string()) {
            self.extra.push(name.to_string());
        }
    }

    pub fn order(&self) -> impl Iterator<Item = &String> {
        self.requested.iter().chain(self.extra.iter())
    }
}

/// Render the full assembly text: each section in order, introduced by `"; section <name>"`,
/// containing the in-source-order rendering of every item bound to it, separated from the next
/// section by a blank line.
pub fn render(sections: &Sections, items: &[Rc<RefCell<Item>>]) -> String {
    let mut output = String::new();

    for (index, name) in sections.order().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        output.push_str(&format!("; section {}\n", name));

        for item in items {
            output.push_str(&item.borrow().render(name));
        }
    }

    output
}
