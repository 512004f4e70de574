use crate::compiler::branch::BranchTargetHandle;

/// One slot in a compiled word's thread.  Either a plain label — a runtime primitive like `exit`
/// or `lit`, another word's assembly label, or a literal's already-rendered payload text — or a
/// handle to a branch target whose final `*+N` / `*-N` form isn't known until the surrounding
/// control structure closes.
#[derive(Clone)]
pub enum ThreadCell {
    Label(String),
    Branch(BranchTargetHandle),
}

impl ThreadCell {
    fn render(&self) -> String {
        match self {
            ThreadCell::Label(text) => format!(" dta a({})\n", text),
            ThreadCell::Branch(target) => format!(" dta a({})\n", target.text()),
        }
    }

    /// The cell's content alone, with no `dta a(...)` wrapper — used by `--dump`'s per-word
    /// thread listing, and safe to call on an unresolved branch target (unlike `render`).
    fn describe(&self) -> String {
        match self {
            ThreadCell::Label(text) => text.clone(),
            ThreadCell::Branch(target) if target.is_resolved() => target.text(),
            ThreadCell::Branch(_) => "<unresolved>".to_string(),
        }
    }
}

/// Accumulates the thread cells for a single word as its body is compiled, tracking the
/// instruction-pointer index (`ip`) that branch targets are anchored against.
#[derive(Clone, Default)]
pub struct ThreadBuilder {
    cells: Vec<ThreadCell>,
}

impl ThreadBuilder {
    pub fn new() -> ThreadBuilder {
        ThreadBuilder { cells: Vec::new() }
    }

    /// The index the *next* appended cell will occupy.  Used both as a backward-branch target
    /// (captured by `begin`/`do`) and as the resolution point for a forward branch (captured by
    /// `then`/`repeat`/the end of a `do` loop).
    pub fn ip(&self) -> usize {
        self.cells.len()
    }

    pub fn push_label(&mut self, text: impl Into<String>) {
        self.cells.push(ThreadCell::Label(text.into()));
    }

    /// Append a placeholder cell for a branch target and return its handle, anchored at the ip
    /// that will follow this cell.
    pub fn push_branch(&mut self) -> BranchTargetHandle {
        let handle = crate::compiler::branch::BranchTarget::new(self.cells.len() + 1);
        self.cells.push(ThreadCell::Branch(handle.clone()));
        handle
    }

    pub fn cells(&self) -> &[ThreadCell] {
        &self.cells
    }
}

/// An output fragment produced while compiling.  Items are created in source order and appended
/// to a single ordered list that drives both dictionary lookups (via separate name index) and,
/// later, sectioned rendering.  Dead items are never removed — they're simply skipped at render
/// time via their `used` flag.
pub enum Item {
    /// A verbatim assembly fragment bound to a single section.
    RawCode { text: String, section: String },

    /// A named numeric constant.  Its text-section rendering defines a dictionary entry that
    /// pushes the value; its data-section rendering defines the literal `equ`.
    Constant {
        label: String,
        const_label: String,
        /// The value's source-text form (e.g. `"$230"`), preserved verbatim for rendering rather
        /// than normalized to decimal, so `$230 constant dladr` renders as `dladr equ $230`.
        value_text: String,
        text_section: String,
        data_section: String,
        used: bool,
    },

    /// A named, possibly sized, storage location.  `size_cells == 0` means a bare label at the
    /// current program counter (`create`).
    Variable {
        label: String,
        var_label: String,
        size_cells: usize,
        text_section: String,
        data_section: String,
        used: bool,
    },

    /// A compiled (or inline-assembly) word.
    Word {
        name: String,
        label: String,
        section: String,
        thread: ThreadBuilder,
        referenced_names: Vec<String>,
        inline_code: Option<String>,
        recursive: bool,
        used: bool,
    },
}

impl Item {
    pub fn mark_used(&mut self) {
        match self {
            Item::Constant { used, .. } => *used = true,
            Item::Variable { used, .. } => *used = true,
            Item::Word { used, .. } => *used = true,
            Item::RawCode { .. } => {}
        }
    }

    pub fn is_used(&self) -> bool {
        match self {
            Item::Constant { used, .. } => *used,
            Item::Variable { used, .. } => *used,
            Item::Word { used, .. } => *used,
            Item::RawCode { .. } => true,
        }
    }

    pub fn referenced_names(&self) -> &[String] {
        match self {
            Item::Word {
                referenced_names, ..
            } => referenced_names,
            _ => &[],
        }
    }

    /// A one-line `name (label): cell, cell, ...` summary for `--dump`, or `None` for an item
    /// that isn't a used `Word` (there's nothing interesting to say about a dead item, and
    /// constants/variables don't have a thread).
    pub fn dump_thread(&self) -> Option<String> {
        match self {
            Item::Word {
                name,
                label,
                thread,
                inline_code,
                used,
                ..
            } => {
                if !used {
                    return None;
                }
                if inline_code.is_some() {
                    return Some(format!("{} ({}): <inline assembly>", name, label));
                }
                let cells: Vec<String> = thread.cells().iter().map(ThreadCell::describe).collect();
                Some(format!("{} ({}): {}", name, label, cells.join(", ")))
            }
            _ => None,
        }
    }

    /// Render this item's contribution to `section`.  An item whose `used` flag is false, or
    /// whose bound section doesn't match, renders as empty text.
    pub fn render(&self, section: &str) -> String {
        match self {
            Item::RawCode { text, section: s } => {
                if s == section {
                    text.clone()
                } else {
                    String::new()
                }
            }

            Item::Constant {
                label,
                const_label,
                value_text,
                text_section,
                data_section,
                used,
            } => {
                if !used {
                    String::new()
                } else if section == text_section {
                    format!("{}\n dta a(const),a({})\n", const_label, label)
                } else if section == data_section {
                    format!("{} equ {}\n", label, value_text)
                } else {
                    String::new()
                }
            }

            Item::Variable {
                label,
                var_label,
                size_cells,
                text_section,
                data_section,
                used,
            } => {
                if !used {
                    String::new()
                } else if section == text_section {
                    format!("{}\n dta a(variable),a({})\n", var_label, label)
                } else if section == data_section {
                    if *size_cells > 0 {
                        format!("{} equ *\n org *+{}\n", label, size_cells * 2)
                    } else {
                        format!("{} equ *\n", label)
                    }
                } else {
                    String::new()
                }
            }

            Item::Word {
                label,
                section: word_section,
                thread,
                inline_code,
                used,
                ..
            } => {
                if !used || section != word_section {
                    return String::new();
                }

                match inline_code {
                    Some(body) => format!("{}\n dta a(*+2)\n{}", label, body),
                    None => {
                        let mut rendered = format!("{}\n", label);
                        for cell in thread.cells() {
                            rendered.push_str(&cell.render());
                        }
                        rendered
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_word_renders_empty() {
        let mut thread = ThreadBuilder::new();
        thread.push_label("exit");

        let item = Item::Word {
            name: "unused".into(),
            label: "unused".into(),
            section: "text".into(),
            thread,
            referenced_names: Vec::new(),
            inline_code: None,
            recursive: false,
            used: false,
        };

        assert_eq!(item.render("text"), "");
    }

    #[test]
    fn used_word_renders_its_thread() {
        let mut thread = ThreadBuilder::new();
        thread.push_label("enter");
        thread.push_label("exit");

        let item = Item::Word {
            name: "main".into(),
            label: "main".into(),
            section: "text".into(),
            thread,
            referenced_names: Vec::new(),
            inline_code: None,
            recursive: false,
            used: true,
        };

        assert_eq!(item.render("text"), "main\n dta a(enter)\n dta a(exit)\n");
        assert_eq!(item.render("data"), "");
    }

    #[test]
    fn constant_renders_in_both_sections() {
        let item = Item::Constant {
            label: "dladr".into(),
            const_label: "const_dladr".into(),
            value_text: "$230".into(),
            text_section: "text".into(),
            data_section: "data".into(),
            used: true,
        };

        assert_eq!(
            item.render("text"),
            "const_dladr\n dta a(const),a(dladr)\n"
        );
        assert_eq!(item.render("data"), "dladr equ $230\n");
    }
}
