use crate::compiler::dictionary::{Dictionary, ItemHandle};
use crate::compiler::item::{Item, ThreadBuilder};
use crate::compiler::sections::Sections;
use crate::compiler::stack::{LeaveStack, OperandStack, StackValue};
use crate::error::{self, CompileError, ErrorKind};
use crate::lang::source_buffer::{Input, SourceLocation};
use crate::lang::token::{self, Token};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Classification of a dictionary lookup, decided from a short-lived immutable borrow so the
/// mutation (marking a constant or variable used) can happen afterwards without a borrow clash.
enum DictLookup {
    Constant(String),
    Variable,
    Word,
}

/// Which of the two states the compiler is currently in.  `Compile` always has a word open in
/// `compile_target`; `[` and `]` toggle between the two without disturbing which word is open,
/// only `;` actually closes one.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Interpret,
    Compile,
}

/// Runtime primitive labels the inner interpreter and base-words asset depend on by fixed name.
/// Reserved up front so a user word can never silently shadow one of them in the emitted assembly.
const RESERVED_LABELS: &[&str] = &[
    // Runtime kernel (`assets::runtime`).
    "next", "enter", "exit", "lit", "branch", "branch_if_zero", "_if", "until", "while", "do",
    "loop", "plus_loop", "unloop", "i_impl", "const", "variable", "loop_step",
    "push_pstack", "push_pstack_ax", "pop_pstack", "pstack_hi_tmp", "loop_index_hi_tmp",
    "loop_depth", "loop_index_lo", "loop_limit_lo", "start", "call_main", "rstack_top",
    "pstack_bottom", "pstack_size", "ip", "w", "rsp", "psp",
    // Base-words library (`assets::base_words`): `[label]`-assigned names and each primitive's
    // private scratch storage.
    "to_r", "r_from", "r_fetch", "two_dup", "plus", "minus", "star", "slash_mod", "slash",
    "equals", "less_than", "greater_than", "zero_equals", "zero_less", "one_plus", "one_minus",
    "two_star", "fetch", "store", "c_fetch", "c_store", "plus_store",
    "swap_tmp", "nip_tmp", "plus_tmp", "minus_tmp", "mul_a", "mul_b", "mul_result",
    "div_numer", "div_denom", "div_rem", "eq_tmp", "lt_tmp", "and_tmp", "or_tmp", "xor_tmp",
    "fetch_addr", "store_addr", "cfetch_addr", "cstore_addr",
];

/// Drives the whole front end: tokenizing, the interpret/compile state machine, the dictionary,
/// and the ordered item list.  One instance lives for the whole compilation, including the runtime
/// and base-words assets and every `[include]`d file.
pub struct Compiler {
    dictionary: Dictionary,
    items: Vec<ItemHandle>,
    operand_stack: OperandStack,
    leave_stack: LeaveStack,
    sections: Sections,
    text_section: String,
    data_section: String,
    mode: Mode,
    compile_target: Option<ItemHandle>,
    used_labels: HashSet<String>,
}

impl Compiler {
    pub fn new(section_order: Vec<String>) -> Compiler {
        let mut sections = Sections::new(section_order);
        sections.note("text");
        sections.note("data");

        Compiler {
            dictionary: Dictionary::new(),
            items: Vec::new(),
            operand_stack: OperandStack::new(),
            leave_stack: LeaveStack::new(),
            sections,
            text_section: "text".to_string(),
            data_section: "data".to_string(),
            mode: Mode::Interpret,
            compile_target: None,
            used_labels: RESERVED_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Compile `source` (named `path`, for diagnostics), resolving any `[include]` directives it
    /// contains relative to `base_dir`.  Recursion through this function is the include stack:
    /// each nested call owns its own `Input` over its own file, so returning from the call
    /// restores the caller's cursor automatically.
    pub fn compile_source(&mut self, path: &str, source: &str, base_dir: &Path) -> error::Result<()> {
        let mut input = Input::new(path, source);

        while let Some(token) = token::next_token(&mut input)? {
            match self.mode {
                Mode::Interpret => self.interpret_token(token, &mut input, base_dir)?,
                Mode::Compile => self.compile_token(token, &mut input)?,
            }
        }

        Ok(())
    }

    /// Verify the compile-time stack is empty, mark everything reachable from `main`, and render
    /// the final assembly text.
    pub fn finish(mut self) -> error::Result<String> {
        self.verify_and_mark()?;
        Ok(self.render())
    }

    /// The `StackNotEmpty` check and the reachability mark, without consuming `self` or
    /// rendering — split out so `--dump` can inspect the finalized `used` flags and thread cells
    /// before the item list is handed to [`Compiler::render`]/[`Compiler::finish`].
    pub fn verify_and_mark(&mut self) -> error::Result<()> {
        if !self.operand_stack.is_empty() {
            return Err(CompileError::new(None, ErrorKind::StackNotEmpty));
        }

        self.mark_reachable()
    }

    /// Render the final assembly text from the current item list and section order. Only
    /// meaningful after [`Compiler::verify_and_mark`] has run.
    pub fn render(&self) -> String {
        crate::compiler::sections::render(&self.sections, &self.items)
    }

    /// A `--dump` diagnostic: one line per used word, in source order, naming its thread cells.
    /// Must be called before [`Compiler::finish`] consumes `self`; reachability is already final
    /// by then since `mark_reachable` only flips `used` flags without touching the item list.
    pub fn dump_threads(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| item.borrow().dump_thread())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mark_reachable(&mut self) -> error::Result<()> {
        let main = self
            .dictionary
            .find("main")
            .ok_or_else(|| CompileError::new(None, ErrorKind::ParseError("No 'main' word defined.".to_string())))?;

        main.borrow_mut().mark_used();
        let mut worklist = vec!["main".to_string()];

        while let Some(name) = worklist.pop() {
            let Some(item) = self.dictionary.find(&name) else {
                continue;
            };

            let referenced = item.borrow().referenced_names().to_vec();
            for referenced_name in referenced {
                if let Some(target) = self.dictionary.find(&referenced_name) {
                    if !target.borrow().is_used() {
                        target.borrow_mut().mark_used();
                        worklist.push(referenced_name);
                    }
                }
            }
        }

        Ok(())
    }

    fn unique_label(&mut self, base: &str) -> String {
        if self.used_labels.insert(base.to_string()) {
            return base.to_string();
        }

        let mut suffix = 2;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if self.used_labels.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }

    fn push_item(&mut self, item: Item) -> ItemHandle {
        let handle = Rc::new(RefCell::new(item));
        self.items.push(handle.clone());
        handle
    }

    /// The label another word's thread should reference to invoke `item`, and whether that item
    /// is a `Word` (in which case the reference is tracked for reachability; constants and
    /// variables are marked used immediately instead, per their eager-marking rule).
    fn reference(&mut self, item: &ItemHandle) -> String {
        let mut borrowed = item.borrow_mut();
        match &mut *borrowed {
            Item::Constant { const_label, used, .. } => {
                *used = true;
                const_label.clone()
            }
            Item::Variable { var_label, used, .. } => {
                *used = true;
                var_label.clone()
            }
            Item::Word { label, .. } => label.clone(),
            Item::RawCode { .. } => unreachable!("RawCode items are never registered in the dictionary"),
        }
    }

    fn is_word(item: &ItemHandle) -> bool {
        matches!(&*item.borrow(), Item::Word { .. })
    }

    fn word_field<R>(&self, f: impl FnOnce(&mut String, &mut ThreadBuilder, &mut Vec<String>, &mut bool, &mut Option<String>) -> R) -> R {
        let target = self.compile_target.as_ref().expect("compile mode always has an open word");
        let mut borrowed = target.borrow_mut();
        match &mut *borrowed {
            Item::Word {
                label,
                thread,
                referenced_names,
                recursive,
                inline_code,
                ..
            } => f(label, thread, referenced_names, recursive, inline_code),
            _ => unreachable!("compile_target is always a Word"),
        }
    }

    fn current_word_name(&self) -> String {
        let target = self.compile_target.as_ref().expect("compile mode always has an open word");
        match &*target.borrow() {
            Item::Word { name, .. } => name.clone(),
            _ => unreachable!("compile_target is always a Word"),
        }
    }

    fn is_recursive(&self) -> bool {
        self.word_field(|_, _, _, recursive, _| *recursive)
    }

    // ---------------------------------------------------------------- interpret mode --------

    fn interpret_token(&mut self, token: Token, input: &mut Input, base_dir: &Path) -> error::Result<()> {
        let loc = token.location.clone();

        if token.is(":") {
            return self.begin_word(input);
        }

        if token.is("[include]") {
            return self.include_file(input, &loc, base_dir);
        }

        if token.is("[code]") {
            let body = self.read_code_block(input, &loc)?;
            self.sections.note(&self.text_section.clone());
            self.push_item(Item::RawCode {
                text: body,
                section: self.text_section.clone(),
            });
            return Ok(());
        }

        if token.is("[text-section]") {
            let name = self.read_name_token(input, &loc)?;
            self.text_section = name.clone();
            self.sections.note(&name);
            return Ok(());
        }

        if token.is("[data-section]") {
            let name = self.read_name_token(input, &loc)?;
            self.data_section = name.clone();
            self.sections.note(&name);
            return Ok(());
        }

        if token.is("variable") {
            return self.define_variable(input, &loc, 1);
        }

        if token.is("2variable") {
            return self.define_variable(input, &loc, 2);
        }

        if token.is("create") {
            return self.define_variable(input, &loc, 0);
        }

        if token.is("constant") {
            return self.define_constant(input, &loc);
        }

        if token.is(",") {
            let value = self.operand_stack.pop_value(&loc, ",")?;
            let text = value
                .literal_text()
                .ok_or_else(|| CompileError::new(Some(loc.clone()), ErrorKind::ParseError("',' requires a value.".to_string())))?;
            self.emit_data_raw(format!(" dta a({})\n", text));
            return Ok(());
        }

        if token.is("c,") {
            let value = self.operand_stack.pop_value(&loc, "c,")?;
            let text = value
                .literal_text()
                .ok_or_else(|| CompileError::new(Some(loc.clone()), ErrorKind::ParseError("'c,' requires a value.".to_string())))?;
            self.emit_data_raw(format!(" dta b({})\n", text));
            return Ok(());
        }

        if token.is(",\"") || token.is("\"") {
            let text = self.read_quoted(input, &loc, '"')?;
            let counted = token.is(",\"");
            let mut rendered = String::new();
            if counted {
                rendered.push_str(&format!(" dta b({})\n", text.len()));
            }
            rendered.push_str(&format!(" dta c(\"{}\")\n", text));
            self.emit_data_raw(rendered);
            return Ok(());
        }

        if token.is(",'") || token.is("'") {
            let (text, inverse) = self.read_antic_quoted(input, &loc)?;
            let counted = token.is(",'");
            let mut rendered = String::new();
            if counted {
                rendered.push_str(&format!(" dta b({})\n", text.len()));
            }
            if inverse {
                rendered.push_str(&format!(" dta f(+\"{}\")\n", text));
            } else {
                rendered.push_str(&format!(" dta f(\"{}\")\n", text));
            }
            self.emit_data_raw(rendered);
            return Ok(());
        }

        if token.is("allot") {
            let n = self.operand_stack.pop_int(&loc, "allot")?;
            self.emit_data_raw(format!(" org *+{}\n", n));
            return Ok(());
        }

        if token.is("+") || token.is("-") || token.is("*") || token.is("/") {
            let b = self.operand_stack.pop_int(&loc, &token.text)?;
            let a = self.operand_stack.pop_int(&loc, &token.text)?;
            let result = match token.text.as_str() {
                "+" => a + b,
                "-" => a - b,
                "*" => a * b,
                "/" => {
                    if b == 0 {
                        return Err(CompileError::new(Some(loc), ErrorKind::ParseError("Division by zero.".to_string())));
                    }
                    a.wrapping_div(b)
                }
                _ => unreachable!(),
            };
            self.operand_stack.push(StackValue::from_int(result));
            return Ok(());
        }

        if token.is("cells") {
            let a = self.operand_stack.pop_int(&loc, "cells")?;
            self.operand_stack.push(StackValue::from_int(a * 2));
            return Ok(());
        }

        if token.is("]") {
            if self.compile_target.is_none() {
                return error::parse_error(&loc, "']' with no word being defined.");
            }
            self.mode = Mode::Compile;
            return Ok(());
        }

        if let Some(value) = token::parse_number(&token.text) {
            self.operand_stack.push(StackValue::from_literal_text(value, token.text.clone()));
            return Ok(());
        }

        if let Some(item) = self.dictionary.find(&token.text) {
            let kind = {
                let borrowed = item.borrow();
                match &*borrowed {
                    Item::Constant { value_text, .. } => DictLookup::Constant(value_text.clone()),
                    Item::Variable { .. } => DictLookup::Variable,
                    Item::Word { .. } => DictLookup::Word,
                    Item::RawCode { .. } => unreachable!(),
                }
            };

            match kind {
                DictLookup::Constant(value_text) => {
                    let value = token::parse_number(&value_text).expect("constant value_text is always a valid literal");
                    item.borrow_mut().mark_used();
                    self.operand_stack.push(StackValue::from_literal_text(value, value_text));
                }
                DictLookup::Variable => {
                    item.borrow_mut().mark_used();
                    self.operand_stack.push(StackValue::Text(token.text.clone()));
                }
                DictLookup::Word => {
                    self.operand_stack.push(StackValue::Text(token.text.clone()));
                }
            }
            return Ok(());
        }

        Err(CompileError::new(Some(loc), ErrorKind::UnknownWord(token.text)))
    }

    fn begin_word(&mut self, input: &mut Input) -> error::Result<()> {
        let name_token = self.require_next_token(input)?;
        let label = self.unique_label(&token::canon(&name_token.text));

        // Every colon word's thread opens on the "enter" code field: `next` jumps through a
        // word's own first cell, and for a colon word that cell must point at the routine that
        // pushes a return address and dives into the thread that follows.
        let mut thread = ThreadBuilder::new();
        thread.push_label("enter");

        let item = Item::Word {
            name: name_token.text,
            label,
            section: self.text_section.clone(),
            thread,
            referenced_names: Vec::new(),
            inline_code: None,
            recursive: false,
            used: false,
        };

        self.sections.note(&self.text_section.clone());
        let handle = self.push_item(item);
        self.compile_target = Some(handle);
        self.mode = Mode::Compile;
        Ok(())
    }

    fn define_variable(&mut self, input: &mut Input, _loc: &SourceLocation, size_cells: usize) -> error::Result<()> {
        let name_token = self.require_next_token(input)?;
        let label = self.unique_label(&token::canon(&name_token.text));
        let var_label = format!("var_{}", label);

        let item = Item::Variable {
            label,
            var_label,
            size_cells,
            text_section: self.text_section.clone(),
            data_section: self.data_section.clone(),
            used: false,
        };

        self.sections.note(&self.text_section.clone());
        self.sections.note(&self.data_section.clone());
        let handle = self.push_item(item);
        self.dictionary.insert(name_token.text, handle);
        Ok(())
    }

    fn define_constant(&mut self, input: &mut Input, loc: &SourceLocation) -> error::Result<()> {
        let value = self.operand_stack.pop_value(loc, "constant")?;
        let (_, value_text) = match value {
            StackValue::Int { value, text } => (value, text),
            _ => {
                return error::parse_error(loc, "'constant' requires an integer value.");
            }
        };

        let name_token = self.require_next_token(input)?;
        let label = self.unique_label(&token::canon(&name_token.text));
        let const_label = format!("const_{}", label);

        let item = Item::Constant {
            label,
            const_label,
            value_text,
            text_section: self.text_section.clone(),
            data_section: self.data_section.clone(),
            used: false,
        };

        self.sections.note(&self.text_section.clone());
        self.sections.note(&self.data_section.clone());
        let handle = self.push_item(item);
        self.dictionary.insert(name_token.text, handle);
        Ok(())
    }

    fn include_file(&mut self, input: &mut Input, loc: &SourceLocation, base_dir: &Path) -> error::Result<()> {
        let name_token = self.require_next_token(input)?;
        let file_name = name_token.text.replace('"', "");
        let resolved = base_dir.join(&file_name);

        let contents = std::fs::read_to_string(&resolved)
            .map_err(|_| CompileError::new(Some(loc.clone()), ErrorKind::NoSuchFile(file_name.clone())))?;

        let nested_base = resolved.parent().map(Path::to_path_buf).unwrap_or_else(|| base_dir.to_path_buf());
        let path_text = resolved.to_string_lossy().into_owned();

        self.compile_source(&path_text, &contents, &nested_base)
    }

    fn emit_data_raw(&mut self, text: String) {
        self.sections.note(&self.data_section.clone());
        self.push_item(Item::RawCode {
            text,
            section: self.data_section.clone(),
        });
    }

    // ------------------------------------------------------------------ compile mode --------

    fn compile_token(&mut self, token: Token, input: &mut Input) -> error::Result<()> {
        let loc = token.location.clone();

        if token.is(";") {
            self.word_field(|_, thread, _, _, _| thread.push_label("exit"));
            let handle = self.compile_target.take().expect("compile mode always has an open word");
            let name = match &*handle.borrow() {
                Item::Word { name, .. } => name.clone(),
                _ => unreachable!(),
            };
            self.dictionary.insert(name, handle);
            self.mode = Mode::Interpret;
            return Ok(());
        }

        if token.is("recursive") {
            self.word_field(|_, _, _, recursive, _| *recursive = true);
            return Ok(());
        }

        if token.is("[label]") {
            let label_token = self.require_next_token(input)?;
            self.word_field(|label, _, _, _, _| *label = label_token.text.clone());
            return Ok(());
        }

        if token.is("[code]") {
            let body = self.read_code_block(input, &loc)?;
            self.word_field(|_, _, _, _, inline_code| *inline_code = Some(body));
            return Ok(());
        }

        if token.is("begin") {
            let ip = self.word_field(|_, thread, _, _, _| thread.ip());
            self.operand_stack.push(StackValue::from_int(ip as i64));
            return Ok(());
        }

        if token.is("again") {
            let begin_ip = self.operand_stack.pop_int(&loc, "begin")? as usize;
            self.word_field(|_, thread, _, _, _| {
                thread.push_label("branch");
                thread.push_branch().resolve(begin_ip);
            });
            return Ok(());
        }

        if token.is("until") {
            let begin_ip = self.operand_stack.pop_int(&loc, "begin")? as usize;
            self.word_field(|_, thread, _, _, _| {
                thread.push_label("until");
                thread.push_branch().resolve(begin_ip);
            });
            return Ok(());
        }

        if token.is("if") {
            let handle = self.word_field(|_, thread, _, _, _| {
                thread.push_label("_if");
                thread.push_branch()
            });
            self.operand_stack.push(StackValue::Branch(handle));
            return Ok(());
        }

        if token.is("else") {
            let t0 = self.operand_stack.pop_branch(&loc, "if")?;
            let current_ip = self.word_field(|_, thread, _, _, _| {
                thread.push_label("branch");
                let t1 = thread.push_branch();
                let ip = thread.ip();
                (t1, ip)
            });
            let (t1, ip) = current_ip;
            t0.resolve(ip);
            self.operand_stack.push(StackValue::Branch(t1));
            return Ok(());
        }

        if token.is("then") {
            let target = self.operand_stack.pop_branch(&loc, "if/else")?;
            let ip = self.word_field(|_, thread, _, _, _| thread.ip());
            target.resolve(ip);
            return Ok(());
        }

        if token.is("while") {
            let handle = self.word_field(|_, thread, _, _, _| {
                thread.push_label("while");
                thread.push_branch()
            });
            self.operand_stack.push(StackValue::Branch(handle));
            return Ok(());
        }

        if token.is("repeat") {
            let t1 = self.operand_stack.pop_branch(&loc, "while")?;
            let begin_ip = self.operand_stack.pop_int(&loc, "begin")? as usize;
            let ip_after = self.word_field(|_, thread, _, _, _| {
                thread.push_label("branch");
                thread.push_branch().resolve(begin_ip);
                thread.ip()
            });
            t1.resolve(ip_after);
            return Ok(());
        }

        if token.is("[") {
            self.mode = Mode::Interpret;
            return Ok(());
        }

        if token.is("literal") {
            let value = self.operand_stack.pop_value(&loc, "literal")?;
            let text = value
                .literal_text()
                .ok_or_else(|| CompileError::new(Some(loc.clone()), ErrorKind::ParseError("'literal' requires a value.".to_string())))?;
            self.word_field(|_, thread, _, _, _| {
                thread.push_label("lit");
                thread.push_label(text);
            });
            return Ok(());
        }

        if token.is("do") {
            let ip = self.word_field(|_, thread, _, _, _| {
                thread.push_label("do");
                thread.ip()
            });
            self.operand_stack.push(StackValue::from_int(ip as i64));
            self.leave_stack.push_frame();
            return Ok(());
        }

        if token.is("loop") || token.is("+loop") {
            let do_ip = self.operand_stack.pop_int(&loc, "do")? as usize;
            let label = if token.is("loop") { "loop" } else { "plus_loop" };
            let current_ip = self.word_field(|_, thread, _, _, _| {
                thread.push_label(label);
                thread.push_branch().resolve(do_ip);
                thread.ip()
            });
            let leaves = self.leave_stack.pop_frame(&loc)?;
            for leave in leaves {
                leave.resolve(current_ip);
            }
            return Ok(());
        }

        if token.is("leave") {
            let handle = self.word_field(|_, thread, _, _, _| {
                thread.push_label("unloop");
                thread.push_label("branch");
                thread.push_branch()
            });
            self.leave_stack.add_leave(handle, &loc)?;
            return Ok(());
        }

        if token.is("lit") {
            let literal_token = self.require_next_token(input)?;
            self.word_field(|_, thread, _, _, _| {
                thread.push_label("lit");
                thread.push_label(literal_token.text.clone());
            });
            return Ok(());
        }

        if token.is("[']") {
            let name_token = self.require_next_token(input)?;
            let item = self
                .dictionary
                .find(&name_token.text)
                .ok_or_else(|| CompileError::new(Some(loc.clone()), ErrorKind::UnknownWord(name_token.text.clone())))?;
            let is_word = Compiler::is_word(&item);
            let label = self.reference(&item);
            if is_word {
                self.word_field(|_, _, referenced_names, _, _| referenced_names.push(name_token.text.clone()));
            }
            self.word_field(|_, thread, _, _, _| {
                thread.push_label("lit");
                thread.push_label(label);
            });
            return Ok(());
        }

        // Any other token: self-reference for a recursive word, a dictionary lookup, a numeric
        // literal, or an error.
        if self.is_recursive() && token.text == self.current_word_name() {
            let own_label = self.word_field(|label, _, _, _, _| label.clone());
            let own_name = self.current_word_name();
            self.word_field(|_, thread, referenced_names, _, _| {
                thread.push_label(own_label.clone());
                referenced_names.push(own_name.clone());
            });
            return Ok(());
        }

        if let Some(item) = self.dictionary.find(&token.text) {
            let is_word = Compiler::is_word(&item);
            let label = self.reference(&item);
            if is_word {
                self.word_field(|_, _, referenced_names, _, _| referenced_names.push(token.text.clone()));
            }
            self.word_field(|_, thread, _, _, _| thread.push_label(label));
            return Ok(());
        }

        if let Some(value) = token::parse_number(&token.text) {
            self.word_field(|_, thread, _, _, _| {
                thread.push_label("lit");
                thread.push_label(value.to_string());
            });
            return Ok(());
        }

        Err(CompileError::new(Some(loc), ErrorKind::UnknownWord(token.text)))
    }

    // ------------------------------------------------------------------ shared helpers --------

    fn require_next_token(&self, input: &mut Input) -> error::Result<Token> {
        let loc = input.location().clone();
        token::next_token(input)?.ok_or_else(|| CompileError::new(Some(loc), ErrorKind::UnexpectedEndOfStream))
    }

    fn read_name_token(&self, input: &mut Input, _loc: &SourceLocation) -> error::Result<String> {
        Ok(self.require_next_token(input)?.text)
    }

    /// Scan raw tokens (bypassing comment handling) until one equals `[end-code]`, returning the
    /// verbatim source text between the directive and the terminator.
    fn read_code_block(&self, input: &mut Input, start_loc: &SourceLocation) -> error::Result<String> {
        input.skip_whitespace();
        let start = input.mark();
        let mut end = start;

        loop {
            match input.next_raw_token() {
                Some((_, text)) => {
                    if text == "[end-code]" {
                        break;
                    }
                    end = input.mark();
                }
                None => {
                    return Err(CompileError::new(Some(start_loc.clone()), ErrorKind::UnexpectedEndOfStream));
                }
            }
        }

        let mut body = input.slice(start, end).to_string();
        if !body.is_empty() && !body.ends_with('\n') {
            body.push('\n');
        }
        Ok(body)
    }

    /// Scan raw tokens until one ends with `quote`, returning the verbatim text between the
    /// directive and the terminator with the trailing quote character stripped.
    fn read_quoted(&self, input: &mut Input, start_loc: &SourceLocation, quote: char) -> error::Result<String> {
        input.skip_whitespace();
        let start = input.mark();

        loop {
            match input.next_raw_token() {
                Some((_, text)) => {
                    if text.ends_with(quote) {
                        let end = input.mark();
                        let full = input.slice(start, end);
                        return Ok(full.strip_suffix(quote).unwrap_or(full).to_string());
                    }
                }
                None => {
                    return Err(CompileError::new(Some(start_loc.clone()), ErrorKind::UnexpectedEndOfStream));
                }
            }
        }
    }

    /// As `read_quoted`, but for the Antic-encoding `'...'` form, which additionally recognizes a
    /// terminator ending in `'*` as marking the text for inverse video.
    fn read_antic_quoted(&self, input: &mut Input, start_loc: &SourceLocation) -> error::Result<(String, bool)> {
        input.skip_whitespace();
        let start = input.mark();

        loop {
            match input.next_raw_token() {
                Some((_, text)) => {
                    if text.ends_with("'*") {
                        let end = input.mark();
                        let full = input.slice(start, end);
                        let trimmed = full.strip_suffix("'*").unwrap_or(full);
                        return Ok((trimmed.to_string(), true));
                    }
                    if text.ends_with('\'') {
                        let end = input.mark();
                        let full = input.slice(start, end);
                        let trimmed = full.strip_suffix('\'').unwrap_or(full);
                        return Ok((trimmed.to_string(), false));
                    }
                }
                None => {
                    return Err(CompileError::new(Some(start_loc.clone()), ErrorKind::UnexpectedEndOfStream));
                }
            }
        }
    }
}

/// Resolve `path`'s parent directory, falling back to the current directory when it has none
/// (e.g. a bare file name with no leading path components).
pub fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_sections() -> Vec<String> {
        vec!["init".to_string(), "boot".to_string(), "data".to_string(), "text".to_string()]
    }

    fn compile(source: &str) -> error::Result<String> {
        let mut compiler = Compiler::new(default_sections());
        compiler.compile_source("<test>", source, Path::new("."))?;
        compiler.finish()
    }

    #[test]
    fn constant_push_scenario() {
        let rendered = compile("$230 constant dladr : main dladr ;").unwrap();
        assert!(rendered.contains("main\n dta a(enter)\n dta a(const_dladr)\n dta a(exit)\n"));
        assert!(rendered.contains("dladr equ $230\n"));
    }

    #[test]
    fn branching_scenario_resolves_offsets() {
        let rendered = compile(": main if 1 else 2 then ;").unwrap();
        assert!(rendered.contains("_if\n dta a(*+8)\n"));
        assert!(rendered.contains("branch\n dta a(*+4)\n"));
    }

    #[test]
    fn counted_loop_scenario() {
        let rendered = compile(": main 10 0 do loop ;").unwrap();
        assert!(rendered.contains("do\n"));
        assert!(rendered.contains("loop\n dta a(*-"));
    }

    #[test]
    fn dead_code_elimination_scenario() {
        let rendered = compile(": unused 1 ; : main 0 ;").unwrap();
        assert!(!rendered.contains("unused"));
    }

    #[test]
    fn stack_not_empty_is_an_error() {
        let err = compile("1 2 : main ;").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::StackNotEmpty));
    }

    #[test]
    fn unknown_word_is_an_error() {
        let err = compile(": main bogus-word ;").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownWord(_)));
    }

    #[test]
    fn self_reference_requires_recursive() {
        let err = compile(": main main ;").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownWord(_)));

        let rendered = compile(": main recursive main ;").unwrap();
        assert!(rendered.contains("main\n dta a(main)\n dta a(exit)\n"));
    }

    #[test]
    fn redefinition_shadows_but_leaves_old_reference_bound() {
        let rendered = compile(": helper 1 ; : old helper ; : helper 2 ; : main helper old ;").unwrap();
        assert!(rendered.contains("main"));
        assert!(rendered.contains("old"));
    }

    #[test]
    fn begin_until_scenario() {
        let rendered = compile(": main begin 1 until ;").unwrap();
        assert!(rendered.contains("until\n dta a(*-8)\n"));
    }

    #[test]
    fn begin_again_scenario() {
        let rendered = compile(": main begin 1 again ;").unwrap();
        assert!(rendered.contains("branch\n dta a(*-8)\n"));
    }

    #[test]
    fn begin_while_repeat_scenario() {
        // `compile()` here starts from a bare dictionary (no runtime/base-words assets, unlike
        // the real binary in `tests/compile.rs`), so `cond`/`step` stand in for a condition word
        // and a loop-body word — the test is about the branch-offset arithmetic, not about any
        // particular word's semantics.
        let rendered = compile(": cond 1 ; : step 1 ; : main begin cond while step repeat ;").unwrap();
        assert!(rendered.contains("while\n dta a(*+6)\n"));
        assert!(rendered.contains("branch\n dta a(*-12)\n"));
    }

    #[test]
    fn variable_2variable_and_create_allocate_storage() {
        let rendered = compile("variable foo 2variable bar create baz : main foo bar baz ;").unwrap();
        assert!(rendered.contains("var_foo\n dta a(variable),a(foo)\n"));
        assert!(rendered.contains("foo equ *\n org *+2\n"));
        assert!(rendered.contains("var_bar\n dta a(variable),a(bar)\n"));
        assert!(rendered.contains("bar equ *\n org *+4\n"));
        assert!(rendered.contains("var_baz\n dta a(variable),a(baz)\n"));
        assert!(rendered.contains("baz equ *\n"));
        assert!(!rendered.contains("baz equ *\n org"));
        assert!(rendered.contains("main\n dta a(enter)\n dta a(var_foo)\n dta a(var_bar)\n dta a(var_baz)\n dta a(exit)\n"));
    }

    #[test]
    fn comma_and_c_comma_emit_raw_data() {
        let rendered = compile("5 , $41 c, : main 0 ;").unwrap();
        assert!(rendered.contains(" dta a(5)\n"));
        assert!(rendered.contains(" dta b(65)\n"));
    }

    #[test]
    fn allot_zero_is_a_present_no_op() {
        let rendered = compile("0 allot : main 0 ;").unwrap();
        assert!(rendered.contains(" org *+0\n"));
    }

    #[test]
    fn allot_emits_an_org_directive_for_its_byte_count() {
        let rendered = compile("40 allot : main 0 ;").unwrap();
        assert!(rendered.contains(" org *+40\n"));
    }

    #[test]
    fn counted_string_literal_allocates_length_prefixed_bytes() {
        let rendered = compile(",\"  hello world\" : main 0 ;").unwrap();
        assert!(rendered.contains(" dta b(11)\n"));
        assert!(rendered.contains(" dta c(\"hello world\")\n"));
    }

    #[test]
    fn uncounted_string_literal_has_no_length_prefix() {
        let rendered = compile("\"  hi\" : main 0 ;").unwrap();
        assert!(!rendered.contains(" dta b(2)\n"));
        assert!(rendered.contains(" dta c(\"hi\")\n"));
    }

    #[test]
    fn antic_quoted_literal_marks_inverse_video() {
        let rendered = compile(",' bye'* : main 0 ;").unwrap();
        assert!(rendered.contains(" dta b(3)\n"));
        assert!(rendered.contains(" dta f(+\"bye\")\n"));
    }

    #[test]
    fn antic_quoted_literal_without_star_is_not_inverse() {
        let rendered = compile(",' hi' : main 0 ;").unwrap();
        assert!(rendered.contains(" dta f(\"hi\")\n"));
        assert!(!rendered.contains(" dta f(+\"hi\")\n"));
    }

    #[test]
    fn lit_emits_the_next_token_verbatim() {
        let rendered = compile(": main lit foo-bar ;").unwrap();
        assert!(rendered.contains("main\n dta a(enter)\n dta a(lit)\n dta a(foo-bar)\n dta a(exit)\n"));
    }

    #[test]
    fn tick_pushes_a_words_label_as_a_literal_and_marks_it_used() {
        let rendered = compile(": helper 1 ; : other 2 ; : main ['] helper other ;").unwrap();
        assert!(rendered.contains("main\n dta a(enter)\n dta a(lit)\n dta a(helper)\n dta a(other)\n dta a(exit)\n"));
        assert!(rendered.contains("\nhelper\n"));
    }

    #[test]
    fn label_directive_overrides_a_user_words_assembler_label() {
        let rendered = compile(": foo [label] custom_label 1 ; : main foo ;").unwrap();
        assert!(rendered.contains("custom_label\n dta a(enter)\n dta a(lit)\n dta a(1)\n dta a(exit)\n"));
        assert!(rendered.contains(" dta a(custom_label)\n"));
    }

    #[test]
    fn empty_do_loop_resolves_zero_leaves() {
        let rendered = compile(": main 10 0 do loop ;").unwrap();
        assert!(!rendered.contains("unloop"));
        assert!(rendered.contains(" dta a(do)\n"));
        assert!(rendered.contains(" dta a(loop)\n dta a(*-"));
    }

    #[test]
    fn division_by_zero_at_compile_time_is_a_parse_error() {
        let err = compile("1 0 / : main 0 ;").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ParseError(_)));
    }

    #[test]
    fn cells_word_doubles_the_top_of_stack() {
        let rendered = compile("3 cells constant three_cells : main three_cells ;").unwrap();
        assert!(rendered.contains("three_cells equ 6\n"));
    }

    #[test]
    fn include_of_the_same_file_twice_reparses_it_and_the_latest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let helper_path = dir.path().join("helper.f");
        std::fs::write(&helper_path, ": helper 42 ;").unwrap();

        let mut compiler = Compiler::new(default_sections());
        let source = "[include] \"helper.f\" [include] \"helper.f\" : main helper ;";
        compiler.compile_source("<test>", source, dir.path()).unwrap();
        let rendered = compiler.finish().unwrap();

        // The second include's `helper` shadows the first; `unique_label` disambiguates the
        // assembler label so the two definitions don't collide, and only the one actually bound
        // in the dictionary at the point `main` was compiled is reachable.
        assert!(rendered.contains("helper_2"));
        assert!(rendered.contains(" dta a(helper_2)\n"));
    }
}
