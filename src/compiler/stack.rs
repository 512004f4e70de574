use crate::compiler::branch::BranchTargetHandle;
use crate::error::{self, CompileError, ErrorKind};
use crate::lang::source_buffer::SourceLocation;

/// A value produced by immediate-mode evaluation, or a marker pushed by an open control
/// structure during word compilation.
#[derive(Clone)]
pub enum StackValue {
    /// An integer value, together with the source text it was parsed from (when it came straight
    /// from a numeric literal) so constant definitions can render in the same radix the user
    /// wrote them in.  Values produced by arithmetic carry their decimal rendering instead.
    Int { value: i64, text: String },

    /// An already-resolved label or other raw text, produced by pushing a non-constant
    /// dictionary name, or as a marker handled purely as text.
    Text(String),

    /// A handle to an open control structure's branch target, e.g. the `if` of an `if/then`.
    Branch(BranchTargetHandle),
}

impl StackValue {
    pub fn from_int(value: i64) -> StackValue {
        StackValue::Int {
            value,
            text: value.to_string(),
        }
    }

    pub fn from_literal_text(value: i64, text: impl Into<String>) -> StackValue {
        StackValue::Int {
            value,
            text: text.into(),
        }
    }

    /// The textual form used by the `literal` word: decimal for integers, verbatim for text.
    pub fn literal_text(&self) -> Option<String> {
        match self {
            StackValue::Int { value, .. } => Some(value.to_string()),
            StackValue::Text(text) => Some(text.clone()),
            StackValue::Branch(_) => None,
        }
    }
}

/// The compile-time operand stack.  Distinct from the target's runtime parameter stack; this one
/// only exists while the compiler is running.
#[derive(Default)]
pub struct OperandStack {
    values: Vec<StackValue>,
}

impl OperandStack {
    pub fn new() -> OperandStack {
        OperandStack { values: Vec::new() }
    }

    pub fn push(&mut self, value: StackValue) {
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    fn pop(&mut self, location: &SourceLocation, what: &str) -> error::Result<StackValue> {
        self.values.pop().ok_or_else(|| {
            CompileError::new(
                Some(location.clone()),
                ErrorKind::StackUnderflow(what.to_string()),
            )
        })
    }

    pub fn pop_value(&mut self, location: &SourceLocation, what: &str) -> error::Result<StackValue> {
        self.pop(location, what)
    }

    pub fn pop_int(&mut self, location: &SourceLocation, what: &str) -> error::Result<i64> {
        match self.pop(location, what)? {
            StackValue::Int { value, .. } => Ok(value),
            _ => Err(CompileError::new(
                Some(location.clone()),
                ErrorKind::ParseError(format!("Expected an integer for '{}'.", what)),
            )),
        }
    }

    pub fn pop_branch(&mut self, location: &SourceLocation, what: &str) -> error::Result<BranchTargetHandle> {
        match self.pop(location, what)? {
            StackValue::Branch(target) => Ok(target),
            _ => Err(CompileError::new(
                Some(location.clone()),
                ErrorKind::ParseError(format!("Expected an open '{}' control structure.", what)),
            )),
        }
    }
}

/// The do-loop leave stack: a stack of lists of forward branch targets.  `do` pushes a fresh
/// empty list, `leave` appends to the top list, and `loop`/`+loop` pops the list and resolves
/// every target in it.
#[derive(Default)]
pub struct LeaveStack {
    frames: Vec<Vec<BranchTargetHandle>>,
}

impl LeaveStack {
    pub fn new() -> LeaveStack {
        LeaveStack { frames: Vec::new() }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn add_leave(&mut self, target: BranchTargetHandle, location: &SourceLocation) -> error::Result<()> {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.push(target);
                Ok(())
            }
            None => Err(CompileError::new(
                Some(location.clone()),
                ErrorKind::StackUnderflow("leave".to_string()),
            )),
        }
    }

    pub fn pop_frame(&mut self, location: &SourceLocation) -> error::Result<Vec<BranchTargetHandle>> {
        self.frames.pop().ok_or_else(|| {
            CompileError::new(
                Some(location.clone()),
                ErrorKind::StackUnderflow("loop".to_string()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new_from_path("<test>")
    }

    #[test]
    fn pop_underflow_is_an_error() {
        let mut stack = OperandStack::new();
        let err = stack.pop_int(&loc(), "+").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::StackUnderflow(_)));
    }

    #[test]
    fn literal_text_is_decimal_for_hex_input() {
        let value = StackValue::from_literal_text(0x230, "$230");
        assert_eq!(value.literal_text(), Some("560".to_string()));
    }

    #[test]
    fn leave_with_no_open_loop_is_an_error() {
        let mut leaves = LeaveStack::new();
        let err = leaves.add_leave(crate::compiler::branch::BranchTarget::new(0), &loc());
        assert!(err.is_err());
    }
}
