/// Forward/backward patchable branch targets shared between a word's thread and the compile-time
/// operand stack.
pub mod branch;

/// The word dictionary: insert-at-front definitions, the fixed alias table, and lookup.
pub mod dictionary;

/// The front-end/middle-end driver: the interpret/compile state machine, the compile-time
/// operand stack, the do-loop leave stack, and recursive `[include]` handling.
pub mod engine;

/// The polymorphic emitted-item list and the per-word threaded-code builder.
pub mod item;

/// Section ordering and the final sectioned assembly render.
pub mod sections;

/// The compile-time operand stack and the do-loop leave stack.
pub mod stack;

pub use engine::Compiler;
