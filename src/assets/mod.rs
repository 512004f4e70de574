/// The static 6502 inner interpreter and its primitive core words, as a text asset
/// parameterized by the parameter-stack base address and size.
pub mod runtime;

/// The base-words standard library, compiled from the same source language as user files.
pub mod base_words;

/// The two runtime-template substitution points: the parameter-stack base address (emitted
/// verbatim, as given on the command line) and its size in bytes, masked to 8 bits per spec.md
/// §9 ("the size is masked to 8 bits (`& 0xFF`)").
pub struct RuntimeParams {
    pub pstack_bottom: String,
    pub pstack_size: u8,
}

/// Substitute the two placeholders in [`runtime::RUNTIME_SOURCE_TEMPLATE`], producing the
/// concrete runtime source text to feed through the compiler ahead of the user's file.
pub fn render_runtime(params: &RuntimeParams) -> String {
    runtime::RUNTIME_SOURCE_TEMPLATE
        .replace("{{PSTACK_BOTTOM}}", &params.pstack_bottom)
        .replace("{{PSTACK_SIZE}}", &params.pstack_size.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_both_placeholders() {
        let rendered = render_runtime(&RuntimeParams {
            pstack_bottom: "$600".to_string(),
            pstack_size: 128,
        });

        assert!(rendered.contains("pstack_bottom equ $600"));
        assert!(rendered.contains("pstack_size   equ 128"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn pstack_size_is_masked_to_8_bits() {
        // 256 & 0xFF == 0; the masking happens before `render_runtime` is called (in the CLI
        // argument layer), so this just confirms a pre-masked value round-trips untouched.
        let rendered = render_runtime(&RuntimeParams {
            pstack_bottom: "$600".to_string(),
            pstack_size: 0,
        });

        assert!(rendered.contains("pstack_size   equ 0"));
    }
}
