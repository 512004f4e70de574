/// The base-words library (section `text`): the small set of stack, arithmetic, comparison,
/// logic, memory, and return-stack words that sit directly on top of the runtime's primitive
/// core words (`lit`, `branch`, `do`/`loop`, `const`, `variable`, ...).
///
/// Like the runtime in [`crate::assets::runtime`], this is not the compiler's invention — it's an
/// opaque asset fed through the same tokenizer and state machine as user source, parsed
/// immediately after the runtime and before the user's file. Unlike the runtime kernel (one
/// giant `[code]` block bound wholesale to `boot`), every entry here is an ordinary colon
/// definition, so dead-word elimination applies to it exactly as it would to a user's own
/// library: a program that never uses `mod` doesn't pay for `mod`.
///
/// Words whose source-level name isn't a valid assembler label (`+`, `0=`, `2*`, ...) use
/// `[label]` to pick one, per spec.md §6's note that "non-canonical names require a `[label]`
/// declaration inside the definition." Each primitive's scratch zero-page storage is declared
/// inside its own `[code]` body and named after the word, so dead-word elimination never strands
/// a live word's scratch cell inside a dead one's rendering.
///
/// Composed (colon-defined) entries reference earlier entries by name, so — as in any
/// concatenative language with no forward declarations — this file is laid out in dependency
/// order: every word a composed definition calls is defined above it.
pub const BASE_WORDS_SOURCE: &str = r#"
[text-section] text

\ ----------------------------------------------------------------- stack words --------
: dup
 [code]
 ldy #0
 lda (psp),y
 tax
 iny
 lda (psp),y
 jsr push_pstack_ax
 jmp next
 [end-code]
;

: drop
 [code]
 jsr pop_pstack
 jmp next
 [end-code]
;

: swap
 [code]
 ldy #0
 lda (psp),y
 sta swap_tmp
 iny
 lda (psp),y
 sta swap_tmp+1
 ldy #2
 lda (psp),y
 pha
 iny
 lda (psp),y
 tax
 pla
 ldy #0
 sta (psp),y
 iny
 txa
 sta (psp),y
 lda swap_tmp
 ldy #2
 sta (psp),y
 lda swap_tmp+1
 iny
 sta (psp),y
 jmp next
swap_tmp ds 2
 [end-code]
;

: over
 [code]
 ldy #2
 lda (psp),y
 tax
 iny
 lda (psp),y
 jsr push_pstack_ax
 jmp next
 [end-code]
;

: nip
 [code]
 jsr pop_pstack
 sta nip_tmp
 stx nip_tmp+1
 jsr pop_pstack
 lda nip_tmp
 ldx nip_tmp+1
 jsr push_pstack
 jmp next
nip_tmp ds 2
 [end-code]
;

\ --------------------------------------------------------------------- loop words -------
\ `do`/`loop`/`leave` are compiler-recognized control words (see engine.rs), but the loop
\ index itself is an ordinary dictionary word so user source can reference it like any
\ other: `i`'s body just jumps into the runtime's `i_impl`, which does the real work and
\ falls into `next` itself.
: i
 [code]
 jmp i_impl
 [end-code]
;

\ ------------------------------------------------------------- return stack words ------
: >r
 [label] to_r
 [code]
 jsr pop_pstack
 pha
 sec
 lda rsp
 sbc #2
 sta rsp
 bcs +
 dec rsp+1
+
 ldy #0
 pla
 sta (rsp),y
 iny
 txa
 sta (rsp),y
 jmp next
 [end-code]
;

: r>
 [label] r_from
 [code]
 ldy #0
 lda (rsp),y
 pha
 iny
 lda (rsp),y
 tax
 pla
 jsr push_pstack
 clc
 lda rsp
 adc #2
 sta rsp
 bcc +
 inc rsp+1
+
 jmp next
 [end-code]
;

: r@
 [label] r_fetch
 [code]
 ldy #0
 lda (rsp),y
 pha
 iny
 lda (rsp),y
 tax
 pla
 jsr push_pstack
 jmp next
 [end-code]
;

: rot >r swap r> swap ;
: 2dup [label] two_dup over over ;

\ ------------------------------------------------------------------ arithmetic ---------
: +
 [label] plus
 [code]
 jsr pop_pstack
 sta plus_tmp
 stx plus_tmp+1
 jsr pop_pstack
 clc
 adc plus_tmp
 pha
 txa
 adc plus_tmp+1
 tax
 pla
 jsr push_pstack
 jmp next
plus_tmp ds 2
 [end-code]
;

: -
 [label] minus
 [code]
 jsr pop_pstack
 sta minus_tmp
 stx minus_tmp+1
 jsr pop_pstack
 sec
 sbc minus_tmp
 pha
 txa
 sbc minus_tmp+1
 tax
 pla
 jsr push_pstack
 jmp next
minus_tmp ds 2
 [end-code]
;

: *
 [label] star
 [code]
 ; ( n1 n2 -- product ) 16-bit multiply via shift-and-add; only the low 16
 ; bits of the product are kept, matching the target's cell width.
 jsr pop_pstack
 sta mul_b
 stx mul_b+1
 jsr pop_pstack
 sta mul_a
 stx mul_a+1
 lda #0
 sta mul_result
 sta mul_result+1
 ldy #16
.loop
 lsr mul_b+1
 ror mul_b
 bcc .skip
 clc
 lda mul_result
 adc mul_a
 sta mul_result
 lda mul_result+1
 adc mul_a+1
 sta mul_result+1
.skip
 asl mul_a
 rol mul_a+1
 dey
 bne .loop
 lda mul_result
 ldx mul_result+1
 jsr push_pstack
 jmp next
mul_a      ds 2
mul_b      ds 2
mul_result ds 2
 [end-code]
;

: /mod
 [label] slash_mod
 [code]
 ; ( n1 n2 -- rem quot ) 16-bit unsigned division, shift-and-subtract.
 jsr pop_pstack
 sta div_denom
 stx div_denom+1
 jsr pop_pstack
 sta div_numer
 stx div_numer+1
 lda #0
 sta div_rem
 sta div_rem+1
 ldy #16
.loop
 asl div_numer
 rol div_numer+1
 rol div_rem
 rol div_rem+1
 sec
 lda div_rem
 sbc div_denom
 tax
 lda div_rem+1
 sbc div_denom+1
 bcc .skip
 sta div_rem+1
 stx div_rem
 inc div_numer
.skip
 dey
 bne .loop
 lda div_rem
 ldx div_rem+1
 jsr push_pstack
 lda div_numer
 ldx div_numer+1
 jsr push_pstack
 jmp next
div_numer ds 2
div_denom ds 2
div_rem   ds 2
 [end-code]
;

: / [label] slash /mod swap drop ;
: mod /mod drop ;

\ ------------------------------------------------------------------ comparisons --------
: =
 [label] equals
 [code]
 jsr pop_pstack
 sta eq_tmp
 stx eq_tmp+1
 jsr pop_pstack
 cmp eq_tmp
 bne .false
 cpx eq_tmp+1
 bne .false
 lda #$ff
 tax
 jsr push_pstack
 jmp next
.false
 lda #0
 tax
 jsr push_pstack
 jmp next
eq_tmp ds 2
 [end-code]
;

: <
 [label] less_than
 [code]
 jsr pop_pstack
 sta lt_tmp
 stx lt_tmp+1
 jsr pop_pstack
 cmp lt_tmp
 txa
 sbc lt_tmp+1
 bvc .noflip
 eor #$80
.noflip
 bmi .true
 lda #0
 tax
 jsr push_pstack
 jmp next
.true
 lda #$ff
 tax
 jsr push_pstack
 jmp next
lt_tmp ds 2
 [end-code]
;

: > [label] greater_than swap < ;

: negate 0 swap - ;
: 1+ [label] one_plus 1 + ;
: 1- [label] one_minus 1 - ;
: 0= [label] zero_equals 0 = ;
: 0< [label] zero_less 0 < ;
: abs dup 0< if negate then ;
: min 2dup < if drop else nip then ;
: max 2dup > if drop else nip then ;

\ ------------------------------------------------------------------------- logic -------
: and
 [code]
 jsr pop_pstack
 sta and_tmp
 stx and_tmp+1
 jsr pop_pstack
 and and_tmp
 pha
 txa
 and and_tmp+1
 tax
 pla
 jsr push_pstack
 jmp next
and_tmp ds 2
 [end-code]
;

: or
 [code]
 jsr pop_pstack
 sta or_tmp
 stx or_tmp+1
 jsr pop_pstack
 ora or_tmp
 pha
 txa
 ora or_tmp+1
 tax
 pla
 jsr push_pstack
 jmp next
or_tmp ds 2
 [end-code]
;

: xor
 [code]
 jsr pop_pstack
 sta xor_tmp
 stx xor_tmp+1
 jsr pop_pstack
 eor xor_tmp
 pha
 txa
 eor xor_tmp+1
 tax
 pla
 jsr push_pstack
 jmp next
xor_tmp ds 2
 [end-code]
;

: invert
 [code]
 jsr pop_pstack
 eor #$ff
 pha
 txa
 eor #$ff
 tax
 pla
 jsr push_pstack
 jmp next
 [end-code]
;

: 2*
 [label] two_star
 [code]
 jsr pop_pstack
 asl a
 pha
 txa
 rol a
 tax
 pla
 jsr push_pstack
 jmp next
 [end-code]
;

\ ------------------------------------------------------------------------ memory -------
: @
 [label] fetch
 [code]
 jsr pop_pstack
 sta fetch_addr
 stx fetch_addr+1
 ldy #0
 lda (fetch_addr),y
 pha
 iny
 lda (fetch_addr),y
 tax
 pla
 jsr push_pstack
 jmp next
fetch_addr ds 2
 [end-code]
;

: !
 [label] store
 [code]
 jsr pop_pstack
 sta store_addr
 stx store_addr+1
 jsr pop_pstack
 ldy #0
 sta (store_addr),y
 iny
 txa
 sta (store_addr),y
 jmp next
store_addr ds 2
 [end-code]
;

: c@
 [label] c_fetch
 [code]
 jsr pop_pstack
 sta cfetch_addr
 stx cfetch_addr+1
 ldy #0
 lda (cfetch_addr),y
 ldx #0
 jsr push_pstack
 jmp next
cfetch_addr ds 2
 [end-code]
;

: c!
 [label] c_store
 [code]
 jsr pop_pstack
 sta cstore_addr
 stx cstore_addr+1
 jsr pop_pstack
 ldy #0
 sta (cstore_addr),y
 jmp next
cstore_addr ds 2
 [end-code]
;

: +! [label] plus_store dup @ rot + swap ! ;
"#;
