/// The static 6502 runtime: the inner interpreter (`next`, `enter`, `exit`), the literal pusher,
/// and the handful of primitive control-flow words the compiler itself emits by fixed label name
/// (`branch`, `_if`, `until`, `while`, `do`, `loop`, `plus_loop`, `unloop`, `const`, `variable`).
///
/// This text is not the compiler's invention — it's an opaque asset, reproduced here as a
/// faithful-in-spirit indirect-threaded Forth kernel. It is fed through the same tokenizer and
/// state machine as user source, wrapped in `[text-section]`/`[code]` directives so it lands as a
/// single raw fragment bound to the `boot` section. The two `{{PSTACK_BOTTOM}}` and
/// `{{PSTACK_SIZE}}` placeholders are substituted before parsing.
pub const RUNTIME_SOURCE_TEMPLATE: &str = r#"
[text-section] boot
[code]
; ---------------------------------------------------------------------------
; Indirect threaded inner interpreter.
;
; ip   - thread instruction pointer (points at the cell to fetch next)
; w    - working pointer (the word currently being entered)
; rsp  - return stack pointer (grows down from rstack_top)
; ---------------------------------------------------------------------------

pstack_bottom equ {{PSTACK_BOTTOM}}
pstack_size   equ {{PSTACK_SIZE}}

ip  equ $f0
w   equ $f2
rsp equ $f4
psp equ $f6

rstack_top equ pstack_bottom - pstack_size - 2

 org pstack_bottom - pstack_size - 2 - 256

next
 ldy #0
 lda (ip),y
 sta w
 iny
 lda (ip),y
 sta w+1
 clc
 lda ip
 adc #2
 sta ip
 bcc +
 inc ip+1
+
 jmp (w)

enter
 ; w holds the address of the colon word being entered; push the caller's ip
 ; on the return stack, then set ip to the first cell after w's code field.
 ldy #0
 lda rsp
 sec
 sbc #2
 sta rsp
 ldy #0
 lda ip
 sta (rsp),y
 iny
 lda ip+1
 sta (rsp),y
 clc
 lda w
 adc #2
 sta ip
 lda w+1
 adc #0
 sta ip+1
 jmp next

exit
 ldy #0
 lda (rsp),y
 sta ip
 iny
 lda (rsp),y
 sta ip+1
 clc
 lda rsp
 adc #2
 sta rsp
 jmp next

lit
 ; the cell following this one holds the literal's immediate value.
 ldy #0
 lda (ip),y
 pha
 iny
 lda (ip),y
 tax
 pla
 jsr push_pstack
 clc
 lda ip
 adc #2
 sta ip
 bcc +
 inc ip+1
+
 jmp next

branch
 ; the cell following this one holds the absolute target address.
 ldy #0
 lda (ip),y
 tax
 iny
 lda (ip),y
 sta ip+1
 stx ip
 jmp next

branch_if_zero
 jsr pop_pstack
 ora pstack_hi_tmp
 bne .false
 jmp branch
.false
 clc
 lda ip
 adc #2
 sta ip
 bcc +
 inc ip+1
+
 jmp next

_if
 jmp branch_if_zero

until
 jmp branch_if_zero

while
 jmp branch_if_zero

do
 ; pop start index then limit, push both onto the loop control stack.
 jsr pop_pstack
 sta loop_index_lo,x
 stx loop_index_hi_tmp
 jsr pop_pstack
 sta loop_limit_lo,x
 inc loop_depth
 jmp next

loop_step
 inc loop_index_lo,x
 bne .no_carry
 inc loop_index_hi_tmp
.no_carry
 lda loop_index_lo,x
 cmp loop_limit_lo,x
 bne branch
 dec loop_depth
 clc
 lda ip
 adc #2
 sta ip
 bcc +
 inc ip+1
+
 jmp next

loop
 ldx loop_depth
 jmp loop_step

plus_loop
 jsr pop_pstack
 ldx loop_depth
 clc
 adc loop_index_lo,x
 sta loop_index_lo,x
 jmp loop_step

unloop
 dec loop_depth
 jmp next

; `i_impl` is the raw body; `i` itself is a dictionary word (see base_words.rs)
; so that user source can reference it like any other word.
i_impl
 ldx loop_depth
 lda loop_index_lo,x
 ldx #0
 jsr push_pstack
 jmp next

const
 ; w+2 holds the constant's immediate value, baked in at assemble time.
 ldy #2
 lda (w),y
 tax
 iny
 lda (w),y
 jsr push_pstack_ax
 jmp next

variable
 ; w+2 holds the variable's resolved storage address, baked in at assemble time.
 ldy #2
 lda (w),y
 tax
 iny
 lda (w),y
 jsr push_pstack_ax
 jmp next

push_pstack
 ; push one cell onto the parameter stack.  A holds the low byte, X the high
 ; byte; psp is predecremented, so it always points at the most recently
 ; pushed cell's low byte.
 pha
 sec
 lda psp
 sbc #2
 sta psp
 bcs +
 dec psp+1
+
 ldy #0
 pla
 sta (psp),y
 iny
 txa
 sta (psp),y
 rts

push_pstack_ax
 ; as push_pstack, but with the byte order swapped: A holds the high byte,
 ; X the low byte.  Used by the code fields baked in for `const`/`variable`,
 ; which load their payload lowest-address-first.
 tay
 txa
 tax
 tya
 jmp push_pstack

pop_pstack
 ; pop one cell off the parameter stack into A (low byte) and X (high byte).
 ; The high byte is additionally latched into pstack_hi_tmp, since the
 ; zero-test in branch_if_zero needs both halves but only has one register
 ; free by the time it gets there.
 ldy #0
 lda (psp),y
 pha
 iny
 lda (psp),y
 sta pstack_hi_tmp
 tax
 clc
 lda psp
 adc #2
 sta psp
 bcc +
 inc psp+1
+
 pla
 rts

pstack_hi_tmp      ds 1
loop_index_hi_tmp  ds 1
loop_depth         dta b(0)
loop_index_lo      ds 16
loop_limit_lo       ds 16

[end-code]

[text-section] init
[code]
; ---------------------------------------------------------------------------
; Cold start: seed the return- and parameter-stack pointers, point the
; instruction pointer at a one-cell thread that names `main`, and fall into
; the inner interpreter.  A colon word's first cell is always `enter`, so
; this has the same effect as if `main` had itself been called from another
; word.
; ---------------------------------------------------------------------------

start
 lda #<rstack_top
 sta rsp
 lda #>rstack_top
 sta rsp+1
 lda #<pstack_bottom
 sta psp
 lda #>pstack_bottom
 sta psp+1
 lda #<call_main
 sta ip
 lda #>call_main
 sta ip+1
 jmp next

call_main
 dta a(main)

[end-code]
"#;
