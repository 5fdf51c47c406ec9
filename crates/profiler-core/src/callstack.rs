//! Call-Stack Engine: reconstructs a nested call tree from a stream of
//! `(opcode, pc, bank)` samples without ever being told explicitly when a
//! call or a return happens.

use crate::region::RegionTable;
use crate::resolver::PcResolver;
use crate::symbol::SymbolMap;
use crate::trace::TraceEmitter;

const RETI_OPCODE: u8 = 0xD9;

/// Resolving to one of these behaves as if no region were found at all —
/// the sticky cache is left untouched, no event is emitted.
const IGNORED_SYMBOLS: &[&str] = &[".add_VBL", ".add_int", "_display_off"];

/// One entry of the shadow call stack. `indent` is redundant with stack
/// position but kept explicit since it's what a flamegraph viewer wants and
/// it's cheap to carry along.
#[derive(Debug, Clone, Copy)]
pub struct CallStackFrame {
    pub symbol_index: usize,
    pub entry_cycle: u64,
    pub indent: usize,
}

pub struct CallStackEngine {
    symbol_map: SymbolMap,
    regions: RegionTable,
    resolver: PcResolver,
    call_stack: Vec<CallStackFrame>,
    /// call_stack positions of interrupt frames currently in flight, oldest first.
    interrupt_stack: Vec<usize>,
    trace: TraceEmitter,
    frame_cycle_offset: u64,
}

impl CallStackEngine {
    pub fn new(symbol_map: SymbolMap) -> Self {
        let regions = RegionTable::build(&symbol_map);
        let trace = TraceEmitter::new(&symbol_map);
        CallStackEngine {
            symbol_map,
            regions,
            resolver: PcResolver::new(),
            call_stack: Vec::new(),
            interrupt_stack: Vec::new(),
            trace,
            frame_cycle_offset: 0,
        }
    }

    pub fn symbol_map(&self) -> &SymbolMap {
        &self.symbol_map
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    pub fn trace(&self) -> &TraceEmitter {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut TraceEmitter {
        &mut self.trace
    }

    pub fn depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Called by the Frame Driver before advancing the emulator through frame
    /// `frames_elapsed`, so `global_cycle = frame_cycle_offset + local_cycle`.
    pub fn begin_frame(&mut self, frame_cycle_offset: u64) {
        self.frame_cycle_offset = frame_cycle_offset;
    }

    fn global(&self, local_cycle: u64) -> u64 {
        self.frame_cycle_offset + local_cycle
    }

    fn close_top(&mut self, at: u64) {
        if let Some(frame) = self.call_stack.pop() {
            self.trace.close(frame.symbol_index, at, frame.entry_cycle);
        }
    }

    fn push(&mut self, symbol_index: usize, at: u64) {
        let indent = self.call_stack.len();
        self.call_stack.push(CallStackFrame { symbol_index, entry_cycle: at, indent });
        self.trace.open(symbol_index, at);
    }

    fn position_of_on_stack(&self, symbol_index: usize) -> Option<usize> {
        self.call_stack.iter().rposition(|f| f.symbol_index == symbol_index)
    }

    /// Close every frame above (but not including) `stack_pos`.
    fn pop_to_not_including(&mut self, stack_pos: usize, at: u64) {
        while self.call_stack.len() > stack_pos + 1 {
            self.close_top(at);
        }
    }

    /// Fully unwind every currently-open interrupt (and everything above
    /// each), as if one RETI per interrupt had fired back-to-back.
    fn unwind_all_interrupts(&mut self, at: u64) {
        while let Some(pos) = self.interrupt_stack.last().copied() {
            while self.call_stack.len() > pos + 1 {
                self.close_top(at);
            }
            self.close_top(at);
            self.interrupt_stack.pop();
        }
    }

    /// On RETI, unwind exactly the topmost open interrupt.
    fn handle_reti(&mut self, at: u64) {
        let Some(pos) = self.interrupt_stack.last().copied() else {
            // No interrupt is open: a dispatch inconsistency. Silently
            // ignored, stacks untouched.
            return;
        };
        while self.call_stack.len() > pos + 1 {
            self.close_top(at);
        }
        self.close_top(at);
        self.interrupt_stack.pop();
        // The resumed frame's identity is ambiguous from here; let the next
        // instruction re-discover it rather than guess.
        self.resolver.clear();
    }

    fn handle_normal_instruction(&mut self, pc: u16, bank: u8, at: u64) {
        let prev_current = self.resolver.current().cloned();
        let Some(region) = self.resolver.resolve(&self.regions, pc, bank) else {
            return;
        };

        if IGNORED_SYMBOLS.contains(&region.symbol.as_str()) {
            self.resolver.set_current(prev_current);
            return;
        }

        let is_unchanged = prev_current
            .as_ref()
            .map(|c| c.bank == region.bank && c.addr == region.addr)
            .unwrap_or(false);
        if is_unchanged {
            return;
        }

        if pc == region.addr {
            // Case A: entering a function at its entry point.
            self.push(region.symbol_index, at);
        } else if let Some(stack_pos) = self.position_of_on_stack(region.symbol_index) {
            // Case B, ancestor already on stack: tail-call / jump-back.
            self.pop_to_not_including(stack_pos, at);
        } else if !self.interrupt_stack.is_empty() {
            // Case B, unknown mid-function landing inside an interrupt: ignore.
            self.resolver.set_current(prev_current);
        } else if pc >= 0x4000 {
            // Case B, banked code, no interrupt in flight: treat as a call.
            self.push(region.symbol_index, at);
        } else {
            // Case B, bank-0 mid-function landing outside an interrupt: spurious.
            self.resolver.set_current(prev_current);
        }
    }

    /// Per-instruction hook. `cycle` is the local (per-frame) cycle count.
    pub fn on_after_instruction(&mut self, opcode: u8, pc: u16, current_rom_bank: u8, cycle: u64) {
        let at = self.global(cycle);
        if opcode == RETI_OPCODE {
            self.handle_reti(at);
        }
        self.handle_normal_instruction(pc, current_rom_bank, at);
    }

    /// Interrupt-dispatch hook. `interrupt_index` is `0..5`, matching the
    /// order the first five entries of the Symbol Map were seeded in.
    pub fn on_interrupt(&mut self, interrupt_index: u8, cycle: u64) {
        let at = self.global(cycle);
        self.unwind_all_interrupts(at);
        self.resolver.clear();

        let symbol_index = interrupt_index as usize;
        let pos = self.call_stack.len();
        self.push(symbol_index, at);
        self.interrupt_stack.push(pos);
    }

    /// Close every remaining frame in LIFO order. Called once at the end of
    /// the run, before `TraceEmitter::finalize`.
    pub fn shutdown(&mut self, at: u64) {
        while !self.call_stack.is_empty() {
            self.close_top(at);
        }
        self.interrupt_stack.clear();
    }

    pub fn into_trace(self) -> TraceEmitter {
        self.trace
    }
}
