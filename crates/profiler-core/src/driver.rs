//! Frame Driver: the only piece of `profiler-core` that knows about
//! `gb-core`. Owns the per-frame loop — input replay, emulator advance,
//! framebuffer capture policy, global cycle accounting — and wires the
//! emulator's instruction hook into a [`CallStackEngine`] without either
//! side knowing about the other's internals.

use crate::callstack::CallStackEngine;
use crate::config::{CaptureMode, ProfilerConfig};
use crate::input::{ButtonId, InputAction, InputEvent};
use crate::trace::Trace;
use gb_core::{Button, GbCore, InstructionObserver};

/// Global-clock frame budget used for the profiler's cycle accounting. This
/// is the figure the trace's timestamps are built from; it intentionally
/// mirrors a full frame's worth of cycles rather than `gb-core`'s own
/// hardware dot-count, so traces stay stable even if the emulator's internal
/// timing model changes.
pub const CYCLES_PER_FRAME: u64 = 70256;

fn to_gb_button(button: ButtonId) -> Button {
    match button {
        ButtonId::Up => Button::Up,
        ButtonId::Down => Button::Down,
        ButtonId::Left => Button::Left,
        ButtonId::Right => Button::Right,
        ButtonId::A => Button::A,
        ButtonId::B => Button::B,
        ButtonId::Start => Button::Start,
        ButtonId::Select => Button::Select,
    }
}

struct EngineObserver<'a> {
    engine: &'a mut CallStackEngine,
}

impl InstructionObserver for EngineObserver<'_> {
    fn on_after_instruction(&mut self, opcode: u8, pc: u16, rom_bank: u8, cycle: u64) {
        self.engine.on_after_instruction(opcode, pc, rom_bank, cycle);
    }

    fn on_interrupt(&mut self, interrupt_index: u8, cycle: u64) {
        self.engine.on_interrupt(interrupt_index, cycle);
    }
}

pub struct DriverOutcome {
    pub trace: Trace,
    pub frames_elapsed: u64,
}

/// Run `config.frames` frames starting at `config.start_frame`.
///
/// `capture_framebuffer` is called whenever the capture policy says a frame
/// should be captured; it returns an opaque source string (a file path, a
/// URL) that is recorded as-is. `progress` is called once per frame with
/// `(frames_done, total_frames)`.
pub fn run<F, P>(
    core: &mut GbCore,
    engine: &mut CallStackEngine,
    inputs: &[InputEvent],
    config: &ProfilerConfig,
    mut capture_framebuffer: F,
    mut progress: P,
) -> DriverOutcome
where
    F: FnMut(&GbCore, u64, u64) -> String,
    P: FnMut(u64, u64),
{
    for &idx in &config.disabled_interrupts {
        core.disabled_interrupts |= 1 << idx;
    }

    let total = config.start_frame + config.frames;
    let mut global_cycle: u64 = 0;
    let mut frames_elapsed: u64 = 0;
    let mut capture_start_cycle: Option<u64> = None;
    let mut input_cursor = 0usize;

    for i in 0..total {
        let batch_start = input_cursor;
        while input_cursor < inputs.len() && inputs[input_cursor].frame == i {
            input_cursor += 1;
        }
        let batch = &inputs[batch_start..input_cursor];
        apply_batch(core, batch, InputAction::Release);
        apply_batch(core, batch, InputAction::Press);

        let frame_start_cycle = global_cycle;
        engine.begin_frame(frame_start_cycle);
        {
            let mut obs = EngineObserver { engine };
            core.run_frame(&mut obs).expect("gb-core frame advance should never fail mid-run");
        }
        frames_elapsed += 1;
        global_cycle = frame_start_cycle + CYCLES_PER_FRAME;
        progress(i + 1, total);

        if i >= config.start_frame {
            capture_start_cycle.get_or_insert(frame_start_cycle);
            let should_capture = match config.capture_mode {
                CaptureMode::All => true,
                CaptureMode::Exit => i + 1 == total,
                CaptureMode::None => false,
            };
            if should_capture {
                let src = capture_framebuffer(core, frame_start_cycle, i);
                engine.trace_mut().capture(src, frame_start_cycle, i);
            }
        }
    }

    engine.shutdown(global_cycle);
    let trace = engine.trace().finalize(capture_start_cycle.unwrap_or(0));
    DriverOutcome { trace, frames_elapsed }
}

fn apply_batch(core: &mut GbCore, batch: &[InputEvent], action: InputAction) {
    for ev in batch.iter().filter(|e| e.action == action) {
        let button = to_gb_button(ev.button);
        match action {
            InputAction::Press => core.press(button),
            InputAction::Release => core.release(button),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolMap;
    use gb_core::{Cartridge, CartridgeKind};

    fn make_core() -> GbCore {
        let mut rom = vec![0u8; 0x8000];
        rom[0x0147] = 0x00; // ROM-only cartridge type
        rom[0x0148] = 0x00; // 32 KiB, no banking
        // Infinite loop at the entry point so the CPU does something stable.
        rom[0x0100] = 0xC3; // JP 0x0100
        rom[0x0101] = 0x00;
        rom[0x0102] = 0x01;
        let cartridge = Cartridge::from_bytes(rom).unwrap();
        assert_eq!(cartridge.kind, CartridgeKind::RomOnly);
        GbCore::new(cartridge)
    }

    #[test]
    fn runs_requested_number_of_frames() {
        let mut core = make_core();
        let mut engine = CallStackEngine::new(SymbolMap::interrupts_only());
        let config = ProfilerConfig {
            start_frame: 0,
            frames: 3,
            capture_mode: CaptureMode::None,
            disabled_interrupts: vec![],
            verbose: false,
        };
        let outcome = run(&mut core, &mut engine, &[], &config, |_, _, _| String::new(), |_, _| {});
        assert_eq!(outcome.frames_elapsed, 3);
    }

    #[test]
    fn all_mode_records_one_capture_per_frame_from_start() {
        let mut core = make_core();
        let mut engine = CallStackEngine::new(SymbolMap::interrupts_only());
        let config = ProfilerConfig {
            start_frame: 1,
            frames: 2,
            capture_mode: CaptureMode::All,
            disabled_interrupts: vec![],
            verbose: false,
        };
        let outcome = run(&mut core, &mut engine, &[], &config, |_, _, i| format!("frame-{i}.png"), |_, _| {});
        assert_eq!(outcome.trace.captures.len(), 2);
        assert_eq!(outcome.trace.captures[0].frame_number, 1);
    }

    #[test]
    fn exit_mode_captures_only_the_last_frame() {
        let mut core = make_core();
        let mut engine = CallStackEngine::new(SymbolMap::interrupts_only());
        let config = ProfilerConfig {
            start_frame: 0,
            frames: 4,
            capture_mode: CaptureMode::Exit,
            disabled_interrupts: vec![],
            verbose: false,
        };
        let outcome = run(&mut core, &mut engine, &[], &config, |_, _, i| format!("frame-{i}.png"), |_, _| {});
        assert_eq!(outcome.trace.captures.len(), 1);
        assert_eq!(outcome.trace.captures[0].frame_number, 3);
    }
}
