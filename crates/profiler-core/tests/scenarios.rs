use gb_core::{Cartridge, GbCore};
use profiler_core::{CallStackEngine, CaptureMode, ProfilerConfig, SymbolMap};

fn map_from(defs: &[(&str, u16, u8)]) -> SymbolMap {
    let mut text = String::new();
    for (sym, addr, bank) in defs {
        let packed: u32 = ((*bank as u32) << 16) | (*addr as u32);
        text.push_str(&format!("DEF {sym} = ${packed:06x}\n"));
    }
    SymbolMap::parse(&text)
}

fn run_pc_trace(engine: &mut CallStackEngine, trace: &[(u16, u8)]) {
    for (i, (pc, bank)) in trace.iter().enumerate() {
        engine.on_after_instruction(0x00, *pc, *bank, i as u64 * 4);
    }
}

fn infinite_loop_core() -> GbCore {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100] = 0xC3;
    rom[0x0101] = 0x00;
    rom[0x0102] = 0x01;
    GbCore::new(Cartridge::from_bytes(rom).unwrap())
}

#[test]
fn scenario_1_empty_map() {
    let mut core = infinite_loop_core();
    let mut engine = CallStackEngine::new(SymbolMap::interrupts_only());
    let config = ProfilerConfig {
        start_frame: 0,
        frames: 1,
        capture_mode: CaptureMode::All,
        disabled_interrupts: vec![],
        verbose: false,
    };
    let outcome =
        profiler_core::driver::run(&mut core, &mut engine, &[], &config, |_, _, _| "frame.png".to_string(), |_, _| {});

    assert_eq!(outcome.trace.shared.frames.len(), 5);
    assert!(outcome.trace.profiles[0].events.is_empty());
    assert_eq!(outcome.trace.captures.len(), 1);
    assert_eq!(outcome.trace.captures[0].at, 0);
}

#[test]
fn scenario_2_simple_call() {
    let mut engine = CallStackEngine::new(map_from(&[("_main", 0x0150, 0), ("_foo", 0x0200, 0)]));
    run_pc_trace(&mut engine, &[(0x0150, 0), (0x0151, 0), (0x0200, 0), (0x0201, 0), (0x0152, 0)]);
    assert_eq!(engine.depth(), 1);
    engine.shutdown(100);
    let trace = engine.trace().finalize(0);

    let main_idx = trace.shared.frames.iter().position(|f| f.name == "_main").unwrap();
    let foo_idx = trace.shared.frames.iter().position(|f| f.name == "_foo").unwrap();
    let events: Vec<(profiler_core::EventType, usize)> =
        trace.profiles[0].events.iter().map(|e| (e.event_type, e.frame)).collect();
    assert_eq!(
        events,
        vec![
            (profiler_core::EventType::Open, main_idx),
            (profiler_core::EventType::Open, foo_idx),
            (profiler_core::EventType::Close, foo_idx),
            (profiler_core::EventType::Close, main_idx),
        ]
    );
}

#[test]
fn scenario_3_tail_call_back_to_ancestor() {
    let mut engine = CallStackEngine::new(map_from(&[("_a", 0x0100, 0), ("_b", 0x0200, 0)]));
    run_pc_trace(&mut engine, &[(0x0100, 0), (0x0200, 0), (0x0150, 0)]);

    let trace = engine.trace().finalize(0);
    let a_idx = trace.shared.frames.iter().position(|f| f.name == "_a").unwrap();
    let b_idx = trace.shared.frames.iter().position(|f| f.name == "_b").unwrap();
    let events: Vec<(profiler_core::EventType, usize)> =
        trace.profiles[0].events.iter().map(|e| (e.event_type, e.frame)).collect();
    // O(a), O(b), C(b) -- no close for `a`, it's still on the stack.
    assert_eq!(
        events,
        vec![
            (profiler_core::EventType::Open, a_idx),
            (profiler_core::EventType::Open, b_idx),
            (profiler_core::EventType::Close, b_idx),
        ]
    );
    assert_eq!(engine.depth(), 1);
}

#[test]
fn scenario_4_interrupt_during_function() {
    let mut engine = CallStackEngine::new(map_from(&[("_main", 0x0150, 0), ("_foo", 0x0200, 0)]));
    engine.on_after_instruction(0x00, 0x0150, 0, 0);
    engine.on_after_instruction(0x00, 0x0200, 0, 0);
    assert_eq!(engine.depth(), 2);

    engine.on_interrupt(0, 1000);
    assert_eq!(engine.depth(), 3);
    engine.on_after_instruction(0xD9, 0x0041, 0, 1200);
    assert_eq!(engine.depth(), 2);

    let trace = engine.trace().finalize(0);
    let vbl_idx = trace.shared.frames.iter().position(|f| f.name == "[INTERRUPT] VBL").unwrap();
    let open_close: Vec<_> = trace.profiles[0]
        .events
        .iter()
        .filter(|e| e.frame == vbl_idx)
        .map(|e| (e.event_type, e.at))
        .collect();
    assert_eq!(
        open_close,
        vec![(profiler_core::EventType::Open, 1000), (profiler_core::EventType::Close, 1200)]
    );
}

#[test]
fn scenario_5_capture_start_filter() {
    let mut core = infinite_loop_core();
    let mut engine = CallStackEngine::new(map_from(&[("_main", 0x0150, 0)]));
    let config = ProfilerConfig {
        start_frame: 1,
        frames: 1,
        capture_mode: CaptureMode::All,
        disabled_interrupts: vec![],
        verbose: false,
    };
    let outcome =
        profiler_core::driver::run(&mut core, &mut engine, &[], &config, |_, _, i| format!("f{i}.png"), |_, _| {});

    assert_eq!(outcome.trace.captures.len(), 1);
    assert_eq!(outcome.trace.captures[0].frame_number, 1);
}

#[test]
fn scenario_6_bank_switch_opens_distinct_frames() {
    let mut engine = CallStackEngine::new(map_from(&[("_boot", 0x0100, 0), ("_x", 0x4100, 1)]));
    run_pc_trace(&mut engine, &[(0x0100, 1), (0x4100, 1)]);
    assert_eq!(engine.depth(), 2);

    let trace = engine.trace().finalize(0);
    let boot_idx = trace.shared.frames.iter().position(|f| f.name == "_boot").unwrap();
    let x_idx = trace.shared.frames.iter().position(|f| f.name == "_x").unwrap();
    let opens: Vec<usize> = trace.profiles[0]
        .events
        .iter()
        .filter(|e| e.event_type == profiler_core::EventType::Open)
        .map(|e| e.frame)
        .collect();
    assert_eq!(opens, vec![boot_idx, x_idx]);
}

#[test]
fn reti_with_empty_interrupt_stack_is_a_no_op() {
    let mut engine = CallStackEngine::new(map_from(&[("_main", 0x0150, 0)]));
    engine.on_after_instruction(0x00, 0x0150, 0, 0);
    let depth_before = engine.depth();
    engine.on_after_instruction(0xD9, 0x0151, 0, 10);
    assert_eq!(engine.depth(), depth_before);
}
