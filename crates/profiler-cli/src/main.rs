mod capture;
mod cli;
mod error;
mod loaders;

use clap::Parser;
use error::CliError;
use gb_core::{Cartridge, GbCore};
use profiler_core::{CallStackEngine, ProfilerConfig, SymbolMap, Trace};
use std::path::Path;

fn main() {
    let args = cli::Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &cli::Args) -> Result<(), CliError> {
    let config_file = match &args.config {
        Some(path) => {
            let text =
                std::fs::read_to_string(path).map_err(|e| CliError::Read { path: path.clone(), source: e })?;
            Some(toml::from_str(&text).map_err(|e| CliError::ConfigToml { path: path.clone(), source: e })?)
        }
        None => None,
    };
    let config = cli::resolve_config(args, config_file);
    config.validate()?;

    let symbol_map = loaders::load_symbol_map(args.map.as_deref());

    if args.list_frames {
        print_frames(&symbol_map);
        return Ok(());
    }

    let rom_bytes = loaders::load_rom(&args.rom)?;
    let input_events = loaders::load_input_events(args.input.as_deref())?;
    let total_frames = config.start_frame + config.frames;
    let input_events = profiler_core::input::normalize(input_events, total_frames)?;

    let trace = run_once(&rom_bytes, symbol_map.clone(), &input_events, &config, &args.capture_dir)?;

    if args.verify_determinism {
        log::info!("re-running for determinism check");
        let second = run_once(&rom_bytes, symbol_map, &input_events, &config, &args.capture_dir)?;
        if serde_json::to_string(&trace).ok() != serde_json::to_string(&second).ok() {
            return Err(CliError::NonDeterministic);
        }
        log::info!("determinism check passed");
    }

    let json = serde_json::to_string_pretty(&trace).expect("Trace always serializes");
    std::fs::write(&args.out, json).map_err(|e| CliError::Write { path: args.out.clone(), source: e })?;
    log::info!("wrote trace to {}", args.out.display());
    Ok(())
}

fn run_once(
    rom_bytes: &[u8],
    symbol_map: SymbolMap,
    input_events: &[profiler_core::InputEvent],
    config: &ProfilerConfig,
    capture_dir: &Path,
) -> Result<Trace, CliError> {
    let cartridge = Cartridge::from_bytes(rom_bytes.to_vec())?;
    let mut core = GbCore::new(cartridge);
    let mut engine = CallStackEngine::new(symbol_map);

    let outcome = profiler_core::driver::run(
        &mut core,
        &mut engine,
        input_events,
        config,
        |core, _at, frame_number| match capture::write_frame_png(core, capture_dir, frame_number) {
            Ok(path) => path.display().to_string(),
            Err(e) => {
                log::warn!("failed to write capture for frame {frame_number}: {e}");
                String::new()
            }
        },
        |done, total| log::debug!("frame {done}/{total}"),
    );
    Ok(outcome.trace)
}

fn print_frames(symbol_map: &SymbolMap) {
    let regions = profiler_core::RegionTable::build(symbol_map);
    for symbol in symbol_map.symbols() {
        let region = regions.find(symbol.bank, symbol.addr);
        match region {
            Some(r) => println!("bank {:>3}  {:#06x}-{:#06x}  {}", r.bank, r.addr, r.end, r.symbol),
            None => println!("bank {:>3}  {:#06x}         {}", symbol.bank, symbol.addr, symbol.symbol),
        }
    }
}
