use crate::error::CliError;
use profiler_core::{InputEvent, SymbolMap};
use std::path::Path;

pub fn load_rom(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| CliError::Read { path: path.to_path_buf(), source: e })
}

/// Missing or unreadable map files fall back to interrupts-only — a wrong
/// or absent map degrades symbolization, it isn't fatal.
pub fn load_symbol_map(path: Option<&Path>) -> SymbolMap {
    let Some(path) = path else {
        return SymbolMap::interrupts_only();
    };
    match std::fs::read_to_string(path) {
        Ok(text) => SymbolMap::parse(&text),
        Err(e) => {
            log::warn!("could not read map file {}: {e}; symbolizing interrupts only", path.display());
            SymbolMap::interrupts_only()
        }
    }
}

pub fn load_input_events(path: Option<&Path>) -> Result<Vec<InputEvent>, CliError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError::Read { path: path.to_path_buf(), source: e })?;
    serde_json::from_str(&text).map_err(|e| CliError::InputJson { path: path.to_path_buf(), source: e })
}
