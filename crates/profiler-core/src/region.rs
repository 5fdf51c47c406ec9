//! Region Table: derives contiguous, per-bank address ranges from the
//! Symbol Map by sorting symbols within a bank and taking each region up to
//! (but not including) the next symbol's start.

use crate::symbol::{Symbol, SymbolMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn bank_max(bank: u8) -> u16 {
    if bank == 0 {
        0x3FFF
    } else {
        0x7FFF
    }
}

/// A contiguous `[addr, end]` range within one bank attributed to one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub symbol_index: usize,
    pub symbol: String,
    pub addr: u16,
    pub bank: u8,
    pub end: u16,
}

#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    /// Regions per bank, sorted by `addr` ascending.
    by_bank: BTreeMap<u8, Vec<Region>>,
}

impl RegionTable {
    pub fn build(map: &SymbolMap) -> Self {
        let mut grouped: BTreeMap<u8, Vec<(usize, &Symbol)>> = BTreeMap::new();
        for (idx, sym) in map.symbols().iter().enumerate() {
            grouped.entry(sym.bank).or_default().push((idx, sym));
        }

        let mut by_bank: BTreeMap<u8, Vec<Region>> = BTreeMap::new();
        for (bank, mut entries) in grouped {
            entries.sort_by_key(|(_, s)| s.addr);
            let max = bank_max(bank);
            let mut regions = Vec::with_capacity(entries.len());
            for i in 0..entries.len() {
                let (idx, sym) = entries[i];
                let end = if i + 1 < entries.len() {
                    let next_addr = entries[i + 1].1.addr;
                    max.min(next_addr.saturating_sub(1))
                } else {
                    max
                };
                regions.push(Region {
                    symbol_index: idx,
                    symbol: sym.symbol.clone(),
                    addr: sym.addr,
                    bank,
                    end,
                });
            }
            by_bank.insert(bank, regions);
        }
        RegionTable { by_bank }
    }

    pub fn regions_in_bank(&self, bank: u8) -> &[Region] {
        self.by_bank.get(&bank).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Linear scan for the region containing `pc` within `bank`. A binary
    /// search would do since regions are sorted and disjoint, but typical
    /// ROM symbol tables are small enough (hundreds of entries per bank)
    /// that this isn't the bottleneck.
    pub fn find(&self, bank: u8, pc: u16) -> Option<&Region> {
        self.regions_in_bank(bank).iter().find(|r| r.addr <= pc && pc <= r.end)
    }
}
