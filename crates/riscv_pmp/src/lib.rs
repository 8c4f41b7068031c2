#![cfg_attr(not(test), no_std)]
//RISC-V PMP Configuration.

pub mod csrs;
mod regions;

pub use regions::{PmpBackend, PmpRegions, RegionPriority};

//The following constants assume 16 PMP entries.
pub const PMP_ENTRIES: usize = 16;
pub const PMP_CFG_ENTRIES: usize = 2;

//The number of PMP entries used to protect for instance memory mapped CSRs related to interrupts,
//in this case, 1 entry for SiFive CLINT (the highest priority entry)
pub const FROZEN_PMP_ENTRIES: usize = 1;

pub const PMP_R: u8 = 1 << 0;
pub const PMP_W: u8 = 1 << 1;
pub const PMP_X: u8 = 1 << 2;
pub const PMP_NO_PERM: u8 = 0;

const XWR_MASK: u8 = PMP_R | PMP_W | PMP_X;
const RV64_PAGESIZE_MASK: usize = 0xfff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PMPAddressingMode {
    OFF = 0,
    TOR = 1,
    NA4 = 2,
    NAPOT = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum PMPErrorCode {
    InvalidIndex = 2,
    NotPageAligned = 3,
    InvalidPermissions = 4,
    InvalidCfg = 5,
    NoFreeEntry = 6,
    InvalidRegion = 7,
}

/// Values to program for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmpEncoding {
    /// A single NAPOT entry.
    Napot { pmpaddr: usize },
    /// Two consecutive entries, the first one holds the bottom address and is left OFF.
    Tor { bottom: usize, top: usize },
}

impl PmpEncoding {
    pub fn entries(&self) -> usize {
        match self {
            PmpEncoding::Napot { .. } => 1,
            PmpEncoding::Tor { .. } => 2,
        }
    }

    pub fn mode(&self) -> PMPAddressingMode {
        match self {
            PmpEncoding::Napot { .. } => PMPAddressingMode::NAPOT,
            PmpEncoding::Tor { .. } => PMPAddressingMode::TOR,
        }
    }
}

/// Computes the PMP encoding of `[addr, addr + size)`.
///
/// The whole address space is requested with `addr = 0` and `size = usize::MAX`. Any other
/// region must be page aligned, and gets a NAPOT entry whenever its size is a power of two and its
/// base is aligned on that size, a TOR pair otherwise.
pub fn pmp_encode(region_addr: usize, region_size: usize) -> Result<PmpEncoding, PMPErrorCode> {
    if region_addr == 0 && region_size == usize::MAX {
        return Ok(PmpEncoding::Napot { pmpaddr: usize::MAX });
    }

    if region_size == 0
        || region_addr & RV64_PAGESIZE_MASK != 0
        || region_size & RV64_PAGESIZE_MASK != 0
    {
        log::debug!("PMP addr or size not page aligned!");
        return Err(PMPErrorCode::NotPageAligned);
    }
    let region_end = region_addr
        .checked_add(region_size)
        .ok_or(PMPErrorCode::InvalidRegion)?;

    if region_size.is_power_of_two() && region_addr & (region_size - 1) == 0 {
        // Trailing ones encode the size: a region of 2^n bytes has n - 3 of them.
        let pmpaddr = (region_addr >> 2) | ((region_size >> 3) - 1);
        Ok(PmpEncoding::Napot { pmpaddr })
    } else {
        Ok(PmpEncoding::Tor {
            bottom: region_addr >> 2,
            top: region_end >> 2,
        })
    }
}

/// Builds the 8 bits configuration of the entry holding the region's permissions.
pub fn pmp_cfg(mode: PMPAddressingMode, region_perm: u8) -> Result<u8, PMPErrorCode> {
    if region_perm & !XWR_MASK != 0 {
        return Err(PMPErrorCode::InvalidPermissions);
    }
    Ok(region_perm | ((mode as u8) << 3))
}

/// Replaces byte `index % 8` of a `pmpcfg` CSR value.
pub fn pmpcfg_insert(pmpcfg: usize, index: usize, value: u8) -> usize {
    let index_pos: usize = index % 8;
    let pmpcfg_mask: usize = 0xff << (index_pos * 8);
    (pmpcfg & !pmpcfg_mask) | ((value as usize) << (index_pos * 8))
}

/// Extracts byte `index % 8` of a `pmpcfg` CSR value.
pub fn pmpcfg_extract(pmpcfg: usize, index: usize) -> u8 {
    let index_pos: usize = index % 8;
    ((pmpcfg >> (index_pos * 8)) & 0xff) as u8
}

// ————————————————————————————————— Tests —————————————————————————————————— //
