#![cfg_attr(not(test), no_std)]

use bitflags::bitflags;

//mstatus register fields. mask for fields with width > 1 bit.
pub mod mstatus {
    pub const MPP_LOW: usize = 11;
    pub const MPP_HIGH: usize = 12;
    pub const MPP_MASK: usize = 0x3; // 2 bits
    pub const MPIE: usize = 7;
    pub const MPRV: usize = 17;
}

//mcause register valid values.
pub mod mcause {
    pub const INTERRUPT: usize = 1 << 63;

    pub const INSTRUCTION_ACCESS_FAULT: usize = 1;
    pub const ILLEGAL_INSTRUCTION: usize = 2;
    pub const LOAD_ACCESS_FAULT: usize = 5;
    pub const STORE_ACCESS_FAULT: usize = 7;
    pub const ECALL_FROM_UMODE: usize = 8;
    pub const ECALL_FROM_SMODE: usize = 9;
    pub const INSTRUCTION_PAGE_FAULT: usize = 12;
    pub const LOAD_PAGE_FAULT: usize = 13;
    pub const STORE_PAGE_FAULT: usize = 15;

    pub const MSWI: usize = INTERRUPT | 3;
    pub const MTI: usize = INTERRUPT | 7;
    pub const MEI: usize = INTERRUPT | 11;

    pub const fn is_interrupt(mcause: usize) -> bool {
        mcause & INTERRUPT != 0
    }
}

bitflags! {
    /// Bits shared by `mie` and `mip`.
    pub struct Interrupts: usize {
        const SSIP = 1 << 1;
        const MSIP = 1 << 3;
        const STIP = 1 << 5;
        const MTIP = 1 << 7;
        const SEIP = 1 << 9;
        const MEIP = 1 << 11;
    }
}

pub mod satp {
    pub const MODE_SHIFT: usize = 60;
    pub const MODE_MASK: usize = 0xf << MODE_SHIFT;
    pub const MODE_BARE: usize = 0;
    pub const MODE_SV39: usize = 8;
    pub const PPN_MASK: usize = (1 << 44) - 1;

    /// Satp value selecting an Sv39 root page table at `root` (a physical address).
    pub const fn sv39(root: usize) -> usize {
        (MODE_SV39 << MODE_SHIFT) | ((root >> 12) & PPN_MASK)
    }

    pub const fn mode(satp: usize) -> usize {
        (satp & MODE_MASK) >> MODE_SHIFT
    }

    pub const fn root(satp: usize) -> usize {
        (satp & PPN_MASK) << 12
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
