//! Sv39 page table validation.
//!
//! Enclave page tables are built by the untrusted host inside the enclave memory. Before the
//! enclave can run, every table and every mapped page they reference must lie inside that
//! memory, otherwise the enclave could be given access to host or monitor pages.

use enclave_engine::{PageTableError, PageTableValidator};
use riscv_utils::{PAGE_SHIFT, PAGE_SIZE};

pub const PTE_V: usize = 1 << 0;
pub const PTE_R: usize = 1 << 1;
pub const PTE_W: usize = 1 << 2;
pub const PTE_X: usize = 1 << 3;

const PTE_PPN_SHIFT: usize = 10;
const PTE_PPN_MASK: usize = (1 << 44) - 1;
const PTES_PER_TABLE: usize = 512;
const PTE_SIZE: usize = 8;

/// Physical memory holding the page tables.
pub trait PhysMemory {
    fn read_pte(&self, addr: usize) -> usize;
    fn write_pte(&self, addr: usize, pte: usize);
}

pub struct Sv39Validator<M> {
    memory: M,
}

impl<M> Sv39Validator<M> {
    pub const fn new(memory: M) -> Self {
        Sv39Validator { memory }
    }
}

impl<M: PhysMemory> Sv39Validator<M> {
    fn walk(&self, level: usize, table: usize, base: usize, size: usize) -> Result<(), PageTableError> {
        for index in 0..PTES_PER_TABLE {
            let addr = table + index * PTE_SIZE;
            let pte = self.memory.read_pte(addr);

            if pte & PTE_V == 0 {
                if pte != 0 {
                    self.memory.write_pte(addr, 0);
                }
                continue;
            }
            // Writable but not readable is reserved.
            if pte & (PTE_R | PTE_W) == PTE_W {
                return Err(PageTableError::InvalidEntry);
            }

            let target = ((pte >> PTE_PPN_SHIFT) & PTE_PPN_MASK) << PAGE_SHIFT;
            if pte & (PTE_R | PTE_X) != 0 {
                // Leaves at upper levels map superpages.
                let span = PAGE_SIZE << (9 * (level - 1));
                if target % span != 0 {
                    return Err(PageTableError::Misaligned);
                }
                if !contains(base, size, target, span) {
                    log::debug!("PTE at {:#x} maps {:#x} outside of the enclave", addr, target);
                    return Err(PageTableError::OutOfBounds);
                }
            } else {
                if level == 1 {
                    return Err(PageTableError::InvalidEntry);
                }
                if !contains(base, size, target, PAGE_SIZE) {
                    log::debug!("PTE at {:#x} points to table {:#x} outside of the enclave", addr, target);
                    return Err(PageTableError::OutOfBounds);
                }
                self.walk(level - 1, target, base, size)?;
            }
        }
        Ok(())
    }
}

impl<M: PhysMemory> PageTableValidator for Sv39Validator<M> {
    fn init_and_validate(
        &self,
        levels: usize,
        root: usize,
        base: usize,
        size: usize,
    ) -> Result<(), PageTableError> {
        if levels == 0 {
            return Err(PageTableError::InvalidEntry);
        }
        if root % PAGE_SIZE != 0 {
            return Err(PageTableError::Misaligned);
        }
        if !contains(base, size, root, PAGE_SIZE) {
            return Err(PageTableError::OutOfBounds);
        }
        self.walk(levels, root, base, size)
    }
}

/// `[addr, addr + len)` lies within `[base, base + size)`.
fn contains(base: usize, size: usize, addr: usize, len: usize) -> bool {
    let end = base as u128 + size as u128;
    addr >= base && addr as u128 + len as u128 <= end
}

// ————————————————————————————————— Tests —————————————————————————————————— //
