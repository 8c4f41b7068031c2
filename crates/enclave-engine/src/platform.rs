//! Services the engine expects from the platform.

use crate::region::RegionDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTableError {
    Misaligned,
    /// A valid entry maps memory outside of the enclave.
    OutOfBounds,
    /// A leaf or table entry is malformed.
    InvalidEntry,
}

/// Checks an enclave page table before the enclave becomes runnable.
pub trait PageTableValidator {
    /// Walks the `levels` deep page table rooted at `root` and checks that every physical page it
    /// references lies within `[base, base + size)`.
    fn init_and_validate(
        &self,
        levels: usize,
        root: usize,
        base: usize,
        size: usize,
    ) -> Result<(), PageTableError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMemoryError {
    Misaligned,
    /// The address is not backed by host memory.
    Inaccessible,
}

/// Machine mode accesses to physical memory.
pub trait HostMemory {
    /// Checks that a word could be written at `addr`, without writing it.
    fn check_word(&self, addr: usize) -> Result<(), HostMemoryError>;

    fn write_word(&self, addr: usize, value: usize) -> Result<(), HostMemoryError>;

    /// Zeroes `[base, base + size)`.
    fn scrub(&self, base: usize, size: usize);
}

/// Shared platform services.
pub trait Platform: RegionDriver + PageTableValidator + HostMemory {}

impl<T: RegionDriver + PageTableValidator + HostMemory> Platform for T {}

/// The hart executing the current call.
///
/// `id` is always below [`NB_HARTS`](crate::config::NB_HARTS).
pub trait Hart {
    fn id(&self) -> usize;

    fn satp(&self) -> usize;
    fn set_satp(&mut self, satp: usize);

    fn stvec(&self) -> usize;
    fn set_stvec(&mut self, stvec: usize);

    fn mepc(&self) -> usize;
    fn set_mepc(&mut self, mepc: usize);

    fn set_sepc(&mut self, sepc: usize);

    fn mask_timer_interrupt(&mut self);
    fn unmask_timer_interrupt(&mut self);

    /// Drops pending timer interrupts (machine and supervisor).
    fn clear_pending_interrupts(&mut self);

    /// Arms the supervisor timer for `deadline`: the previous forwarded tick is acknowledged and
    /// the machine timer interrupt unmasked.
    fn set_timer(&mut self, deadline: usize);

    fn fence_vma(&mut self);
}
