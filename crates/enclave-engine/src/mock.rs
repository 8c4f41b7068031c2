//! In-memory platform, used to exercise the engine off target.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use riscv_csrs::Interrupts;
use spin::Mutex;

use crate::config::NB_HARTS;
use crate::platform::{Hart, HostMemory, HostMemoryError, PageTableError, PageTableValidator};
use crate::region::{RegionDriver, RegionError, RegionId, RegionPriority};

pub const MOCK_REGIONS: usize = 32;

#[derive(Debug, Clone, Copy)]
struct MockRegion {
    base: usize,
    size: usize,
    global: bool,
    lifted: [bool; NB_HARTS],
}

/// Region driver, page table validator and host memory backed by plain data structures.
///
/// Each collaborator can be told to fail, to drive the engine through its error paths.
pub struct MockPlatform {
    regions: Mutex<[Option<MockRegion>; MOCK_REGIONS]>,
    memory: Mutex<HashMap<usize, usize>>,
    scrubbed: Mutex<Vec<(usize, usize)>>,
    fail_region_init: AtomicBool,
    fail_set_global: AtomicBool,
    fail_validation: AtomicBool,
}

impl MockPlatform {
    pub fn new() -> Self {
        MockPlatform {
            regions: Mutex::new([None; MOCK_REGIONS]),
            memory: Mutex::new(HashMap::new()),
            scrubbed: Mutex::new(Vec::new()),
            fail_region_init: AtomicBool::new(false),
            fail_set_global: AtomicBool::new(false),
            fail_validation: AtomicBool::new(false),
        }
    }

    pub fn fail_region_init(&self, fail: bool) {
        self.fail_region_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set_global(&self, fail: bool) {
        self.fail_set_global.store(fail, Ordering::SeqCst);
    }

    pub fn fail_validation(&self, fail: bool) {
        self.fail_validation.store(fail, Ordering::SeqCst);
    }

    pub fn word_at(&self, addr: usize) -> Option<usize> {
        self.memory.lock().get(&addr).copied()
    }

    pub fn write(&self, addr: usize, value: usize) {
        self.memory.lock().insert(addr, value);
    }

    pub fn live_regions(&self) -> usize {
        self.regions.lock().iter().flatten().count()
    }

    /// The region is enforced on `hart`.
    pub fn is_enforced(&self, hart: usize, region: RegionId) -> bool {
        self.regions
            .lock()
            .get(region.0)
            .copied()
            .flatten()
            .map_or(false, |r| r.global && !r.lifted[hart])
    }

    pub fn scrubbed(&self) -> Vec<(usize, usize)> {
        self.scrubbed.lock().clone()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionDriver for MockPlatform {
    fn init_atomic(
        &self,
        base: usize,
        size: usize,
        _perm: u8,
        _priority: RegionPriority,
    ) -> Result<RegionId, RegionError> {
        if self.fail_region_init.load(Ordering::SeqCst) {
            return Err(RegionError::Exhausted);
        }
        let mut regions = self.regions.lock();
        let index = regions
            .iter()
            .position(|slot| slot.is_none())
            .ok_or(RegionError::Exhausted)?;
        regions[index] = Some(MockRegion {
            base,
            size,
            global: false,
            lifted: [false; NB_HARTS],
        });
        Ok(RegionId(index))
    }

    fn free_atomic(&self, region: RegionId) {
        let mut regions = self.regions.lock();
        if regions[region.0].take().is_none() {
            panic!("Double free of region {:?}", region);
        }
    }

    fn set_global(&self, _hart: usize, region: RegionId) -> Result<(), RegionError> {
        if self.fail_set_global.load(Ordering::SeqCst) {
            return Err(RegionError::InvalidRegion);
        }
        let mut regions = self.regions.lock();
        let entry = regions[region.0].as_mut().ok_or(RegionError::InvalidRegion)?;
        entry.global = true;
        entry.lifted = [false; NB_HARTS];
        Ok(())
    }

    fn unset_global(&self, _hart: usize, region: RegionId) -> Result<(), RegionError> {
        let mut regions = self.regions.lock();
        let entry = regions[region.0].as_mut().ok_or(RegionError::InvalidRegion)?;
        entry.global = false;
        Ok(())
    }

    fn set(&self, hart: usize, region: RegionId) {
        if let Some(entry) = self.regions.lock()[region.0].as_mut() {
            entry.lifted[hart] = false;
        }
    }

    fn unset(&self, hart: usize, region: RegionId) {
        if let Some(entry) = self.regions.lock()[region.0].as_mut() {
            entry.lifted[hart] = true;
        }
    }

    fn base(&self, region: RegionId) -> usize {
        self.regions.lock()[region.0].map_or(0, |r| r.base)
    }

    fn size(&self, region: RegionId) -> usize {
        self.regions.lock()[region.0].map_or(0, |r| r.size)
    }
}

impl PageTableValidator for MockPlatform {
    fn init_and_validate(
        &self,
        _levels: usize,
        _root: usize,
        _base: usize,
        _size: usize,
    ) -> Result<(), PageTableError> {
        if self.fail_validation.load(Ordering::SeqCst) {
            return Err(PageTableError::OutOfBounds);
        }
        Ok(())
    }
}

impl HostMemory for MockPlatform {
    fn check_word(&self, addr: usize) -> Result<(), HostMemoryError> {
        if addr % core::mem::size_of::<usize>() != 0 {
            return Err(HostMemoryError::Misaligned);
        }
        if addr == 0 {
            return Err(HostMemoryError::Inaccessible);
        }
        Ok(())
    }

    fn write_word(&self, addr: usize, value: usize) -> Result<(), HostMemoryError> {
        self.check_word(addr)?;
        self.memory.lock().insert(addr, value);
        Ok(())
    }

    fn scrub(&self, base: usize, size: usize) {
        self.memory
            .lock()
            .retain(|&addr, _| addr < base || addr - base >= size);
        self.scrubbed.lock().push((base, size));
    }
}

/// CSR model of a single hart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHart {
    pub id: usize,
    pub satp: usize,
    pub stvec: usize,
    pub mepc: usize,
    pub sepc: usize,
    pub timer_enabled: bool,
    pub pending: Interrupts,
    pub timer_deadline: Option<usize>,
    pub fences: usize,
}

impl MockHart {
    pub fn new(id: usize) -> Self {
        MockHart {
            id,
            satp: 0,
            stvec: 0,
            mepc: 0,
            sepc: 0,
            timer_enabled: true,
            pending: Interrupts::empty(),
            timer_deadline: None,
            fences: 0,
        }
    }
}

impl Hart for MockHart {
    fn id(&self) -> usize {
        self.id
    }

    fn satp(&self) -> usize {
        self.satp
    }

    fn set_satp(&mut self, satp: usize) {
        self.satp = satp;
    }

    fn stvec(&self) -> usize {
        self.stvec
    }

    fn set_stvec(&mut self, stvec: usize) {
        self.stvec = stvec;
    }

    fn mepc(&self) -> usize {
        self.mepc
    }

    fn set_mepc(&mut self, mepc: usize) {
        self.mepc = mepc;
    }

    fn set_sepc(&mut self, sepc: usize) {
        self.sepc = sepc;
    }

    fn mask_timer_interrupt(&mut self) {
        self.timer_enabled = false;
    }

    fn unmask_timer_interrupt(&mut self) {
        self.timer_enabled = true;
    }

    fn clear_pending_interrupts(&mut self) {
        self.pending.remove(Interrupts::MTIP | Interrupts::STIP);
    }

    fn set_timer(&mut self, deadline: usize) {
        self.timer_deadline = Some(deadline);
        self.pending.remove(Interrupts::STIP);
        self.timer_enabled = true;
    }

    fn fence_vma(&mut self) {
        self.fences += 1;
    }
}
