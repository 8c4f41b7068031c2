//! Scenarios driving the engine through the mock platform.

use std::sync::{Arc, Barrier};
use std::thread;

use riscv_csrs::{satp, Interrupts};
use riscv_utils::RegisterState;

use crate::config::{ENCL_MAX, POISON_WORD, RUNTIME_START_ADDRESS, RUNTIME_TRAP_VECTOR};
use crate::mock::{MockHart, MockPlatform};
use crate::platform::{HostMemory, HostMemoryError, PageTableError, PageTableValidator};
use crate::region::{RegionDriver, RegionError, RegionPriority};
use crate::{EnclaveEngine, EnclaveError, EnclaveState, HostWrite, Location, RegionId, StopSignal};

const BASE: usize = 0x8000_0000;
const SIZE: usize = 0x10_0000;
const EID_PTR: usize = 0x9000_0000;
const RET_PTR: usize = 0x9000_0008;
const HOST_SATP: usize = (8 << 60) | 0x9_0100;
const HOST_STVEC: usize = 0xffff_ffff_8000_2000;
const HOST_MEPC: usize = 0xffff_ffff_8010_0004;
const ENTRY_PC: usize = 0x1000;

type Engine = EnclaveEngine<MockPlatform>;

fn engine() -> Engine {
    EnclaveEngine::new(MockPlatform::new())
}

fn host_hart(id: usize) -> MockHart {
    let mut hart = MockHart::new(id);
    hart.satp = HOST_SATP;
    hart.stvec = HOST_STVEC;
    hart.mepc = HOST_MEPC;
    hart
}

fn host_regs(seed: usize) -> RegisterState {
    let mut regs = RegisterState::zeroed();
    regs.ra = seed + 1;
    regs.sp = seed + 2;
    regs.a0 = seed + 3;
    regs.a1 = seed + 4;
    regs.a7 = seed + 5;
    regs.s11 = seed + 6;
    regs
}

fn create_at(engine: &Engine, base: usize) -> usize {
    engine.create(&host_hart(0), base, SIZE, EID_PTR).unwrap()
}

/// Mock platform running a hook right after a region is handed back to the driver, while the
/// destroy that freed it is still in flight.
struct FreeHookPlatform {
    inner: MockPlatform,
    after_free: spin::Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl RegionDriver for FreeHookPlatform {
    fn init_atomic(
        &self,
        base: usize,
        size: usize,
        perm: u8,
        priority: RegionPriority,
    ) -> Result<RegionId, RegionError> {
        self.inner.init_atomic(base, size, perm, priority)
    }

    fn free_atomic(&self, region: RegionId) {
        self.inner.free_atomic(region);
        let hook = self.after_free.lock().take();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn set_global(&self, hart: usize, region: RegionId) -> Result<(), RegionError> {
        self.inner.set_global(hart, region)
    }

    fn unset_global(&self, hart: usize, region: RegionId) -> Result<(), RegionError> {
        self.inner.unset_global(hart, region)
    }

    fn set(&self, hart: usize, region: RegionId) {
        self.inner.set(hart, region)
    }

    fn unset(&self, hart: usize, region: RegionId) {
        self.inner.unset(hart, region)
    }

    fn base(&self, region: RegionId) -> usize {
        self.inner.base(region)
    }

    fn size(&self, region: RegionId) -> usize {
        self.inner.size(region)
    }
}

impl PageTableValidator for FreeHookPlatform {
    fn init_and_validate(
        &self,
        levels: usize,
        root: usize,
        base: usize,
        size: usize,
    ) -> Result<(), PageTableError> {
        self.inner.init_and_validate(levels, root, base, size)
    }
}

impl HostMemory for FreeHookPlatform {
    fn check_word(&self, addr: usize) -> Result<(), HostMemoryError> {
        self.inner.check_word(addr)
    }

    fn write_word(&self, addr: usize, value: usize) -> Result<(), HostMemoryError> {
        self.inner.write_word(addr, value)
    }

    fn scrub(&self, base: usize, size: usize) {
        self.inner.scrub(base, size)
    }
}

fn region_of(engine: &Engine, eid: usize) -> RegionId {
    let (base, _) = engine.region_bounds(eid).unwrap();
    (0..crate::mock::MOCK_REGIONS)
        .map(RegionId)
        .find(|&r| engine.platform().base(r) == base && engine.platform().size(r) != 0)
        .unwrap()
}

// ———————————————————————————————— Lifecycle ——————————————————————————————— //

#[test]
fn create_overlap_destroy() {
    let engine = engine();
    let hart = host_hart(0);

    assert_eq!(engine.create(&hart, BASE, SIZE, EID_PTR), Ok(0));
    assert_eq!(engine.state(0), Some(EnclaveState::Initialized));
    assert_eq!(engine.platform().word_at(EID_PTR), Some(0));
    assert_eq!(engine.host_satp(0), Some(HOST_SATP));

    assert_eq!(
        engine.create(&hart, 0x8008_0000, SIZE, EID_PTR),
        Err(EnclaveError::RegionOverlap)
    );
    assert_eq!(engine.platform().live_regions(), 1);

    engine.platform().write(BASE + 0x40, 0xdead);
    assert_eq!(engine.destroy(&hart, 0), Ok(()));
    assert!(!engine.is_allocated(0));
    assert_eq!(engine.state(0), None);
    assert_eq!(engine.platform().live_regions(), 0);
    assert_eq!(engine.platform().scrubbed(), vec![(BASE, SIZE)]);
    assert_eq!(engine.platform().word_at(BASE + 0x40), None);

    assert_eq!(engine.destroy(&hart, 0), Err(EnclaveError::NotDestroyable));
    assert_eq!(engine.destroy(&hart, ENCL_MAX), Err(EnclaveError::NotDestroyable));
}

#[test]
fn adjacent_regions_do_not_overlap() {
    let engine = engine();
    assert_eq!(create_at(&engine, BASE), 0);
    assert_eq!(create_at(&engine, BASE + SIZE), 1);
    assert_eq!(
        engine.create(&host_hart(0), BASE + SIZE - 0x1000, 0x1000, EID_PTR),
        Err(EnclaveError::RegionOverlap)
    );
}

#[test]
fn create_validates_arguments() {
    let engine = engine();
    let hart = host_hart(0);

    assert_eq!(engine.create(&hart, BASE, 0, EID_PTR), Err(EnclaveError::IllegalArgument));
    assert_eq!(
        engine.create(&hart, BASE + 0x10, SIZE, EID_PTR),
        Err(EnclaveError::IllegalArgument)
    );
    assert_eq!(
        engine.create(&hart, usize::MAX & !0xfff, 0x2000, EID_PTR),
        Err(EnclaveError::IllegalArgument)
    );
    assert_eq!(engine.platform().live_regions(), 0);
    assert_eq!(engine.platform().word_at(EID_PTR), None);
}

#[test]
fn create_requires_a_writable_eid_slot() {
    let engine = engine();
    let hart = host_hart(0);

    assert_eq!(
        engine.create(&hart, BASE, SIZE, EID_PTR + 4),
        Err(EnclaveError::IllegalArgument)
    );
    assert_eq!(engine.create(&hart, BASE, SIZE, 0), Err(EnclaveError::IllegalArgument));
    assert!(!engine.is_allocated(0));
    assert_eq!(engine.platform().live_regions(), 0);
    assert_eq!(engine.platform().word_at(EID_PTR + 4), None);

    assert_eq!(engine.create(&hart, BASE, SIZE, EID_PTR), Ok(0));
    assert_eq!(engine.platform().word_at(EID_PTR), Some(0));
}

#[test]
fn create_unwinds_on_failure() {
    let engine = engine();
    let hart = host_hart(0);

    engine.platform().fail_region_init(true);
    assert_eq!(engine.create(&hart, BASE, SIZE, EID_PTR), Err(EnclaveError::PmpFailure));
    engine.platform().fail_region_init(false);

    engine.platform().fail_set_global(true);
    assert_eq!(engine.create(&hart, BASE, SIZE, EID_PTR), Err(EnclaveError::PmpFailure));
    assert!(!engine.is_allocated(0));
    assert_eq!(engine.platform().live_regions(), 0);
    engine.platform().fail_set_global(false);

    engine.platform().fail_validation(true);
    assert_eq!(
        engine.create(&hart, BASE, SIZE, EID_PTR),
        Err(EnclaveError::IllegalPageTable)
    );
    assert!(!engine.is_allocated(0));
    assert_eq!(engine.platform().live_regions(), 0);
    assert_eq!(engine.lookup_by_host_satp(HOST_SATP), None);
    engine.platform().fail_validation(false);

    // Nothing leaked, the same range and id can be used again.
    assert_eq!(engine.create(&hart, BASE, SIZE, EID_PTR), Ok(0));
    assert_eq!(engine.platform().word_at(EID_PTR), Some(0));
}

#[test]
fn capacity_and_reuse() {
    let engine = engine();
    for eid in 0..ENCL_MAX {
        assert_eq!(create_at(&engine, BASE + eid * SIZE), eid);
    }
    assert_eq!(
        engine.create(&host_hart(0), BASE + ENCL_MAX * SIZE, SIZE, EID_PTR),
        Err(EnclaveError::NoCapacity)
    );
    assert_eq!(engine.platform().live_regions(), ENCL_MAX);

    engine.destroy(&host_hart(0), 5).unwrap();
    assert_eq!(create_at(&engine, BASE + ENCL_MAX * SIZE), 5);
}

#[test]
fn queries() {
    let engine = engine();
    let eid = create_at(&engine, BASE);

    assert_eq!(engine.region_bounds(eid), Some((BASE, SIZE)));
    assert_eq!(engine.lookup_by_host_satp(HOST_SATP), Some(eid));
    assert_eq!(engine.lookup_by_enclave_satp(satp::sv39(BASE)), Some(eid));
    assert_eq!(engine.lookup_by_enclave_satp(0), None);
    assert_eq!(engine.location(eid), Some(Location::Idle));
    assert_eq!(engine.host_satp(3), None);
    assert_eq!(engine.region_bounds(3), None);

    engine.destroy(&host_hart(0), eid).unwrap();
    assert_eq!(engine.lookup_by_host_satp(HOST_SATP), None);
    assert_eq!(engine.lookup_by_enclave_satp(satp::sv39(BASE)), None);
}

// ————————————————————————————— Context Switch ————————————————————————————— //

#[test]
fn enter_then_exit_restores_host() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let region = region_of(&engine, eid);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0x100);

    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();
    assert_eq!(engine.state(eid), Some(EnclaveState::Running));
    assert_eq!(engine.location(eid), Some(Location::InEnclave { hart: 0 }));
    assert_eq!(hart.satp, satp::sv39(BASE));
    assert_eq!(hart.stvec, RUNTIME_TRAP_VECTOR);
    assert_eq!(hart.mepc, RUNTIME_START_ADDRESS);
    assert_eq!(hart.sepc, ENTRY_PC);
    assert!(!hart.timer_enabled);
    assert!(hart.fences > 0);
    // The enclave starts with a clean register file.
    assert_eq!(regs, RegisterState::zeroed());
    // Protection is lifted on this hart only.
    assert!(!engine.platform().is_enforced(0, region));
    assert!(engine.platform().is_enforced(1, region));

    regs.a0 = 0x55;
    regs.sp = 0x3000;
    hart.mepc = 0x2000;
    engine.exit(&mut hart, &mut regs, 42).unwrap();

    assert_eq!(regs, host_regs(0x100));
    assert_eq!(hart.mepc, HOST_MEPC);
    assert_eq!(hart.satp, HOST_SATP);
    assert_eq!(hart.stvec, HOST_STVEC);
    assert!(hart.timer_enabled);
    assert!(engine.platform().is_enforced(0, region));
    assert_eq!(engine.platform().word_at(RET_PTR), Some(42));
    assert_eq!(engine.state(eid), Some(EnclaveState::Initialized));
    assert_eq!(engine.location(eid), Some(Location::Idle));

    // A second run starts from scratch again.
    let mut regs = host_regs(0x200);
    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();
    assert_eq!(regs, RegisterState::zeroed());
}

#[test]
fn enter_rejections_have_no_side_effects() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0x100);

    assert_eq!(
        engine.enter(&mut hart, &mut regs, 7, ENTRY_PC, RET_PTR),
        Err(EnclaveError::NotRunnable)
    );
    assert_eq!(
        engine.enter(&mut hart, &mut regs, ENCL_MAX + 1, ENTRY_PC, RET_PTR),
        Err(EnclaveError::NotRunnable)
    );
    assert_eq!(
        engine.enter(&mut hart, &mut regs, eid, RUNTIME_START_ADDRESS, RET_PTR),
        Err(EnclaveError::IllegalArgument)
    );
    assert_eq!(engine.state(eid), Some(EnclaveState::Initialized));
    assert_eq!(regs, host_regs(0x100));
    assert_eq!(hart, host_hart(0));

    // Single threaded: a second entry is refused while the first runs.
    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();
    let mut other = host_hart(1);
    let mut other_regs = host_regs(0x300);
    assert_eq!(
        engine.enter(&mut other, &mut other_regs, eid, ENTRY_PC, RET_PTR),
        Err(EnclaveError::NotRunnable)
    );
    assert_eq!(other, host_hart(1));
}

#[test]
fn running_enclave_is_not_destroyable() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0);
    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();

    assert_eq!(
        engine.destroy(&host_hart(1), eid),
        Err(EnclaveError::NotDestroyable)
    );
    assert_eq!(engine.state(eid), Some(EnclaveState::Running));
    assert_eq!(engine.region_bounds(eid), Some((BASE, SIZE)));
    assert_eq!(engine.platform().live_regions(), 1);

    engine.exit(&mut hart, &mut regs, 0).unwrap();
    assert_eq!(engine.destroy(&hart, eid), Ok(()));
}

#[test]
fn stop_then_resume_continues_enclave() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0x100);
    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();

    // The runtime installed its own vector and got interrupted somewhere.
    regs.a0 = 7;
    regs.s0 = 0x4242;
    hart.stvec = 0x5040;
    hart.mepc = 0x1234;
    let enclave_regs = regs;

    assert_eq!(engine.stop(&mut hart, &mut regs, 0), Ok(StopSignal::Interrupted));
    assert_eq!(regs, host_regs(0x100));
    assert_eq!(hart.mepc, HOST_MEPC);
    assert_eq!(hart.satp, HOST_SATP);
    assert_eq!(hart.stvec, HOST_STVEC);
    assert!(hart.timer_enabled);
    assert_eq!(engine.state(eid), Some(EnclaveState::Running));
    assert_eq!(engine.location(eid), Some(Location::Stopped));

    // Stopped enclaves can not be entered again nor destroyed.
    let mut scratch = host_regs(0);
    assert_eq!(
        engine.enter(&mut host_hart(1), &mut scratch, eid, ENTRY_PC, RET_PTR),
        Err(EnclaveError::NotRunnable)
    );
    assert_eq!(engine.destroy(&hart, eid), Err(EnclaveError::NotDestroyable));

    // The host did other things in the meantime, and resumes from another hart.
    let mut hart = host_hart(1);
    hart.mepc = HOST_MEPC + 0x100;
    hart.pending = Interrupts::MTIP | Interrupts::STIP | Interrupts::SSIP;
    let mut regs = host_regs(0x200);
    engine.resume(&mut hart, &mut regs, eid).unwrap();

    assert_eq!(regs, enclave_regs);
    assert_eq!(hart.mepc, 0x1234);
    assert_eq!(hart.stvec, 0x5040);
    assert_eq!(hart.satp, satp::sv39(BASE));
    assert_eq!(hart.pending, Interrupts::SSIP);
    assert!(!hart.timer_enabled);
    assert_eq!(engine.location(eid), Some(Location::InEnclave { hart: 1 }));

    engine.exit(&mut hart, &mut regs, 9).unwrap();
    assert_eq!(regs, host_regs(0x200));
    assert_eq!(hart.mepc, HOST_MEPC + 0x100);
    assert_eq!(engine.platform().word_at(RET_PTR), Some(9));
    assert_eq!(engine.state(eid), Some(EnclaveState::Initialized));
}

#[test]
fn stop_reasons() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0);
    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();

    // Unknown requests still give the hart back, the host reads an error.
    assert_eq!(engine.stop(&mut hart, &mut regs, 5), Ok(StopSignal::Unknown));
    assert_eq!(StopSignal::Unknown.code(), EnclaveError::UnknownError.code());
    assert_eq!(regs, host_regs(0));
    assert_eq!(hart.satp, HOST_SATP);
    assert_eq!(hart.stvec, HOST_STVEC);
    assert_eq!(engine.state(eid), Some(EnclaveState::Running));
    assert_eq!(engine.location(eid), Some(Location::Stopped));

    engine.resume(&mut hart, &mut regs, eid).unwrap();
    assert_eq!(engine.stop(&mut hart, &mut regs, 1), Ok(StopSignal::EdgeCallHost));
    assert_eq!(StopSignal::EdgeCallHost.code(), EnclaveError::EdgeCallHost.code());
    assert_eq!(engine.location(eid), Some(Location::Stopped));
}

#[test]
fn enclave_calls_from_the_host_are_refused() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0);

    assert_eq!(engine.exit(&mut hart, &mut regs, 0), Err(EnclaveError::InvalidId));
    assert_eq!(engine.stop(&mut hart, &mut regs, 0), Err(EnclaveError::InvalidId));

    // Matching root, but the enclave never ran on this hart.
    hart.satp = satp::sv39(BASE);
    assert_eq!(engine.exit(&mut hart, &mut regs, 0), Err(EnclaveError::NotRunning));

    // Running on hart 0, hart 1 can not act on its behalf.
    let mut running = host_hart(0);
    engine.enter(&mut running, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();
    let mut other = host_hart(1);
    other.satp = satp::sv39(BASE);
    assert_eq!(engine.stop(&mut other, &mut regs, 0), Err(EnclaveError::NotRunning));
}

#[test]
fn resume_requires_a_stopped_enclave() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0);

    assert_eq!(engine.resume(&mut hart, &mut regs, eid), Err(EnclaveError::NotResumable));
    assert_eq!(engine.resume(&mut hart, &mut regs, 9), Err(EnclaveError::NotResumable));

    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR).unwrap();
    let mut other = host_hart(1);
    let mut other_regs = host_regs(0x500);
    assert_eq!(
        engine.resume(&mut other, &mut other_regs, eid),
        Err(EnclaveError::NotResumable)
    );
    assert_eq!(other_regs, host_regs(0x500));
}

// ———————————————————————————— Host Write Guard ———————————————————————————— //

#[test]
fn host_writes_never_reach_enclaves() {
    let engine = engine();
    let eid = create_at(&engine, BASE);

    assert_eq!(engine.write_word_to_host(BASE + 8, 5), HostWrite::Poisoned(eid));
    assert_eq!(engine.platform().word_at(BASE + 8), Some(POISON_WORD));
    assert_eq!(engine.write_word_to_host(BASE + SIZE, 5), HostWrite::Delivered);
    assert_eq!(engine.platform().word_at(BASE + SIZE), Some(5));
    assert_eq!(engine.write_word_to_host(BASE + SIZE + 4, 5), HostWrite::Rejected);
    assert_eq!(engine.write_word_to_host(0, 5), HostWrite::Rejected);

    // The eid of a new enclave pointed into an existing one is poisoned too.
    let other = engine
        .create(&host_hart(0), BASE + SIZE, SIZE, BASE + 0x100)
        .unwrap();
    assert_eq!(other, 1);
    assert_eq!(engine.platform().word_at(BASE + 0x100), Some(POISON_WORD));
}

#[test]
fn exit_value_is_poisoned_inside_enclave_memory() {
    let engine = engine();
    let eid = create_at(&engine, BASE);
    let mut hart = host_hart(0);
    let mut regs = host_regs(0);

    engine.enter(&mut hart, &mut regs, eid, ENTRY_PC, BASE + 0x800).unwrap();
    engine.exit(&mut hart, &mut regs, 42).unwrap();
    assert_eq!(engine.platform().word_at(BASE + 0x800), Some(POISON_WORD));
}

// ——————————————————————————————— Concurrency —————————————————————————————— //

#[test]
fn concurrent_overlapping_creates() {
    const HARTS: usize = 8;
    let engine = Arc::new(engine());
    let barrier = Arc::new(Barrier::new(HARTS));

    let handles: Vec<_> = (0..HARTS)
        .map(|id| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let hart = host_hart(id);
                barrier.wait();
                engine.create(&hart, BASE + id * 0x1000, SIZE, EID_PTR + id * 8)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| *r == Err(EnclaveError::RegionOverlap)));
    assert_eq!(engine.platform().live_regions(), 1);
}

#[test]
fn create_during_destroy_gets_the_recycled_region() {
    let engine = Arc::new(EnclaveEngine::<FreeHookPlatform>::new(FreeHookPlatform {
        inner: MockPlatform::new(),
        after_free: spin::Mutex::new(None),
    }));
    let eid = engine.create(&host_hart(0), BASE, SIZE, EID_PTR).unwrap();

    // A disjoint create lands between the region release and the end of the destroy.
    let created = Arc::new(spin::Mutex::new(None));
    let hook: Box<dyn FnOnce() + Send> = {
        let engine = engine.clone();
        let created = created.clone();
        Box::new(move || {
            let result = engine.create(&host_hart(1), BASE + 4 * SIZE, SIZE, EID_PTR + 8);
            *created.lock() = Some(result);
        })
    };
    *engine.platform().after_free.lock() = Some(hook);

    assert_eq!(engine.destroy(&host_hart(0), eid), Ok(()));
    let other = created.lock().take().unwrap().unwrap();
    assert_ne!(other, eid);
    assert!(!engine.is_allocated(eid));
    assert_eq!(engine.region_bounds(other), Some((BASE + 4 * SIZE, SIZE)));
    assert_eq!(engine.state(other), Some(EnclaveState::Initialized));

    // The guard uses the bounds of the new region only.
    assert_eq!(engine.write_word_to_host(BASE + 8, 1), HostWrite::Delivered);
    assert_eq!(
        engine.write_word_to_host(BASE + 4 * SIZE + 8, 1),
        HostWrite::Poisoned(other)
    );
}

#[test]
fn concurrent_entries_into_one_enclave() {
    const HARTS: usize = 4;
    let engine = Arc::new(engine());
    let eid = create_at(&engine, BASE);
    let barrier = Arc::new(Barrier::new(HARTS));

    let handles: Vec<_> = (0..HARTS)
        .map(|id| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut hart = host_hart(id);
                let mut regs = host_regs(id);
                barrier.wait();
                engine
                    .enter(&mut hart, &mut regs, eid, ENTRY_PC, RET_PTR)
                    .map(|_| id)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| *r == Err(EnclaveError::NotRunnable)));
    assert_eq!(
        engine.location(eid),
        Some(Location::InEnclave { hart: winners[0] })
    );
}
