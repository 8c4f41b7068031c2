use core::sync::atomic::{AtomicBool, Ordering};

use riscv_csrs::Interrupts;
use riscv_pmp::{RegionPriority, PMP_NO_PERM, PMP_R, PMP_W, PMP_X};
use riscv_utils::{read_mtvec, set_mie, write_mscratch, write_mtvec, NUM_HARTS};

use super::launch_host;
use super::trap::machine_trap_handler;
use crate::println;
use crate::statics::{ENGINE, HART_STACKS, SM_SIZE, SM_START_ADDRESS, STACK_SIZE};

/// Boot information handed over by the previous boot stage.
#[repr(C)]
pub struct SmManifest {
    pub next_arg1: usize,
    pub next_addr: usize,
    pub coldboot_hartid: usize,
    pub num_harts: usize,
}

static COLDBOOT_DONE: AtomicBool = AtomicBool::new(false);

pub fn sm_entry(hartid: usize, manifest: &SmManifest, log_level: log::LevelFilter) -> ! {
    if hartid >= NUM_HARTS {
        panic!("Hart {} is not supported, at most {} harts", hartid, NUM_HARTS);
    }

    if hartid == manifest.coldboot_hartid {
        logger::init(log_level);
        println!(
            "============= Security Monitor on Coldboot Hart ID: {} =============",
            hartid
        );
        println!(
            "Manifest Content: {:x} {:x} {:x} {:x}",
            manifest.coldboot_hartid, manifest.next_arg1, manifest.next_addr, manifest.num_harts
        );
        init_memory_protection(hartid);
        COLDBOOT_DONE.store(true, Ordering::SeqCst);
    } else {
        while !COLDBOOT_DONE.load(Ordering::SeqCst) {
            core::hint::spin_loop();
        }
        log::debug!("Warmboot hart {}", hartid);
        ENGINE.platform().pmp().hart_online(hartid);
    }

    init_hart(hartid);
    launch_host(hartid, manifest.next_arg1, manifest.next_addr)
}

/// Walls off the monitor and opens the rest of memory to the host.
fn init_memory_protection(hartid: usize) {
    let pmp = ENGINE.platform().pmp();
    pmp.hart_online(hartid);

    let sm_region = pmp
        .init_region(SM_START_ADDRESS, SM_SIZE, PMP_NO_PERM, RegionPriority::Top)
        .and_then(|region| pmp.set_global(hartid, region));
    if let Err(err) = sm_region {
        panic!("Failed to protect the monitor memory: {:?}", err);
    }

    let os_region = pmp
        .init_region(0, usize::MAX, PMP_R | PMP_W | PMP_X, RegionPriority::Bottom)
        .and_then(|region| pmp.set_global(hartid, region));
    if let Err(err) = os_region {
        panic!("Failed to open memory to the host: {:?}", err);
    }
}

/// Installs the monitor stack and trap handler of the hart.
fn init_hart(hartid: usize) {
    // SAFETY: each hart only takes the address of its own stack, no reference is created.
    let stacks = unsafe { core::ptr::addr_of_mut!(HART_STACKS) } as usize;
    write_mscratch(stacks + (hartid + 1) * STACK_SIZE);

    write_mtvec(machine_trap_handler as usize);
    log::info!("Hart {} mtvec {:#x}", hartid, read_mtvec());

    set_mie(Interrupts::MSIP.bits());
}
