//! Machine mode trap entry.
//!
//! The interrupted register file is spilled on the monitor stack of the hart (found in
//! `mscratch`) and handed to `handle_trap`, which may rewrite it entirely when switching between
//! the host and an enclave. The registers are restored from the same frame before `mret`.

use core::arch::asm;

use riscv_csrs::{mcause, Interrupts};
use riscv_sbi::ipi::aclint_mswi_clear_ipi;
use riscv_utils::{clear_mie, read_mcause, read_mepc, read_mhartid, read_mtval, set_mip, RegisterState};

use super::hart::MachineHart;
use crate::calls;
use crate::statics::ENGINE;

#[repr(align(4))]
#[naked]
pub extern "C" fn machine_trap_handler() {
    unsafe {
        asm!(
        "csrrw sp, mscratch, sp
        addi sp, sp, -32*8
        sd zero, 0*8(sp)
        sd ra, 1*8(sp)
        sd gp, 3*8(sp)
        sd tp, 4*8(sp)
        sd t0, 5*8(sp)
        sd t1, 6*8(sp)
        sd t2, 7*8(sp)
        sd s0, 8*8(sp)
        sd s1, 9*8(sp)
        sd a0, 10*8(sp)
        sd a1, 11*8(sp)
        sd a2, 12*8(sp)
        sd a3, 13*8(sp)
        sd a4, 14*8(sp)
        sd a5, 15*8(sp)
        sd a6, 16*8(sp)
        sd a7, 17*8(sp)
        sd s2, 18*8(sp)
        sd s3, 19*8(sp)
        sd s4, 20*8(sp)
        sd s5, 21*8(sp)
        sd s6, 22*8(sp)
        sd s7, 23*8(sp)
        sd s8, 24*8(sp)
        sd s9, 25*8(sp)
        sd s10, 26*8(sp)
        sd s11, 27*8(sp)
        sd t3, 28*8(sp)
        sd t4, 29*8(sp)
        sd t5, 30*8(sp)
        sd t6, 31*8(sp)
        csrr t0, mscratch   // interrupted sp
        sd t0, 2*8(sp)
        mv a0, sp
        call {trap_handler}
        ld ra, 1*8(sp)
        ld gp, 3*8(sp)
        ld tp, 4*8(sp)
        ld t1, 6*8(sp)
        ld t2, 7*8(sp)
        ld s0, 8*8(sp)
        ld s1, 9*8(sp)
        ld a0, 10*8(sp)
        ld a1, 11*8(sp)
        ld a2, 12*8(sp)
        ld a3, 13*8(sp)
        ld a4, 14*8(sp)
        ld a5, 15*8(sp)
        ld a6, 16*8(sp)
        ld a7, 17*8(sp)
        ld s2, 18*8(sp)
        ld s3, 19*8(sp)
        ld s4, 20*8(sp)
        ld s5, 21*8(sp)
        ld s6, 22*8(sp)
        ld s7, 23*8(sp)
        ld s8, 24*8(sp)
        ld s9, 25*8(sp)
        ld s10, 26*8(sp)
        ld s11, 27*8(sp)
        ld t3, 28*8(sp)
        ld t4, 29*8(sp)
        ld t5, 30*8(sp)
        ld t6, 31*8(sp)
        addi t0, sp, 32*8   // monitor stack top
        csrw mscratch, t0
        ld t0, 5*8(sp)
        ld sp, 2*8(sp)
        mret",
            trap_handler = sym handle_trap,
            options(noreturn)
        )
    }
}

extern "C" fn handle_trap(regs: &mut RegisterState) {
    let cause = read_mcause();
    let hartid = read_mhartid();
    let pmp = ENGINE.platform().pmp();

    // A global PMP update may have raced with this trap.
    pmp.sync_if_stale(hartid);

    match cause {
        mcause::ECALL_FROM_SMODE | mcause::ECALL_FROM_UMODE => {
            let mut hart = MachineHart::current();
            calls::handle_ecall(&ENGINE, &mut hart, regs);
        }
        mcause::MSWI => {
            aclint_mswi_clear_ipi(hartid);
            pmp.sync_local(hartid);
        }
        mcause::MTI => {
            // Forwarded to the supervisor, which re-arms the timer through its own SBI.
            clear_mie(Interrupts::MTIP.bits());
            set_mip(Interrupts::STIP.bits());
        }
        _ => exit_handler_failed(cause, read_mepc(), read_mtval()),
    }
}

fn exit_handler_failed(cause: usize, mepc: usize, mtval: usize) -> ! {
    panic!(
        "Cannot handle trap with mcause: {:#x} mepc: {:#x} mtval: {:#x}",
        cause, mepc, mtval
    );
}
