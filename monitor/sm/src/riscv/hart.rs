//! The hart executing the monitor.

use enclave_engine::Hart;
use riscv_csrs::Interrupts;
use riscv_utils::{
    aclint_mtimer_set_mtimecmp, clear_mie, clear_mip, local_sfence_vma, read_mepc, read_mhartid,
    read_satp, read_stvec, set_mie, write_mepc, write_satp, write_sepc, write_stvec,
};

/// CSR access for the current hart.
pub struct MachineHart {
    id: usize,
}

impl MachineHart {
    pub fn current() -> Self {
        MachineHart { id: read_mhartid() }
    }
}

impl Hart for MachineHart {
    fn id(&self) -> usize {
        self.id
    }

    fn satp(&self) -> usize {
        read_satp()
    }

    fn set_satp(&mut self, satp: usize) {
        write_satp(satp);
    }

    fn stvec(&self) -> usize {
        read_stvec()
    }

    fn set_stvec(&mut self, stvec: usize) {
        write_stvec(stvec);
    }

    fn mepc(&self) -> usize {
        read_mepc()
    }

    fn set_mepc(&mut self, mepc: usize) {
        write_mepc(mepc);
    }

    fn set_sepc(&mut self, sepc: usize) {
        write_sepc(sepc);
    }

    fn mask_timer_interrupt(&mut self) {
        clear_mie(Interrupts::MTIP.bits());
    }

    fn unmask_timer_interrupt(&mut self) {
        set_mie(Interrupts::MTIP.bits());
    }

    fn clear_pending_interrupts(&mut self) {
        clear_mip((Interrupts::MTIP | Interrupts::STIP).bits());
    }

    fn set_timer(&mut self, deadline: usize) {
        aclint_mtimer_set_mtimecmp(self.id, deadline);
        clear_mip(Interrupts::STIP.bits());
        set_mie(Interrupts::MTIP.bits());
    }

    fn fence_vma(&mut self) {
        local_sfence_vma();
    }
}
