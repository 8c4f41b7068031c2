//! Moving a hart between a host and an enclave.
//!
//! `enter` and `resume` hand the hart to the enclave, `exit` and `stop` give it back to the
//! host. Both directions swap the trapped register file with the one saved in the enclave
//! thread, the hart's CSRs are then reprogrammed outside of the table lock.

use riscv_utils::RegisterState;

use crate::config::{RUNTIME_START_ADDRESS, RUNTIME_TRAP_VECTOR};
use crate::enclave::{EnclaveState, Location};
use crate::platform::{Hart, Platform};
use crate::region::RegionId;
use crate::satp::SatpIndex;
use crate::{EnclaveEngine, EnclaveError, EnclaveId, StopReason, StopSignal};

/// What happens to the enclave thread when the hart goes back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// The thread terminated, its context is dropped.
    Discard,
    /// The thread is stopped, its context is kept for a later resume.
    Preserve,
}

/// Everything the hart needs to go back to the host.
struct HostContext {
    region: RegionId,
    host_satp: usize,
    host_stvec: usize,
}

impl<P: Platform, S: SatpIndex> EnclaveEngine<P, S> {
    /// Runs enclave `eid` on the calling hart, starting at `entry_pc` in the enclave runtime.
    ///
    /// `regs` holds the host registers on entry and the enclave registers on return, the exit
    /// value of the enclave will be written at host address `retptr`.
    pub fn enter<H: Hart>(
        &self,
        hart: &mut H,
        regs: &mut RegisterState,
        eid: EnclaveId,
        entry_pc: usize,
        retptr: usize,
    ) -> Result<(), EnclaveError> {
        let hart_id = hart.id();
        let (region, encl_satp) = {
            let mut table = self.table.lock();
            if !self.eids.is_allocated(eid) || !table.enclaves[eid].is_runnable() {
                log::debug!("Enclave {} is not runnable", eid);
                return Err(EnclaveError::NotRunnable);
            }
            if entry_pc >= RUNTIME_START_ADDRESS {
                log::debug!("Refusing entry point {:#x} for enclave {}", entry_pc, eid);
                return Err(EnclaveError::IllegalArgument);
            }

            let enclave = &mut table.enclaves[eid];
            let region = enclave.region.ok_or(EnclaveError::UnknownError)?;
            enclave.state = EnclaveState::Running;
            enclave.n_thread += 1;
            enclave.host_stvec[hart_id] = hart.stvec();
            let encl_satp = enclave.encl_satp;

            let thread = &mut enclave.threads[0];
            thread.set_retptr(retptr);
            thread.location = Location::InEnclave { hart: hart_id };
            thread.swap_prev_state(regs);
            thread.swap_prev_mepc(hart.mepc());
            (region, encl_satp)
        };

        hart.set_stvec(RUNTIME_TRAP_VECTOR);
        hart.set_mepc(RUNTIME_START_ADDRESS);
        hart.set_sepc(entry_pc);
        self.switch_to_enclave(hart, region, encl_satp);
        log::debug!("Hart {} entered enclave {} at {:#x}", hart_id, eid, entry_pc);
        Ok(())
    }

    /// Terminates the enclave running on the calling hart and delivers `retval` to its host.
    pub fn exit<H: Hart>(
        &self,
        hart: &mut H,
        regs: &mut RegisterState,
        retval: usize,
    ) -> Result<(), EnclaveError> {
        let (eid, retptr, host) = self.leave_enclave(hart, regs, Continuation::Discard)?;
        self.write_word_to_host(retptr, retval);
        self.return_to_host(hart, host);

        let mut table = self.table.lock();
        let enclave = &mut table.enclaves[eid];
        enclave.n_thread = enclave.n_thread.saturating_sub(1);
        if enclave.n_thread == 0 {
            enclave.state = EnclaveState::Initialized;
        }
        log::debug!("Enclave {} exited with {:#x}", eid, retval);
        Ok(())
    }

    /// Gives the calling hart back to the host, keeping the enclave thread for a later resume.
    pub fn stop<H: Hart>(
        &self,
        hart: &mut H,
        regs: &mut RegisterState,
        reason: usize,
    ) -> Result<StopSignal, EnclaveError> {
        let (eid, _, host) = self.leave_enclave(hart, regs, Continuation::Preserve)?;
        self.return_to_host(hart, host);
        let reason = StopReason::from(reason);
        if let StopReason::Unknown(code) = reason {
            log::warn!("Enclave {} stopped for an unknown reason {}", eid, code);
        } else {
            log::debug!("Enclave {} stopped: {:?}", eid, reason);
        }
        Ok(reason.into())
    }

    /// Continues a stopped enclave on the calling hart.
    pub fn resume<H: Hart>(
        &self,
        hart: &mut H,
        regs: &mut RegisterState,
        eid: EnclaveId,
    ) -> Result<(), EnclaveError> {
        let hart_id = hart.id();
        let (region, encl_satp, stvec) = {
            let mut table = self.table.lock();
            if !self.eids.is_allocated(eid) || !table.enclaves[eid].is_resumable() {
                log::debug!("Enclave {} is not resumable", eid);
                return Err(EnclaveError::NotResumable);
            }

            let enclave = &mut table.enclaves[eid];
            let region = enclave.region.ok_or(EnclaveError::UnknownError)?;
            enclave.host_stvec[hart_id] = hart.stvec();
            let encl_satp = enclave.encl_satp;

            let thread = &mut enclave.threads[0];
            thread.swap_prev_state(regs);
            let enclave_mepc = thread.swap_prev_mepc(hart.mepc());
            hart.set_mepc(enclave_mepc);
            thread.location = Location::InEnclave { hart: hart_id };
            (region, encl_satp, thread.stvec)
        };

        hart.set_stvec(stvec);
        hart.clear_pending_interrupts();
        self.switch_to_enclave(hart, region, encl_satp);
        log::debug!("Hart {} resumed enclave {}", hart_id, eid);
        Ok(())
    }

    /// Resolves the enclave running on the calling hart and swaps its thread out.
    fn leave_enclave<H: Hart>(
        &self,
        hart: &mut H,
        regs: &mut RegisterState,
        continuation: Continuation,
    ) -> Result<(EnclaveId, usize, HostContext), EnclaveError> {
        let hart_id = hart.id();
        let mut table = self.table.lock();
        let eid = table
            .index
            .lookup_by_enclave_satp(&table.enclaves, hart.satp())
            .filter(|&eid| self.eids.is_allocated(eid))
            .ok_or(EnclaveError::InvalidId)?;

        let enclave = &mut table.enclaves[eid];
        if !enclave.is_running_on(hart_id) {
            log::debug!("Enclave {} is not running on hart {}", eid, hart_id);
            return Err(EnclaveError::NotRunning);
        }
        let host = HostContext {
            region: enclave.region.ok_or(EnclaveError::UnknownError)?,
            host_satp: enclave.host_satp,
            host_stvec: enclave.host_stvec[hart_id],
        };

        let thread = &mut enclave.threads[0];
        let retptr = thread.retptr;
        thread.swap_prev_state(regs);
        match continuation {
            Continuation::Discard => {
                hart.set_mepc(thread.prev_mepc);
                thread.clean();
            }
            Continuation::Preserve => {
                let host_mepc = thread.swap_prev_mepc(hart.mepc());
                hart.set_mepc(host_mepc);
                thread.stvec = hart.stvec();
                thread.location = Location::Stopped;
            }
        }
        Ok((eid, retptr, host))
    }

    fn switch_to_enclave<H: Hart>(&self, hart: &mut H, region: RegionId, encl_satp: usize) {
        hart.set_satp(encl_satp);
        hart.mask_timer_interrupt();
        self.platform.unset(hart.id(), region);
        hart.fence_vma();
    }

    fn return_to_host<H: Hart>(&self, hart: &mut H, host: HostContext) {
        self.platform.set(hart.id(), host.region);
        hart.set_stvec(host.host_stvec);
        hart.set_satp(host.host_satp);
        hart.unmask_timer_interrupt();
        hart.fence_vma();
    }
}
