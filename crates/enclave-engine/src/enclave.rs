//! Enclave records.

use riscv_utils::RegisterState;

use crate::config::{ENCL_MAX, MAX_ENCL_THREADS, NB_HARTS};
use crate::region::RegionId;
use crate::satp::SatpIndex;
use crate::EnclaveId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(isize)]
pub enum EnclaveState {
    Destroyed = -2,
    Invalid = -1,
    Fresh = 0,
    Initialized = 1,
    Running = 2,
    /// The slot is claimed by a creation that has not completed yet.
    Allocated = 3,
}

/// Where the thread of a running enclave is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Not entered.
    Idle,
    /// Executing on the given hart.
    InEnclave { hart: usize },
    /// Stopped, the host holds the hart until it resumes the enclave.
    Stopped,
}

/// Saved context of an enclave thread.
///
/// While the thread executes, `prev_state` and `prev_mepc` hold the host context it will return
/// to. While it is stopped they hold the enclave's own context, swapped back in on resume.
#[derive(Debug, Clone, Copy)]
pub struct ThreadState {
    pub prev_state: RegisterState,
    pub prev_mepc: usize,
    /// Host address receiving the exit value.
    pub retptr: usize,
    /// Enclave trap vector, saved while stopped.
    pub stvec: usize,
    pub location: Location,
}

impl ThreadState {
    pub const EMPTY: ThreadState = ThreadState {
        prev_state: RegisterState::zeroed(),
        prev_mepc: 0,
        retptr: 0,
        stvec: 0,
        location: Location::Idle,
    };

    /// Exchanges the live register file with the saved one.
    pub fn swap_prev_state(&mut self, regs: &mut RegisterState) {
        core::mem::swap(&mut self.prev_state, regs);
    }

    /// Saves `current` and returns the previously saved exception pc.
    pub fn swap_prev_mepc(&mut self, current: usize) -> usize {
        core::mem::replace(&mut self.prev_mepc, current)
    }

    pub fn set_retptr(&mut self, retptr: usize) {
        self.retptr = retptr;
    }

    pub fn clean(&mut self) {
        *self = Self::EMPTY;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Enclave {
    pub eid: EnclaveId,
    pub state: EnclaveState,
    pub region: Option<RegionId>,
    pub host_satp: usize,
    pub encl_satp: usize,
    pub n_thread: usize,
    pub threads: [ThreadState; MAX_ENCL_THREADS],
    pub host_stvec: [usize; NB_HARTS],
}

impl Enclave {
    pub const EMPTY: Enclave = Enclave {
        eid: 0,
        state: EnclaveState::Fresh,
        region: None,
        host_satp: 0,
        encl_satp: 0,
        n_thread: 0,
        threads: [ThreadState::EMPTY; MAX_ENCL_THREADS],
        host_stvec: [0; NB_HARTS],
    };

    /// Can be entered by one more thread.
    pub fn is_runnable(&self) -> bool {
        match self.state {
            EnclaveState::Initialized => true,
            EnclaveState::Running => self.n_thread < MAX_ENCL_THREADS,
            _ => false,
        }
    }

    pub fn is_destroyable(&self) -> bool {
        self.state == EnclaveState::Initialized
    }

    /// Running with its thread stopped.
    pub fn is_resumable(&self) -> bool {
        self.state == EnclaveState::Running
            && self.n_thread > 0
            && self.threads[0].location == Location::Stopped
    }

    /// Executing on `hart`.
    pub fn is_running_on(&self, hart: usize) -> bool {
        self.state == EnclaveState::Running
            && self.threads[0].location == Location::InEnclave { hart }
    }

    /// Resets everything but the state.
    pub fn clear(&mut self) {
        let state = self.state;
        *self = Self::EMPTY;
        self.state = state;
    }
}

pub struct EnclaveTable<S> {
    pub enclaves: [Enclave; ENCL_MAX],
    pub index: S,
}

impl<S: SatpIndex> EnclaveTable<S> {
    pub const fn new() -> Self {
        EnclaveTable {
            enclaves: [Enclave::EMPTY; ENCL_MAX],
            index: S::INIT,
        }
    }

    pub fn get_mut(&mut self, eid: EnclaveId) -> Option<&mut Enclave> {
        self.enclaves.get_mut(eid)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
