//! Word writes into host memory on behalf of the enclave calls.

use core::mem::size_of;

use crate::config::POISON_WORD;
use crate::platform::Platform;
use crate::region::find_overlap;
use crate::satp::SatpIndex;
use crate::{EnclaveEngine, EnclaveId};

/// Outcome of a write into host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostWrite {
    /// The value landed at the requested address.
    Delivered,
    /// The address belongs to an enclave, the poison word was written instead.
    Poisoned(EnclaveId),
    /// Nothing was written.
    Rejected,
}

impl<P: Platform, S: SatpIndex> EnclaveEngine<P, S> {
    /// Writes `value` at host physical address `addr`, unless the word intersects an enclave.
    pub fn write_word_to_host(&self, addr: usize, value: usize) -> HostWrite {
        let table = self.table.lock();
        if addr % size_of::<usize>() != 0 {
            log::warn!("Refusing misaligned host write at {:#x}", addr);
            return HostWrite::Rejected;
        }

        let (word, outcome) =
            match find_overlap(&self.platform, &*table, &self.eids, addr, size_of::<usize>()) {
                Some(eid) => {
                    log::warn!("Host pointer {:#x} targets enclave {}, poisoning", addr, eid);
                    (POISON_WORD, HostWrite::Poisoned(eid))
                }
                None => (value, HostWrite::Delivered),
            };

        match self.platform.write_word(addr, word) {
            Ok(()) => outcome,
            Err(err) => {
                log::warn!("Host write at {:#x} failed: {:?}", addr, err);
                HostWrite::Rejected
            }
        }
    }
}
