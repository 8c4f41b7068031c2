//! Reverse lookup from page table roots to enclaves.

use crate::config::ENCL_MAX;
use crate::enclave::Enclave;
use crate::EnclaveId;

/// Maps page table roots back to enclave ids.
///
/// Implementations are only ever called with the enclave table lock held, and are notified of
/// every enclave that gets published or retired. The default index keeps no state of its own
/// and scans the table.
pub trait SatpIndex {
    const INIT: Self;

    fn record(&mut self, _eid: EnclaveId, _encl_satp: usize, _host_satp: usize) {}

    fn forget(&mut self, _eid: EnclaveId) {}

    fn lookup_by_enclave_satp(
        &self,
        enclaves: &[Enclave; ENCL_MAX],
        encl_satp: usize,
    ) -> Option<EnclaveId>;

    fn lookup_by_host_satp(
        &self,
        enclaves: &[Enclave; ENCL_MAX],
        host_satp: usize,
    ) -> Option<EnclaveId>;
}

/// Linear scan over the published enclaves.
///
/// Published enclaves always have a non zero (Sv39) root, a zero root never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSatpIndex;

impl SatpIndex for LinearSatpIndex {
    const INIT: Self = LinearSatpIndex;

    fn lookup_by_enclave_satp(
        &self,
        enclaves: &[Enclave; ENCL_MAX],
        encl_satp: usize,
    ) -> Option<EnclaveId> {
        if encl_satp == 0 {
            return None;
        }
        enclaves.iter().position(|e| e.encl_satp == encl_satp)
    }

    fn lookup_by_host_satp(
        &self,
        enclaves: &[Enclave; ENCL_MAX],
        host_satp: usize,
    ) -> Option<EnclaveId> {
        enclaves
            .iter()
            .position(|e| e.encl_satp != 0 && e.host_satp == host_satp)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
