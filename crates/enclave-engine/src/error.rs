//! Results reported to the callers of the enclave calls.

/// Status codes of the enclave calls, as returned to the caller in a0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum EnclaveError {
    InvalidId = 1,
    Interrupted = 2,
    PmpFailure = 3,
    NotRunnable = 4,
    NotDestroyable = 5,
    RegionOverlap = 6,
    NotAccessible = 7,
    IllegalArgument = 8,
    NotRunning = 9,
    NotResumable = 10,
    EdgeCallHost = 11,
    NotInitialized = 12,
    NoCapacity = 13,
    SbiProhibited = 14,
    IllegalPageTable = 15,
    UnknownError = 17,
}

impl EnclaveError {
    pub const SUCCESS: usize = 0;

    pub fn code(self) -> usize {
        self as usize
    }

    /// Status code of a call result, 0 on success.
    pub fn status<T>(result: &Result<T, EnclaveError>) -> usize {
        match result {
            Ok(_) => Self::SUCCESS,
            Err(err) => err.code(),
        }
    }
}

/// Why an enclave thread hands control back to its host without exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TimerInterrupt,
    EdgeCallHost,
    /// Any other request, the host still gets its hart back.
    Unknown(usize),
}

impl From<usize> for StopReason {
    fn from(reason: usize) -> Self {
        match reason {
            0 => StopReason::TimerInterrupt,
            1 => StopReason::EdgeCallHost,
            other => StopReason::Unknown(other),
        }
    }
}

/// What the host observes once a stopped enclave gave it control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Interrupted,
    EdgeCallHost,
    Unknown,
}

impl From<StopReason> for StopSignal {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::TimerInterrupt => StopSignal::Interrupted,
            StopReason::EdgeCallHost => StopSignal::EdgeCallHost,
            StopReason::Unknown(_) => StopSignal::Unknown,
        }
    }
}

impl StopSignal {
    /// Status code the host reads after the stop.
    pub fn code(self) -> usize {
        match self {
            StopSignal::Interrupted => EnclaveError::Interrupted.code(),
            StopSignal::EdgeCallHost => EnclaveError::EdgeCallHost.code(),
            StopSignal::Unknown => EnclaveError::UnknownError.code(),
        }
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_codes() {
        assert_eq!(EnclaveError::InvalidId.code(), 1);
        assert_eq!(EnclaveError::IllegalPageTable.code(), 15);
        assert_eq!(EnclaveError::UnknownError.code(), 17);
        assert_eq!(EnclaveError::status(&Ok::<(), EnclaveError>(())), 0);
        assert_eq!(EnclaveError::status::<()>(&Err(EnclaveError::NoCapacity)), 13);
    }

    #[test]
    fn stop_reasons() {
        assert_eq!(StopReason::from(0), StopReason::TimerInterrupt);
        assert_eq!(StopReason::from(1), StopReason::EdgeCallHost);
        assert_eq!(StopReason::from(7), StopReason::Unknown(7));
        assert_eq!(StopSignal::from(StopReason::TimerInterrupt).code(), 2);
        assert_eq!(StopSignal::from(StopReason::EdgeCallHost).code(), 11);
        assert_eq!(StopSignal::from(StopReason::Unknown(7)).code(), 17);
    }
}
