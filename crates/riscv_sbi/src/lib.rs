#![cfg_attr(not(test), no_std)]

//! SBI identifiers and the handlers of the extensions the monitor implements itself.

pub mod ecall;
pub mod ipi;

pub const SM_SBI_VERSION: usize = 0x10001;

pub mod sbi {
    pub const ECALL_IMPID: usize = 0x1;
    pub const ECALL_VERSION_MINOR: usize = 0;
    pub const ECALL_VERSION_MAJOR: usize = 1;
    pub const SPEC_VERSION_MAJOR_MASK: usize = 0x7f;
    pub const SPEC_VERSION_MAJOR_OFFSET: usize = 24;
    pub const EXT_BASE: usize = 0x10;
    pub const EXT_TIME: usize = 0x54494D45;
    pub const EXT_IPI: usize = 0x735049;
    pub const EXT_RFENCE: usize = 0x52464E43;
    pub const EXT_SRST: usize = 0x53525354;
    pub const EXT_HSM: usize = 0x48534D;
    /// Security monitor extension ("\x08BKE").
    pub const EXT_SM: usize = 0x08424b45;
}

pub mod sbi_ext_base {
    pub const GET_SPEC_VERSION: usize = 0;
    pub const GET_IMP_ID: usize = 1;
    pub const GET_IMP_VERSION: usize = 2;
    pub const PROBE_EXT: usize = 3;
    pub const GET_MVENDORID: usize = 4;
    pub const GET_MARCHID: usize = 5;
    pub const GET_MIMPID: usize = 6;
}

pub mod sbi_ext_time {
    pub const SET_TIMER: usize = 0;
}

/// Function ids of the security monitor extension.
pub mod sbi_ext_sm {
    // Host calls.
    pub const CREATE_ENCLAVE: usize = 2001;
    pub const DESTROY_ENCLAVE: usize = 2002;
    pub const RUN_ENCLAVE: usize = 2003;
    pub const RESUME_ENCLAVE: usize = 2005;

    // Enclave calls.
    pub const STOP_ENCLAVE: usize = 3004;
    pub const EXIT_ENCLAVE: usize = 3006;
}

pub mod sbi_error {
    pub const SUCCESS: isize = 0;
    pub const ERR_FAILED: isize = -1;
    pub const ERR_NOT_SUPPORTED: isize = -2;
    pub const ERR_INVALID_PARAM: isize = -3;
}

/// Values returned to the caller in a0 and a1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbiRet {
    pub error: isize,
    pub value: usize,
}

impl SbiRet {
    pub const fn success(value: usize) -> Self {
        SbiRet {
            error: sbi_error::SUCCESS,
            value,
        }
    }

    pub const fn error(error: isize) -> Self {
        SbiRet { error, value: 0 }
    }

    pub const fn not_supported() -> Self {
        Self::error(sbi_error::ERR_NOT_SUPPORTED)
    }
}
