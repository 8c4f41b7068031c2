#[cfg(target_arch = "riscv64")]
use core::arch::asm;

use crate::{sbi, sbi_ext_base, SbiRet, SM_SBI_VERSION};

// ------------------------------- SBI BASE CALL HANDLER and HELPERS ----------------------- //

pub fn sbi_ext_base_handler(fid: usize, a0: usize) -> SbiRet {
    match fid {
        sbi_ext_base::GET_SPEC_VERSION => SbiRet::success(get_sbi_spec_version()),
        sbi_ext_base::GET_IMP_ID => SbiRet::success(sbi::ECALL_IMPID),
        sbi_ext_base::GET_IMP_VERSION => SbiRet::success(SM_SBI_VERSION),
        sbi_ext_base::GET_MVENDORID | sbi_ext_base::GET_MARCHID | sbi_ext_base::GET_MIMPID => {
            SbiRet::success(get_m_x_id(fid))
        }
        sbi_ext_base::PROBE_EXT => SbiRet::success(probe(a0)),
        _ => ecall_handler_failed(sbi::EXT_BASE, fid),
    }
}

pub fn get_sbi_spec_version() -> usize {
    let mut spec_ver: usize;

    spec_ver = (sbi::ECALL_VERSION_MAJOR << sbi::SPEC_VERSION_MAJOR_OFFSET)
        & (sbi::SPEC_VERSION_MAJOR_MASK << sbi::SPEC_VERSION_MAJOR_OFFSET);
    spec_ver |= sbi::ECALL_VERSION_MINOR;
    spec_ver
}

/// Extensions serviced by the monitor report 1, everything else 0.
pub fn probe(extension: usize) -> usize {
    match extension {
        sbi::EXT_BASE | sbi::EXT_TIME | sbi::EXT_SM => 1,
        _ => 0,
    }
}

#[cfg(target_arch = "riscv64")]
pub fn get_m_x_id(fid: usize) -> usize {
    let mut ret: usize = 0;
    match fid {
        sbi_ext_base::GET_MVENDORID => unsafe {
            asm!("csrr {}, mvendorid", out(reg) ret);
        },
        sbi_ext_base::GET_MARCHID => unsafe {
            asm!("csrr {}, marchid", out(reg) ret);
        },
        sbi_ext_base::GET_MIMPID => unsafe {
            asm!("csrr {}, mimpid", out(reg) ret);
        },
        _ => log::debug!("Invalid get_m_x_id request!"),
    }
    ret
}

#[cfg(not(target_arch = "riscv64"))]
pub fn get_m_x_id(_fid: usize) -> usize {
    0
}

pub fn ecall_handler_failed(extension: usize, fid: usize) -> SbiRet {
    log::debug!(
        "Cannot service SBI ecall: extension {:#x} function {} is not supported.",
        extension,
        fid
    );
    SbiRet::not_supported()
}

// ————————————————————————————————— Tests —————————————————————————————————— //
