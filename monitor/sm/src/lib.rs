//! Security monitor
//!
//! Machine mode firmware hosting isolated enclaves next to an untrusted operating system. The
//! enclave bookkeeping lives in `enclave_engine`, this crate wires it to the hardware: SBI call
//! decoding, the machine trap handler, PMP programming and page table validation.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "riscv64", feature(naked_functions, fn_align))]

pub mod calls;
pub mod debug;
pub mod pgtable;
pub mod statics;

#[cfg(target_arch = "riscv64")]
pub mod riscv;

#[cfg(target_arch = "riscv64")]
pub mod arch {
    pub use crate::riscv::*;
}
