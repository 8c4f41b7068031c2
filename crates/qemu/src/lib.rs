#![no_std]

//! Console and exit for the QEMU `virt` machine.

#[cfg(target_arch = "riscv64")]
mod riscv64;

#[cfg(target_arch = "riscv64")]
pub use riscv64::{_print, exit};

// ———————————————————————————— Print Utilities ————————————————————————————— //

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::_print(core::format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", core::format_args!($($arg)*)));
}

/// There is no console off target, output is dropped.
#[cfg(not(target_arch = "riscv64"))]
pub fn _print(_args: core::fmt::Arguments) {}

#[cfg(not(target_arch = "riscv64"))]
pub fn exit(_exit_code: ExitCode) -> ! {
    loop {
        core::hint::spin_loop();
    }
}

// —————————————————————————————— Exiting QEMU —————————————————————————————— //

/// Qemu exit codes
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u32)]
pub enum ExitCode {
    Success = 0x5555,
    Failure = 0x3333,
}

impl ExitCode {
    pub fn to_str(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Failure => "Failure",
        }
    }
}
