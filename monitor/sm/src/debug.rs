//! Debug Module
//!
//! Console output of the monitor, and a way out of QEMU.

// ———————————————————————————— Print Facilities ———————————————————————————— //

pub mod serial {
    pub use qemu::_print;
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::debug::serial::_print(core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\r\n"));
    ($($arg:tt)*) => ($crate::print!("{}\r\n", core::format_args!($($arg)*)))
}

// —————————————————————————————————— Qemu —————————————————————————————————— //

pub mod qemu {
    pub use qemu::ExitCode;

    pub fn exit(exit_code: ExitCode) -> ! {
        println!("========= Exiting Security Monitor =========");
        println!("{}", exit_code.to_str());
        println!("============================================");

        qemu::exit(exit_code)
    }
}
