//! RISC-V 64 implementation

use core::arch::asm;
use core::fmt;
use core::fmt::Write;

use riscv_utils::SERIAL_PORT_BASE_ADDRESS;
use spin::{Mutex, Once};
use uart_16550::MmioSerialPort;

use crate::ExitCode;

static SERIAL_PORT: Once<Mutex<MmioSerialPort>> = Once::new();

/// Internal function used to print to stdout when running in Qemu.
pub fn _print(args: fmt::Arguments) {
    let port = SERIAL_PORT.call_once(|| {
        // SAFETY: the UART is mapped at this address on the virt machine and only used here.
        let mut serial = unsafe { MmioSerialPort::new(SERIAL_PORT_BASE_ADDRESS) };
        serial.init();
        Mutex::new(serial)
    });
    // Nothing sensible to do if the console fails.
    let _ = port.lock().write_fmt(args);
}

// —————————————————————————————— Exiting QEMU —————————————————————————————— //

/// Exit QEMU through the SiFive test device.
pub fn exit(exit_code: ExitCode) -> ! {
    const SIFIVE_TEST_ADDR: usize = 0x10_0000;

    unsafe {
        let exit_code = exit_code as u32;
        asm!(
            "sw {0}, 0({1})",
            in(reg) exit_code,
            in(reg) SIFIVE_TEST_ADDR
        );

        // For the case that the QEMU exit attempt did not work, transition into an infinite
        // loop. Calling `panic!()` here is unfeasible, since there is a good chance
        // this function here is the last expression in the `panic!()` handler
        // itself. This prevents a possible infinite loop.
        loop {
            asm!("wfi", options(nomem, nostack));
        }
    }
}
