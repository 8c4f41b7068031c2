#![no_std]

//! `log` backend of the security monitor, writing to the QEMU console.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{LevelFilter, Metadata, Record};
use qemu::_print;
use spin::Mutex;

static LOGGER: HartLogger = HartLogger { line: Mutex::new(()) };
static IS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Prefixes every record with the emitting hart, one line at a time.
struct HartLogger {
    line: Mutex<()>,
}

impl log::Log for HartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _line = self.line.lock();
        _print(core::format_args!(
            "[{} | hart {} | {}] {}\n",
            record.level(),
            hart_id(),
            record.target(),
            record.args()
        ))
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "riscv64")]
fn hart_id() -> usize {
    riscv_utils::read_mhartid()
}

#[cfg(not(target_arch = "riscv64"))]
fn hart_id() -> usize {
    0
}

/// Installs the logger, only the first call on any hart has an effect.
pub fn init(level: LevelFilter) {
    match IS_INITIALIZED.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst) {
        Ok(_) => {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(level);
            }
        }
        Err(_) => {
            log::warn!("Logger is already initialized, skipping init");
        }
    };
}
