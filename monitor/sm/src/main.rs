#![cfg_attr(target_arch = "riscv64", no_std, no_main)]
#![cfg_attr(target_arch = "riscv64", feature(naked_functions))]

#[cfg(target_arch = "riscv64")]
mod entry {
    use core::arch::asm;
    use core::panic::PanicInfo;

    use log::LevelFilter;
    use sm::debug::qemu;
    use sm::statics::{HART_STACKS, STACK_SIZE};
    use sm::{arch, println};

    const LOG_LEVEL: LevelFilter = LevelFilter::Info;

    /// Entered by every hart with `a0 = hartid` and `a1` pointing to the boot manifest.
    #[no_mangle]
    #[naked]
    #[link_section = ".text.entry"]
    pub extern "C" fn _start() -> ! {
        unsafe {
            asm!(
                "la sp, {stacks}
                li t0, {stack_size}
                addi t1, a0, 1
                mul t0, t0, t1
                add sp, sp, t0
                call {entry}",
                stacks = sym HART_STACKS,
                stack_size = const STACK_SIZE,
                entry = sym sm_main,
                options(noreturn)
            )
        }
    }

    extern "C" fn sm_main(hartid: usize, manifest: &'static arch::SmManifest) -> ! {
        arch::sm_entry(hartid, manifest, LOG_LEVEL)
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        println!("CPU {}: Panicked", arch::cpuid());
        println!("{:#?}", info);
        qemu::exit(qemu::ExitCode::Failure);
    }
}

#[cfg(not(target_arch = "riscv64"))]
fn main() {}
