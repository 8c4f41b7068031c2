//! Decoding of the SBI calls trapped by the monitor.
//!
//! Calls follow the SBI convention: extension id in a7, function id in a6 and arguments from a0.
//! Security monitor calls only report a status code in a0, written to whichever register file
//! is live once the call completes (the host's after an exit, the enclave's after a run).

use enclave_engine::{EnclaveEngine, EnclaveError, Hart, Platform, SatpIndex};
use riscv_sbi::ecall::{ecall_handler_failed, sbi_ext_base_handler};
use riscv_sbi::{sbi, sbi_ext_sm, sbi_ext_time, SbiRet};
use riscv_utils::RegisterState;

/// Size of the `ecall` instruction.
const ECALL_SIZE: usize = 4;

/// Services the `ecall` that trapped into the monitor.
pub fn handle_ecall<P, S, H>(engine: &EnclaveEngine<P, S>, hart: &mut H, regs: &mut RegisterState)
where
    P: Platform,
    S: SatpIndex,
    H: Hart,
{
    // Return after the ecall, context switches save and restore this value.
    hart.set_mepc(hart.mepc() + ECALL_SIZE);

    let (extension, fid) = (regs.a7, regs.a6);
    match extension {
        sbi::EXT_SM => {
            let status = sm_call(engine, hart, regs, fid);
            regs.a0 = status;
        }
        sbi::EXT_BASE => {
            let ret = sbi_ext_base_handler(fid, regs.a0);
            regs.a0 = ret.error as usize;
            regs.a1 = ret.value;
        }
        sbi::EXT_TIME => {
            let ret = time_call(hart, fid, regs.a0);
            regs.a0 = ret.error as usize;
        }
        _ => {
            let ret = ecall_handler_failed(extension, fid);
            regs.a0 = ret.error as usize;
        }
    }
}

fn time_call<H: Hart>(hart: &mut H, fid: usize, deadline: usize) -> SbiRet {
    match fid {
        sbi_ext_time::SET_TIMER => {
            hart.set_timer(deadline);
            SbiRet::success(0)
        }
        _ => ecall_handler_failed(sbi::EXT_TIME, fid),
    }
}

fn sm_call<P, S, H>(
    engine: &EnclaveEngine<P, S>,
    hart: &mut H,
    regs: &mut RegisterState,
    fid: usize,
) -> usize
where
    P: Platform,
    S: SatpIndex,
    H: Hart,
{
    let [a0, a1, a2, ..] = regs.sbi_args();
    let from_enclave = engine.lookup_by_enclave_satp(hart.satp()).is_some();
    log::trace!("SM call {} from {}", fid, if from_enclave { "enclave" } else { "host" });

    let result = match fid {
        sbi_ext_sm::CREATE_ENCLAVE
        | sbi_ext_sm::DESTROY_ENCLAVE
        | sbi_ext_sm::RUN_ENCLAVE
        | sbi_ext_sm::RESUME_ENCLAVE
            if from_enclave =>
        {
            log::debug!("Host call {} issued from an enclave", fid);
            Err(EnclaveError::SbiProhibited)
        }
        sbi_ext_sm::CREATE_ENCLAVE => engine.create(hart, a0, a1, a2).map(|_| ()),
        sbi_ext_sm::DESTROY_ENCLAVE => engine.destroy(hart, a0),
        sbi_ext_sm::RUN_ENCLAVE => engine.enter(hart, regs, a0, a1, a2),
        sbi_ext_sm::RESUME_ENCLAVE => engine.resume(hart, regs, a0),
        sbi_ext_sm::EXIT_ENCLAVE => engine.exit(hart, regs, a0),
        sbi_ext_sm::STOP_ENCLAVE => {
            return match engine.stop(hart, regs, a0) {
                Ok(signal) => signal.code(),
                Err(err) => err.code(),
            };
        }
        _ => return ecall_handler_failed(sbi::EXT_SM, fid).error as usize,
    };
    EnclaveError::status(&result)
}

// ————————————————————————————————— Tests —————————————————————————————————— //
