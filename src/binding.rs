// c-linkage entry points.
//
// these signatures are wire-stable: a host process links against them to
// run bytecode and query capabilities. on success the measurement block is
// heap-allocated here and ownership moves to the caller, who hands it back
// through qbex_free_measurements.

use crate::error::ExecError;
use crate::executor;
use crate::instructions;
use log::error;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MeasurementResultEntry {
    pub value: u64,
    pub count: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MeasurementResult {
    pub shots: u64,
    pub result_size: u64,
    pub measurements: *mut MeasurementResultEntry,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ExecuteResult {
    pub error: u8,
    pub measurement: MeasurementResult,
}

impl ExecuteResult {
    fn failure(code: u8) -> Self {
        ExecuteResult {
            error: code,
            measurement: MeasurementResult {
                shots: 0,
                result_size: 0,
                measurements: ptr::null_mut(),
            },
        }
    }

    fn success(report: executor::MeasurementReport) -> Self {
        let entries: Box<[MeasurementResultEntry]> = report
            .entries
            .iter()
            .map(|entry| MeasurementResultEntry {
                value: entry.value,
                count: entry.count,
            })
            .collect();
        let result_size = entries.len() as u64;
        let measurements = Box::into_raw(entries) as *mut MeasurementResultEntry;
        ExecuteResult {
            error: 0,
            measurement: MeasurementResult {
                shots: report.shots,
                result_size,
                measurements,
            },
        }
    }
}

// advisory number of simulable qubits on this build.
#[no_mangle]
pub extern "C" fn qbex_available_qubits() -> u32 {
    executor::available_qubits()
}

// full-catalogue membership test for the compiler handshake. null or
// non-utf8 names are simply not in the catalogue.
#[no_mangle]
pub unsafe extern "C" fn qbex_is_gate_available(ident: *const c_char) -> bool {
    if ident.is_null() {
        return false;
    }
    match unsafe { CStr::from_ptr(ident) }.to_str() {
        Ok(name) => instructions::is_gate_available(name),
        Err(_) => false,
    }
}

// executes `length` bytes of bytecode with the given shot count. any
// failure yields a null measurement block and a nonzero error byte;
// panics are fenced off here and reported as the unclassified code.
#[no_mangle]
pub unsafe extern "C" fn qbex_exec_bytecode(
    raw_bytecode: *const u8,
    length: u32,
    shots: u32,
) -> ExecuteResult {
    let bytes: &[u8] = if raw_bytecode.is_null() {
        &[]
    } else {
        unsafe { slice::from_raw_parts(raw_bytecode, length as usize) }
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor::execute(bytes, shots)));

    match outcome {
        Ok(Ok(report)) => ExecuteResult::success(report),
        Ok(Err(err)) => {
            error!("{}", err);
            ExecuteResult::failure(err.code())
        }
        Err(_) => {
            let err = ExecError::Internal("panic escaped the executor".to_string());
            error!("{}", err);
            ExecuteResult::failure(err.code())
        }
    }
}

// releases a measurement block previously returned by qbex_exec_bytecode.
// safe to call on a failure result; the null block is ignored.
#[no_mangle]
pub unsafe extern "C" fn qbex_free_measurements(result: ExecuteResult) {
    let measurements = result.measurement.measurements;
    if measurements.is_null() {
        return;
    }
    let len = result.measurement.result_size as usize;
    unsafe {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            measurements,
            len,
        )));
    }
}
