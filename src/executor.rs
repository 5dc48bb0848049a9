// instruction dispatch and measurement sampling.
//
// one execution request is: decode the stream, walk the instructions in
// order against a kernel register, accumulate a masked probability map at
// each measure, then draw the requested number of shots from it. the
// register is dropped on every exit path, success or error.

use crate::bits;
use crate::bytecode;
use crate::error::ExecError;
use crate::instructions::{gate_ident, Instruction, InstructionParam, PrimitiveOpcode, StandardGate};
use crate::runtime::{Kernel, QubitRegister, StateVectorKernel};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::Serialize;

// advisory upper bound on register size for a typical host; the wire
// contract exposes it as a build constant.
pub const AVAILABLE_QUBITS: u32 = 24;

// granularity of the sampled distribution: probabilities are replicated
// into a pool of round(p * 65536) entries before drawing. probabilities
// below ~1/65536 can vanish from the histogram; changing this constant
// changes results bit-for-bit against other implementations.
pub const SAMPLE_RESOLUTION: usize = 1 << 16;

// probabilities at or below this floor are treated as numerical dust and
// excluded from the probability map.
const PROB_FLOOR: f64 = 1e-10;

pub fn available_qubits() -> u32 {
    AVAILABLE_QUBITS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeasurementEntry {
    pub value: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasurementReport {
    pub shots: u64,
    pub entries: Vec<MeasurementEntry>,
}

// walks the instruction list against a fresh register from `kernel` and
// returns the masked probability map accumulated by measure instructions.
pub fn run_program<K: Kernel>(
    kernel: &mut K,
    instructions: &[Instruction],
) -> Result<BTreeMap<u64, f64>, ExecError> {
    let mut register: Option<K::Register> = None;
    let mut measure_mask: u64 = 0;
    let mut probs: BTreeMap<u64, f64> = BTreeMap::new();

    for instruction in instructions {
        match instruction {
            Instruction::Nop => {}
            Instruction::Primitive { opcode, params } => match opcode {
                PrimitiveOpcode::Alloc => {
                    if params.len() != 1 {
                        return Err(ExecError::QuantumProgramExecute(format!(
                            "Alloc expects 1 parameter, got {}",
                            params.len()
                        )));
                    }
                    let n_qubits = params[0].as_u64();
                    if n_qubits >= u64::BITS as u64 {
                        return Err(ExecError::QuantumProgramExecute(format!(
                            "cannot allocate {} qubits",
                            n_qubits
                        )));
                    }
                    let n_qubits = n_qubits as usize;
                    info!("allocate {} qubits", n_qubits);
                    // a second alloc replaces the register; the old state
                    // is dropped before the new one is built
                    register = None;
                    register = Some(kernel.create(n_qubits));
                }
                PrimitiveOpcode::Reset => {
                    let reg = initialized(&mut register)?;
                    for param in params {
                        let qubit = qubit_index(reg, param.as_u64())?;
                        if reg.measure(qubit) == 1 {
                            reg.pauli_x(qubit);
                        }
                        debug!("reset qubit {}", qubit);
                    }
                }
                PrimitiveOpcode::Measure => {
                    let reg = initialized(&mut register)?;
                    for param in params {
                        let qubit = qubit_index(reg, param.as_u64())?;
                        measure_mask |= 1u64 << qubit;
                    }
                    debug!(
                        "measure qubits {:?}, mask {:#b}",
                        bits::set_bit_positions(measure_mask),
                        measure_mask
                    );
                    // fold every live basis state into its masked bucket;
                    // measure never mutates the register
                    for state in 0..(1u64 << reg.num_qubits()) {
                        let prob = reg.prob_amp(state);
                        if prob > PROB_FLOOR {
                            *probs.entry(state & measure_mask).or_insert(0.0) += prob;
                        }
                    }
                }
            },
            Instruction::StandardGate {
                gate,
                params,
                targets,
            } => {
                let reg = initialized(&mut register)?;
                dispatch_gate(reg, *gate, params, targets)?;
            }
        }
    }

    Ok(probs)
}

fn initialized<R: QubitRegister>(register: &mut Option<R>) -> Result<&mut R, ExecError> {
    register
        .as_mut()
        .ok_or_else(|| ExecError::QuantumProgramExecute("Qubits are not initialized".to_string()))
}

fn qubit_index<R: QubitRegister>(register: &R, address: u64) -> Result<usize, ExecError> {
    if address >= register.num_qubits() as u64 {
        return Err(ExecError::QuantumProgramExecute(format!(
            "qubit {} out of range for {}-qubit register",
            address,
            register.num_qubits()
        )));
    }
    Ok(address as usize)
}

// validates the instruction shape against the catalogue descriptor, then
// applies the gate through the kernel capability.
fn dispatch_gate<R: QubitRegister>(
    register: &mut R,
    gate_id: u8,
    params: &[InstructionParam],
    raw_targets: &[u64],
) -> Result<(), ExecError> {
    let gate = StandardGate::from_id(gate_id)
        .ok_or_else(|| ExecError::UnsupportedGate(gate_ident(gate_id)))?;
    let descriptor = gate.descriptor();

    if params.len() != descriptor.num_params {
        return Err(ExecError::MissingOrExtraParameter {
            gate: gate.ident().to_string(),
            expected: descriptor.num_params,
            actual: params.len(),
        });
    }
    if raw_targets.len() != descriptor.num_targets {
        return Err(ExecError::TargetSizeNotMatch {
            gate: gate.ident().to_string(),
            expected: descriptor.num_targets,
            actual: raw_targets.len(),
        });
    }

    let mut targets = Vec::with_capacity(raw_targets.len());
    for &raw in raw_targets {
        targets.push(qubit_index(register, raw)?);
    }
    for (i, &a) in targets.iter().enumerate() {
        if targets[..i].contains(&a) {
            return Err(ExecError::QuantumProgramExecute(format!(
                "gate {} targets qubit {} more than once",
                gate.ident(),
                a
            )));
        }
    }

    debug!("executing {}", gate.ident());

    match gate {
        StandardGate::I => {}
        StandardGate::H => register.hadamard(targets[0]),
        StandardGate::X => register.pauli_x(targets[0]),
        StandardGate::Y => register.pauli_y(targets[0]),
        StandardGate::Z => register.pauli_z(targets[0]),
        StandardGate::S => register.s_gate(targets[0]),
        // SD and TD are realized as x-rotations, and CZ as a zero-angle
        // controlled z-rotation, for parity with the reference backend
        StandardGate::Sd => register.rotate_x(targets[0], -FRAC_PI_2),
        StandardGate::T => register.t_gate(targets[0]),
        StandardGate::Td => register.rotate_x(targets[0], -FRAC_PI_4),
        StandardGate::P => register.phase_shift(targets[0], params[0].as_f64()),
        StandardGate::Rx => register.rotate_x(targets[0], params[0].as_f64()),
        StandardGate::Ry => register.rotate_y(targets[0], params[0].as_f64()),
        StandardGate::Rz => register.rotate_z(targets[0], params[0].as_f64()),
        StandardGate::Cx => register.controlled_not(targets[0], targets[1]),
        StandardGate::Cy => register.controlled_pauli_y(targets[0], targets[1]),
        StandardGate::Cz => register.controlled_rotate_z(targets[0], targets[1], 0.0),
        StandardGate::Cp => {
            register.controlled_phase_shift(targets[0], targets[1], params[0].as_f64())
        }
        StandardGate::Swp => register.swap(targets[0], targets[1]),
        StandardGate::SSwp => register.sqrt_swap(targets[0], targets[1]),
        StandardGate::Ccx => register.multi_controlled_not(&targets[..2], &targets[2..]),
        _ => return Err(ExecError::UnsupportedGate(gate.ident().to_string())),
    }

    Ok(())
}

// converts the probability map into a multinomial sample of `shots` draws.
// the pool holds round(p * 65536) copies of each state; draws are uniform
// over the full resolution and redrawn while they land past the pool end.
pub fn sample(probs: &BTreeMap<u64, f64>, shots: u32, rng: &mut StdRng) -> BTreeMap<u64, u64> {
    let mut states: Vec<u64> = Vec::new();
    for (&state, &prob) in probs {
        let copies = (prob * SAMPLE_RESOLUTION as f64).round() as i64;
        for _ in 0..copies {
            states.push(state);
        }
    }

    let mut measurements: BTreeMap<u64, u64> = BTreeMap::new();
    if states.is_empty() {
        // nothing was measured; an empty table is the whole answer
        return measurements;
    }

    states.shuffle(rng);

    for _ in 0..shots {
        let mut idx = rng.random_range(0..SAMPLE_RESOLUTION);
        while idx >= states.len() {
            idx = rng.random_range(0..SAMPLE_RESOLUTION);
        }
        *measurements.entry(states[idx]).or_insert(0) += 1;
    }

    measurements
}

// decode + run + sample against an arbitrary kernel.
pub fn execute_on<K: Kernel>(
    kernel: &mut K,
    bytes: &[u8],
    shots: u32,
    rng: &mut StdRng,
) -> Result<MeasurementReport, ExecError> {
    info!(
        "executing bytecode of length {} with {} shots",
        bytes.len(),
        shots
    );
    let instructions = bytecode::decode(bytes)?;
    let probs = run_program(kernel, &instructions)?;
    let entries = sample(&probs, shots, rng)
        .into_iter()
        .map(|(value, count)| MeasurementEntry { value, count })
        .collect();
    Ok(MeasurementReport {
        shots: shots as u64,
        entries,
    })
}

// entry point for one request on the state-vector backend.
pub fn execute(bytes: &[u8], shots: u32) -> Result<MeasurementReport, ExecError> {
    let mut kernel = StateVectorKernel::new();
    let mut rng = StdRng::from_rng(&mut rand::rng());
    execute_on(&mut kernel, bytes, shots, &mut rng)
}

// deterministic variant: the same seed reproduces the same report.
pub fn execute_seeded(bytes: &[u8], shots: u32, seed: u64) -> Result<MeasurementReport, ExecError> {
    let mut kernel = StateVectorKernel::with_seed(seed);
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5157_4253_414d_504c);
    execute_on(&mut kernel, bytes, shots, &mut rng)
}
