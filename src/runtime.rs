// kernel capability traits.
//
// the executor only ever talks to the simulator through these two traits,
// so the linear-algebra backend can be swapped (mock kernels in tests, a
// gpu backend later) without touching the dispatch code. the set of
// operations is deliberately the minimum the instruction set needs.

mod state_vector;

pub use state_vector::{StateVector, StateVectorKernel};

// creates registers in the |0...0> state. a register is released by
// dropping it, which covers every exit path of the driver.
pub trait Kernel {
    type Register: QubitRegister;

    fn create(&mut self, n_qubits: usize) -> Self::Register;
}

// one allocated qubit register. qubit indices are validated by the caller
// against `num_qubits` before any of these are invoked.
pub trait QubitRegister {
    fn num_qubits(&self) -> usize;

    // single-qubit unitaries
    fn hadamard(&mut self, target: usize);
    fn pauli_x(&mut self, target: usize);
    fn pauli_y(&mut self, target: usize);
    fn pauli_z(&mut self, target: usize);
    fn s_gate(&mut self, target: usize);
    fn t_gate(&mut self, target: usize);
    fn phase_shift(&mut self, target: usize, angle: f64);
    fn rotate_x(&mut self, target: usize, angle: f64);
    fn rotate_y(&mut self, target: usize, angle: f64);
    fn rotate_z(&mut self, target: usize, angle: f64);

    // two-qubit unitaries
    fn controlled_not(&mut self, control: usize, target: usize);
    fn controlled_pauli_y(&mut self, control: usize, target: usize);
    fn controlled_rotate_z(&mut self, control: usize, target: usize, angle: f64);
    fn controlled_phase_shift(&mut self, control: usize, target: usize, angle: f64);
    fn swap(&mut self, a: usize, b: usize);
    fn sqrt_swap(&mut self, a: usize, b: usize);

    // multi-controlled multi-target not, used for the toffoli gate
    fn multi_controlled_not(&mut self, controls: &[usize], targets: &[usize]);

    // projective measurement; collapses the register and returns 0 or 1
    fn measure(&mut self, target: usize) -> u8;

    // probability of one computational-basis state under the current
    // register; does not mutate
    fn prob_amp(&self, basis_state: u64) -> f64;
}
