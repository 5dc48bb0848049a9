// dense state-vector realization of the kernel capability.
//
// amplitudes live in a flat Vec<Complex64> of length 2^n; qubit q maps to
// bit q of the basis-state index. single-qubit gates walk (i, i|mask)
// pairs, controlled gates additionally filter on the control mask. whole-
// vector rewrites and reductions go through rayon.

use crate::runtime::{Kernel, QubitRegister};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

pub struct StateVector {
    n: usize,
    amps: Vec<Complex64>,
    // measurement randomness is local to the register so a seeded run is
    // reproducible end to end
    rng: StdRng,
}

impl StateVector {
    pub fn new(n_qubits: usize) -> Self {
        let mut state = StateVector::with_rng(n_qubits, StdRng::from_rng(&mut rand::rng()));
        state.amps[0] = Complex64::new(1.0, 0.0);
        state
    }

    pub fn seeded(n_qubits: usize, seed: u64) -> Self {
        let mut state = StateVector::with_rng(n_qubits, StdRng::seed_from_u64(seed));
        state.amps[0] = Complex64::new(1.0, 0.0);
        state
    }

    fn with_rng(n_qubits: usize, rng: StdRng) -> Self {
        StateVector {
            n: n_qubits,
            amps: vec![Complex64::new(0.0, 0.0); 1usize << n_qubits],
            rng,
        }
    }

    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amps
    }

    // sum of |amp|^2 over the whole register, 1.0 up to rounding for any
    // reachable state
    pub fn total_probability(&self) -> f64 {
        self.amps.par_iter().map(|amp| amp.norm_sqr()).sum()
    }

    // multiplies amps[i] by `phase` wherever bit `target` of i is set
    fn phase_where_set(&mut self, target: usize, phase: Complex64) {
        let mask = 1usize << target;
        for i in 0..self.amps.len() {
            if (i & mask) != 0 {
                self.amps[i] *= phase;
            }
        }
    }

    // applies a 2x2 unitary [[u00, u01], [u10, u11]] to the `target` axis
    fn single_qubit_unitary(
        &mut self,
        target: usize,
        u00: Complex64,
        u01: Complex64,
        u10: Complex64,
        u11: Complex64,
    ) {
        let mask = 1usize << target;
        for i in 0..self.amps.len() {
            if (i & mask) == 0 {
                let a = self.amps[i];
                let b = self.amps[i | mask];
                self.amps[i] = u00 * a + u01 * b;
                self.amps[i | mask] = u10 * a + u11 * b;
            }
        }
    }
}

impl QubitRegister for StateVector {
    fn num_qubits(&self) -> usize {
        self.n
    }

    fn hadamard(&mut self, target: usize) {
        let mask = 1usize << target;
        let norm = Complex64::new(FRAC_1_SQRT_2, 0.0);
        for i in 0..self.amps.len() {
            if (i & mask) == 0 {
                let a = self.amps[i];
                let b = self.amps[i | mask];
                self.amps[i] = norm * (a + b);
                self.amps[i | mask] = norm * (a - b);
            }
        }
    }

    fn pauli_x(&mut self, target: usize) {
        let mask = 1usize << target;
        for i in 0..self.amps.len() {
            if (i & mask) == 0 {
                self.amps.swap(i, i | mask);
            }
        }
    }

    fn pauli_y(&mut self, target: usize) {
        let mask = 1usize << target;
        let i_unit = Complex64::new(0.0, 1.0);
        for i in 0..self.amps.len() {
            if (i & mask) == 0 {
                let a = self.amps[i];
                let b = self.amps[i | mask];
                self.amps[i] = -i_unit * b;
                self.amps[i | mask] = i_unit * a;
            }
        }
    }

    fn pauli_z(&mut self, target: usize) {
        self.phase_where_set(target, Complex64::new(-1.0, 0.0));
    }

    fn s_gate(&mut self, target: usize) {
        self.phase_where_set(target, Complex64::new(0.0, 1.0));
    }

    fn t_gate(&mut self, target: usize) {
        self.phase_where_set(target, Complex64::from_polar(1.0, FRAC_PI_4));
    }

    fn phase_shift(&mut self, target: usize, angle: f64) {
        self.phase_where_set(target, Complex64::from_polar(1.0, angle));
    }

    fn rotate_x(&mut self, target: usize, angle: f64) {
        let half = angle / 2.0;
        let cos = Complex64::new(half.cos(), 0.0);
        let msin = Complex64::new(0.0, -half.sin());
        self.single_qubit_unitary(target, cos, msin, msin, cos);
    }

    fn rotate_y(&mut self, target: usize, angle: f64) {
        let half = angle / 2.0;
        let cos = Complex64::new(half.cos(), 0.0);
        let sin = Complex64::new(half.sin(), 0.0);
        self.single_qubit_unitary(target, cos, -sin, sin, cos);
    }

    fn rotate_z(&mut self, target: usize, angle: f64) {
        let mask = 1usize << target;
        let lower = Complex64::from_polar(1.0, -angle / 2.0);
        let upper = Complex64::from_polar(1.0, angle / 2.0);
        for i in 0..self.amps.len() {
            if (i & mask) == 0 {
                self.amps[i] *= lower;
            } else {
                self.amps[i] *= upper;
            }
        }
    }

    fn controlled_not(&mut self, control: usize, target: usize) {
        let c_mask = 1usize << control;
        let t_mask = 1usize << target;
        for i in 0..self.amps.len() {
            if (i & c_mask) != 0 && (i & t_mask) == 0 {
                self.amps.swap(i, i | t_mask);
            }
        }
    }

    fn controlled_pauli_y(&mut self, control: usize, target: usize) {
        let c_mask = 1usize << control;
        let t_mask = 1usize << target;
        let i_unit = Complex64::new(0.0, 1.0);
        let old = self.amps.clone();
        self.amps.par_iter_mut().enumerate().for_each(|(i, amp)| {
            if (i & c_mask) != 0 {
                if (i & t_mask) == 0 {
                    *amp = -i_unit * old[i | t_mask];
                } else {
                    *amp = i_unit * old[i ^ t_mask];
                }
            }
        });
    }

    fn controlled_rotate_z(&mut self, control: usize, target: usize, angle: f64) {
        let c_mask = 1usize << control;
        let t_mask = 1usize << target;
        let lower = Complex64::from_polar(1.0, -angle / 2.0);
        let upper = Complex64::from_polar(1.0, angle / 2.0);
        for i in 0..self.amps.len() {
            if (i & c_mask) != 0 {
                if (i & t_mask) == 0 {
                    self.amps[i] *= lower;
                } else {
                    self.amps[i] *= upper;
                }
            }
        }
    }

    fn controlled_phase_shift(&mut self, control: usize, target: usize, angle: f64) {
        let both = (1usize << control) | (1usize << target);
        let phase = Complex64::from_polar(1.0, angle);
        for i in 0..self.amps.len() {
            if (i & both) == both {
                self.amps[i] *= phase;
            }
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        let a_mask = 1usize << a;
        let b_mask = 1usize << b;
        for i in 0..self.amps.len() {
            // visit each |..0..1..> / |..1..0..> pair once
            if (i & a_mask) != 0 && (i & b_mask) == 0 {
                self.amps.swap(i, (i ^ a_mask) | b_mask);
            }
        }
    }

    fn sqrt_swap(&mut self, a: usize, b: usize) {
        let a_mask = 1usize << a;
        let b_mask = 1usize << b;
        let half_plus = Complex64::new(0.5, 0.5);
        let half_minus = Complex64::new(0.5, -0.5);
        for i in 0..self.amps.len() {
            if (i & a_mask) != 0 && (i & b_mask) == 0 {
                let j = (i ^ a_mask) | b_mask;
                let lo = self.amps[i];
                let hi = self.amps[j];
                self.amps[i] = half_plus * lo + half_minus * hi;
                self.amps[j] = half_minus * lo + half_plus * hi;
            }
        }
    }

    fn multi_controlled_not(&mut self, controls: &[usize], targets: &[usize]) {
        let c_mask: usize = controls.iter().fold(0, |mask, &q| mask | (1 << q));
        let t_mask: usize = targets.iter().fold(0, |mask, &q| mask | (1 << q));
        if t_mask == 0 {
            return;
        }
        let old = self.amps.clone();
        self.amps.par_iter_mut().enumerate().for_each(|(i, amp)| {
            if (i & c_mask) == c_mask {
                *amp = old[i ^ t_mask];
            }
        });
    }

    fn measure(&mut self, target: usize) -> u8 {
        let mask = 1usize << target;

        let prob_one: f64 = self
            .amps
            .par_iter()
            .enumerate()
            .map(|(i, amp)| if (i & mask) != 0 { amp.norm_sqr() } else { 0.0 })
            .sum();

        let sample: f64 = self.rng.random();
        let outcome: u8 = if sample < prob_one { 1 } else { 0 };

        let kept = if outcome == 1 { prob_one } else { 1.0 - prob_one };
        let norm = if kept > 1e-12 { 1.0 / kept.sqrt() } else { 0.0 };

        for (i, amp) in self.amps.iter_mut().enumerate() {
            let bit = ((i & mask) != 0) as u8;
            if bit == outcome {
                *amp *= norm;
            } else {
                *amp = Complex64::new(0.0, 0.0);
            }
        }

        outcome
    }

    fn prob_amp(&self, basis_state: u64) -> f64 {
        self.amps
            .get(basis_state as usize)
            .map(|amp| amp.norm_sqr())
            .unwrap_or(0.0)
    }
}

// kernel handing out dense registers. with a seed, register k of a run is
// seeded with `seed + k` so repeated allocations stay deterministic but do
// not share a stream.
pub struct StateVectorKernel {
    seed: Option<u64>,
    created: u64,
}

impl StateVectorKernel {
    pub fn new() -> Self {
        StateVectorKernel {
            seed: None,
            created: 0,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        StateVectorKernel {
            seed: Some(seed),
            created: 0,
        }
    }
}

impl Default for StateVectorKernel {
    fn default() -> Self {
        StateVectorKernel::new()
    }
}

impl Kernel for StateVectorKernel {
    type Register = StateVector;

    fn create(&mut self, n_qubits: usize) -> StateVector {
        let register = match self.seed {
            Some(seed) => StateVector::seeded(n_qubits, seed.wrapping_add(self.created)),
            None => StateVector::new(n_qubits),
        };
        self.created += 1;
        register
    }
}
