// src/register/mod.rs

//! The qubit register: amplitude storage, control scopes, measurement.
//!
//! A [`QubitRegister`] owns the dense amplitude tensor for `n` qubits and
//! every piece of bookkeeping around it: the control-qubit stack with its
//! axis permutation, the operation trace, the behavior switches and the
//! RNG stream that drives measurement. Callers address qubits through
//! lightweight [`Qubit`]/[`QubitGroup`] views obtained from the register.

mod handle;
mod trace;

pub use handle::{Qubit, QubitGroup};
pub use trace::TraceEntry;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::core::axis::compute_axis_order;
use crate::core::config::Config;
use crate::core::constants::near_zero;
use crate::core::error::{QuregError, SystemId};
use crate::core::tensor::AmplitudeTensor;
use crate::operations::{self, Operation, SingleQubitGate};

static NEXT_SYSTEM_ID: AtomicU64 = AtomicU64::new(0);

/// A register of `n` qubits simulated as a dense complex state vector.
///
/// Created in the all-zero basis state. Between operations the state keeps
/// unit norm within floating tolerance; the invariant is broken only
/// inside a single gate or measurement call.
pub struct QubitRegister {
    id: SystemId,
    tensor: AmplitudeTensor,
    /// Groups of control indices, most recently pushed last.
    control_stack: Vec<Vec<usize>>,
    /// Valid whenever the control stack is non-empty; identity otherwise.
    axis_of_qubit: Vec<usize>,
    qubit_of_axis: Vec<usize>,
    trace: Vec<TraceEntry>,
    /// Reentrancy guard: composite operations record one trace entry and
    /// suspend tracing for their inner steps.
    tracing_suspended: bool,
    config: Config,
    rng: StdRng,
}

impl QubitRegister {
    /// Creates a register of `n` qubits in `|0...0⟩` with default
    /// configuration and an OS-seeded measurement stream.
    pub fn new(n: usize) -> Result<Self, QuregError> {
        Self::with_config(n, Config::default())
    }

    /// Creates a register with an explicit configuration.
    pub fn with_config(n: usize, config: Config) -> Result<Self, QuregError> {
        Ok(Self {
            id: SystemId(NEXT_SYSTEM_ID.fetch_add(1, Ordering::Relaxed)),
            tensor: AmplitudeTensor::new(n)?,
            control_stack: Vec::new(),
            axis_of_qubit: (0..n).collect(),
            qubit_of_axis: (0..n).collect(),
            trace: Vec::new(),
            tracing_suspended: false,
            config,
            rng: StdRng::from_rng(&mut rand::rng()),
        })
    }

    /// Creates a register whose measurement outcomes are deterministic
    /// given the seed.
    pub fn seeded(n: usize, seed: u64) -> Result<Self, QuregError> {
        let mut register = Self::new(n)?;
        register.rng = StdRng::seed_from_u64(seed);
        Ok(register)
    }

    // --- Accessors ---

    /// Unique id of this register within the process.
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.tensor.rank()
    }

    /// The current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// `sum(|amplitude|^2)` over the whole state.
    pub fn norm_sqr(&self) -> f64 {
        self.tensor.norm_sqr()
    }

    /// Restores unit norm explicitly.
    pub fn normalize(&mut self) {
        self.tensor.normalize();
    }

    /// The flattened amplitude column in logical qubit order, honoring the
    /// configured bit-significance convention. For inspection and dumps;
    /// the underlying storage is unaffected.
    pub fn amplitudes(&self) -> Vec<Complex<f64>> {
        self.tensor.flattened(&self.axis_of_qubit, self.config.bit_order)
    }

    /// The recorded operation trace.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Discards all recorded trace entries.
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    pub(crate) fn tensor_mut(&mut self) -> &mut AmplitudeTensor {
        &mut self.tensor
    }

    /// Applies a temporary configuration change, runs `body`, and restores
    /// the previous configuration even when `body` fails.
    pub fn scoped_config<T>(
        &mut self,
        patch: impl FnOnce(&mut Config),
        body: impl FnOnce(&mut Self) -> Result<T, QuregError>,
    ) -> Result<T, QuregError> {
        let saved = self.config.clone();
        patch(&mut self.config);
        let result = body(self);
        self.config = saved;
        result
    }

    // --- Qubit views ---

    /// A handle to one qubit. Negative indices count from the back.
    pub fn qubit(&self, index: isize) -> Result<Qubit, QuregError> {
        let index = self.resolve_index(index)?;
        Ok(Qubit { system: self.id, index })
    }

    /// A group over all qubits in ascending order.
    pub fn qubits(&self) -> QubitGroup {
        QubitGroup::new(self.id, (0..self.num_qubits()).collect())
    }

    /// A group over explicit indices, in the given order.
    pub fn group(&self, indexes: &[isize]) -> Result<QubitGroup, QuregError> {
        let mut resolved = Vec::with_capacity(indexes.len());
        for &index in indexes {
            resolved.push(self.resolve_index(index)?);
        }
        Ok(QubitGroup::new(self.id, resolved))
    }

    /// A group selected with sequence-slice semantics: missing bounds fall
    /// to the ends, negative values count from the back, and a negative
    /// step walks the register in reverse.
    pub fn qubit_slice(
        &self,
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    ) -> Result<QubitGroup, QuregError> {
        if step == 0 {
            return Err(QuregError::ConfigurationRange {
                message: "slice step must be non-zero".to_string(),
            });
        }
        let n = self.num_qubits() as isize;
        let resolve = |value: isize| if value < 0 { value + n } else { value };
        let mut indexes = Vec::new();
        if step > 0 {
            let mut position = resolve(start.unwrap_or(0)).clamp(0, n);
            let end = resolve(stop.unwrap_or(n)).clamp(0, n);
            while position < end {
                indexes.push(position as usize);
                position += step;
            }
        } else {
            let mut position = resolve(start.unwrap_or(n - 1)).clamp(-1, n - 1);
            let end = match stop {
                Some(value) => resolve(value).clamp(-1, n - 1),
                None => -1,
            };
            while position > end {
                indexes.push(position as usize);
                position += step;
            }
        }
        Ok(QubitGroup::new(self.id, indexes))
    }

    fn resolve_index(&self, index: isize) -> Result<usize, QuregError> {
        let n = self.num_qubits() as isize;
        let resolved = if index < 0 { index + n } else { index };
        if resolved < 0 || resolved >= n {
            return Err(QuregError::InvalidIndex { index, len: self.num_qubits() });
        }
        Ok(resolved as usize)
    }

    // --- Validation helpers ---

    fn check_system(&self, found: SystemId) -> Result<(), QuregError> {
        if found != self.id {
            return Err(QuregError::CrossSystem { expected: self.id, found });
        }
        Ok(())
    }

    fn check_qubit(&self, qubit: Qubit) -> Result<usize, QuregError> {
        self.check_system(qubit.system)?;
        if qubit.index >= self.num_qubits() {
            return Err(QuregError::InvalidIndex {
                index: qubit.index as isize,
                len: self.num_qubits(),
            });
        }
        Ok(qubit.index)
    }

    fn check_not_controlling(&self, index: usize) -> Result<(), QuregError> {
        if self.is_controlling(index) {
            return Err(QuregError::ControlTargetConflict { index });
        }
        Ok(())
    }

    pub(crate) fn validate_group(
        &self,
        group: &QubitGroup,
        distinct: bool,
        not_controlling: bool,
    ) -> Result<(), QuregError> {
        self.check_system(group.system_id())?;
        for &index in group.indexes() {
            if index >= self.num_qubits() {
                return Err(QuregError::InvalidIndex {
                    index: index as isize,
                    len: self.num_qubits(),
                });
            }
            if not_controlling {
                self.check_not_controlling(index)?;
            }
        }
        if distinct {
            if let Some(index) = group.first_duplicate() {
                return Err(QuregError::DuplicateQubit { index });
            }
        }
        Ok(())
    }

    // --- Tracing ---

    fn can_trace(&self) -> bool {
        self.config.tracing && !self.tracing_suspended
    }

    /// Records one trace entry for a (possibly composite) operation and
    /// suspends tracing of its inner steps. The previous suspension state
    /// is restored on every exit path.
    pub(crate) fn traced<T>(
        &mut self,
        name: &str,
        controls: &[usize],
        targets: &[usize],
        body: impl FnOnce(&mut Self) -> Result<T, QuregError>,
    ) -> Result<T, QuregError> {
        let previous = self.tracing_suspended;
        if self.can_trace() {
            self.trace.push(TraceEntry {
                controls: controls.to_vec(),
                targets: targets.to_vec(),
                operation: name.to_string(),
            });
            self.tracing_suspended = true;
        }
        let result = body(self);
        self.tracing_suspended = previous;
        result
    }

    // --- Control-qubit stack ---

    /// All active control indices, sorted ascending.
    pub fn controls(&self) -> Vec<usize> {
        let mut all: Vec<usize> = self.control_stack.iter().flatten().copied().collect();
        all.sort_unstable();
        all
    }

    /// Number of active control qubits across all pushed groups.
    pub fn control_count(&self) -> usize {
        self.control_stack.iter().map(|group| group.len()).sum()
    }

    /// Whether any control group is active.
    pub fn has_controls(&self) -> bool {
        !self.control_stack.is_empty()
    }

    /// Whether `index` is currently a control qubit.
    pub fn is_controlling(&self, index: usize) -> bool {
        self.control_stack.iter().any(|group| group.contains(&index))
    }

    /// Pushes a group of control qubits, transposing the tensor so all
    /// active controls form the trailing axis block.
    ///
    /// Prefer [`with_controls`](Self::with_controls), which guarantees the
    /// matching pop.
    pub fn push_controls(&mut self, controls: &QubitGroup) -> Result<(), QuregError> {
        self.check_system(controls.system_id())?;
        for &index in controls.indexes() {
            if index >= self.num_qubits() {
                return Err(QuregError::InvalidIndex {
                    index: index as isize,
                    len: self.num_qubits(),
                });
            }
        }
        if let Some(index) = controls.first_duplicate() {
            return Err(QuregError::DuplicateQubit { index });
        }
        for &index in controls.indexes() {
            if self.is_controlling(index) {
                return Err(QuregError::OverlappingControl { index });
            }
        }
        let total = self.control_count() + controls.len();
        if total >= self.num_qubits() {
            return Err(QuregError::TooManyControls {
                requested: total,
                qubits: self.num_qubits(),
            });
        }
        self.unpermute();
        self.control_stack.push(controls.indexes().to_vec());
        self.apply_permutation();
        Ok(())
    }

    /// Removes the most recently pushed control group. Does nothing when
    /// the stack is empty.
    pub fn pop_controls(&mut self) {
        if self.control_stack.is_empty() {
            return;
        }
        self.unpermute();
        self.control_stack.pop();
        self.apply_permutation();
    }

    /// Runs `body` with an additional control group active, popping the
    /// group on every exit path.
    pub fn with_controls<T>(
        &mut self,
        controls: &QubitGroup,
        body: impl FnOnce(&mut Self) -> Result<T, QuregError>,
    ) -> Result<T, QuregError> {
        self.push_controls(controls)?;
        let result = body(self);
        self.pop_controls();
        result
    }

    /// Invokes a controllable operation with the given control group, the
    /// scoped form of controlled execution.
    pub fn controlled(
        &mut self,
        op: &Operation,
        controls: &QubitGroup,
        targets: &QubitGroup,
    ) -> Result<(), QuregError> {
        if !op.is_controllable() {
            return Err(QuregError::UncontrollableOperation { name: op.name().to_string() });
        }
        self.with_controls(controls, |register| op.invoke(register, targets))
    }

    /// Like [`controlled`](Self::controlled), but triggering on the given
    /// control bit pattern instead of all-ones. Controls whose pattern bit
    /// is false are conjugated with X around the controlled call.
    pub fn controlled_on_bools(
        &mut self,
        op: &Operation,
        pattern: &[bool],
        controls: &QubitGroup,
        targets: &QubitGroup,
    ) -> Result<(), QuregError> {
        let flip = operations::x();
        for (&bit, qubit) in pattern.iter().zip(controls.iter()) {
            if !bit {
                self.apply_gate(&flip, qubit)?;
            }
        }
        let result = self.controlled(op, controls, targets);
        for (&bit, qubit) in pattern.iter().zip(controls.iter()) {
            if !bit {
                self.apply_gate(&flip, qubit)?;
            }
        }
        result
    }

    /// Like [`controlled`](Self::controlled), but triggering when the
    /// controls encode `value` under the configured bit order. High bits
    /// beyond the group are truncated.
    pub fn controlled_on_int(
        &mut self,
        op: &Operation,
        value: u64,
        controls: &QubitGroup,
        targets: &QubitGroup,
    ) -> Result<(), QuregError> {
        let pattern =
            crate::core::bits::int_to_bools(value, controls.len(), self.config.bit_order);
        self.controlled_on_bools(op, &pattern, controls, targets)
    }

    fn unpermute(&mut self) {
        if self.control_stack.is_empty() {
            return;
        }
        self.tensor = self.tensor.permuted(&self.axis_of_qubit);
        let n = self.num_qubits();
        self.axis_of_qubit = (0..n).collect();
        self.qubit_of_axis = (0..n).collect();
    }

    fn apply_permutation(&mut self) {
        if self.control_stack.is_empty() {
            return;
        }
        let order = compute_axis_order(self.num_qubits(), &self.controls());
        self.tensor = self.tensor.permuted(&order.qubit_of_axis);
        self.axis_of_qubit = order.axis_of_qubit;
        self.qubit_of_axis = order.qubit_of_axis;
    }

    /// Physical tensor axis currently holding logical qubit `index`.
    pub(crate) fn axis_of(&self, index: usize) -> usize {
        self.axis_of_qubit[index]
    }

    // --- Gate application ---

    /// Applies a 2×2 unitary to one qubit. When control qubits are active
    /// the gate acts only on the branch where all controls hold `|1⟩`.
    pub fn apply_gate(&mut self, gate: &SingleQubitGate, target: Qubit) -> Result<(), QuregError> {
        let index = self.check_qubit(target)?;
        self.check_not_controlling(index)?;
        if self.has_controls() && !gate.is_controllable() {
            return Err(QuregError::UncontrollableOperation { name: gate.name().to_string() });
        }
        let controls = self.controls();
        let matrix = *gate.matrix();
        let apply = move |register: &mut Self| -> Result<(), QuregError> {
            let axis = register.axis_of(index);
            let control_count = register.control_count();
            register.tensor.apply_single_qubit(axis, control_count, &matrix);
            if register.config.auto_normalize {
                register.tensor.normalize();
            }
            Ok(())
        };
        if gate.is_trackable() {
            self.traced(gate.name(), &controls, &[index], apply)
        } else {
            apply(self)
        }
    }

    /// Applies one gate to each qubit of the group, in group order.
    pub fn apply_to_each(
        &mut self,
        gate: &SingleQubitGate,
        group: &QubitGroup,
    ) -> Result<(), QuregError> {
        self.check_system(group.system_id())?;
        for qubit in group.iter() {
            self.apply_gate(gate, qubit)?;
        }
        Ok(())
    }

    /// Applies the gate to the qubits whose pattern bit is set (or, with
    /// `flip`, unset). Pattern and group are zipped to the shorter length.
    pub fn apply_from_bools(
        &mut self,
        gate: &SingleQubitGate,
        pattern: &[bool],
        group: &QubitGroup,
        flip: bool,
    ) -> Result<(), QuregError> {
        self.check_system(group.system_id())?;
        for (&bit, qubit) in pattern.iter().zip(group.iter()) {
            if bit ^ flip {
                self.apply_gate(gate, qubit)?;
            }
        }
        Ok(())
    }

    /// Applies the gate to the qubits selected by the bits of `value`,
    /// least significant bit first over the group order.
    pub fn apply_from_int(
        &mut self,
        gate: &SingleQubitGate,
        value: u64,
        group: &QubitGroup,
    ) -> Result<(), QuregError> {
        self.check_system(group.system_id())?;
        let mut rest = value;
        for qubit in group.iter() {
            if rest == 0 {
                break;
            }
            if rest & 1 == 1 {
                self.apply_gate(gate, qubit)?;
            }
            rest >>= 1;
        }
        Ok(())
    }

    // --- Named composite operations ---

    /// Controlled NOT. The two qubits must be distinct and in this
    /// register.
    pub fn cnot(&mut self, control: Qubit, target: Qubit) -> Result<(), QuregError> {
        let control_index = self.check_qubit(control)?;
        let target_index = self.check_qubit(target)?;
        if self.config.strict_checks && control_index == target_index {
            return Err(QuregError::DuplicateQubit { index: control_index });
        }
        self.check_not_controlling(control_index)?;
        self.check_not_controlling(target_index)?;
        let mut trace_controls = self.controls();
        trace_controls.push(control_index);
        self.traced("CNOT", &trace_controls, &[target_index], |register| {
            register.with_controls(&control.as_group(), |inner| {
                inner.apply_gate(&operations::x(), target)
            })
        })
    }

    /// Toffoli (CCNOT). All three qubits must be distinct and in this
    /// register.
    pub fn ccnot(&mut self, control0: Qubit, control1: Qubit, target: Qubit) -> Result<(), QuregError> {
        let c0 = self.check_qubit(control0)?;
        let c1 = self.check_qubit(control1)?;
        let target_index = self.check_qubit(target)?;
        if self.config.strict_checks {
            if c0 == c1 {
                return Err(QuregError::DuplicateQubit { index: c0 });
            }
            if c0 == target_index || c1 == target_index {
                return Err(QuregError::DuplicateQubit { index: target_index });
            }
        }
        for index in [c0, c1, target_index] {
            self.check_not_controlling(index)?;
        }
        let controls = QubitGroup::new(self.id, vec![c0, c1]);
        let mut trace_controls = self.controls();
        trace_controls.extend([c0, c1]);
        self.traced("CCNOT", &trace_controls, &[target_index], |register| {
            register.with_controls(&controls, |inner| {
                inner.apply_gate(&operations::x(), target)
            })
        })
    }

    /// Exchanges the state of two qubits. Quantum data can be moved but
    /// not copied; this swaps the tensor axes directly, or decomposes into
    /// three CNOTs when control qubits are active.
    pub fn swap(&mut self, a: Qubit, b: Qubit) -> Result<(), QuregError> {
        let a_index = self.check_qubit(a)?;
        let b_index = self.check_qubit(b)?;
        if self.config.strict_checks && a_index == b_index {
            return Err(QuregError::DuplicateQubit { index: a_index });
        }
        self.check_not_controlling(a_index)?;
        self.check_not_controlling(b_index)?;
        let controls = self.controls();
        self.traced("SWAP", &controls, &[a_index, b_index], |register| {
            if register.has_controls() {
                register.cnot(b, a)?;
                register.cnot(a, b)?;
                register.cnot(b, a)
            } else {
                let axis_a = register.axis_of(a_index);
                let axis_b = register.axis_of(b_index);
                register.tensor.swap_axes(axis_a, axis_b);
                Ok(())
            }
        })
    }

    // --- Measurement and reset ---

    /// Probability of measuring `|0⟩` and `|1⟩` on the qubit, without
    /// collapsing the state.
    pub fn probability(&self, qubit: Qubit) -> Result<(f64, f64), QuregError> {
        let index = self.check_qubit(qubit)?;
        let (p0, p1) = self.tensor.axis_probabilities(self.axis_of(index));
        let total = p0 + p1;
        Ok((p0 / total, p1 / total))
    }

    /// Measures one qubit: samples a classical outcome per the Born rule,
    /// zeroes the discarded branch and renormalizes the surviving slice.
    pub fn measure(&mut self, qubit: Qubit) -> Result<bool, QuregError> {
        let index = self.check_qubit(qubit)?;
        self.check_not_controlling(index)?;
        self.traced("MEASURE", &[], &[index], |register| {
            let axis = register.axis_of(index);
            let (p0, p1) = register.tensor.axis_probabilities(axis);
            let sample = register.rng.random::<f64>() * (p0 + p1);
            let outcome = if sample <= p0 { 0 } else { 1 };
            let p_chosen = if outcome == 0 { p0 } else { p1 };
            register.tensor.scale_slice(axis, outcome, 1.0 / p_chosen.sqrt());
            register.tensor.zero_slice(axis, 1 - outcome);
            Ok(outcome == 1)
        })
    }

    /// Measures each qubit of the group in order, then restores unit norm
    /// with one global pass instead of renormalizing per qubit.
    pub fn measure_all(&mut self, group: &QubitGroup) -> Result<Vec<bool>, QuregError> {
        self.validate_group(group, false, true)?;
        let targets = group.indexes().to_vec();
        self.traced("MEASUREALL", &[], &targets, |register| {
            let mut outcomes = Vec::with_capacity(targets.len());
            for &index in &targets {
                let axis = register.axis_of(index);
                let (p0, p1) = register.tensor.axis_probabilities(axis);
                let sample = register.rng.random::<f64>() * (p0 + p1);
                let outcome = if sample <= p0 { 0 } else { 1 };
                register.tensor.zero_slice(axis, 1 - outcome);
                outcomes.push(outcome == 1);
            }
            register.tensor.normalize();
            Ok(outcomes)
        })
    }

    /// Forces one qubit to `|0⟩`, keeping the relative amplitude structure
    /// of the surviving branch.
    ///
    /// Reset recovers amplitude, not phase: a relative phase present in
    /// the superposition stays folded into the surviving amplitudes.
    /// Callers needing a canonical `|0⟩` apply a phase-correcting gate
    /// first.
    pub fn reset(&mut self, qubit: Qubit) -> Result<(), QuregError> {
        let index = self.check_qubit(qubit)?;
        self.check_not_controlling(index)?;
        self.traced("RESET", &[], &[index], |register| {
            let axis = register.axis_of(index);
            let p0 = register.tensor.slice_norm_sqr(axis, 0);
            if near_zero(p0) {
                // The |0⟩ branch is empty: move the |1⟩ branch across.
                // This is a move, not a measurement.
                register.tensor.copy_slice(axis, 1, 0);
            }
            let p0 = register.tensor.slice_norm_sqr(axis, 0);
            register.tensor.scale_slice(axis, 0, 1.0 / p0.sqrt());
            register.tensor.zero_slice(axis, 1);
            Ok(())
        })
    }

    /// Resets each qubit of the group, then restores unit norm with one
    /// global pass.
    pub fn reset_all(&mut self, group: &QubitGroup) -> Result<(), QuregError> {
        self.validate_group(group, false, true)?;
        let targets = group.indexes().to_vec();
        self.traced("RESETALL", &[], &targets, |register| {
            for &index in &targets {
                let axis = register.axis_of(index);
                let p0 = register.tensor.slice_norm_sqr(axis, 0);
                if near_zero(p0) {
                    register.tensor.copy_slice(axis, 1, 0);
                }
                register.tensor.zero_slice(axis, 1);
            }
            register.tensor.normalize();
            Ok(())
        })
    }

    // --- Growing, shrinking, temporary qubits ---

    /// Appends `count` qubits at the end of the register, each in `|0⟩`,
    /// and returns a group over them. Any active control transposition is
    /// undone around the resize and reapplied afterwards.
    pub fn add_qubits(&mut self, count: usize) -> Result<QubitGroup, QuregError> {
        let old_n = self.num_qubits();
        self.unpermute();
        if let Err(error) = self.tensor.grow(count) {
            self.apply_permutation();
            return Err(error);
        }
        let n = self.num_qubits();
        self.axis_of_qubit = (0..n).collect();
        self.qubit_of_axis = (0..n).collect();
        self.apply_permutation();
        Ok(QubitGroup::new(self.id, (old_n..n).collect()))
    }

    /// Removes the `count` trailing qubits, which must already be exactly
    /// in `|0⟩` with full probability mass. The occupancy scan is skipped
    /// when `check_release` is off.
    pub fn remove_qubits(&mut self, count: usize) -> Result<(), QuregError> {
        let n = self.num_qubits();
        if count > n {
            return Err(QuregError::ConfigurationRange {
                message: format!("cannot remove {} qubits from a register of {}", count, n),
            });
        }
        for &index in self.controls().iter() {
            if index >= n - count {
                return Err(QuregError::ControlTargetConflict { index });
            }
        }
        self.unpermute();
        if let Err(error) = self.tensor.shrink(count, self.config.check_release) {
            self.apply_permutation();
            return Err(error);
        }
        let n = self.num_qubits();
        self.axis_of_qubit = (0..n).collect();
        self.qubit_of_axis = (0..n).collect();
        self.apply_permutation();
        Ok(())
    }

    /// Allocates `count` scratch qubits, runs `body` with a group over
    /// them, and removes them again on every exit path. The removal
    /// requires the scratch qubits to have been driven back to `|0⟩`;
    /// failing that, the scope fails loudly with
    /// [`QuregError::UnreleasedState`] instead of leaking probability
    /// mass.
    pub fn with_temp_qubits<T>(
        &mut self,
        count: usize,
        body: impl FnOnce(&mut Self, &QubitGroup) -> Result<T, QuregError>,
    ) -> Result<T, QuregError> {
        let group = self.add_qubits(count)?;
        let result = body(self, &group);
        let released = self.remove_qubits(count);
        match (result, released) {
            (Err(error), _) => Err(error),
            (Ok(_), Err(error)) => Err(error),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Consumes the register, verifying that it was driven back to the
    /// all-zero state. The check is skipped when `check_release` is off.
    ///
    /// This replaces teardown-time validation in a destructor: callers
    /// release deterministically and handle the error where it happens.
    pub fn release(self) -> Result<(), QuregError> {
        if self.config.check_release {
            let residual = self.tensor.residual_off_zero();
            if !near_zero(residual) {
                return Err(QuregError::UnreleasedState {
                    message: format!(
                        "register released with probability mass {:.3e} outside |0...0⟩",
                        residual
                    ),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for QubitRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QubitRegister({} qubits, {})", self.num_qubits(), self.id)
    }
}
