// tests/register_tests.rs

// Import necessary types from the qureg crate
use num_complex::Complex;
use qureg::validation::states_approx_equal;
use qureg::{BitOrder, Operation, QubitRegister, QuregError, operations};

const TEST_TOLERANCE: f64 = 1e-6;

fn c(re: f64, im: f64) -> Complex<f64> {
    Complex::new(re, im)
}

// Helper to prepare a generic non-basis state so round-trip tests do not
// accidentally pass on |0...0⟩.
fn prepare_generic(register: &mut QubitRegister) -> Result<(), QuregError> {
    for (position, qubit) in register.qubits().iter().enumerate() {
        register.apply_gate(&operations::ry(0.3 + 0.4 * position as f64), qubit)?;
        register.apply_gate(&operations::rz(0.9 - 0.2 * position as f64), qubit)?;
    }
    for position in 0..register.num_qubits().saturating_sub(1) {
        let control = register.qubit(position as isize)?;
        let target = register.qubit(position as isize + 1)?;
        register.cnot(control, target)?;
    }
    Ok(())
}

#[test]
fn new_register_is_all_zero() -> Result<(), QuregError> {
    let register = QubitRegister::new(3)?;
    let amplitudes = register.amplitudes();
    assert_eq!(amplitudes.len(), 8);
    assert!((amplitudes[0] - c(1.0, 0.0)).norm() < TEST_TOLERANCE);
    assert!((register.norm_sqr() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn h_z_h_yields_deterministic_one() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    let q0 = register.qubit(0)?;
    register.apply_gate(&operations::h(), q0)?;
    register.apply_gate(&operations::z(), q0)?;
    register.apply_gate(&operations::h(), q0)?;

    let amplitudes = register.amplitudes();
    assert!(amplitudes[0].norm() < TEST_TOLERANCE);
    assert!((amplitudes[1] - c(1.0, 0.0)).norm() < TEST_TOLERANCE);

    assert!(register.measure(q0)?, "H·Z·H on |0⟩ must measure as 1");
    register.reset(q0)?;
    let amplitudes = register.amplitudes();
    assert!((amplitudes[0] - c(1.0, 0.0)).norm() < TEST_TOLERANCE);
    register.release()
}

#[test]
fn bell_state_amplitudes() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let q0 = register.qubit(0)?;
    let q1 = register.qubit(1)?;
    register.apply_gate(&operations::h(), q0)?;
    register.cnot(q0, q1)?;

    let amplitudes = register.amplitudes();
    let expected = std::f64::consts::FRAC_1_SQRT_2;
    assert!((amplitudes[0].norm() - expected).abs() < TEST_TOLERANCE);
    assert!(amplitudes[1].norm() < TEST_TOLERANCE);
    assert!(amplitudes[2].norm() < TEST_TOLERANCE);
    assert!((amplitudes[3].norm() - expected).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn gate_inverse_round_trips() -> Result<(), QuregError> {
    let pairs: Vec<(operations::SingleQubitGate, Vec<operations::SingleQubitGate>)> = vec![
        (operations::h(), vec![operations::h()]),
        (operations::x(), vec![operations::x()]),
        (
            operations::s(),
            vec![operations::s(), operations::s(), operations::s()],
        ),
        (operations::r1(0.7), vec![operations::r1(-0.7)]),
        (operations::r1(2.4), vec![operations::r1(-2.4)]),
    ];
    for (gate, inverse_sequence) in pairs {
        let mut register = QubitRegister::new(2)?;
        prepare_generic(&mut register)?;
        let before = register.amplitudes();
        let q1 = register.qubit(1)?;
        register.apply_gate(&gate, q1)?;
        for inverse in &inverse_sequence {
            register.apply_gate(inverse, q1)?;
        }
        assert!(
            states_approx_equal(&register.amplitudes(), &before, TEST_TOLERANCE),
            "{} round trip failed",
            gate.name()
        );
    }
    Ok(())
}

#[test]
fn norm_stays_unit_under_long_gate_sequences() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    for round in 0..50 {
        let theta = 0.1 + 0.05 * round as f64;
        for qubit in register.qubits().iter() {
            register.apply_gate(&operations::h(), qubit)?;
            register.apply_gate(&operations::rx(theta), qubit)?;
            register.apply_gate(&operations::t(), qubit)?;
        }
        register.cnot(register.qubit(0)?, register.qubit(2)?)?;
    }
    assert!((register.norm_sqr() - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn measurement_is_consistent_with_itself() -> Result<(), QuregError> {
    let mut register = QubitRegister::seeded(2, 99)?;
    prepare_generic(&mut register)?;
    let q0 = register.qubit(0)?;
    let first = register.measure(q0)?;
    let second = register.measure(q0)?;
    assert_eq!(first, second, "immediate re-measurement must agree");

    let (p0, p1) = register.probability(q0)?;
    let recorded = if first { p1 } else { p0 };
    assert!((recorded - 1.0).abs() < 1e-9, "recorded outcome must have probability 1");
    Ok(())
}

#[test]
fn probability_does_not_collapse() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    let q0 = register.qubit(0)?;
    register.apply_gate(&operations::h(), q0)?;
    let before = register.amplitudes();
    let (p0, p1) = register.probability(q0)?;
    assert!((p0 - 0.5).abs() < TEST_TOLERANCE);
    assert!((p1 - 0.5).abs() < TEST_TOLERANCE);
    assert!(states_approx_equal(&register.amplitudes(), &before, TEST_TOLERANCE));
    Ok(())
}

#[test]
fn measure_all_collapses_to_basis_state() -> Result<(), QuregError> {
    let mut register = QubitRegister::seeded(2, 3)?;
    let group = register.qubits();
    register.apply_to_each(&operations::x(), &group)?;
    let outcomes = register.measure_all(&group)?;
    assert_eq!(outcomes, vec![true, true]);
    let amplitudes = register.amplitudes();
    assert!((amplitudes[3].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn reset_is_idempotent_and_exact() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    let q0 = register.qubit(0)?;

    // Reset of an already-|0⟩ qubit is a no-op.
    let before = register.amplitudes();
    register.reset(q0)?;
    assert!(states_approx_equal(&register.amplitudes(), &before, TEST_TOLERANCE));

    // X then reset returns exactly to amplitude (1, 0).
    register.apply_gate(&operations::x(), q0)?;
    register.reset(q0)?;
    let amplitudes = register.amplitudes();
    assert!((amplitudes[0] - c(1.0, 0.0)).norm() < TEST_TOLERANCE);
    assert!(amplitudes[1].norm() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn reset_folds_phase_into_surviving_amplitude() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    let q0 = register.qubit(0)?;
    register.apply_gate(&operations::h(), q0)?;
    register.apply_gate(&operations::s(), q0)?;
    register.reset(q0)?;
    // All mass back on |0⟩; the relative phase is not canonicalized away.
    let amplitudes = register.amplitudes();
    assert!((amplitudes[0].norm() - 1.0).abs() < TEST_TOLERANCE);
    assert!(amplitudes[1].norm() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn reset_all_restores_zero_state() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    prepare_generic(&mut register)?;
    let group = register.qubits();
    register.reset_all(&group)?;
    let amplitudes = register.amplitudes();
    assert!((amplitudes[0].norm() - 1.0).abs() < TEST_TOLERANCE);
    register.release()
}

#[test]
fn ccnot_flips_only_with_both_controls_set() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    let q0 = register.qubit(0)?;
    let q1 = register.qubit(1)?;
    let q2 = register.qubit(2)?;

    register.apply_gate(&operations::x(), q0)?;
    register.ccnot(q0, q1, q2)?;
    // Only one control set: target untouched. |100⟩
    assert!((register.amplitudes()[0b100].norm() - 1.0).abs() < TEST_TOLERANCE);

    register.apply_gate(&operations::x(), q1)?;
    register.ccnot(q0, q1, q2)?;
    // Both controls set: target flips. |111⟩
    assert!((register.amplitudes()[0b111].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn swap_exchanges_qubit_state() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    let q0 = register.qubit(0)?;
    let q2 = register.qubit(2)?;
    register.apply_gate(&operations::x(), q0)?;
    register.swap(q0, q2)?;
    assert!((register.amplitudes()[0b001].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn controlled_swap_decomposes_under_controls() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    let q0 = register.qubit(0)?;
    let q1 = register.qubit(1)?;
    register.apply_gate(&operations::x(), q0)?;
    register.apply_gate(&operations::x(), q1)?;
    // Control |1⟩: the swap happens. |110⟩ -> |101⟩
    register.controlled(&Operation::Swap, &q0.as_group(), &register.group(&[1, 2])?)?;
    assert!((register.amplitudes()[0b101].norm() - 1.0).abs() < TEST_TOLERANCE);
    // Flip the control off and try again: nothing moves.
    register.apply_gate(&operations::x(), q0)?;
    register.controlled(&Operation::Swap, &q0.as_group(), &register.group(&[1, 2])?)?;
    assert!((register.amplitudes()[0b001].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn controlled_on_int_triggers_on_pattern() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    let q0 = register.qubit(0)?;
    let controls = register.group(&[0, 1])?;
    let target = register.qubit(2)?.as_group();

    // Pattern 0b10 (qubit 0 high, qubit 1 low) matches after X on qubit 0.
    register.apply_gate(&operations::x(), q0)?;
    register.controlled_on_int(&Operation::Gate(operations::x()), 0b10, &controls, &target)?;
    assert!((register.amplitudes()[0b101].norm() - 1.0).abs() < TEST_TOLERANCE);

    // A non-matching pattern leaves the target alone and restores controls.
    register.controlled_on_int(&Operation::Gate(operations::x()), 0b01, &controls, &target)?;
    assert!((register.amplitudes()[0b101].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn apply_from_int_selects_group_members() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    let group = register.qubits();
    // Bits least significant first over the group: qubits 0 and 2 flip.
    register.apply_from_int(&operations::x(), 0b101, &group)?;
    assert!((register.amplitudes()[0b101].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn readout_convention_only_changes_enumeration() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    register.apply_gate(&operations::x(), register.qubit(0)?)?;
    let msb = register.amplitudes();
    assert!((msb[0b10].norm() - 1.0).abs() < TEST_TOLERANCE);
    register.scoped_config(
        |config| config.bit_order = BitOrder::LeastSignificantFirst,
        |register| {
            let lsb = register.amplitudes();
            assert!((lsb[0b01].norm() - 1.0).abs() < TEST_TOLERANCE);
            Ok(())
        },
    )
}

#[test]
fn scoped_config_nests_and_restores_on_error() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    assert!(register.config().auto_normalize);
    register.scoped_config(
        |config| config.auto_normalize = false,
        |register| {
            assert!(!register.config().auto_normalize);
            register.scoped_config(
                |config| config.auto_normalize = true,
                |register| {
                    assert!(register.config().auto_normalize);
                    Ok(())
                },
            )?;
            assert!(!register.config().auto_normalize);
            Ok(())
        },
    )?;
    assert!(register.config().auto_normalize);

    // The previous value comes back even when the body fails.
    let result = register.scoped_config(
        |config| config.auto_normalize = false,
        |register| register.apply_gate(&operations::x(), register.qubit(7)?),
    );
    assert!(matches!(result, Err(QuregError::InvalidIndex { .. })));
    assert!(register.config().auto_normalize);
    Ok(())
}

#[test]
fn trace_records_composites_as_single_entries() -> Result<(), QuregError> {
    let mut register = QubitRegister::seeded(2, 5)?;
    register.config_mut().tracing = true;
    let q0 = register.qubit(0)?;
    let q1 = register.qubit(1)?;

    register.apply_gate(&operations::h(), q0)?;
    register.cnot(q0, q1)?;
    register.swap(q0, q1)?;
    register.measure(q0)?;
    register.with_controls(&q0.as_group(), |inner| {
        inner.apply_gate(&operations::h(), q1)
    })?;

    let trace = register.trace();
    assert_eq!(trace.len(), 5);
    assert_eq!(trace[0].operation, "H");
    assert_eq!(trace[0].targets, vec![0]);
    assert!(trace[0].controls.is_empty());
    assert_eq!(trace[1].operation, "CNOT");
    assert_eq!(trace[1].controls, vec![0]);
    assert_eq!(trace[1].targets, vec![1]);
    assert_eq!(trace[2].operation, "SWAP");
    assert_eq!(trace[2].targets, vec![0, 1]);
    assert_eq!(trace[3].operation, "MEASURE");
    assert_eq!(trace[4].operation, "H");
    assert_eq!(trace[4].controls, vec![0]);
    assert_eq!(trace[4].targets, vec![1]);

    register.clear_trace();
    assert!(register.trace().is_empty());
    Ok(())
}

#[test]
fn identity_gate_is_not_traced() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    register.config_mut().tracing = true;
    register.apply_gate(&operations::i(), register.qubit(0)?)?;
    assert!(register.trace().is_empty());
    Ok(())
}

#[test]
fn temporary_qubits_grow_and_shrink_the_register() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    prepare_generic(&mut register)?;
    let before = register.amplitudes();
    let value = register.with_temp_qubits(2, |register, scratch| {
        assert_eq!(register.num_qubits(), 4);
        assert_eq!(scratch.indexes(), &[2, 3]);
        let tmp = scratch.get(0)?;
        register.apply_gate(&operations::x(), tmp)?;
        register.apply_gate(&operations::x(), tmp)?;
        Ok(17)
    })?;
    assert_eq!(value, 17);
    assert_eq!(register.num_qubits(), 2);
    assert!(states_approx_equal(&register.amplitudes(), &before, TEST_TOLERANCE));
    Ok(())
}

#[test]
fn leaking_temporary_qubits_fails_loudly() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let result = register.with_temp_qubits(1, |register, scratch| {
        register.apply_gate(&operations::x(), scratch.get(0)?)
    });
    assert!(matches!(result, Err(QuregError::UnreleasedState { .. })));
    // The scratch qubit is still there; nothing was silently discarded.
    assert_eq!(register.num_qubits(), 3);
    Ok(())
}

#[test]
fn add_and_remove_qubits_round_trip() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    register.apply_gate(&operations::x(), register.qubit(0)?)?;
    let added = register.add_qubits(1)?;
    assert_eq!(added.indexes(), &[2]);
    assert_eq!(register.num_qubits(), 3);
    assert!((register.amplitudes()[0b100].norm() - 1.0).abs() < TEST_TOLERANCE);
    register.remove_qubits(1)?;
    assert_eq!(register.num_qubits(), 2);
    assert!((register.amplitudes()[0b10].norm() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn resizing_works_while_controls_are_active() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let q0 = register.qubit(0)?;
    register.apply_gate(&operations::x(), q0)?;
    register.push_controls(&q0.as_group())?;
    let added = register.add_qubits(1)?;
    // Control still active and |1⟩: the gate acts on the new qubit.
    register.apply_gate(&operations::x(), added.get(0)?)?;
    register.pop_controls();
    assert!((register.amplitudes()[0b101].norm() - 1.0).abs() < TEST_TOLERANCE);
    // Undo, then shrink back down.
    register.apply_gate(&operations::x(), register.qubit(2)?)?;
    register.remove_qubits(1)?;
    assert_eq!(register.num_qubits(), 2);
    Ok(())
}

// --- Error paths ---

#[test]
fn overlapping_controls_are_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let q0 = register.qubit(0)?;
    register.push_controls(&q0.as_group())?;
    let result = register.push_controls(&q0.as_group());
    assert!(matches!(result, Err(QuregError::OverlappingControl { index: 0 })));
    register.pop_controls();
    Ok(())
}

#[test]
fn cnot_on_one_qubit_is_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let q0 = register.qubit(0)?;
    let result = register.cnot(q0, q0);
    assert!(matches!(result, Err(QuregError::DuplicateQubit { index: 0 })));
    Ok(())
}

#[test]
fn shrinking_an_occupied_qubit_is_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    // Drive the trailing qubit to 0.6|0⟩ + 0.8i|1⟩.
    let rotate = operations::SingleQubitGate::new(
        c(0.6, 0.0),
        c(0.0, 0.8),
        c(0.0, 0.8),
        c(0.6, 0.0),
        "U",
    )?;
    register.apply_gate(&rotate, register.qubit(1)?)?;
    let result = register.remove_qubits(1);
    assert!(matches!(result, Err(QuregError::UnreleasedState { .. })));
    // Failed removal leaves the register intact.
    assert_eq!(register.num_qubits(), 2);
    assert!((register.norm_sqr() - 1.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn too_many_controls_are_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let everything = register.qubits();
    let result = register.push_controls(&everything);
    assert!(matches!(
        result,
        Err(QuregError::TooManyControls { requested: 2, qubits: 2 })
    ));
    Ok(())
}

#[test]
fn out_of_range_indices_are_rejected() -> Result<(), QuregError> {
    let register = QubitRegister::new(2)?;
    assert!(matches!(register.qubit(5), Err(QuregError::InvalidIndex { .. })));
    assert!(matches!(register.qubit(-3), Err(QuregError::InvalidIndex { .. })));
    assert_eq!(register.qubit(-1)?.index(), 1);
    Ok(())
}

#[test]
fn foreign_handles_are_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    let other = QubitRegister::new(1)?;
    let foreign = other.qubit(0)?;
    let result = register.cnot(register.qubit(0)?, foreign);
    assert!(matches!(result, Err(QuregError::CrossSystem { .. })));
    Ok(())
}

#[test]
fn targeting_a_control_is_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let q0 = register.qubit(0)?;
    let result = register.with_controls(&q0.as_group(), |inner| {
        inner.apply_gate(&operations::x(), q0)
    });
    assert!(matches!(result, Err(QuregError::ControlTargetConflict { index: 0 })));
    assert!(!register.has_controls(), "control scope must unwind on error");
    Ok(())
}

#[test]
fn uncontrollable_operations_are_rejected_under_controls() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(2)?;
    let gate = operations::h().with_controllable(false);
    let q0 = register.qubit(0)?;
    let q1 = register.qubit(1)?;
    let result = register.controlled(&Operation::Gate(gate.clone()), &q0.as_group(), &q1.as_group());
    assert!(matches!(result, Err(QuregError::UncontrollableOperation { .. })));
    // Outside a control scope the gate applies normally.
    register.apply_gate(&gate, q1)?;
    Ok(())
}

#[test]
fn wrong_operation_arity_is_rejected() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(3)?;
    let one = register.group(&[0])?;
    let result = Operation::Swap.invoke(&mut register, &one);
    assert!(matches!(
        result,
        Err(QuregError::OperationArity { expected: 2, found: 1, .. })
    ));
    Ok(())
}

#[test]
fn release_checks_for_leftover_mass() -> Result<(), QuregError> {
    let mut register = QubitRegister::new(1)?;
    register.apply_gate(&operations::x(), register.qubit(0)?)?;
    let result = register.release();
    assert!(matches!(result, Err(QuregError::UnreleasedState { .. })));

    let mut register = QubitRegister::new(1)?;
    register.apply_gate(&operations::x(), register.qubit(0)?)?;
    register.reset(register.qubit(0)?)?;
    register.release()
}
