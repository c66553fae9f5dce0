// demos/qft_roundtrip.rs
//
// Runs the quantum Fourier transform and its inverse over a small register
// with both backends and shows that they agree. Run with
// `cargo run --example qft_roundtrip`.

use qureg::validation::states_approx_equal;
use qureg::{QftBackend, QftEngine, QubitRegister, QuregError, operations};

fn prepare(register: &mut QubitRegister) -> Result<(), QuregError> {
    for (position, qubit) in register.qubits().iter().enumerate() {
        register.apply_gate(&operations::ry(0.5 + 0.3 * position as f64), qubit)?;
    }
    register.cnot(register.qubit(0)?, register.qubit(2)?)?;
    Ok(())
}

fn main() -> Result<(), QuregError> {
    let mut engine = QftEngine::new();

    let mut gate_register = QubitRegister::new(3)?;
    gate_register.config_mut().qft_backend = QftBackend::Gates;
    let mut numeric_register = QubitRegister::new(3)?;
    prepare(&mut gate_register)?;
    prepare(&mut numeric_register)?;

    let gate_group = gate_register.qubits();
    let numeric_group = numeric_register.qubits();
    engine.forward(&mut gate_register, &gate_group)?;
    engine.forward(&mut numeric_register, &numeric_group)?;

    println!("QFT spectrum (transform backend):");
    for (index, amplitude) in numeric_register.amplitudes().iter().enumerate() {
        println!("  |{:03b}⟩: {:.4}  (p = {:.4})", index, amplitude, amplitude.norm_sqr());
    }
    println!(
        "backends agree: {}",
        states_approx_equal(
            &gate_register.amplitudes(),
            &numeric_register.amplitudes(),
            1e-6
        )
    );

    let before = numeric_register.amplitudes();
    engine.inverse(&mut numeric_register, &numeric_group)?;
    engine.forward(&mut numeric_register, &numeric_group)?;
    println!(
        "inverse/forward round trip holds: {}",
        states_approx_equal(&numeric_register.amplitudes(), &before, 1e-6)
    );
    Ok(())
}
