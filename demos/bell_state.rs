// demos/bell_state.rs
//
// Prepares a Bell pair, shows the flattened amplitudes, and measures both
// qubits. Run with `cargo run --example bell_state`.

use qureg::{QubitRegister, QuregError, operations};

fn main() -> Result<(), QuregError> {
    let mut register = QubitRegister::seeded(2, 11)?;
    register.config_mut().tracing = true;

    let q0 = register.qubit(0)?;
    let q1 = register.qubit(1)?;
    register.apply_gate(&operations::h(), q0)?;
    register.cnot(q0, q1)?;

    println!("Bell state amplitudes:");
    for (index, amplitude) in register.amplitudes().iter().enumerate() {
        println!("  |{:02b}⟩: {:.4}", index, amplitude);
    }

    let outcomes = register.measure_all(&register.qubits())?;
    println!("Measured: {:?}", outcomes);
    assert_eq!(outcomes[0], outcomes[1], "Bell pair outcomes always agree");

    println!("Trace:");
    for entry in register.trace() {
        println!("  {}", entry);
    }

    register.reset_all(&register.qubits())?;
    register.release()
}
