// Module Definition
pub mod charges; // Charge model and fixed-width encoder
pub mod evaluator; // Benchmark harness over core budgets
pub mod field;
pub mod grid;
pub mod kernels; // Field vector and magnitude kernels
pub mod memory; // Host workspace and device mirrors
pub mod parallel;
pub mod partition; // Launch configuration and dispatch
pub mod report;
pub mod sequential;
pub mod timing;

#[cfg(feature = "python")]
pub mod controller; // Python classes
