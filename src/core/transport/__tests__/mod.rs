pub mod apdagd_test;
pub mod solver_test;
