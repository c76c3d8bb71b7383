pub mod momentum_test;
