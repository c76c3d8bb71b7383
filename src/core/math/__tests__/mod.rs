pub mod ops_test;
