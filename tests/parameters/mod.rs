//! Integration tests for the parameter system
//!
//! These tests verify that the parameter system behaves correctly in various scenarios.

// Tests for the Parameters schema
mod parameters_tests;

// Tests for Mu assignments and their arithmetic
mod mu_tests;



// Tests for parameter spaces and sampling
mod space_tests;

// Tests for the Parametric trait
mod parametric_tests;
