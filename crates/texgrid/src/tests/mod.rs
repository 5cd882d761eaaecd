//! Comprehensive test suite for the texture/array binding surface

mod array_tests;
mod integration_tests;
