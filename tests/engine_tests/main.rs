//! Engine test suite
