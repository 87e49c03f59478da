//! Integration tests for fieldbuf-core.

mod definition_tests;
mod evolution_tests;
mod helpers;
mod record_tests;
