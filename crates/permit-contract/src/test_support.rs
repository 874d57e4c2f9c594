//! Shared test utilities for permit-contract unit tests.
