//! Test-only crate. The actual coverage lives in `tests/`.
