//! Unit tests for the hygiene map CLI.
#![expect(
    clippy::panic,
    reason = "tests panic on unexpected error variants to surface them"
)]

use super::*;
