//! Test Fixtures Module
//!
//! Generated audio and helpers for writing it to WAV files.

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod audio_fixtures;

pub use audio_fixtures::*;
