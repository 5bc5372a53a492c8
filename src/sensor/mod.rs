//! # Sensor Feed Module
//!
//! Decoding for the line-oriented serial sensor feed.
//!
//! This module handles:
//! - Newline framing of the raw byte stream (partial chunks tolerated)
//! - Parsing one framed record into a typed sensor sample
//! - The zero-default policy for missing or unparsable fields

pub mod framer;
pub mod parser;
