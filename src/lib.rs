//! pygraft: structure-matched replacement of Python definitions
//!
//! Patches function and method definitions in a destination Python file by
//! locating, for each definition in a source file, a structurally-matching
//! definition in the destination and replacing it wholesale. Matching is by
//! name, canonical parameter signature, and enclosing context (module, or
//! class identified by name and base list), never by position or body.
//!
//! The pipeline is linear and fails fast: parse both files, collect source
//! candidates, validate that every candidate matches somewhere in the
//! destination, splice the replacements, then publish the result with a
//! collision-free backup of the old file. Any failure before the publish
//! step leaves the destination byte-for-byte untouched.

// Parsing and byte spans
pub mod parse;

// The structural engine
pub mod matcher;
pub mod rewrite;
pub mod scan;

// Filesystem publish
pub mod swap;

// Run pipeline and its surfaces
pub mod cli;
pub mod error;
pub mod output;
