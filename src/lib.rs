//! salarylens
//!
//! Salary dashboard pipeline over technology-industry compensation data. This
//! crate re-exports [`sln_core`]; the `sln` command-line tool lives in the
//! `sln-cli` workspace member.

pub use sln_core::*;
