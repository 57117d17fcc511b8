//! Command-line argument surface (component G).
//!
//! Grounded in the teacher's `clap::Parser`-derive `Args` pattern
//! (`examples/parser.rs`): dispatch is by `clap::Subcommand` derive, not a
//! hand-rolled `match` on `std::env::args()`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hdtdist",
    version,
    about = "Triplet and quartet tree distance via Hierarchical Decomposition Trees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Canonical subcommand names, in the casing `clap` expects them in.
const COMMAND_NAMES: &[&str] = &[
    "calc-trip-dist",
    "calc-quart-dist",
    "print-tree",
    "print-rooted-tree",
    "print-hdt",
];

/// Parses `argv` the way [`Cli::parse`] does, except the command name (the
/// first argument after the program name) is matched case-insensitively
/// against [`COMMAND_NAMES`] before handing off to `clap` (spec §6: "Commands
/// (case-insensitive)"). Every other argument (file paths) is left untouched.
pub fn parse_case_insensitive<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString>,
{
    let mut args: Vec<std::ffi::OsString> = args.into_iter().map(Into::into).collect();
    if let Some(first) = args.get_mut(1) {
        if let Some(s) = first.to_str() {
            let lower = s.to_ascii_lowercase();
            if let Some(canonical) = COMMAND_NAMES.iter().find(|c| c.replace('-', "") == lower.replace('-', "")) {
                *first = (*canonical).into();
            }
        }
    }
    Cli::try_parse_from(args)
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the triplet distance between two Newick trees.
    CalcTripDist {
        /// Path to the first tree (T1).
        file1: String,
        /// Path to the second tree (T2).
        file2: String,
    },
    /// Print the quartet distance between two Newick trees.
    CalcQuartDist {
        /// Path to the first tree (T1).
        file1: String,
        /// Path to the second tree (T2).
        file2: String,
    },
    /// Print a parsed tree's unrooted adjacency as Graphviz DOT.
    PrintTree {
        /// Path to the tree to parse.
        file: String,
    },
    /// Print a parsed tree's rooted projection as Graphviz DOT.
    PrintRootedTree {
        /// Path to the tree to parse.
        file: String,
    },
    /// Print the HDT built over a parsed tree's rooted projection as
    /// Graphviz DOT.
    PrintHDT {
        /// Path to the tree to parse.
        file: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_command_regardless_of_case() {
        let cli = parse_case_insensitive(["hdtdist", "calcTripDist", "a.nwk", "b.nwk"]).unwrap();
        assert!(matches!(cli.command, Command::CalcTripDist { .. }));

        let cli = parse_case_insensitive(["hdtdist", "CALCQUARTDIST", "a.nwk", "b.nwk"]).unwrap();
        assert!(matches!(cli.command, Command::CalcQuartDist { .. }));

        let cli = parse_case_insensitive(["hdtdist", "PrintHDT", "a.nwk"]).unwrap();
        assert!(matches!(cli.command, Command::PrintHDT { .. }));
    }

    #[test]
    fn rejects_unrecognised_command() {
        assert!(parse_case_insensitive(["hdtdist", "frobnicate", "a.nwk"]).is_err());
    }
}
