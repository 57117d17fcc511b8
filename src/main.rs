//! CLI entry point (component G). Parses arguments via [`clap`], routes
//! output through [`hdtdist::dot`], and converts errors to `termcolor`
//! stderr diagnostics with the exit codes documented in DESIGN.md (OQ-1):
//! parse failure -> nonzero exit, nothing on stdout; pairing failure ->
//! legacy `-1` on stdout, exit code 0; usage error -> `clap`'s own nonzero
//! exit.

mod cli;

use std::io::Write;
use std::sync::Mutex;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use hdtdist::config::ActiveMode;
use hdtdist::driver;
use hdtdist::session::Session;
use hdtdist::{dot, newick};

/// Minimal `log::Log` impl writing through the same `termcolor::StandardStream`
/// the diagnostics use, so a single colour policy governs both (SPEC_FULL.md
/// §4.H). Grounded in the teacher's `examples/parser.rs` success/error
/// reporting idiom, generalised from a one-shot `ColorSpec` to a persistent
/// logger.
struct TermLogger {
    stream: Mutex<StandardStream>,
}

impl log::Log for TermLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut spec = ColorSpec::new();
        match record.level() {
            log::Level::Error => {
                spec.set_fg(Some(Color::Red)).set_bold(true);
            }
            log::Level::Warn => {
                spec.set_fg(Some(Color::Yellow));
            }
            log::Level::Info => {
                spec.set_fg(Some(Color::Green));
            }
            log::Level::Debug | log::Level::Trace => {
                spec.set_dimmed(true);
            }
        }
        let mut stream = self.stream.lock().unwrap();
        let _ = stream.set_color(&spec);
        let _ = writeln!(stream, "[{}] {}", record.level(), record.args());
        let _ = stream.reset();
    }

    fn flush(&self) {
        let _ = self.stream.lock().unwrap().flush();
    }
}

fn install_logger() {
    let logger = Box::new(TermLogger {
        stream: Mutex::new(StandardStream::stderr(ColorChoice::Auto)),
    });
    log::set_max_level(log::LevelFilter::Trace);
    let _ = log::set_boxed_logger(logger);
}

fn error_spec() -> ColorSpec {
    let mut s = ColorSpec::new();
    s.set_fg(Some(Color::Red)).set_bold(true);
    s
}

fn print_diagnostic(message: &str) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    let _ = stderr.set_color(&error_spec());
    let _ = writeln!(stderr, "error: {message}");
    let _ = stderr.reset();
}

fn read_file(path: &str) -> Result<String, hdtdist::error::DistanceError> {
    std::fs::read_to_string(path)
        .map_err(|source| {
            hdtdist::error::TreeError::Io {
                file: path.to_string(),
                source,
            }
            .into()
        })
}

fn load_session(file1: &str, file2: &str) -> Result<Session, hdtdist::error::DistanceError> {
    let src1 = read_file(file1)?;
    let src2 = read_file(file2)?;
    Session::load(file1, &src1, file2, &src2)
}

fn run() -> i32 {
    let cli = match cli::parse_case_insensitive(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    match cli.command {
        cli::Command::CalcTripDist { file1, file2 } => {
            let session = match load_session(&file1, &file2) {
                Ok(s) => s,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            if session.check_leaf_sets_match().is_err() {
                println!("-1");
                return 0;
            }
            let total = session.total_leaves();
            let distance = driver::calculate_triplet_distance::<ActiveMode>(session.t1, session.t2, total);
            println!("{distance}");
            0
        }

        cli::Command::CalcQuartDist { file1, file2 } => {
            if !ActiveMode::QUARTETS {
                print_diagnostic("this build was compiled without the `quartet` feature; calcQuartDist is unavailable");
                return 1;
            }
            let session = match load_session(&file1, &file2) {
                Ok(s) => s,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            if session.check_leaf_sets_match().is_err() {
                println!("-1");
                return 0;
            }
            let total = session.total_leaves();
            // Smallest max_degree drives the colour domain (see
            // `driver::calculate_quartet_distance`'s `max_colour`), so pass
            // it first — `original_source/src/main.cpp` makes the same swap
            // ahead of `calculateQuartetDistance`.
            let Session { t1, t2, .. } = session;
            let distance = if t1.max_degree <= t2.max_degree {
                driver::calculate_quartet_distance::<ActiveMode>(t1, t2, total)
            } else {
                driver::calculate_quartet_distance::<ActiveMode>(t2, t1, total)
            };
            println!("{distance}");
            0
        }

        cli::Command::PrintTree { file } => {
            let src = match read_file(&file) {
                Ok(s) => s,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            let mut interner = hdtdist::session::LeafInterner::new();
            let tree = match newick::parse(&file, &src, &mut interner) {
                Ok(t) => t,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            let _ = dot::print_tree_to_stdout(&tree, &interner);
            0
        }

        cli::Command::PrintRootedTree { file } => {
            let src = match read_file(&file) {
                Ok(s) => s,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            let mut interner = hdtdist::session::LeafInterner::new();
            let tree = match newick::parse(&file, &src, &mut interner) {
                Ok(t) => t,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            let rooted = tree.root();
            let _ = dot::print_rooted_tree_to_stdout(&rooted, &interner);
            0
        }

        cli::Command::PrintHDT { file } => {
            let src = match read_file(&file) {
                Ok(s) => s,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            let mut interner = hdtdist::session::LeafInterner::new();
            let tree = match newick::parse(&file, &src, &mut interner) {
                Ok(t) => t,
                Err(e) => {
                    print_diagnostic(&e.to_string());
                    return 1;
                }
            };
            let rooted = tree.root();
            // OQ-3: `max_degree = 0` is passed deliberately — counters are
            // never read on this path, only the decomposition shape.
            let hdt = hdtdist::hdt::construct::<ActiveMode>(&rooted, 0);
            let _ = dot::print_hdt_to_stdout(&hdt, &interner);
            0
        }
    }
}

fn main() {
    install_logger();
    std::process::exit(run());
}
