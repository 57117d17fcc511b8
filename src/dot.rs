//! Graphviz DOT pretty-printer (component F).
//!
//! Grounded in the teacher's `termcolor`-based colour policy
//! (`src/expr/pretty.rs`'s `ColorWriter`/`StandardStream` pattern), but
//! without `pretty::RcDoc`: DOT is a flat statement list with no
//! line-wrapping concerns, so there is no layout problem for a doc-layout
//! algebra to solve. Every renderer below writes directly to any
//! `termcolor::WriteColor + std::io::Write` sink; [`termcolor::NoColor`]
//! gives the same code path a plain-text target for `print_*` -> `String`.

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

use crate::config::DistanceMode;
use crate::hdt::{Hdt, HdtNodeKind};
use crate::session::LeafInterner;
use crate::tree::{RootedTree, UnrootedTree};

fn style_keyword() -> ColorSpec {
    let mut s = ColorSpec::new();
    s.set_fg(Some(Color::Cyan)).set_bold(true);
    s
}

fn style_brace() -> ColorSpec {
    let mut s = ColorSpec::new();
    s.set_dimmed(true);
    s
}

fn style_label() -> ColorSpec {
    let mut s = ColorSpec::new();
    s.set_fg(Some(Color::Green)).set_bold(true);
    s
}

fn styled<W: WriteColor + Write>(out: &mut W, spec: &ColorSpec, text: &str) -> io::Result<()> {
    out.set_color(spec)?;
    write!(out, "{text}")?;
    out.reset()
}

fn leaf_label(interner: &LeafInterner, leaf: crate::tree::LeafId) -> String {
    interner.label(leaf).map(str::to_string).unwrap_or_else(|| format!("#{}", leaf.0))
}

/// Writes `tree` as an undirected `graph { ... }` — one statement per edge,
/// leaves labelled by their interned name.
fn write_tree<W: WriteColor + Write>(
    out: &mut W,
    tree: &UnrootedTree,
    interner: &LeafInterner,
) -> io::Result<()> {
    styled(out, &style_keyword(), "graph")?;
    write!(out, " ")?;
    styled(out, &style_brace(), "{")?;
    writeln!(out)?;

    for (id, node) in tree.nodes.iter() {
        if let Some(leaf) = node.leaf {
            writeln!(out, "  n{} [label=\"{}\"];", id.index(), leaf_label(interner, leaf))?;
        } else {
            writeln!(out, "  n{} [label=\"\", shape=point];", id.index())?;
        }
    }
    for (id, node) in tree.nodes.iter() {
        for &nb in &node.neighbors {
            // Undirected: emit each edge once, from the lower index.
            if id.index() < nb.index() {
                writeln!(out, "  n{} -- n{};", id.index(), nb.index())?;
            }
        }
    }

    styled(out, &style_brace(), "}")?;
    writeln!(out)
}

/// Writes `tree` as a directed `digraph { ... }` — parent -> child edges,
/// leaves labelled, internal nodes annotated with their `n`/colour.
fn write_rooted_tree<W: WriteColor + Write>(
    out: &mut W,
    tree: &RootedTree,
    interner: &LeafInterner,
) -> io::Result<()> {
    styled(out, &style_keyword(), "digraph")?;
    write!(out, " ")?;
    styled(out, &style_brace(), "{")?;
    writeln!(out)?;

    for (id, node) in tree.nodes.iter() {
        if let Some(leaf) = node.leaf {
            write!(out, "  n{} [label=\"", id.index())?;
            styled(out, &style_label(), &leaf_label(interner, leaf))?;
            writeln!(out, "\"];")?;
        } else {
            writeln!(
                out,
                "  n{} [label=\"n={},c={}\", shape=ellipse];",
                id.index(),
                node.n,
                node.colour
            )?;
        }
    }
    for (id, node) in tree.nodes.iter() {
        for &child in &node.children {
            writeln!(out, "  n{} -> n{};", id.index(), child.index())?;
        }
    }

    styled(out, &style_brace(), "}")?;
    writeln!(out)
}

/// Writes `hdt` as a directed `digraph { ... }`. Composition-type node
/// shapes: `L` = box, `C`/`I`/`G` = ellipse annotated with the letter.
fn write_hdt<W: WriteColor + Write, M: DistanceMode>(
    out: &mut W,
    hdt: &Hdt<M>,
    interner: &LeafInterner,
) -> io::Result<()> {
    styled(out, &style_keyword(), "digraph")?;
    write!(out, " ")?;
    styled(out, &style_brace(), "{")?;
    writeln!(out)?;

    for id in hdt.nodes.ids() {
        let node = hdt.nodes.get(id);
        match &node.kind {
            HdtNodeKind::Leaf(leaf) => {
                write!(out, "  h{} [shape=box, label=\"", id.index())?;
                styled(out, &style_label(), &leaf_label(interner, *leaf))?;
                writeln!(out, "\"];")?;
            }
            HdtNodeKind::Series(_) => {
                writeln!(out, "  h{} [shape=ellipse, label=\"C\"];", id.index())?;
            }
            HdtNodeKind::Parallel(_, _) => {
                writeln!(out, "  h{} [shape=ellipse, label=\"I\"];", id.index())?;
            }
            HdtNodeKind::General(_) => {
                writeln!(out, "  h{} [shape=ellipse, label=\"G\"];", id.index())?;
            }
        }
    }
    for id in hdt.nodes.ids() {
        let node = hdt.nodes.get(id);
        let children: Vec<_> = match &node.kind {
            HdtNodeKind::Leaf(_) => Vec::new(),
            HdtNodeKind::Series(c) => vec![*c],
            HdtNodeKind::Parallel(l, r) => vec![*l, *r],
            HdtNodeKind::General(kids) => kids.to_vec(),
        };
        for child in children {
            writeln!(out, "  h{} -> h{};", id.index(), child.index())?;
        }
    }

    styled(out, &style_brace(), "}")?;
    writeln!(out)
}

fn render_plain(f: impl FnOnce(&mut NoColor<Vec<u8>>) -> io::Result<()>) -> String {
    let mut buf = NoColor::new(Vec::new());
    f(&mut buf).expect("writing DOT text to an in-memory buffer cannot fail");
    String::from_utf8(buf.into_inner()).expect("DOT output is always valid UTF-8")
}

/// Renders `tree` as plain-text DOT (the `printTree` CLI command's payload).
pub fn print_tree(tree: &UnrootedTree, interner: &LeafInterner) -> String {
    render_plain(|buf| write_tree(buf, tree, interner))
}

/// Renders `tree` as plain-text DOT (the `printRootedTree` CLI command's
/// payload).
pub fn print_rooted_tree(tree: &RootedTree, interner: &LeafInterner) -> String {
    render_plain(|buf| write_rooted_tree(buf, tree, interner))
}

/// Renders `hdt` as plain-text DOT (the `printHDT` CLI command's payload).
pub fn print_hdt<M: DistanceMode>(hdt: &Hdt<M>, interner: &LeafInterner) -> String {
    render_plain(|buf| write_hdt(buf, hdt, interner))
}

/// Writes `tree` to stdout, coloured when stdout is a terminal
/// (`ColorChoice::Auto`, matching `src/expr/pretty.rs`'s terminal-detection
/// policy) and plain otherwise.
pub fn print_tree_to_stdout(tree: &UnrootedTree, interner: &LeafInterner) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_tree(&mut stdout, tree, interner)
}

pub fn print_rooted_tree_to_stdout(tree: &RootedTree, interner: &LeafInterner) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_rooted_tree(&mut stdout, tree, interner)
}

pub fn print_hdt_to_stdout<M: DistanceMode>(hdt: &Hdt<M>, interner: &LeafInterner) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_hdt(&mut stdout, hdt, interner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick;

    #[test]
    fn prints_rooted_tree_as_digraph() {
        let mut interner = LeafInterner::new();
        let unrooted = newick::parse("t.nwk", "(A,(B,C));", &mut interner).unwrap();
        let rooted = unrooted.root();
        let dot = print_rooted_tree(&rooted, &interner);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("->"));
    }

    #[test]
    fn prints_unrooted_tree_as_graph() {
        let mut interner = LeafInterner::new();
        let unrooted = newick::parse("t.nwk", "(A,(B,C));", &mut interner).unwrap();
        let dot = print_tree(&unrooted, &interner);
        assert!(dot.starts_with("graph {"));
        assert!(dot.contains("--"));
    }
}
