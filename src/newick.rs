//! Newick parser & tree builder (component E).
//!
//! Two stages, mirroring the teacher's `src/parser.rs`: a `chumsky` lexer
//! stage tokenises the input, then a `chumsky` grammar stage (built with
//! `recursive`/`delimited_by`/`recover_with`, the same combinators
//! `parser.rs`'s `ast_parser` uses for its own nested-delimiter grammar) folds
//! the token stream into an owned [`Ast`], which a separate pass lowers into
//! an [`UnrootedTree`] — branch lengths are tokenised but never carried into
//! the `Ast`, since they carry no algorithmic meaning for triplet/quartet
//! distance.

use chumsky::input::ValueInput;
use chumsky::prelude::*;

use crate::session::LeafInterner;
use crate::tree::{UnrootedNode, UnrootedNodeId, UnrootedTree};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    Semicolon,
    Label(String),
    BranchLength(f64),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Label(s) => write!(f, "{s}"),
            Token::BranchLength(v) => write!(f, "{v}"),
        }
    }
}

fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<Token>, extra::Err<Rich<'a, char>>> {
    let punct = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just(';').to(Token::Semicolon),
    ));

    let branch_length = just(':').ignore_then(
        any()
            .filter(|c: &char| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+' || *c == 'e' || *c == 'E')
            .repeated()
            .at_least(1)
            .to_slice()
            .try_map(|s: &str, span| {
                s.parse::<f64>()
                    .map(Token::BranchLength)
                    .map_err(|e| Rich::custom(span, format!("invalid branch length '{s}': {e}")))
            }),
    );

    let quoted_label = just('\'')
        .ignore_then(any().filter(|c: &char| *c != '\'').repeated().to_slice())
        .then_ignore(just('\''))
        .map(|s: &str| Token::Label(s.to_string()));

    let bare_label = any()
        .filter(|c: &char| !"(),:;".contains(*c) && !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|s: &str| Token::Label(s.replace('_', " ")));

    let token = choice((punct, branch_length, quoted_label, bare_label));

    token.padded().repeated().collect().then_ignore(end())
}

/// Owned parse tree for one `subtree` production — the grammar stage's
/// output, before leaf interning and arena allocation lower it into an
/// [`UnrootedTree`] (mirroring the teacher's `Ast` / `encode_into_tree`
/// split: parse to a plain value first, build the real structure after).
#[derive(Debug)]
enum Ast {
    Leaf(String),
    Internal(Vec<Ast>),
}

/// Grammar stage: a `recursive` `chumsky` parser over the already-lexed
/// token stream. A subtree is either a parenthesised, comma-separated list
/// of child subtrees (optionally followed by an internal label, itself
/// discarded — only leaves are interned) or a bare leaf label; either form
/// may carry a trailing branch length, also discarded. Mismatched
/// parentheses recover via `nested_delimiters`, the same pattern
/// `parser.rs`'s `paren_expr`/`call`/`powerset` productions use for their own
/// parenthesised groups.
fn subtree_parser<'tokens, I>() -> impl Parser<'tokens, I, Ast, extra::Err<Rich<'tokens, Token>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let label = select! { Token::Label(s) => s };
    let branch_length = select! { Token::BranchLength(v) => v };

    recursive(|subtree| {
        let leaf = label.clone().map(Ast::Leaf);

        let internal = subtree
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .recover_with(via_parser(nested_delimiters(
                Token::LParen,
                Token::RParen,
                [],
                |_| Vec::new(),
            )))
            .then_ignore(label.clone().ignored().or_not())
            .map(Ast::Internal)
            .labelled("internal node");

        internal
            .or(leaf)
            .then_ignore(branch_length.ignored().or_not())
            .labelled("subtree")
    })
}

impl Ast {
    /// Lowers this `Ast` into `tree`, allocating arena nodes and interning
    /// leaf labels as it goes, and returns the id of the node it built.
    fn build(self, tree: &mut UnrootedTree, interner: &mut LeafInterner) -> UnrootedNodeId {
        match self {
            Ast::Leaf(label) => {
                let leaf_id = interner.intern(&label);
                let id = tree.nodes.alloc(UnrootedNode {
                    neighbors: Default::default(),
                    leaf: Some(leaf_id),
                });
                if tree.leaf_nodes.len() <= leaf_id.0 as usize {
                    tree.leaf_nodes
                        .resize(leaf_id.0 as usize + 1, crate::arena::Id::from_index(0));
                }
                tree.leaf_nodes[leaf_id.0 as usize] = id;
                id
            }
            Ast::Internal(children) => {
                let id = tree.nodes.alloc(UnrootedNode::default());
                for child in children {
                    let child_id = child.build(tree, interner);
                    tree.nodes.get_mut(id).neighbors.push(child_id);
                    tree.nodes.get_mut(child_id).neighbors.push(id);
                }
                id
            }
        }
    }
}

/// Parses `src` (Newick text, `file` used only for diagnostics) into an
/// [`UnrootedTree`], interning leaf labels into `interner`.
pub fn parse(
    file: &str,
    src: &str,
    interner: &mut LeafInterner,
) -> crate::error::DistResult<UnrootedTree> {
    let (tokens, lex_errs) = lexer().parse(src).into_output_errors();
    if !lex_errs.is_empty() {
        let message = lex_errs
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(crate::error::TreeError::Parse {
            file: file.to_string(),
            message,
        }
        .into());
    }
    let tokens = tokens.unwrap_or_default();

    let (ast, parse_errs) = subtree_parser()
        .then_ignore(just(Token::Semicolon))
        .then_ignore(end())
        .parse(tokens.as_slice())
        .into_output_errors();

    let Some(ast) = ast.filter(|_| parse_errs.is_empty()) else {
        let message = if parse_errs.is_empty() {
            "failed to parse tree".to_string()
        } else {
            parse_errs.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
        };
        return Err(crate::error::TreeError::Parse {
            file: file.to_string(),
            message,
        }
        .into());
    };

    let mut tree = UnrootedTree::new();
    let root = ast.build(&mut tree, interner);
    tree.newick_root = Some(root);
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_binary_tree() {
        let mut interner = LeafInterner::new();
        let tree = parse("t.nwk", "(A,(B,C));", &mut interner).unwrap();
        assert_eq!(interner.len(), 3);
        let rooted = tree.root();
        assert_eq!(rooted.num_leaves, 3);
    }

    #[test]
    fn parses_branch_lengths_and_discards_them() {
        let mut interner = LeafInterner::new();
        let tree = parse("t.nwk", "(A:0.1,(B:0.2,C:0.3):0.4);", &mut interner).unwrap();
        let rooted = tree.root();
        assert_eq!(rooted.num_leaves, 3);
    }

    #[test]
    fn parses_quoted_labels() {
        let mut interner = LeafInterner::new();
        let tree = parse("t.nwk", "('leaf one','leaf two');", &mut interner).unwrap();
        assert_eq!(interner.len(), 2);
        let _ = tree.root();
    }

    #[test]
    fn rejects_malformed_input() {
        let mut interner = LeafInterner::new();
        let err = parse("t.nwk", "(A,(B,C);", &mut interner);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_missing_semicolon() {
        let mut interner = LeafInterner::new();
        let err = parse("t.nwk", "(A,B)", &mut interner);
        assert!(err.is_err());
    }
}
