//! Printer
//!
//! Printing writes each node's prefix, its text or children, then its suffix.
//! A tree that no visitor touched prints back exactly as it was parsed.
//!
//! Nodes created with [`Formatting::infer`] get their prefix decided here.
//! This is a best-effort heuristic and not part of any correctness contract;
//! visitors that need exact layout should set formatting explicitly.
//! For an inferred child of a branch, the first rule that applies wins:
//!
//! 1. a preceding sibling branch that starts a line lends its line break and
//!    indentation;
//! 2. a following sibling branch that starts a line lends the same;
//! 3. a following token that starts a line (typically a closing delimiter)
//!    lends its indentation plus one indent unit;
//! 4. the first child of a root gets no prefix;
//! 5. anything else gets a single space.
//!
//! When the chosen prefix starts a new line, every line break inside the
//! inferred subtree is shifted by the new indentation, so snippets parsed at
//! column zero land at the right depth.

use crate::formatting::{Formatting, shift_lines, unshift_lines};
use crate::tree::{Language, Node, NodeId};

const INDENT_UNIT: &str = "    ";

/// Render a tree to text
pub fn print<L: Language>(node: &Node<L>) -> String {
    let resolved = resolve_formatting(node);
    let mut out = String::new();
    write_node(&resolved, &mut out);
    out
}

/// Render a node without its own leading trivia, dedented to column zero
pub fn print_trimmed<L: Language>(node: &Node<L>) -> String {
    let resolved = resolve_formatting(node);
    let width = resolved.formatting().indent().map_or(0, str::len);
    let mut out = String::new();
    write_node(&resolved.with_prefix(""), &mut out);
    unshift_lines(out.trim_end(), width)
}

fn write_node<L: Language>(node: &Node<L>, out: &mut String) {
    out.push_str(node.prefix());
    match node.text() {
        Some(text) => out.push_str(text),
        None => {
            for child in node.children() {
                write_node(child, out);
            }
        }
    }
    out.push_str(node.suffix());
}

/// Column at which the content of node `id` starts, after its prefix
///
/// Columns count characters from the last line break. `None` when the node
/// is not part of the tree.
pub fn column_of<L: Language>(root: &Node<L>, id: NodeId) -> Option<usize> {
    fn advance(column: &mut usize, text: &str) {
        match text.rfind('\n') {
            Some(idx) => *column = text[idx + 1..].chars().count(),
            None => *column += text.chars().count(),
        }
    }

    fn walk<L: Language>(node: &Node<L>, id: NodeId, column: &mut usize) -> Option<usize> {
        advance(column, node.prefix());
        if node.id() == id {
            return Some(*column);
        }
        match node.text() {
            Some(text) => advance(column, text),
            None => {
                for child in node.children() {
                    if let Some(found) = walk(child, id, column) {
                        return Some(found);
                    }
                }
            }
        }
        advance(column, node.suffix());
        None
    }

    let mut column = 0;
    walk(&resolve_formatting(root), id, &mut column)
}

/// Replace every inferred formatting in the tree with a concrete one
///
/// Returns the input itself when nothing was inferred.
pub fn resolve_formatting<L: Language>(root: &Node<L>) -> Node<L> {
    let resolved = resolve_children(root);
    if resolved.formatting().is_inferred() {
        resolved.with_formatting(Formatting::new("").with_suffix(resolved.suffix()))
    } else {
        resolved
    }
}

fn resolve_children<L: Language>(node: &Node<L>) -> Node<L> {
    if node.is_token() {
        return node.clone();
    }
    let mut children: Vec<Node<L>> = node.children().iter().map(resolve_children).collect();
    let mut changed = children
        .iter()
        .zip(node.children())
        .any(|(a, b)| !Node::ptr_eq(a, b));

    for index in 0..children.len() {
        if !children[index].formatting().is_inferred() {
            continue;
        }
        let prefix = infer_prefix(&children, index);
        children[index] = apply_prefix(&children[index], &prefix);
        changed = true;
    }

    if !changed {
        return node.clone();
    }
    // inferring a prefix never changes kinds, so the grammar still holds
    node.with_children(children).unwrap_or_else(|_| node.clone())
}

fn line_start<L: Language>(node: &Node<L>) -> Option<&str> {
    if node.formatting().is_inferred() {
        return None;
    }
    node.formatting().indent()
}

fn infer_prefix<L: Language>(siblings: &[Node<L>], index: usize) -> String {
    let before = siblings[..index]
        .iter()
        .rev()
        .filter(|n| !n.is_token())
        .find_map(line_start);
    if let Some(indent) = before {
        return format!("\n{indent}");
    }
    let after = siblings[index + 1..]
        .iter()
        .filter(|n| !n.is_token())
        .find_map(line_start);
    if let Some(indent) = after {
        return format!("\n{indent}");
    }
    let closing = siblings[index + 1..]
        .iter()
        .filter(|n| n.is_token())
        .find_map(line_start);
    if let Some(indent) = closing {
        let unit = if indent.contains('\t') { "\t" } else { INDENT_UNIT };
        return format!("\n{indent}{unit}");
    }
    if index == 0 { String::new() } else { " ".to_string() }
}

fn apply_prefix<L: Language>(node: &Node<L>, prefix: &str) -> Node<L> {
    let formatting = Formatting::new(prefix).with_suffix(node.suffix());
    let node = node.with_formatting(formatting);
    match prefix.rfind('\n') {
        Some(idx) => shift_subtree(&node, &prefix[idx + 1..], true),
        None => node,
    }
}

fn shift_subtree<L: Language>(node: &Node<L>, indent: &str, is_top: bool) -> Node<L> {
    let mut shifted = node.clone();
    if !is_top && node.formatting().has_newline() {
        shifted = shifted.with_formatting(
            Formatting::new(shift_lines(node.prefix(), indent)).with_suffix(node.suffix()),
        );
    }
    if node.is_token() {
        return shifted;
    }
    let children = node
        .children()
        .iter()
        .enumerate()
        // the first child's prefix sits on the node's own line
        .map(|(i, c)| shift_subtree(c, indent, is_top && i == 0))
        .collect();
    shifted.with_children(children).unwrap_or(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::testing::{Kind, Sexp, parse};

    #[test]
    fn test_round_trip_is_exact() {
        for text in ["(a)", "  ( a\n\t(b  c) )\n\n", "(\n  a\n  (b)\n)"] {
            assert_eq!(print(&parse(text)), text);
        }
    }

    #[test]
    fn test_inferred_token_gets_single_space() {
        let tree = parse("(a b)");
        let mut children = tree.children().to_vec();
        children.insert(2, Node::token(Kind::Atom, Formatting::infer(), "x"));
        let out = tree.with_children(children).unwrap();
        assert_eq!(print(&out), "(a x b)");
    }

    #[test]
    fn test_inferred_branch_borrows_sibling_indent() {
        let tree = parse("(\n  (a)\n  (b)\n)");
        let snippet = parse("(c\n  d)");
        let snippet = snippet.with_formatting(Formatting::infer());
        let mut children = tree.children().to_vec();
        children.insert(2, snippet);
        let out = tree.with_children(children).unwrap();
        insta::assert_snapshot!(print(&out), @r"
        (
          (a)
          (c
            d)
          (b)
        )
        ");
    }

    #[test]
    fn test_inferred_branch_in_empty_list_indents_one_level() {
        let tree = parse("(x\n  (\n  ))");
        let inner = &tree.children()[2];
        let mut children = inner.children().to_vec();
        children.insert(1, parse("(a)").with_formatting(Formatting::infer()));
        let inner = inner.with_children(children).unwrap();
        let out = tree.with_child(2, inner).unwrap();
        assert_eq!(print(&out), "(x\n  (\n      (a)\n  ))");
    }

    #[test]
    fn test_column_of() {
        let tree = parse("(a\n   (b c))");
        let inner = &tree.children()[2];
        assert_eq!(column_of(&tree, tree.id()), Some(0));
        assert_eq!(column_of(&tree, inner.id()), Some(3));
        assert_eq!(column_of(&tree, inner.children()[2].id()), Some(6));
        assert_eq!(column_of(&tree, parse("(z)").id()), None);
    }

    #[test]
    fn test_print_trimmed() {
        let tree = parse("(\n    (a\n      b)\n)");
        let inner: &Node<Sexp> = &tree.children()[1];
        assert_eq!(print_trimmed(inner), "(a\n  b)");
    }
}
