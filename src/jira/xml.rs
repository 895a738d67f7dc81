//! Navigation helpers over the source tracker's XML export documents.

use roxmltree::Node;
use std::collections::BTreeSet;

/// First child element with the given tag name.
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
}

/// All child elements with the given tag name.
pub fn children<'a, 'input, 'n>(
    node: Node<'a, 'input>,
    name: &'n str,
) -> impl Iterator<Item = Node<'a, 'input>> + use<'a, 'input, 'n> {
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name(name))
}

/// Trimmed text of the first child with the given tag name, if non-empty.
pub fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    let text = child(node, name)?.text()?.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// First child with the given tag name carrying `attr = value`.
pub fn child_with_attribute<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
    attr: &str,
    value: &str,
) -> Option<Node<'a, 'input>> {
    children(node, name).find(|n| n.attribute(attr) == Some(value))
}

/// Collect the text of every `name` child into a unique set.
pub fn collect_values(node: Node<'_, '_>, name: &str, into: &mut BTreeSet<String>) {
    for element in children(node, name) {
        if let Some(text) = element.text() {
            let text = text.trim();
            if !text.is_empty() {
                into.insert(text.to_string());
            }
        }
    }
}

/// Append the text of every `name` child to a sequence, each prefixed.
///
/// Sequences preserve order and duplicates; sets do not. Callers choose
/// statically which shape they are filling.
pub fn append_values(node: Node<'_, '_>, name: &str, into: &mut Vec<String>, prefix: &str) {
    for element in children(node, name) {
        if let Some(text) = element.text() {
            let text = text.trim();
            if !text.is_empty() {
                into.push(format!("{prefix}{text}"));
            }
        }
    }
}
