//! Markup codec for editable documents.
//!
//! The parser accepts the HTML subset a contentEditable surface produces and
//! never fails: unknown elements are kept as [`Tag::Other`], stray end tags
//! are dropped, and elements still open at the end of input are closed there.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};

use crate::document::tag::Tag;
use crate::document::tree::{Attribute, Element, NodeData, NodeId, Tree};

/// Byte cursor over the markup being parsed.
struct Scanner<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Scanner<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.rest().starts_with(pat)
    }

    fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    /// Consumes bytes while `pred` holds and returns them. Only ASCII
    /// predicates are used, so the result always ends on a char boundary.
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while self.peek().is_some_and(&pred) {
            self.i += 1;
        }
        &self.s[start..self.i]
    }

    /// Moves past the next occurrence of `pat`, or to the end of input.
    fn skip_past(&mut self, pat: &str) {
        match self.rest().find(pat) {
            Some(found) => self.bump_n(found + pat.len()),
            None => self.i = self.s.len(),
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Parses `input` and appends the resulting nodes to `root`.
pub(crate) fn parse_into(tree: &mut Tree, root: NodeId, input: &str) {
    let mut open: Vec<NodeId> = vec![root];
    let mut scanner = Scanner::new(input);

    while !scanner.eof() {
        let current = open.last().copied().unwrap_or(root);
        let rest = scanner.rest();

        let tag_start = rest.find('<').unwrap_or(rest.len());
        if tag_start > 0 {
            push_text(tree, current, &rest[..tag_start]);
            scanner.bump_n(tag_start);
            continue;
        }

        if scanner.starts_with("<!--") {
            scanner.skip_past("-->");
        } else if scanner.starts_with("<!") || scanner.starts_with("<?") {
            scanner.skip_past(">");
        } else if scanner.starts_with("</") {
            scanner.bump_n(2);
            let name = scanner.take_while(is_name_byte);
            scanner.skip_past(">");
            close_element(tree, &mut open, &Tag::from_name(name));
        } else if rest.as_bytes().get(1).is_some_and(u8::is_ascii_alphabetic) {
            scanner.bump_n(1);
            let (element, self_closing) = parse_start_tag(&mut scanner);
            let is_void = element.tag.is_void();
            let id = tree.new_element(element);
            tree.append_child(current, id);
            if !is_void && !self_closing {
                open.push(id);
            }
        } else {
            // A lone '<' is literal text
            push_text(tree, current, "<");
            scanner.bump_n(1);
        }
    }
}

fn parse_start_tag(scanner: &mut Scanner<'_>) -> (Element, bool) {
    let name = scanner.take_while(is_name_byte);
    let mut element = Element::new(Tag::from_name(name));
    let mut self_closing = false;

    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            None => break,
            Some(b'>') => {
                scanner.bump_n(1);
                break;
            }
            Some(b'/') => {
                scanner.bump_n(1);
                if scanner.peek() == Some(b'>') {
                    scanner.bump_n(1);
                    self_closing = true;
                    break;
                }
            }
            Some(_) => {
                let attr_name = scanner.take_while(|b| {
                    !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/'
                });
                if attr_name.is_empty() {
                    // Junk such as a stray quote; skip one byte and carry on
                    scanner.bump_n(1);
                    continue;
                }
                scanner.skip_whitespace();
                let value = if scanner.peek() == Some(b'=') {
                    scanner.bump_n(1);
                    scanner.skip_whitespace();
                    Some(parse_attr_value(scanner))
                } else {
                    None
                };
                element.attrs.push(Attribute {
                    name: attr_name.to_ascii_lowercase(),
                    value,
                });
            }
        }
    }

    (element, self_closing)
}

fn parse_attr_value(scanner: &mut Scanner<'_>) -> String {
    let raw = match scanner.peek() {
        Some(quote @ (b'"' | b'\'')) => {
            scanner.bump_n(1);
            let value = scanner.take_while(|b| b != quote);
            scanner.bump_n(1);
            value
        }
        _ => scanner.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
    };
    decode_html_entities(raw).into_owned()
}

fn push_text(tree: &mut Tree, parent: NodeId, raw: &str) {
    let text = decode_html_entities(raw);
    if text.is_empty() {
        return;
    }
    // Merge with a preceding text sibling so a literal '<' does not fragment
    // the run into several nodes.
    if let Some(&last) = tree.children(parent).last()
        && tree.append_text(last, &text)
    {
        return;
    }
    let id = tree.new_text(text.into_owned());
    tree.append_child(parent, id);
}

fn close_element(tree: &Tree, open: &mut Vec<NodeId>, tag: &Tag) {
    // Index 0 is the root and can never be closed by markup
    let matching = open
        .iter()
        .rposition(|id| tree.get(*id).and_then(|node| node.tag()) == Some(tag));
    if let Some(position) = matching
        && position > 0
    {
        open.truncate(position);
    }
}

/// Serializes the children of `root`.
pub(crate) fn serialize(tree: &Tree, root: NodeId) -> String {
    let mut out = String::new();
    for child in tree.children(root) {
        write_node(tree, *child, &mut out);
    }
    out
}

fn write_node(tree: &Tree, id: NodeId, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Text(text) => out.push_str(&encode_text(text)),
        NodeData::Element { element, children } => {
            out.push('<');
            out.push_str(element.tag.name());
            for attr in &element.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str("=\"");
                    out.push_str(&encode_double_quoted_attribute(value));
                    out.push('"');
                }
            }
            out.push('>');
            if element.tag.is_void() {
                return;
            }
            for child in children {
                write_node(tree, *child, out);
            }
            out.push_str("</");
            out.push_str(element.tag.name());
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn round_trip(input: &str) -> String {
        let mut tree = Tree::new();
        let root = tree.new_element(Element::new(Tag::Root));
        parse_into(&mut tree, root, input);
        serialize(&tree, root)
    }

    fn parse(input: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.new_element(Element::new(Tag::Root));
        parse_into(&mut tree, root, input);
        (tree, root)
    }

    #[rstest]
    #[case("plain text")]
    #[case("<p>The <em>quick</em> fox</p>")]
    #[case("<h2>오늘의 메모</h2>\n<blockquote>\n  <p>quote<br>\n  line</p>\n</blockquote>")]
    #[case("<ul><li>one</li><li>two</li></ul>")]
    #[case("<a href=\"https://example.com/?a=1&amp;b=2\">link</a>")]
    #[case("a &lt; b &amp;&amp; c &gt; d")]
    fn test_canonical_markup_round_trips(#[case] input: &str) {
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_entities_decode_into_text_nodes() {
        let (tree, root) = parse("<p>fish &amp; chips</p>");
        assert_eq!(tree.text_content(root), "fish & chips");
    }

    #[test]
    fn test_comments_and_doctype_are_dropped() {
        assert_eq!(round_trip("<!DOCTYPE html><!-- note --><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_self_closing_and_void_elements() {
        assert_eq!(round_trip("a<br/>b<br>c"), "a<br>b<br>c");
        assert_eq!(round_trip("<img src=\"x.png\">"), "<img src=\"x.png\">");
    }

    #[test]
    fn test_unclosed_elements_close_at_end_of_input() {
        assert_eq!(round_trip("<p>open <strong>bold"), "<p>open <strong>bold</strong></p>");
    }

    #[test]
    fn test_stray_end_tags_are_ignored() {
        assert_eq!(round_trip("a</em>b</p>"), "ab");
    }

    #[test]
    fn test_end_tag_closes_intervening_elements() {
        assert_eq!(
            round_trip("<p>one <strong>two</p>three"),
            "<p>one <strong>two</strong></p>three"
        );
    }

    #[test]
    fn test_uppercase_tags_and_attribute_forms() {
        assert_eq!(
            round_trip("<P CLASS='lead' hidden data-x=1>x</P>"),
            "<p class=\"lead\" hidden data-x=\"1\">x</p>"
        );
    }

    #[test]
    fn test_literal_less_than_stays_one_text_node() {
        let (tree, root) = parse("1 < 2");
        assert_eq!(tree.children(root).len(), 1);
        assert_eq!(tree.text_content(root), "1 < 2");
    }
}
