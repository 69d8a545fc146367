//! HTML tokenization and tree construction into an `lc-dom` document.

use lc_dom::Document;
use lc_dom::NodeId;
use std::collections::VecDeque;

/// Parses raw HTML into a DOM document.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn parse(&self, input: &str) -> Document {
        let mut builder = TreeBuilder::new();
        let mut tokenizer = Tokenizer::new(input);
        while let Some(token) = tokenizer.next_token() {
            builder.push(token);
        }
        builder.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    idx: usize,
    pending: VecDeque<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            idx: 0,
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }

        while self.idx < self.bytes.len() {
            let idx = self.idx;
            if self.bytes[idx] != b'<' {
                let next = find_byte(self.bytes, idx.saturating_add(1), b'<')
                    .unwrap_or(self.bytes.len());
                self.idx = next;
                return Some(Token::Text(decode_entities(&self.input[idx..next])));
            }

            if starts_with(self.bytes, idx, b"<!--") {
                self.idx = skip_comment(self.bytes, idx);
                continue;
            }

            if starts_with(self.bytes, idx, b"<!") || starts_with(self.bytes, idx, b"<?") {
                self.idx = skip_to_gt(self.bytes, idx.saturating_add(2));
                continue;
            }

            if starts_with(self.bytes, idx, b"</") {
                if let Some((name, next)) = parse_end_tag(self.bytes, idx) {
                    self.idx = next;
                    return Some(Token::End { name });
                }
            } else if let Some((token, next)) = parse_start_tag(self.bytes, idx) {
                self.idx = next;
                if let Token::Start {
                    name,
                    self_closing: false,
                    ..
                } = &token
                    && is_raw_text_tag(name)
                {
                    self.queue_raw_text(name.clone());
                }
                return Some(token);
            }

            // A lone `<` that does not open a tag is plain text.
            let next =
                find_byte(self.bytes, idx.saturating_add(1), b'<').unwrap_or(self.bytes.len());
            self.idx = next;
            return Some(Token::Text(decode_entities(&self.input[idx..next])));
        }

        None
    }

    /// Consumes the raw body of `<script>`/`<style>` and queues it, followed
    /// by the matching end tag.
    fn queue_raw_text(&mut self, tag: String) {
        let (raw, after) = read_raw_text_until_end_tag(self.input, self.idx, &tag);
        self.idx = after;
        if !raw.is_empty() {
            self.pending.push_back(Token::Text(raw.to_owned()));
        }
        self.pending.push_back(Token::End { name: tag });
    }
}

struct TreeBuilder {
    doc: Document,
    stack: Vec<NodeId>,
    title: Option<String>,
}

impl TreeBuilder {
    fn new() -> Self {
        let doc = Document::new();
        let body = doc.body();
        Self {
            doc,
            stack: vec![body],
            title: None,
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.body())
    }

    fn push(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.push_text(text),
            Token::Start {
                name,
                attrs,
                self_closing,
            } => self.push_start(name, attrs, self_closing),
            Token::End { name } => self.push_end(&name),
        }
    }

    fn push_text(&mut self, text: String) {
        let parent = self.current();
        let preserve = matches!(
            self.doc.tag_name(parent),
            Some("pre" | "textarea" | "style" | "script" | "title")
        );
        if text.trim().is_empty() && !preserve {
            return;
        }

        if self.doc.tag_name(parent) == Some("title") && self.title.is_none() {
            let collapsed = collapse_whitespace(&text);
            if !collapsed.is_empty() {
                self.title = Some(collapsed);
            }
        }

        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
    }

    fn push_start(&mut self, name: String, attrs: Vec<(String, String)>, self_closing: bool) {
        match name.as_str() {
            "html" => {
                self.merge_attrs(self.doc.root(), attrs);
                return;
            }
            "head" => {
                let head = self.doc.head();
                self.merge_attrs(head, attrs);
                self.stack.truncate(1);
                self.stack.push(head);
                return;
            }
            "body" => {
                let body = self.doc.body();
                self.merge_attrs(body, attrs);
                self.stack.truncate(1);
                return;
            }
            _ => {}
        }

        let node = self.doc.create_element(&name);
        for (attr, value) in attrs {
            self.doc.set_attribute(node, &attr, value);
        }
        let parent = self.current();
        self.doc.append_child(parent, node);

        if !self_closing && !lc_dom::is_void(&name) {
            self.stack.push(node);
        }
    }

    fn push_end(&mut self, name: &str) {
        if matches!(name, "html" | "body") {
            return;
        }

        // The body sits at the bottom of the stack and is never popped.
        let open = self
            .stack
            .iter()
            .rposition(|id| self.doc.tag_name(*id) == Some(name))
            .filter(|position| *position > 0);
        if let Some(position) = open {
            self.stack.truncate(position);
        }
    }

    fn merge_attrs(&mut self, node: NodeId, attrs: Vec<(String, String)>) {
        for (attr, value) in attrs {
            if !self.doc.has_attribute(node, &attr) {
                self.doc.set_attribute(node, &attr, value);
            }
        }
    }

    fn finish(mut self) -> Document {
        self.doc.title = self.title.unwrap_or_default();
        self.doc
    }
}

fn parse_end_tag(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let mut idx = skip_spaces(bytes, start.saturating_add(2));
    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[name_start..idx]).to_ascii_lowercase();
    let end = find_byte(bytes, idx, b'>')?;
    Some((name, end.saturating_add(1)))
}

fn parse_start_tag(bytes: &[u8], start: usize) -> Option<(Token, usize)> {
    let mut idx = start.saturating_add(1);
    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }

    let name = String::from_utf8_lossy(&bytes[name_start..idx]).to_ascii_lowercase();
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                idx = idx.saturating_add(1);
                break;
            }
            Some(b'/') => {
                self_closing = true;
                idx = idx.saturating_add(1);
                continue;
            }
            Some(_) => {}
        }
        self_closing = false;

        let attr_start = idx;
        while idx < bytes.len() && is_attr_name_char(bytes[idx]) {
            idx = idx.saturating_add(1);
        }
        if idx == attr_start {
            // Garbage inside the tag: give up on attributes, keep the element.
            idx = skip_to_gt(bytes, idx);
            break;
        }

        let attr = String::from_utf8_lossy(&bytes[attr_start..idx]).to_ascii_lowercase();
        idx = skip_spaces(bytes, idx);

        let mut value = String::new();
        if bytes.get(idx).copied() == Some(b'=') {
            idx = skip_spaces(bytes, idx.saturating_add(1));
            let (raw, next) = read_attr_value(bytes, idx);
            value = decode_entities(&raw);
            idx = next;
        }

        if !attrs.iter().any(|(existing, _)| *existing == attr) {
            attrs.push((attr, value));
        }
    }

    Some((
        Token::Start {
            name,
            attrs,
            self_closing,
        },
        idx,
    ))
}

fn read_attr_value(bytes: &[u8], start: usize) -> (String, usize) {
    match bytes.get(start).copied() {
        Some(quote @ (b'"' | b'\'')) => {
            let value_start = start.saturating_add(1);
            let end = find_byte(bytes, value_start, quote).unwrap_or(bytes.len());
            let value = String::from_utf8_lossy(&bytes[value_start..end]).into_owned();
            (value, end.saturating_add(1).min(bytes.len()))
        }
        _ => {
            let mut end = start;
            while end < bytes.len() && !bytes[end].is_ascii_whitespace() && bytes[end] != b'>' {
                end = end.saturating_add(1);
            }
            (String::from_utf8_lossy(&bytes[start..end]).into_owned(), end)
        }
    }
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx.saturating_add(2), tag_bytes)
            && tag_name_boundary(bytes, idx.saturating_add(2 + tag_bytes.len()))
            && let Some((_, end_idx)) = parse_end_tag(bytes, idx)
        {
            return (&input[start..idx], end_idx);
        }

        idx = idx.saturating_add(1);
    }

    (&input[start..], bytes.len())
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp.saturating_add(1)..];
        let decoded = tail
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_entity(&tail[..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi.saturating_add(1)..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let numeric = entity.strip_prefix('#')?;
            let value = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => numeric.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    find_subslice(bytes, start.saturating_add(4), b"-->")
        .map(|end| end.saturating_add(3))
        .unwrap_or(bytes.len())
}

fn skip_to_gt(bytes: &[u8], idx: usize) -> usize {
    find_byte(bytes, idx, b'>')
        .map(|end| end.saturating_add(1))
        .unwrap_or(bytes.len())
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_attr_name_char(byte: u8) -> bool {
    !byte.is_ascii_whitespace() && !matches!(byte, b'>' | b'/' | b'=' | b'"' | b'\'')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end].eq_ignore_ascii_case(pattern)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}
