//! Conversion of the HTML-flavoured text found in slide records into inline
//! runs. Only emphasis and line structure survive; every other tag is dropped
//! and its text kept, and `<script>`/`<style>` bodies are discarded whole.

use std::sync::LazyLock;

use regex::Regex;

use super::Inline;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/?)\s*([A-Za-z][A-Za-z0-9]*)\b[^>]*>").expect("tag pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9A-Fa-f]+|[A-Za-z]+);").expect("entity pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameKind {
    Root,
    Bold,
    Italic,
    Skip,
}

struct Frame {
    kind: FrameKind,
    tag: String,
    children: Vec<Inline>,
}

impl Frame {
    fn new(kind: FrameKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            children: Vec::new(),
        }
    }
}

struct Builder {
    stack: Vec<Frame>,
}

impl Builder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::new(FrameKind::Root, "")],
        }
    }

    fn skipping(&self) -> bool {
        self.stack.iter().any(|f| f.kind == FrameKind::Skip)
    }

    fn top(&mut self) -> &mut Vec<Inline> {
        let last = self.stack.len() - 1;
        &mut self.stack[last].children
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() || self.skipping() {
            return;
        }
        let decoded = decode_entities(raw);
        let collapsed = collapse_whitespace(&decoded);
        if collapsed.is_empty() {
            return;
        }
        let children = self.top();
        if let Some(Inline::Text(prev)) = children.last_mut() {
            prev.push_str(&collapsed);
        } else {
            children.push(Inline::Text(collapsed));
        }
    }

    fn line_break(&mut self) {
        if self.skipping() {
            return;
        }
        let children = self.top();
        if !children.is_empty() && !matches!(children.last(), Some(Inline::LineBreak)) {
            children.push(Inline::LineBreak);
        }
    }

    fn open(&mut self, kind: FrameKind, tag: &str) {
        self.stack.push(Frame::new(kind, tag));
    }

    fn close(&mut self, tag: &str) {
        // Unmatched closing tags are ignored.
        let Some(pos) = self.stack.iter().rposition(|f| f.tag == tag) else {
            return;
        };
        if pos == 0 {
            return;
        }
        while self.stack.len() > pos {
            self.pop();
        }
    }

    fn pop(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let wrapped = match frame.kind {
            FrameKind::Bold if !frame.children.is_empty() => Some(Inline::Bold(frame.children)),
            FrameKind::Italic if !frame.children.is_empty() => {
                Some(Inline::Italic(frame.children))
            }
            _ => None,
        };
        if let Some(inline) = wrapped {
            self.top().push(inline);
        }
    }

    fn finish(mut self) -> Vec<Inline> {
        while self.stack.len() > 1 {
            self.pop();
        }
        let mut inlines = self.stack.pop().map(|f| f.children).unwrap_or_default();
        while matches!(inlines.last(), Some(Inline::LineBreak)) {
            inlines.pop();
        }
        trim_edges(&mut inlines);
        inlines
    }
}

/// Parse slide text into inline runs.
pub fn parse(content: &str) -> Vec<Inline> {
    let mut builder = Builder::new();
    let mut last = 0;

    for caps in TAG.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        builder.text(&content[last..whole.start()]);
        last = whole.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        match (name.as_str(), closing) {
            ("br", _) => builder.line_break(),
            ("p" | "div" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4", _) => {
                builder.line_break()
            }
            ("b" | "strong", false) => builder.open(FrameKind::Bold, &name),
            ("i" | "em", false) => builder.open(FrameKind::Italic, &name),
            ("script" | "style", false) => builder.open(FrameKind::Skip, &name),
            ("b" | "strong" | "i" | "em" | "script" | "style", true) => builder.close(&name),
            _ => {}
        }
    }
    builder.text(&content[last..]);
    builder.finish()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{00a0}'),
                    "mdash" => Some('\u{2014}'),
                    "ndash" => Some('\u{2013}'),
                    "hellip" => Some('\u{2026}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        // Non-breaking spaces survive collapsing.
        if c.is_whitespace() && c != '\u{00a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn trim_edges(inlines: &mut Vec<Inline>) {
    if let Some(first) = inlines.first_mut() {
        trim_inline(first, true);
    }
    if let Some(last) = inlines.last_mut() {
        trim_inline(last, false);
    }
    inlines.retain(|i| !matches!(i, Inline::Text(s) if s.is_empty()));
}

fn trim_inline(inline: &mut Inline, start: bool) {
    match inline {
        Inline::Text(s) => {
            *s = if start {
                s.trim_start().to_string()
            } else {
                s.trim_end().to_string()
            };
        }
        Inline::Bold(children) | Inline::Italic(children) => {
            let child = if start {
                children.first_mut()
            } else {
                children.last_mut()
            };
            if let Some(child) = child {
                trim_inline(child, start);
            }
        }
        Inline::LineBreak => {}
    }
}
