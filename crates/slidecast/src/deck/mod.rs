pub mod markup;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Deck {
    pub slides: Vec<Slide>,
    /// Directory the deck was loaded from; asset paths resolve against it.
    pub base_path: PathBuf,
}

/// One slide record as it appears in the data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    /// Body text, HTML-flavoured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gif: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The `media` field: a filename, a (possibly nested) list of filenames, or
/// something else that renders as nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Media {
    File(String),
    List(Vec<Media>),
    Other(serde_json::Value),
}

impl Media {
    /// All filenames in document order, nested lists flattened.
    pub fn files(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Media::File(name) => out.push(name),
            Media::List(items) => {
                for item in items {
                    item.collect_files(out);
                }
            }
            Media::Other(_) => {}
        }
    }
}

impl Slide {
    pub fn points(&self) -> &[String] {
        self.points.as_deref().unwrap_or_default()
    }

    pub fn media_files(&self) -> Vec<&str> {
        self.media.as_ref().map(Media::files).unwrap_or_default()
    }

    /// Title as plain text, markup removed.
    pub fn plain_title(&self) -> String {
        inlines_to_text(&markup::parse(&self.title))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    LineBreak,
}

/// Extract plain text from inline elements.
pub fn inlines_to_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(s) => text.push_str(s),
            Inline::Bold(children) | Inline::Italic(children) => {
                text.push_str(&inlines_to_text(children));
            }
            Inline::LineBreak => text.push('\n'),
        }
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml" | "yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

/// Parse a JSON slide list. Records that fail to decode are skipped.
pub fn parse_json(content: &str) -> Result<Vec<Slide>> {
    let value: serde_json::Value =
        serde_json::from_str(content).context("Slide data is not valid JSON")?;
    let records = match value {
        serde_json::Value::Array(records) => records,
        serde_json::Value::Object(mut map) => match map.remove("slides") {
            Some(serde_json::Value::Array(records)) => records,
            _ => bail!("Expected a list of slides"),
        },
        _ => bail!("Expected a list of slides"),
    };
    Ok(decode_records(records))
}

/// Parse a YAML slide list. Same leniency as [`parse_json`].
pub fn parse_yaml(content: &str) -> Result<Vec<Slide>> {
    let value: serde_json::Value =
        serde_yaml::from_str(content).context("Slide data is not valid YAML")?;
    let json = serde_json::to_string(&value)?;
    parse_json(&json)
}

fn decode_records(records: Vec<serde_json::Value>) -> Vec<Slide> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<Slide>(record) {
            Ok(slide) => Some(slide),
            Err(e) => {
                tracing::warn!("Skipping slide record {}: {e}", i + 1);
                None
            }
        })
        .collect()
}

pub fn parse(content: &str, format: Format) -> Result<Vec<Slide>> {
    match format {
        Format::Json => parse_json(content),
        Format::Yaml => parse_yaml(content),
    }
}

/// Read and parse a deck file. An empty deck is an error.
pub fn load(path: &Path) -> Result<Deck> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let slides = parse(&content, Format::from_path(path))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if slides.is_empty() {
        bail!("No slides found in {}", path.display());
    }
    let base_path = path
        .parent()
        .unwrap_or(Path::new("."))
        .to_path_buf();
    tracing::debug!("Loaded {} slides from {}", slides.len(), path.display());
    Ok(Deck { slides, base_path })
}
