//! Typed view trees for slides and thumbnails.
//!
//! Every slide is turned into a [`SlideView`] once, when the deck is loaded.
//! Elements that take part in the entrance animation carry a stagger slot,
//! numbered in document order across the content block and the image block.

use std::path::{Path, PathBuf};

use crate::color::{self, Contrast, Gradient};
use crate::deck::{Inline, Slide, markup};

pub const DEFAULT_ASSET_DIR: &str = "images";
pub const DEFAULT_PLACEHOLDER: &str = "placeholder.jpg";
const THUMBNAIL_TITLE_CHARS: usize = 15;

/// Resolves asset filenames from slide records to paths on disk.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    dir: PathBuf,
    placeholder: String,
}

impl AssetResolver {
    pub fn new(base_path: &Path, asset_dir: &str, placeholder: &str) -> Self {
        Self {
            dir: base_path.join(asset_dir),
            placeholder: placeholder.to_string(),
        }
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn placeholder(&self) -> PathBuf {
        self.dir.join(&self.placeholder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Dispatch a media filename by extension. Unknown extensions yield `None`.
    pub fn classify(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "mp4" | "webm" => Some(MediaKind::Video),
            "gif" | "jpg" | "jpeg" | "png" | "svg" => Some(MediaKind::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Title,
    Subtitle,
    Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text {
        role: TextRole,
        inlines: Vec<Inline>,
    },
    Image {
        src: PathBuf,
        alt: String,
        /// Shown when `src` cannot be loaded.
        fallback: Option<PathBuf>,
    },
    Video {
        src: PathBuf,
    },
    Point {
        inlines: Vec<Inline>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub node: Node,
    /// Position in the slide's reveal order; `None` means always visible.
    pub stagger: Option<usize>,
    /// Media elements get a short emphasis pulse when revealed.
    pub media: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlideView {
    pub index: usize,
    pub background: Gradient,
    pub contrast: Contrast,
    pub content: Vec<Element>,
    pub image: Option<Element>,
}

impl SlideView {
    /// All elements in document order: content block first, then the image.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.content.iter().chain(self.image.iter())
    }

    pub fn stagger_count(&self) -> usize {
        self.elements().filter(|e| e.stagger.is_some()).count()
    }

    /// Whether the element in stagger slot `slot` is a media element.
    pub fn is_media_slot(&self, slot: usize) -> bool {
        self.elements()
            .any(|e| e.stagger == Some(slot) && e.media)
    }

    pub fn hero_image(&self) -> Option<&Path> {
        match self.image.as_ref().map(|e| &e.node) {
            Some(Node::Image { src, .. }) => Some(src),
            _ => None,
        }
    }
}

/// Builds a [`SlideView`], assigning stagger slots as elements are pushed.
pub struct SlideViewBuilder {
    view: SlideView,
    next_slot: usize,
}

impl SlideViewBuilder {
    pub fn new(index: usize) -> Self {
        let base = color::palette_hex(index);
        Self {
            view: SlideView {
                index,
                background: color::slide_background(index),
                contrast: Contrast::for_background(base),
                content: Vec::new(),
                image: None,
            },
            next_slot: 0,
        }
    }

    fn element(&mut self, node: Node, staggered: bool, media: bool) -> Element {
        let stagger = staggered.then(|| {
            let slot = self.next_slot;
            self.next_slot += 1;
            slot
        });
        Element {
            node,
            stagger,
            media,
        }
    }

    pub fn text(mut self, role: TextRole, source: &str) -> Self {
        let el = self.element(
            Node::Text {
                role,
                inlines: markup::parse(source),
            },
            true,
            false,
        );
        self.view.content.push(el);
        self
    }

    /// A media element. `staggered` media also pulses on reveal.
    pub fn media(mut self, kind: MediaKind, src: PathBuf, alt: String, staggered: bool) -> Self {
        let node = match kind {
            MediaKind::Video => Node::Video { src },
            MediaKind::Image => Node::Image {
                src,
                alt,
                fallback: None,
            },
        };
        let el = self.element(node, staggered, staggered);
        self.view.content.push(el);
        self
    }

    pub fn point(mut self, source: &str) -> Self {
        let el = self.element(
            Node::Point {
                inlines: markup::parse(source),
            },
            true,
            false,
        );
        self.view.content.push(el);
        self
    }

    pub fn hero_image(mut self, src: PathBuf, alt: String, fallback: PathBuf) -> Self {
        let el = self.element(
            Node::Image {
                src,
                alt,
                fallback: Some(fallback),
            },
            true,
            false,
        );
        self.view.image = Some(el);
        self
    }

    pub fn build(self) -> SlideView {
        self.view
    }
}

/// Build the view for one slide record.
pub fn build_slide(index: usize, slide: &Slide, assets: &AssetResolver) -> SlideView {
    let title = slide.plain_title();
    let mut builder = SlideViewBuilder::new(index).text(TextRole::Title, &slide.title);

    if let Some(subtitle) = slide.subtitle.as_deref().filter(|s| !s.is_empty()) {
        builder = builder.text(TextRole::Subtitle, subtitle);
    }
    builder = builder.text(TextRole::Body, slide.content.as_deref().unwrap_or_default());

    if let Some(video) = slide.video.as_deref().filter(|s| !s.is_empty()) {
        builder = builder.media(MediaKind::Video, assets.resolve(video), String::new(), true);
    }
    if let Some(gif) = slide.gif.as_deref().filter(|s| !s.is_empty()) {
        builder = builder.media(
            MediaKind::Image,
            assets.resolve(gif),
            format!("GIF for {title}"),
            true,
        );
    }
    for name in slide.media_files() {
        match MediaKind::classify(name) {
            Some(kind) => {
                let alt = if name.to_ascii_lowercase().ends_with(".gif") {
                    "GIF"
                } else {
                    "Media"
                };
                builder = builder.media(kind, assets.resolve(name), alt.to_string(), false);
            }
            None => tracing::debug!("Slide {}: ignoring unsupported media {name}", index + 1),
        }
    }
    for point in slide.points() {
        builder = builder.point(point);
    }
    if let Some(image) = slide.image.as_deref().filter(|s| !s.is_empty()) {
        builder = builder.hero_image(assets.resolve(image), title, assets.placeholder());
    }
    builder.build()
}

pub fn build_all(slides: &[Slide], assets: &AssetResolver) -> Vec<SlideView> {
    slides
        .iter()
        .enumerate()
        .map(|(i, s)| build_slide(i, s, assets))
        .collect()
}

/// One entry of the thumbnail index.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub index: usize,
    pub number: usize,
    pub label: String,
}

impl Thumbnail {
    pub fn build(index: usize, slide: &Slide) -> Self {
        Self {
            index,
            number: index + 1,
            label: slide
                .plain_title()
                .chars()
                .take(THUMBNAIL_TITLE_CHARS)
                .collect(),
        }
    }

    pub fn is_active(&self, current: usize) -> bool {
        self.index == current
    }
}

pub fn build_thumbnails(slides: &[Slide]) -> Vec<Thumbnail> {
    slides
        .iter()
        .enumerate()
        .map(|(i, s)| Thumbnail::build(i, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Media;

    fn assets() -> AssetResolver {
        AssetResolver::new(Path::new("/deck"), DEFAULT_ASSET_DIR, DEFAULT_PLACEHOLDER)
    }

    fn slide(title: &str) -> Slide {
        Slide {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_media() {
        assert_eq!(MediaKind::classify("clip.mp4"), Some(MediaKind::Video));
        assert_eq!(MediaKind::classify("clip.webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::classify("loop.gif"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("photo.JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("icon.svg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("notes.txt"), None);
        assert_eq!(MediaKind::classify("no_extension"), None);
    }

    #[test]
    fn test_media_list_dispatch() {
        let mut s = slide("Media");
        s.media = Some(Media::List(vec![
            Media::File("a.gif".into()),
            Media::File("b.mp4".into()),
            Media::File("c.doc".into()),
        ]));
        let view = build_slide(0, &s, &assets());
        let media: Vec<_> = view
            .content
            .iter()
            .filter(|e| matches!(e.node, Node::Image { .. } | Node::Video { .. }))
            .collect();
        assert_eq!(media.len(), 2);
        assert!(matches!(&media[0].node, Node::Image { src, .. } if src.ends_with("a.gif")));
        assert!(matches!(&media[1].node, Node::Video { src } if src.ends_with("b.mp4")));
        // Media list entries are not part of the entrance sequence.
        assert!(media.iter().all(|e| e.stagger.is_none() && !e.media));
    }

    #[test]
    fn test_stagger_slots_follow_document_order() {
        let s = Slide {
            title: "Mouse".into(),
            subtitle: Some("Pointing".into()),
            content: Some("Body".into()),
            video: Some("demo.mp4".into()),
            gif: Some("click.gif".into()),
            points: Some(vec!["Left".into(), "Right".into()]),
            image: Some("mouse.png".into()),
            ..Default::default()
        };
        let view = build_slide(2, &s, &assets());
        let slots: Vec<_> = view.elements().filter_map(|e| e.stagger).collect();
        assert_eq!(slots, (0..8).collect::<Vec<_>>());
        assert_eq!(view.stagger_count(), 8);
        assert!(!view.is_media_slot(0));
        assert!(view.is_media_slot(3));
        assert!(view.is_media_slot(4));
        assert!(!view.is_media_slot(7));
    }

    #[test]
    fn test_minimal_slide_has_title_and_body() {
        let view = build_slide(0, &slide("Only"), &assets());
        assert_eq!(view.content.len(), 2);
        assert!(view.image.is_none());
        assert!(matches!(
            &view.content[1].node,
            Node::Text { role: TextRole::Body, inlines } if inlines.is_empty()
        ));
    }

    #[test]
    fn test_hero_image_has_placeholder_fallback() {
        let mut s = slide("Scanner");
        s.image = Some("scanner.jpg".into());
        let view = build_slide(0, &s, &assets());
        match view.image.map(|e| e.node) {
            Some(Node::Image { src, alt, fallback }) => {
                assert_eq!(src, Path::new("/deck/images/scanner.jpg"));
                assert_eq!(alt, "Scanner");
                assert_eq!(fallback, Some(PathBuf::from("/deck/images/placeholder.jpg")));
            }
            other => panic!("expected hero image, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_points_render_nothing() {
        let mut s = slide("Empty");
        s.points = Some(Vec::new());
        let view = build_slide(0, &s, &assets());
        assert!(!view.content.iter().any(|e| matches!(e.node, Node::Point { .. })));
    }

    #[test]
    fn test_contrast_follows_palette() {
        let view = build_slide(7, &slide("Light"), &assets());
        assert_eq!(view.contrast, Contrast::LightBackground);
        let view = build_slide(0, &slide("Dark"), &assets());
        assert_eq!(view.contrast, Contrast::DarkBackground);
    }

    #[test]
    fn test_thumbnail_truncates_to_fifteen_chars() {
        let thumb = Thumbnail::build(4, &slide("Touchscreens and Styluses"));
        assert_eq!(thumb.number, 5);
        assert_eq!(thumb.label, "Touchscreens an");
        assert!(thumb.is_active(4));
        assert!(!thumb.is_active(3));

        let short = Thumbnail::build(0, &slide("Mic"));
        assert_eq!(short.label, "Mic");
    }

    #[test]
    fn test_thumbnail_counts_characters_not_bytes() {
        let thumb = Thumbnail::build(0, &slide("Écrans tactiles modernes"));
        assert_eq!(thumb.label.chars().count(), 15);
        assert_eq!(thumb.label, "Écrans tactiles");
    }
}
