use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::config::Config;
use crate::deck::{self, Slide};
use crate::view::{AssetResolver, MediaKind};

/// Run the check command.
pub fn run(file: &Path) -> Result<()> {
    let deck = deck::load(file)?;
    let config = Config::load_or_default();
    let assets = AssetResolver::new(&deck.base_path, config.asset_dir(), config.placeholder());

    println!(
        "{} {} slide(s)",
        file.display().to_string().bold(),
        deck.slides.len()
    );
    for (i, slide) in deck.slides.iter().enumerate() {
        let title = slide.plain_title();
        let title = if title.is_empty() {
            "(untitled)".dimmed().to_string()
        } else {
            title
        };
        let notes = if slide.notes.is_some() {
            " [notes]".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {:>3}. {title}{notes}", i + 1);
    }
    println!();

    let referenced = referenced_assets(&deck.slides);
    let missing: Vec<&String> = referenced
        .iter()
        .filter(|name| !assets.resolve(name).exists())
        .collect();
    let unsupported = unsupported_media(&deck.slides);

    if missing.is_empty() {
        println!(
            "{}",
            format!("All {} referenced asset(s) found.", referenced.len()).green()
        );
    } else {
        println!(
            "{}",
            format!("{} asset(s) missing:", missing.len()).yellow().bold()
        );
        for name in &missing {
            println!("  {}", assets.resolve(name).display());
        }
    }

    if !unsupported.is_empty() {
        println!(
            "{} {}",
            "Ignored media with unsupported extensions:".yellow(),
            unsupported.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    if !assets.placeholder().exists() {
        println!(
            "{} {}",
            "Placeholder image not found:".yellow(),
            assets.placeholder().display()
        );
    }

    Ok(())
}

/// Every asset filename the slides refer to, deduplicated.
pub fn referenced_assets(slides: &[Slide]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for slide in slides {
        for field in [&slide.image, &slide.video, &slide.gif] {
            if let Some(name) = field.as_deref().filter(|s| !s.is_empty()) {
                names.insert(name.to_string());
            }
        }
        for name in slide.media_files() {
            if MediaKind::classify(name).is_some() {
                names.insert(name.to_string());
            }
        }
    }
    names
}

/// Media list entries that will not be shown.
pub fn unsupported_media(slides: &[Slide]) -> BTreeSet<String> {
    slides
        .iter()
        .flat_map(|s| s.media_files())
        .filter(|name| MediaKind::classify(name).is_none())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Media;

    fn slides() -> Vec<Slide> {
        vec![
            Slide {
                title: "One".into(),
                image: Some("a.png".into()),
                gif: Some("b.gif".into()),
                ..Default::default()
            },
            Slide {
                title: "Two".into(),
                image: Some("a.png".into()),
                video: Some("".into()),
                media: Some(Media::List(vec![
                    Media::File("c.webm".into()),
                    Media::File("notes.pdf".into()),
                ])),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_referenced_assets_deduplicates() {
        let names: Vec<_> = referenced_assets(&slides()).into_iter().collect();
        assert_eq!(names, vec!["a.png", "b.gif", "c.webm"]);
    }

    #[test]
    fn test_unsupported_media() {
        let names: Vec<_> = unsupported_media(&slides()).into_iter().collect();
        assert_eq!(names, vec!["notes.pdf"]);
    }
}
