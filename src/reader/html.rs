//! Field extraction from rendered catalog pages
//!
//! Every function here takes the page's serialized DOM and is tolerant of
//! missing elements: a field that cannot be found is simply left out.

use crate::catalog::{parse_item_id, Genre, ItemId, ItemRecord, Thumbnail};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Toggle that opens the genre menu on a genre landing page
pub const GENRE_MENU: &str = r#"div[label="Genres"] > div"#;

const GENRE_LINK: &str = r#"div[label="Genres"] > div + div li > a"#;
const LINK: &str = "a.slider-refocus";
const BOXART: &str = "img.boxart-image";
const NAME: &str = "h3.previewModal--section-header > strong";
const RELEASE: &str = "div.year";
const CONTENT_RATING: &str = "span.maturity-number";
const DURATION: &str = "span.duration";
const IMAGE_DEFINITION: &str = "span.player-feature-badge";
const DESCRIPTION: &str = "p.preview-modal-synopsis";
const RATING_REASON: &str = "p.specificRatingReason";
const MATURITY_DESCRIPTION: &str = "p.maturityDescription";
const TAG_SECTIONS: &str = "div.about-container > div.previewModal--tags";
const TAG_LABEL: &str = "span.previewModal--tags-label";
const TAG_ITEM: &str = "span.tag-item";
const EPISODE_DURATION: &str = "div.titleCardList-title > span > span.ellipsized";
const AUDIO_DESCRIPTION: &str = "span.audio-description-badge";

/// Ids of every item link currently rendered in a list view
///
/// Document order is kept and duplicates are not removed.
pub fn extract_item_ids(html: &str) -> Vec<ItemId> {
    let document = Html::parse_document(html);
    let Some(selector) = selector(LINK) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(last_path_segment)
        .filter_map(parse_item_id)
        .collect()
}

/// Reads the detail record of item `id` from its title page
pub fn parse_title(html: &str, id: ItemId) -> ItemRecord {
    let document = Html::parse_document(html);
    let mut record = ItemRecord::new(id);

    record.name = first_text(&document, NAME);
    record.release = first_text(&document, RELEASE);
    record.content_rating = first_text(&document, CONTENT_RATING);
    record.duration = first_text(&document, DURATION);
    record.image_definition = first_text(&document, IMAGE_DEFINITION);
    record.description = first_text(&document, DESCRIPTION);
    record.rating_reason = first_text(&document, RATING_REASON);
    record.maturity_description = first_text(&document, MATURITY_DESCRIPTION);
    record.tags = parse_tags(&document);

    // Films show their runtime in minutes, series their season count
    if let Some(duration) = &record.duration {
        let is_film = duration.contains('m');
        record.is_film = Some(is_film);
        if !is_film {
            record.average_episode_duration = average_episode_duration(&document);
        }
    }

    record.has_audio_description = Some(
        selector(AUDIO_DESCRIPTION)
            .map(|s| document.select(&s).next().is_some())
            .unwrap_or(false),
    );

    record
}

/// Reads the first search result's thumbnail
///
/// The code is the last path segment of the result link and the source is
/// the box art image inside it.
pub fn parse_thumbnail(html: &str) -> Option<Thumbnail> {
    let document = Html::parse_document(html);
    let link = document.select(&selector(LINK)?).next()?;

    let code = link.value().attr("href").and_then(last_path_segment)?;
    let source = link
        .select(&selector(BOXART)?)
        .next()?
        .value()
        .attr("src")?
        .trim();
    if source.is_empty() {
        return None;
    }

    Some(Thumbnail {
        code: code.to_string(),
        source: source.to_string(),
    })
}

/// Reads the entries of an open genre menu
///
/// Each genre is named after its menu label followed by `suffix`, which
/// tells apart the film and series variants of a label.
pub fn parse_genres(html: &str, suffix: &str) -> Vec<Genre> {
    let document = Html::parse_document(html);
    let Some(selector) = selector(GENRE_LINK) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| {
            let id = link
                .value()
                .attr("href")
                .and_then(last_path_segment)
                .filter(|id| id.chars().all(|c| c.is_ascii_digit()))?;
            let label = element_text(link)?;
            Some(Genre {
                id: id.to_string(),
                name: format!("{}{}", label, suffix),
            })
        })
        .collect()
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

/// Collapsed text of an element, `None` when blank
fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = selector(css)?;
    document.select(&selector).next().and_then(element_text)
}

/// Labelled tag lists such as cast, genres or "This show is"
fn parse_tags(document: &Html) -> BTreeMap<String, Vec<String>> {
    let (Some(sections), Some(label), Some(item)) =
        (selector(TAG_SECTIONS), selector(TAG_LABEL), selector(TAG_ITEM))
    else {
        return BTreeMap::new();
    };

    let mut tags = BTreeMap::new();
    for section in document.select(&sections) {
        let Some(name) = section.select(&label).next().and_then(element_text) else {
            continue;
        };
        let name = name.trim_end_matches(':').trim().to_string();
        if name.is_empty() {
            continue;
        }

        let values: Vec<String> = section
            .select(&item)
            .filter_map(element_text)
            .map(|value| value.trim_end_matches(',').trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();
        tags.insert(name, values);
    }
    tags
}

/// Mean of the listed episode runtimes, truncated to whole minutes
fn average_episode_duration(document: &Html) -> Option<String> {
    let selector = selector(EPISODE_DURATION)?;
    let minutes: Vec<u64> = document
        .select(&selector)
        .filter_map(element_text)
        .filter_map(|text| {
            let end = text.find('m')?;
            text[..end].trim().parse().ok()
        })
        .collect();

    if minutes.is_empty() {
        return None;
    }
    let average = minutes.iter().sum::<u64>() / minutes.len() as u64;
    Some(format!("{}m", average))
}

fn last_path_segment(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    (!segment.is_empty()).then_some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILM_PAGE: &str = r#"
        <html><body>
          <div class="previewModal">
            <h3 class="previewModal--section-header">About <strong>Roma</strong></h3>
            <div class="year">2018</div>
            <span class="maturity-number">15</span>
            <span class="duration">2h 15m</span>
            <span class="player-feature-badge">HD</span>
            <p class="preview-modal-synopsis">  In 1970s Mexico City,
               a domestic worker keeps a family together. </p>
            <p class="specificRatingReason">language</p>
            <span class="audio-description-badge">AD</span>
            <div class="about-container">
              <div class="previewModal--tags">
                <span class="previewModal--tags-label">Cast:</span>
                <span class="tag-item"> Yalitza Aparicio, </span>
                <span class="tag-item">Marina de Tavira</span>
              </div>
              <div class="previewModal--tags">
                <span class="previewModal--tags-label">Genres:</span>
                <span class="tag-item"> Dramas</span>
              </div>
            </div>
          </div>
        </body></html>
    "#;

    const SERIES_PAGE: &str = r#"
        <html><body>
          <h3 class="previewModal--section-header">About <strong>Dark</strong></h3>
          <span class="duration">3 Seasons</span>
          <div class="titleCardList-title"><span>Secrets<span class="ellipsized">51m</span></span></div>
          <div class="titleCardList-title"><span>Lies<span class="ellipsized">44m</span></span></div>
          <div class="titleCardList-title"><span>Past<span class="ellipsized">46m</span></span></div>
        </body></html>
    "#;

    #[test]
    fn test_extract_item_ids() {
        let html = r#"
            <div class="slider">
              <a class="slider-refocus" href="/watch/80057281?tctx=0%2C0">One</a>
              <a class="slider-refocus" href="/title/70143836">Two</a>
              <a class="other" href="/title/1">Ignored</a>
              <a class="slider-refocus" href="/title/80057281#play">Again</a>
              <a class="slider-refocus" href="/title/not-a-number">Broken</a>
            </div>
        "#;

        assert_eq!(extract_item_ids(html), vec![80057281, 70143836, 80057281]);
    }

    #[test]
    fn test_extract_item_ids_empty_page() {
        assert!(extract_item_ids("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_film() {
        let record = parse_title(FILM_PAGE, 80240715);

        assert_eq!(record.id, 80240715);
        assert_eq!(record.name(), Some("Roma"));
        assert_eq!(record.release.as_deref(), Some("2018"));
        assert_eq!(record.content_rating.as_deref(), Some("15"));
        assert_eq!(record.duration.as_deref(), Some("2h 15m"));
        assert_eq!(record.image_definition.as_deref(), Some("HD"));
        assert_eq!(
            record.description.as_deref(),
            Some("In 1970s Mexico City, a domestic worker keeps a family together.")
        );
        assert_eq!(record.rating_reason.as_deref(), Some("language"));
        assert_eq!(record.maturity_description, None);
        assert_eq!(record.is_film, Some(true));
        assert_eq!(record.average_episode_duration, None);
        assert_eq!(record.has_audio_description, Some(true));
        assert_eq!(
            record.tags["Cast"],
            vec!["Yalitza Aparicio".to_string(), "Marina de Tavira".to_string()]
        );
        assert_eq!(record.tags["Genres"], vec!["Dramas".to_string()]);
    }

    #[test]
    fn test_parse_series_averages_episodes() {
        let record = parse_title(SERIES_PAGE, 80100172);

        assert_eq!(record.name(), Some("Dark"));
        assert_eq!(record.is_film, Some(false));
        // (51 + 44 + 46) / 3 = 47
        assert_eq!(record.average_episode_duration.as_deref(), Some("47m"));
        assert_eq!(record.has_audio_description, Some(false));
    }

    #[test]
    fn test_parse_partial_page() {
        let record = parse_title("<html><body><div class=\"year\">1999</div></body></html>", 7);

        assert_eq!(record.name(), None);
        assert_eq!(record.release.as_deref(), Some("1999"));
        assert_eq!(record.is_film, None);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_parse_thumbnail() {
        let html = r#"
            <a class="slider-refocus" href="/watch/81040344?tctx=1">
              <div class="boxart-container">
                <img class="boxart-image" src="https://img.example.com/81040344.jpg">
              </div>
            </a>
            <a class="slider-refocus" href="/watch/2"><img class="boxart-image" src="second.jpg"></a>
        "#;

        assert_eq!(
            parse_thumbnail(html),
            Some(Thumbnail {
                code: "81040344".to_string(),
                source: "https://img.example.com/81040344.jpg".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_thumbnail_without_result() {
        assert_eq!(parse_thumbnail("<p>No results</p>"), None);
        assert_eq!(
            parse_thumbnail(r#"<a class="slider-refocus" href="/watch/1"></a>"#),
            None
        );
    }

    #[test]
    fn test_parse_genres() {
        let html = r#"
            <div label="Genres">
              <div class="menu-toggle">Genres</div>
              <div class="sub-menu">
                <ul>
                  <li><a href="/browse/genre/5763">Dramas</a></li>
                  <li><a href="/browse/genre/6548?bc=34399"> Comedies </a></li>
                  <li><a href="/browse/genre/">Broken</a></li>
                </ul>
              </div>
            </div>
            <ul><li><a href="/browse/genre/1">Outside the menu</a></li></ul>
        "#;

        assert_eq!(
            parse_genres(html, " Films"),
            vec![
                Genre {
                    id: "5763".to_string(),
                    name: "Dramas Films".to_string(),
                },
                Genre {
                    id: "6548".to_string(),
                    name: "Comedies Films".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_last_path_segment() {
        assert_eq!(last_path_segment("/title/123"), Some("123"));
        assert_eq!(last_path_segment("/title/123/"), Some("123"));
        assert_eq!(last_path_segment("/watch/9?x=1#y"), Some("9"));
        assert_eq!(last_path_segment(""), None);
    }
}
