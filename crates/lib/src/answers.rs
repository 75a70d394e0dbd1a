//! Answer selection: turn the engine's pods into at most five ranked carousel cards.
//!
//! Pods whose title is in [`PRIORITY_TITLES`] come first, in source order, with their full
//! text and a tall thumbnail. Remaining pods fill the leftover slots in source order with
//! truncated text and a wide thumbnail. The output depends only on pod order, so identical
//! engine responses always produce identical cards.

use crate::engine::Pod;

/// Carousel column cap imposed by the chat platform.
pub const MAX_CARDS: usize = 5;

/// Pod titles that are always surfaced before anything else.
pub const PRIORITY_TITLES: [&str; 8] = [
    "Input",
    "Solution",
    "Decimal approximation",
    "Response",
    "Result",
    "Roots",
    "Solutions",
    "Root",
];

/// Label of the single message action on each card.
pub const ACTION_LABEL: &str = "Detail";

const PRIORITY_THUMBNAIL_SIZE: (u32, u32) = (512, 768);
const FILLER_THUMBNAIL_SIZE: (u32, u32) = (512, 341);

/// One carousel column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCard {
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub text: String,
    pub action_label: String,
    pub action_text: String,
}

/// Ranked cards for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub cards: Vec<AnswerCard>,
    /// False when the engine returned no pods at all; the caller replies with example queries instead.
    pub had_any_result: bool,
}

/// Settings for building cards.
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    /// Max characters of filler card text; see [`truncate`].
    pub max_text_length: usize,
    /// Image proxy base URL (no trailing slash). When unset thumbnails use the engine image as is.
    pub image_proxy: Option<String>,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            max_text_length: 60,
            image_proxy: None,
        }
    }
}

pub fn is_priority_title(title: &str) -> bool {
    PRIORITY_TITLES.contains(&title)
}

/// Select and rank cards from pods.
///
/// Each pod is used at most once. Priority pods are taken first (up to [`MAX_CARDS`]), then
/// the remaining budget is filled from the other pods.
pub fn select(pods: &[Pod], options: &AnswerOptions) -> Selection {
    if pods.is_empty() {
        return Selection {
            cards: Vec::new(),
            had_any_result: false,
        };
    }
    let (priority, filler): (Vec<&Pod>, Vec<&Pod>) =
        pods.iter().partition(|p| is_priority_title(&p.title));

    let mut cards: Vec<AnswerCard> = priority
        .into_iter()
        .take(MAX_CARDS)
        .map(|p| priority_card(p, options))
        .collect();
    let remaining = MAX_CARDS.saturating_sub(cards.len());
    cards.extend(
        filler
            .into_iter()
            .take(remaining)
            .map(|p| filler_card(p, options)),
    );

    Selection {
        cards,
        had_any_result: true,
    }
}

fn card_text(pod: &Pod) -> String {
    let text = pod.joined_text();
    if text.is_empty() {
        pod.title.clone()
    } else {
        text
    }
}

fn priority_card(pod: &Pod, options: &AnswerOptions) -> AnswerCard {
    let text = card_text(pod);
    AnswerCard {
        thumbnail_url: pod
            .primary_image()
            .map(|src| thumbnail_url(options.image_proxy.as_deref(), src, PRIORITY_THUMBNAIL_SIZE)),
        title: pod.title.clone(),
        action_label: ACTION_LABEL.to_string(),
        action_text: text.clone(),
        text,
    }
}

fn filler_card(pod: &Pod, options: &AnswerOptions) -> AnswerCard {
    let text = truncate(&card_text(pod), options.max_text_length);
    AnswerCard {
        thumbnail_url: pod
            .primary_image()
            .map(|src| thumbnail_url(options.image_proxy.as_deref(), src, FILLER_THUMBNAIL_SIZE)),
        title: pod.title.clone(),
        action_label: ACTION_LABEL.to_string(),
        action_text: text.clone(),
        text,
    }
}

/// Cut text longer than `max_len` characters to `max_len - 2` characters plus "..".
/// For `max_len <= 2` the text is returned unchanged.
pub fn truncate(text: &str, max_len: usize) -> String {
    if max_len <= 2 {
        return text.to_string();
    }
    if text.chars().count() > max_len {
        let mut cut: String = text.chars().take(max_len - 2).collect();
        cut.push_str("..");
        cut
    } else {
        text.to_string()
    }
}

/// Thumbnail URL through the image proxy: `{proxy}/{urlencoded src}/{w}/{h}.jpg`.
pub fn thumbnail_url(proxy: Option<&str>, src: &str, (width, height): (u32, u32)) -> String {
    match proxy {
        Some(base) => format!(
            "{}/{}/{}/{}.jpg",
            base.trim_end_matches('/'),
            urlencoding::encode(src),
            width,
            height
        ),
        None => src.to_string(),
    }
}
