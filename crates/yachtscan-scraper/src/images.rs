//! Image source resolution and validation.
//!
//! Listing photos arrive as plain `src`, lazy-load attributes, `srcset`
//! candidates or CSS `background-image` declarations. Everything is resolved
//! against the page URL and filtered through the same rule so no strategy can
//! leak an inline-encoded or chrome image into a record.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use url::Url;

/// Path substrings that mark site chrome, iconography or tracking pixels.
/// Broad on purpose; a real photo named `banner-bay.jpg` is lost.
const DENYLIST: &[&str] = &[
    "logo",
    "icon",
    "favicon",
    "placeholder",
    "spinner",
    "loader",
    "loading",
    "avatar",
    "banner",
    "sprite",
    "blank.gif",
    "spacer",
    "pixel",
    "tracking",
    "facebook",
    "twitter",
    "instagram",
    "linkedin",
    "pinterest",
    "youtube",
    "whatsapp",
    "tiktok",
    "badge",
    "flag",
    "1x1",
];

/// Attributes that may carry an image address, most specific first.
const SOURCE_ATTRIBUTES: &[&str] = &[
    "data-src",
    "data-lazy-src",
    "data-original",
    "data-lazy",
    "data-srcset",
    "srcset",
    "src",
];

/// Assumed size for images that carry no dimension hints.
const ASSUMED_DIMENSION: u32 = u32::MAX;

static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)background(?:-image)?\s*:[^;]*?url\(\s*['"]?([^'")]+)['"]?\s*\)"#)
        .expect("valid background-image regex")
});

static STYLE_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[;\s])width\s*:\s*(\d+)px").expect("valid style width regex")
});

static STYLE_HEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[;\s])height\s*:\s*(\d+)px").expect("valid style height regex")
});

/// Minimum-dimension and resolution rules applied to every candidate image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRules {
    pub min_width: u32,
    pub min_height: u32,
}

impl ImageRules {
    #[must_use]
    pub fn from_config(config: &yachtscan_core::ExtractionConfig) -> Self {
        Self {
            min_width: config.min_image_width,
            min_height: config.min_image_height,
        }
    }

    /// Passes when both known dimensions meet the minimums. Unknown
    /// dimensions are assumed to pass.
    #[must_use]
    pub fn meets_minimum(&self, width: Option<u32>, height: Option<u32>) -> bool {
        width.unwrap_or(ASSUMED_DIMENSION) >= self.min_width
            && height.unwrap_or(ASSUMED_DIMENSION) >= self.min_height
    }

    /// Resolves and validates the image carried by an `img`-like element.
    ///
    /// Tries lazy-load attributes before `src` because lazy markup usually
    /// puts a placeholder in `src`.
    #[must_use]
    pub fn image_from_element(&self, element: &ElementRef<'_>, base: &Url) -> Option<String> {
        let el = element.value();
        let style = el.attr("style").unwrap_or("");
        let width = el
            .attr("width")
            .and_then(parse_dimension)
            .or_else(|| style_dimension(&STYLE_WIDTH_RE, style));
        let height = el
            .attr("height")
            .and_then(parse_dimension)
            .or_else(|| style_dimension(&STYLE_HEIGHT_RE, style));
        if !self.meets_minimum(width, height) {
            return None;
        }

        SOURCE_ATTRIBUTES.iter().find_map(|attr| {
            let raw = el.attr(attr)?;
            let candidate = if attr.ends_with("srcset") {
                first_srcset_candidate(raw)?
            } else {
                raw.trim()
            };
            accept_image_url(candidate, base)
        })
    }

    /// Resolves and validates the first `background-image` URL in a style
    /// declaration.
    #[must_use]
    pub fn image_from_style(&self, style: &str, base: &Url) -> Option<String> {
        let raw = BACKGROUND_URL_RE.captures(style)?.get(1)?.as_str();
        accept_image_url(raw, base)
    }

    /// Every valid image in and below `element`: `img`/`source` elements and
    /// inline background images, in document order, without duplicates.
    #[must_use]
    pub fn collect_images(&self, element: &ElementRef<'_>, base: &Url) -> Vec<String> {
        let mut images: Vec<String> = Vec::new();
        let mut push = |url: String| {
            if !images.contains(&url) {
                images.push(url);
            }
        };

        if let Some(url) = element
            .value()
            .attr("style")
            .and_then(|style| self.image_from_style(style, base))
        {
            push(url);
        }

        for node in element.descendants().filter_map(ElementRef::wrap) {
            let el = node.value();
            if matches!(el.name(), "img" | "source") {
                if let Some(url) = self.image_from_element(&node, base) {
                    push(url);
                }
            } else if let Some(url) = el
                .attr("style")
                .and_then(|style| self.image_from_style(style, base))
            {
                push(url);
            }
        }
        images
    }
}

/// Resolves `raw` against `base` and applies the inline-data and denylist
/// rules. Returns the absolute URL when the image is acceptable.
#[must_use]
pub fn accept_image_url(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    let resolved = resolve_url(base, raw)?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    if is_denylisted(resolved.path()) {
        return None;
    }
    Some(resolved.to_string())
}

/// Protocol-relative, absolute-path and relative-path resolution against
/// the page URL.
#[must_use]
pub fn resolve_url(base: &Url, raw: &str) -> Option<Url> {
    base.join(raw.trim()).ok()
}

fn is_denylisted(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    DENYLIST.iter().any(|needle| lower.contains(needle))
}

fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .map(str::trim)
        .find(|c| !c.is_empty())
        .and_then(|c| c.split_whitespace().next())
}

fn parse_dimension(raw: &str) -> Option<u32> {
    raw.trim().trim_end_matches("px").trim().parse::<u32>().ok()
}

fn style_dimension(re: &Regex, style: &str) -> Option<u32> {
    re.captures(style)?.get(1)?.as_str().parse::<u32>().ok()
}
