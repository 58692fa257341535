//! On-page SEO checks.
//!
//! Pure and deterministic: headings, title and meta description in, issue
//! strings out. Issues are reported in a fixed order (H1 count, heading
//! order, title, meta description).

use crate::audit_engine::audit_types::Heading;

/// Shortest meta description not flagged as too short, in characters.
pub const META_DESCRIPTION_MIN: usize = 50;
/// Longest meta description not flagged as too long, in characters.
pub const META_DESCRIPTION_MAX: usize = 160;

const HEADING_EXCERPT_CHARS: usize = 30;

#[must_use]
pub fn analyze_seo(headings: &[Heading], title: &str, meta_description: Option<&str>) -> Vec<String> {
    let mut issues = Vec::new();

    let h1_count = headings.iter().filter(|h| h.level == 1).count();
    match h1_count {
        0 => issues.push("No H1 tag found.".to_string()),
        1 => {}
        n => issues.push(format!("Found {n} H1 tags. Recommended: 1.")),
    }

    let mut previous: Option<u8> = None;
    for heading in headings {
        match previous {
            None if heading.level != 1 => {
                issues.push(format!("First heading is {}, should be h1.", heading.tag));
            }
            Some(prev) if heading.level > prev + 1 => {
                issues.push(format!(
                    "Skipped heading level: h{prev} -> h{} (at \"{}...\")",
                    heading.level,
                    excerpt(&heading.text)
                ));
            }
            _ => {}
        }
        previous = Some(heading.level);
    }

    if title.trim().is_empty() {
        issues.push("Page title is missing or empty.".to_string());
    }

    match meta_description.map(str::trim).filter(|d| !d.is_empty()) {
        None => issues.push("Meta description is missing.".to_string()),
        Some(description) => {
            let length = description.chars().count();
            if length < META_DESCRIPTION_MIN {
                issues.push(format!(
                    "Meta description is too short ({length} characters, minimum {META_DESCRIPTION_MIN})."
                ));
            } else if length > META_DESCRIPTION_MAX {
                issues.push(format!(
                    "Meta description is too long ({length} characters, maximum {META_DESCRIPTION_MAX})."
                ));
            }
        }
    }

    issues
}

fn excerpt(text: &str) -> String {
    text.chars().take(HEADING_EXCERPT_CHARS).collect()
}
