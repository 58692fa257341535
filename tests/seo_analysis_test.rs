//! On-page SEO rules through the public API

use kodegen_tools_siteaudit::analyze_seo;
use kodegen_tools_siteaudit::audit_engine::Heading;

fn heading(level: u8, text: &str) -> Heading {
    Heading {
        tag: format!("h{level}"),
        text: text.to_string(),
        level,
    }
}

#[test]
fn page_with_every_problem_reports_four_issues_in_order() {
    let issues = analyze_seo(&[heading(2, "Intro")], "", None);
    assert_eq!(
        issues,
        vec![
            "No H1 tag found.",
            "First heading is h2, should be h1.",
            "Page title is missing or empty.",
            "Meta description is missing.",
        ]
    );
}

#[test]
fn well_formed_page_has_no_issues() {
    let description = "A concise summary of the page that is comfortably long enough.";
    let issues = analyze_seo(
        &[
            heading(1, "Welcome"),
            heading(2, "Features"),
            heading(3, "Speed"),
            heading(2, "Pricing"),
        ],
        "Welcome | Example",
        Some(description),
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn page_without_headings_only_misses_h1() {
    let description = "x".repeat(80);
    let issues = analyze_seo(&[], "Title", Some(description.as_str()));
    assert_eq!(issues, vec!["No H1 tag found."]);
}

#[test]
fn every_skip_is_reported() {
    let description = "x".repeat(80);
    let issues = analyze_seo(
        &[heading(1, "a"), heading(3, "b"), heading(6, "c")],
        "t",
        Some(description.as_str()),
    );
    assert_eq!(
        issues,
        vec![
            "Skipped heading level: h1 -> h3 (at \"b...\")",
            "Skipped heading level: h3 -> h6 (at \"c...\")",
        ]
    );
}

#[test]
fn whitespace_title_is_missing() {
    let description = "x".repeat(80);
    let issues = analyze_seo(&[heading(1, "a")], " \t\n", Some(description.as_str()));
    assert_eq!(issues, vec!["Page title is missing or empty."]);
}
