//! Sitemap discovery against a local mock server

use kodegen_tools_siteaudit::analyzers::http_client;
use kodegen_tools_siteaudit::{SitemapDiscovery, SitemapError};
use mockito::Server;

fn discovery() -> SitemapDiscovery {
    SitemapDiscovery::new(http_client().expect("client"))
}

fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{loc}</loc></url>"))
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#)
}

#[tokio::test]
async fn lists_pages_from_sitemap_xml() {
    let mut server = Server::new_async().await;
    let base = server.url();
    let body = urlset(&[
        format!("{base}/"),
        format!("{base}/about"),
        format!("{base}/about"),
        format!("{base}/feed.xml"),
    ]);
    server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let response = discovery().discover(&base).await.expect("sitemap found");
    assert_eq!(response.urls, vec![format!("{base}/"), format!("{base}/about")]);
    assert_eq!(response.count, 2);
    assert_eq!(response.sitemap_url, format!("{base}/sitemap.xml"));
}

#[tokio::test]
async fn falls_back_to_sitemap_index_and_expands_children() {
    let mut server = Server::new_async().await;
    let base = server.url();
    server
        .mock("GET", "/sitemap.xml")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/sitemap_index.xml")
        .with_status(200)
        .with_body(format!(
            "<sitemapindex><sitemap><loc>{base}/posts.xml</loc></sitemap><sitemap><loc>{base}/missing.xml</loc></sitemap></sitemapindex>"
        ))
        .create_async()
        .await;
    server
        .mock("GET", "/posts.xml")
        .with_status(200)
        .with_body(urlset(&[format!("{base}/post-1"), format!("{base}/post-2")]))
        .create_async()
        .await;
    server
        .mock("GET", "/missing.xml")
        .with_status(500)
        .create_async()
        .await;

    let response = discovery().discover(&base).await.expect("index found");
    assert_eq!(
        response.urls,
        vec![format!("{base}/post-1"), format!("{base}/post-2")]
    );
    assert_eq!(response.sitemap_url, format!("{base}/sitemap_index.xml"));
}

#[tokio::test]
async fn missing_sitemaps_are_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/sitemap.xml")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/sitemap_index.xml")
        .with_status(404)
        .create_async()
        .await;

    let err = discovery()
        .discover(&server.url())
        .await
        .expect_err("no sitemap");
    assert!(matches!(err, SitemapError::NotFound));
    assert_eq!(err.to_string(), "Sitemap not found");
}

#[tokio::test]
async fn sitemap_without_pages_is_empty() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/sitemap.xml")
        .with_status(200)
        .with_body(urlset(&[]))
        .create_async()
        .await;

    let err = discovery()
        .discover(&server.url())
        .await
        .expect_err("empty sitemap");
    assert!(matches!(err, SitemapError::Empty));
}

#[tokio::test]
async fn blank_site_is_rejected() {
    let err = discovery().discover("  ").await.expect_err("blank input");
    assert!(matches!(err, SitemapError::MissingUrl));
}
