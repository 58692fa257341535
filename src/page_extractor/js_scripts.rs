//! JavaScript evaluation scripts
//!
//! This module contains the JavaScript code evaluated inside audited pages.
//! Every script returns plain JSON so results can be deserialized with serde.

/// Page data for one audited URL: headings, links, images, head metadata,
/// scripts and the body size used for the empty-page warning.
pub const EXTRACT_PAGE_DATA_SCRIPT: &str = r#"
    (() => {
        const headings = Array.from(document.querySelectorAll('h1, h2, h3, h4, h5, h6'))
            .map(el => ({
                tag: el.tagName.toLowerCase(),
                text: (el.textContent || '').trim(),
                level: parseInt(el.tagName.substring(1), 10)
            }));

        const links = Array.from(document.querySelectorAll('a[href]'))
            .map(a => a.href)
            .filter(href => href
                && !href.startsWith('javascript:')
                && !href.startsWith('mailto:')
                && !href.startsWith('tel:'));

        const images = Array.from(document.images)
            .filter(img => img.currentSrc || img.src)
            .map(img => ({
                src: img.currentSrc || img.src,
                alt: img.getAttribute('alt') || ''
            }));

        const meta = document.querySelector('meta[name="description"]');
        const verification = document.querySelector('meta[name="google-site-verification"]');

        const scriptTags = Array.from(document.scripts);

        return {
            title: document.title || '',
            metaDescription: meta ? meta.getAttribute('content') : null,
            headings,
            links,
            images,
            scripts: scriptTags.filter(s => s.src).map(s => s.src),
            inlineScripts: scriptTags
                .filter(s => !s.src && s.textContent)
                .map(s => s.textContent),
            searchConsoleMeta: verification ? verification.getAttribute('content') : null,
            htmlLength: document.body ? document.body.innerHTML.length : 0
        };
    })()
"#;

/// Site-wide scan for the global phase: scripts plus the serialized document
/// so consent-blocked and noscript tags can be pattern matched.
pub const GLOBAL_SCAN_SCRIPT: &str = r#"
    (() => {
        const verification = document.querySelector('meta[name="google-site-verification"]');
        const scriptTags = Array.from(document.scripts);
        return {
            scripts: scriptTags.filter(s => s.src).map(s => s.src),
            inlineScripts: scriptTags
                .filter(s => !s.src && s.textContent)
                .map(s => s.textContent),
            searchConsoleMeta: verification ? verification.getAttribute('content') : null,
            html: document.documentElement ? document.documentElement.outerHTML : ''
        };
    })()
"#;

/// Load state probe polled while waiting for network idle.
pub const LOAD_STATE_SCRIPT: &str = r"
    (() => ({
        readyState: document.readyState,
        resourceCount: performance.getEntriesByType('resource').length
    }))()
";

/// Bounded auto-scroll. Placeholders are replaced by [`auto_scroll_script`].
const AUTO_SCROLL_TEMPLATE: &str = r"
    (async () => {
        const distance = __DISTANCE__;
        const interval = __INTERVAL__;
        const maxIterations = __MAX_ITERATIONS__;
        let iterations = 0;
        let travelled = 0;
        await new Promise(resolve => {
            const timer = setInterval(() => {
                const scrollHeight = document.body ? document.body.scrollHeight : 0;
                window.scrollBy(0, distance);
                travelled += distance;
                iterations += 1;
                if (travelled >= scrollHeight || iterations >= maxIterations) {
                    clearInterval(timer);
                    resolve();
                }
            }, interval);
        });
        window.scrollTo(0, 0);
        return iterations;
    })()
";

/// Auto-scroll script with the given step, tick and iteration cap.
#[must_use]
pub fn auto_scroll_script(distance_px: u32, interval_ms: u64, max_iterations: u32) -> String {
    AUTO_SCROLL_TEMPLATE
        .replace("__DISTANCE__", &distance_px.to_string())
        .replace("__INTERVAL__", &interval_ms.to_string())
        .replace("__MAX_ITERATIONS__", &max_iterations.to_string())
}
