//! Anchor harvesting and the suffix heuristics that classify archive links.
//!
//! Year listings link decisions as `../<year>/<n>.html`. Decision pages link
//! the media summary as `<n>media.pdf` (or `.rtf`) and the judgement as
//! `<n>.pdf` (or `.rtf`).

use scraper::{Html, Selector};
use url::Url;

use cosuju_shared::{CosujuError, DocumentKind, Result};

/// Prefix of decision links on a year listing.
const DECISION_PREFIX: &str = "../";
const DECISION_SUFFIX: &str = ".html";

/// Marker distinguishing summaries from judgements.
const MEDIA_MARKER: &str = "media";

/// Every `href` of every `<a>` in document order. Anchors without `href` are skipped.
pub fn collect_hrefs(doc: &Html) -> Vec<String> {
    let sel = Selector::parse("a[href]").expect("valid selector");
    doc.select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

/// Trimmed `<title>` text of a page.
pub fn page_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").expect("valid selector");
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Decision page URLs linked from a year listing, deduplicated in page order.
pub fn decision_links(listing_html: &str, listing_url: &Url) -> Vec<Url> {
    let doc = Html::parse_document(listing_html);
    let mut seen = std::collections::HashSet::new();

    collect_hrefs(&doc)
        .into_iter()
        .filter(|href| href.starts_with(DECISION_PREFIX) && href.ends_with(DECISION_SUFFIX))
        .filter_map(|href| listing_url.join(&href).ok())
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Document selection
// ---------------------------------------------------------------------------

/// The summary and judgement hrefs chosen from a decision page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentLinks {
    pub summary: Option<String>,
    pub judgement: Option<String>,
}

impl DocumentLinks {
    pub fn get(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::Summary => self.summary.as_deref(),
            DocumentKind::Judgement => self.judgement.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.judgement.is_none()
    }
}

/// Pick the summary and judgement links.
///
/// Summary: first href ending `media.pdf`, else first ending `media.rtf`.
/// Judgement: first `.pdf` href without `media` anywhere in it, else the same for `.rtf`.
pub fn select_documents(hrefs: &[String]) -> DocumentLinks {
    let summary = first_match(hrefs, |h| h.ends_with("media.pdf"))
        .or_else(|| first_match(hrefs, |h| h.ends_with("media.rtf")));

    let judgement = first_match(hrefs, |h| h.ends_with(".pdf") && !h.contains(MEDIA_MARKER))
        .or_else(|| first_match(hrefs, |h| h.ends_with(".rtf") && !h.contains(MEDIA_MARKER)));

    DocumentLinks { summary, judgement }
}

fn first_match(hrefs: &[String], pred: impl Fn(&str) -> bool) -> Option<String> {
    hrefs.iter().find(|h| pred(h.as_str())).cloned()
}

/// Parsed decision page: its title and chosen document links.
#[derive(Debug, Clone)]
pub struct DecisionPage {
    pub title: Option<String>,
    pub documents: DocumentLinks,
}

/// Parse a decision page's HTML.
pub fn parse_decision_page(html: &str) -> DecisionPage {
    let doc = Html::parse_document(html);
    let hrefs = collect_hrefs(&doc);
    DecisionPage {
        title: page_title(&doc),
        documents: select_documents(&hrefs),
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Resolve a document href against the page it appeared on.
pub fn resolve_link(base: &Url, href: &str) -> Result<Url> {
    base.join(href)
        .map_err(|e| CosujuError::parse(format!("cannot resolve '{href}' against {base}: {e}")))
}

/// Last path segment of a URL, used as the on-disk filename.
pub fn filename_from_url(url: &Url) -> Result<String> {
    url.path_segments()
        .and_then(|mut segs| segs.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CosujuError::parse(format!("no filename in document URL {url}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn hrefs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn listing_fixture_yields_decisions() {
        let html = load_fixture("listing.html");
        let base = Url::parse("http://www.saflii.org/za/cases/ZACC/1995/").unwrap();
        let links = decision_links(&html, &base);

        let urls: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "http://www.saflii.org/za/cases/ZACC/1995/3.html",
                "http://www.saflii.org/za/cases/ZACC/1995/2.html",
                "http://www.saflii.org/za/cases/ZACC/1995/1.html",
            ]
        );
    }

    #[test]
    fn decision_fixture_selects_documents() {
        let page = parse_decision_page(&load_fixture("decision.html"));
        assert_eq!(
            page.title.as_deref(),
            Some("S v Makwanyane and Another (CCT3/94) [1995] ZACC 3")
        );
        assert_eq!(page.documents.summary.as_deref(), Some("/za/cases/ZACC/1995/3media.pdf"));
        assert_eq!(page.documents.judgement.as_deref(), Some("/za/cases/ZACC/1995/3.pdf"));
    }

    #[test]
    fn summary_falls_back_to_rtf() {
        let links = select_documents(&hrefs(&["/x/4.rtf", "/x/4media.rtf", "/x/4.pdf"]));
        assert_eq!(links.summary.as_deref(), Some("/x/4media.rtf"));
        assert_eq!(links.judgement.as_deref(), Some("/x/4.pdf"));
    }

    #[test]
    fn judgement_falls_back_to_rtf_without_media() {
        let links = select_documents(&hrefs(&["/x/5media.pdf", "/x/5media.rtf", "/x/5.rtf"]));
        assert_eq!(links.summary.as_deref(), Some("/x/5media.pdf"));
        assert_eq!(links.judgement.as_deref(), Some("/x/5.rtf"));
    }

    #[test]
    fn media_anywhere_excludes_judgement() {
        let links = select_documents(&hrefs(&["/media/6.pdf"]));
        assert_eq!(links.judgement, None);
        assert_eq!(links.summary, None);
        assert!(links.is_empty());
    }

    #[test]
    fn no_documents_on_page() {
        let page = parse_decision_page("<html><head><title> T </title></head><body><a>none</a></body></html>");
        assert_eq!(page.title.as_deref(), Some("T"));
        assert!(page.documents.is_empty());
        assert_eq!(page.documents.get(DocumentKind::Summary), None);
    }

    #[test]
    fn missing_title_is_none() {
        let page = parse_decision_page("<html><body></body></html>");
        assert!(page.title.is_none());
    }

    #[test]
    fn resolve_and_name_documents() {
        let base = Url::parse("http://www.saflii.org/za/cases/ZACC/1995/3.html").unwrap();
        let url = resolve_link(&base, "/za/cases/ZACC/1995/3media.pdf").unwrap();
        assert_eq!(url.as_str(), "http://www.saflii.org/za/cases/ZACC/1995/3media.pdf");
        assert_eq!(filename_from_url(&url).unwrap(), "3media.pdf");

        let relative = resolve_link(&base, "3.rtf").unwrap();
        assert_eq!(filename_from_url(&relative).unwrap(), "3.rtf");

        let dir = Url::parse("http://www.saflii.org/za/cases/ZACC/1995/").unwrap();
        assert!(filename_from_url(&dir).is_err());
    }
}
