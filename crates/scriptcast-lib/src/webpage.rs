//! Webpage text extraction — fetch HTML, keep the main content, flatten it.

use scraper::{ElementRef, Html, Node, Selector};
use tracing::info;

use crate::error::{Error, Result};

/// Pages with less readable text than this are treated as empty.
pub const MIN_CONTENT_LEN: usize = 100;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; PodcastBot/1.0)";

/// Elements whose text never counts as content.
const SKIPPED: &[&str] = &["script", "style", "nav", "footer", "header"];

/// Main-content containers, most specific first.
const MAIN_SELECTORS: &[&str] = &[
    "article",
    r#"[role="main"]"#,
    "main",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
];

/// Fetch a page and extract its main text.
pub async fn scrape(client: &reqwest::Client, url: &str) -> Result<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::MissingParameter("url"));
    }

    info!("fetching {url}");
    let resp = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Upstream {
            status: Some(status.as_u16()),
            body: format!(
                "Failed to fetch URL: {}",
                status.canonical_reason().unwrap_or("unknown status")
            ),
        });
    }

    let html = resp.text().await?;
    let content = extract_main_text(&html)?;
    info!("extracted {} chars from {url}", content.len());
    Ok(content)
}

/// Extract readable text from an HTML document.
///
/// Prefers the first main-content container; falls back to `<body>`, then
/// to the whole document.
pub fn extract_main_text(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);

    let root = MAIN_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| doc.select(&sel).find(|el| !inside_skipped(el)))
        .or_else(|| {
            Selector::parse("body")
                .ok()
                .and_then(|sel| doc.select(&sel).next())
        })
        .unwrap_or_else(|| doc.root_element());

    let content = visible_text(root)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if content.chars().count() < MIN_CONTENT_LEN {
        return Err(Error::EmptyResult(
            "Could not extract meaningful content from the webpage".into(),
        ));
    }
    Ok(content)
}

fn is_skipped(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| SKIPPED.contains(&el.name()))
}

fn inside_skipped(el: &ElementRef<'_>) -> bool {
    SKIPPED.contains(&el.value().name()) || el.ancestors().any(|a| is_skipped(a.value()))
}

/// Concatenated text of `root`, minus anything under a skipped element.
fn visible_text(root: ElementRef<'_>) -> String {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let skipped = node
                .ancestors()
                .take_while(|a| a.id() != root.id())
                .any(|a| is_skipped(a.value()));
            (!skipped).then_some(&**text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(words: usize) -> String {
        vec!["lorem"; words].join(" ")
    }

    #[test]
    fn prefers_article_over_body() {
        let html = format!(
            "<html><body><div>sidebar junk</div><article><h1>Title</h1>\n<p>{}</p></article></body></html>",
            filler(30)
        );
        let text = extract_main_text(&html).unwrap();
        assert!(text.starts_with("Title lorem"));
        assert!(!text.contains("sidebar"));
    }

    #[test]
    fn drops_scripts_navs_and_footers() {
        let html = format!(
            "<html><head><style>p {{ color: red }}</style></head><body>\
             <header>Site header</header><nav>Home | About</nav>\
             <main><p>{}</p><script>var x = 1;</script></main>\
             <footer>Copyright</footer></body></html>",
            filler(30)
        );
        let text = extract_main_text(&html).unwrap();
        for junk in ["Site header", "Home", "var x", "Copyright", "color"] {
            assert!(!text.contains(junk), "leaked: {junk}");
        }
    }

    #[test]
    fn falls_back_to_body() {
        let html = format!("<html><body><div><p>{}</p></div></body></html>", filler(25));
        assert_eq!(extract_main_text(&html).unwrap(), filler(25));
    }

    #[test]
    fn selector_order_is_priority() {
        let html = format!(
            "<body><div class=\"content\">{}</div><main>{}</main></body>",
            filler(30),
            vec!["main"; 30].join(" ")
        );
        assert!(extract_main_text(&html).unwrap().starts_with("main main"));
    }

    #[test]
    fn article_inside_nav_is_ignored() {
        let html = format!(
            "<body><nav><article>teaser</article></nav><main>{}</main></body>",
            filler(30)
        );
        let text = extract_main_text(&html).unwrap();
        assert!(!text.contains("teaser"));
    }

    #[test]
    fn normalizes_whitespace() {
        let html = format!("<body><p>  {}\n\n\t end </p></body>", filler(25));
        assert_eq!(extract_main_text(&html).unwrap(), format!("{} end", filler(25)));
    }

    #[test]
    fn short_pages_are_empty_results() {
        let html = "<html><body><p>Too short.</p></body></html>";
        assert!(matches!(extract_main_text(html), Err(Error::EmptyResult(_))));
    }

    // ── fetching ────────────────────────────────────────────────────

    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::Html as HtmlBody;
    use axum::routing::get;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    async fn article(headers: HeaderMap) -> HtmlBody<String> {
        let agent = headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        HtmlBody(format!(
            "<html><body><nav>menu</nav><article><p>{agent}</p><p>{}</p></article></body></html>",
            filler(30)
        ))
    }

    fn site() -> Router {
        Router::new()
            .route("/article", get(article))
            .route("/gone", get(|| async { (StatusCode::NOT_FOUND, "no such page") }))
            .route("/stub", get(|| async { HtmlBody("<p>tiny</p>") }))
    }

    #[tokio::test]
    async fn scrape_fetches_main_text() {
        let base = serve(site()).await;
        let text = scrape(&reqwest::Client::new(), &format!(" {base}/article ")).await.unwrap();
        assert!(text.starts_with(USER_AGENT));
        assert!(text.ends_with("lorem"));
        assert!(!text.contains("menu"));
    }

    #[tokio::test]
    async fn failed_fetch_is_upstream_error() {
        let base = serve(site()).await;
        let err = scrape(&reqwest::Client::new(), &format!("{base}/gone")).await.unwrap_err();
        match err {
            Error::Upstream { status, body } => {
                assert_eq!(status, Some(404));
                assert_eq!(body, "Failed to fetch URL: Not Found");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn thin_page_is_empty_result() {
        let base = serve(site()).await;
        let err = scrape(&reqwest::Client::new(), &format!("{base}/stub")).await.unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));
    }

    #[tokio::test]
    async fn blank_url_is_missing_parameter() {
        let err = scrape(&reqwest::Client::new(), "  ").await.unwrap_err();
        assert!(matches!(err, Error::MissingParameter("url")));
    }
}
