//! Discovery against mock sites: robots.txt, sitemap indexes, fallbacks

use crate::common::{test_config, urlset, xml};
use contact_miner::config::RunnerKind;
use contact_miner::discovery::discover;
use contact_miner::fetch::build_fetcher;
use contact_miner::model::DiscoveryStrategy;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sitemap_index_ranks_policies_contact_first() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nDisallow: /cart\nSitemap: {}/sitemap_index.xml\n",
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(xml(format!(
            r#"<?xml version="1.0"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <sitemap><loc>{base}/sitemap_pages_1.xml</loc></sitemap>
                <sitemap><loc>{base}/sitemap_policies_1.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap_pages_1.xml"))
        .respond_with(xml(urlset(&base, &["/", "/about-us", "/blog/spring-tune-up"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap_policies_1.xml"))
        .respond_with(xml(urlset(&base, &["/policies/contact-information"])))
        .mount(&server)
        .await;

    let config = test_config(RunnerKind::Pool);
    let fetcher = build_fetcher(&config).unwrap();
    let root = Url::parse(&format!("{}/", base)).unwrap();

    let discovery = discover(fetcher.as_ref(), &root, &config.discovery).await;

    assert_eq!(discovery.sitemaps_read, 3);
    assert_eq!(discovery.strategy, DiscoveryStrategy::SitemapPlusPattern);
    assert_eq!(
        discovery.candidates[0].url.path(),
        "/policies/contact-information"
    );
    assert_eq!(discovery.candidates[0].score, 150);
    assert_eq!(discovery.candidates[1].url.path(), "/about-us");
    assert_eq!(discovery.candidates[1].score, 80);
    assert_eq!(discovery.candidates.len(), config.discovery.max_pages);
    assert!(discovery.candidates.iter().all(|c| c.url.path() != "/"));
}

#[tokio::test]
async fn test_well_known_sitemap_excludes_products_and_ranks_contact() {
    let server = MockServer::start().await;
    let base = server.uri();

    // No robots.txt: the well-known sitemap path is tried
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(urlset(
            &base,
            &[
                "/blog/post-1",
                "/products/contact-lens-cleaner",
                "/collections/contact",
                "/contact-us",
            ],
        )))
        .mount(&server)
        .await;

    for kind in [RunnerKind::Pool, RunnerKind::Concurrent] {
        let config = test_config(kind);
        let fetcher = build_fetcher(&config).unwrap();
        let root = Url::parse(&format!("{}/", base)).unwrap();

        let discovery = discover(fetcher.as_ref(), &root, &config.discovery).await;

        assert_eq!(discovery.candidates[0].url.path(), "/contact-us");
        assert_eq!(discovery.candidates[0].keywords, vec!["contact"]);
        assert!(discovery.candidates.iter().all(|c| {
            !c.url.path().starts_with("/products") && !c.url.path().starts_with("/collections")
        }));
        assert!(discovery
            .candidates
            .iter()
            .all(|c| c.url.path() != "/blog/post-1"));
    }
}

#[tokio::test]
async fn test_broken_sitemap_falls_back_to_patterns() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Page not found</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let config = test_config(RunnerKind::Pool);
    let fetcher = build_fetcher(&config).unwrap();
    let root = Url::parse(&format!("{}/", server.uri())).unwrap();

    let discovery = discover(fetcher.as_ref(), &root, &config.discovery).await;

    assert_eq!(discovery.strategy, DiscoveryStrategy::Pattern);
    assert_eq!(discovery.sitemaps_read, 0);
    let paths: Vec<&str> = discovery.candidates.iter().map(|c| c.url.path()).collect();
    assert_eq!(
        paths,
        vec!["/contact", "/contact-us", "/about", "/about-us", "/pages/contact"]
    );
}
