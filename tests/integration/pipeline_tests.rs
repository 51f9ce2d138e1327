use bookshelf_etl::config::{CatalogConfig, CategoryEntry, Config, DatabaseConfig, OutputConfig};
use bookshelf_etl::crawler::{FetchPolicy, Pipeline};
use bookshelf_etl::storage::SqliteStorage;
use bookshelf_etl::{EtlError, LoadMode};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCIENCE: &str = "/catalogue/category/books/science_22/index.html";
const SCIENCE_PAGE_2: &str = "/catalogue/category/books/science_22/page-2.html";
const POETRY: &str = "/catalogue/category/books/poetry_23/index.html";

/// Renders a listing page linking to `slugs`, optionally with a next link
fn listing_html(slugs: &[&str], next: Option<&str>) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<li><article class="product_pod">
                    <a href="../../../{slug}/index.html"><img src="x.jpg" alt="{slug}"></a>
                    <h3><a href="../../../{slug}/index.html" title="{slug}">{slug}</a></h3>
                </article></li>"#
            )
        })
        .collect();

    let pager = next
        .map(|href| format!(r#"<ul class="pager"><li class="next"><a href="{href}">next</a></li></ul>"#))
        .unwrap_or_default();

    format!("<html><body><ol class=\"row\">{items}</ol>{pager}</body></html>")
}

/// Renders an item detail page
fn product_html(upc: &str, price: &str, availability: &str, description: &str) -> String {
    format!(
        r#"<html><body><article class="product_page">
        <div id="product_description" class="sub-header"><h2>Product Description</h2></div>
        <p>{description}</p>
        <table class="table table-striped">
            <tr><th>UPC</th><td>{upc}</td></tr>
            <tr><th>Product Type</th><td>Books</td></tr>
            <tr><th>Price (excl. tax)</th><td>£{price}</td></tr>
            <tr><th>Price (incl. tax)</th><td>£{price}</td></tr>
            <tr><th>Tax</th><td>£0.00</td></tr>
            <tr><th>Availability</th><td>{availability}</td></tr>
            <tr><th>Number of reviews</th><td>0</td></tr>
        </table></article></body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts two categories: Science over two listing pages (3 items) and Poetry
/// with one good item and one item that always answers 404
async fn mount_catalog(server: &MockServer) {
    mount_html(
        server,
        SCIENCE,
        200,
        listing_html(&["the-elegant-universe_969", "sapiens_996"], Some("page-2.html")),
    )
    .await;
    mount_html(
        server,
        SCIENCE_PAGE_2,
        200,
        listing_html(&["the-origin-of-species_499"], None),
    )
    .await;
    mount_html(
        server,
        POETRY,
        200,
        listing_html(&["odes_101", "lost-verses_102"], None),
    )
    .await;

    mount_html(
        server,
        "/catalogue/the-elegant-universe_969/index.html",
        200,
        product_html("u969", "51.77", "In stock (19 available)", "Strings, briefly."),
    )
    .await;
    mount_html(
        server,
        "/catalogue/sapiens_996/index.html",
        200,
        product_html("u996", "54.23", "In stock (20 available)", "Humankind."),
    )
    .await;
    mount_html(
        server,
        "/catalogue/the-origin-of-species_499/index.html",
        200,
        product_html("u499", "10.01", "In stock (7 available)", "Finches."),
    )
    .await;
    mount_html(
        server,
        "/catalogue/odes_101/index.html",
        200,
        product_html("u101", "13.99", "In stock (2 available)", "Verse."),
    )
    .await;
    mount_html(
        server,
        "/catalogue/lost-verses_102/index.html",
        404,
        "gone".to_string(),
    )
    .await;
}

fn test_config(server: &MockServer, dir: &Path) -> Config {
    Config {
        catalog: CatalogConfig {
            base_url: format!("{}/catalogue/", server.uri()),
            follow_pagination: true,
            max_listing_pages: 10,
            categories: vec![
                CategoryEntry {
                    label: "Science".to_string(),
                    path: "category/books/science_22/index.html".to_string(),
                },
                CategoryEntry {
                    label: "Poetry".to_string(),
                    path: "category/books/poetry_23/index.html".to_string(),
                },
            ],
        },
        output: OutputConfig {
            csv_path: dir.join("data.csv").display().to_string(),
        },
        database: DatabaseConfig {
            path: dir.join("book_db.sqlite3").display().to_string(),
            table: "BooksToScrape".to_string(),
        },
        ..Config::default()
    }
}

fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        max_attempts: 2,
        rate_limit_backoff: Duration::ZERO,
        status_retry_delay: Duration::ZERO,
        network_retry_delay: Duration::ZERO,
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read output file")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_file_mode_writes_header_once_and_appends() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&mock_server, dir.path());
    let csv_path = dir.path().join("data.csv");

    let pipeline = Pipeline::with_policy(config, fast_policy()).expect("Failed to build pipeline");

    let report = pipeline.run(LoadMode::File).await.expect("Pipeline failed");
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].label, "Science");
    assert_eq!(report.categories[0].links_found, 3);
    assert_eq!(report.categories[0].records_loaded, 3);
    assert_eq!(report.categories[1].links_found, 2);
    assert_eq!(report.categories[1].records_loaded, 1);

    let lines = read_lines(&csv_path);
    assert_eq!(lines.len(), 1 + 4);
    assert!(lines[0].starts_with("title,upc,product_type,"));
    assert_eq!(
        lines[1],
        "the-elegant-universe,u969,Books,51.77,51.77,0.0,19,0,\"Strings, briefly.\",Science"
    );
    assert!(lines[3].starts_with("the-origin-of-species,u499,"));
    assert!(lines[4].ends_with(",Poetry"));

    // A second run appends rows without another header
    pipeline.run(LoadMode::File).await.expect("Second run failed");
    let lines = read_lines(&csv_path);
    assert_eq!(lines.len(), 1 + 4 + 4);
    assert_eq!(lines.iter().filter(|l| l.starts_with("title,")).count(), 1);
}

#[tokio::test]
async fn test_database_mode_appends_rows() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&mock_server, dir.path());
    let db_path = dir.path().join("book_db.sqlite3");

    let pipeline = Pipeline::with_policy(config, fast_policy()).expect("Failed to build pipeline");
    let report = pipeline
        .run(LoadMode::Database)
        .await
        .expect("Pipeline failed");
    assert_eq!(report.total_loaded(), 4);
    assert!(!dir.path().join("data.csv").exists());

    let storage = SqliteStorage::new(&db_path, "BooksToScrape").expect("Failed to open DB");
    assert_eq!(storage.count_records().unwrap(), 4);
    assert_eq!(storage.count_by_category("Science").unwrap(), 3);
    assert_eq!(storage.count_by_category("Poetry").unwrap(), 1);

    let records = storage.load_records().unwrap();
    let odes = records
        .iter()
        .find(|r| r.title == "odes")
        .expect("odes missing");
    assert_eq!(odes.upc, "u101");
    assert_eq!(odes.price_excl_tax, 13.99);
    assert_eq!(odes.availability, 2);
    assert_eq!(odes.product_description, "Verse.");
}

#[tokio::test]
async fn test_pagination_can_be_disabled() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&mock_server, dir.path());
    config.catalog.follow_pagination = false;

    let pipeline = Pipeline::with_policy(config, fast_policy()).expect("Failed to build pipeline");
    let listing = url::Url::parse(&format!("{}{}", mock_server.uri(), SCIENCE)).unwrap();
    let links = pipeline
        .fetch_item_links(&listing)
        .await
        .expect("Link fetch failed");

    assert_eq!(
        links,
        vec![
            format!("{}/catalogue/the-elegant-universe_969/index.html", mock_server.uri()),
            format!("{}/catalogue/sapiens_996/index.html", mock_server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_bad_category_status_yields_no_links() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SCIENCE))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&mock_server, dir.path());
    config.catalog.categories.truncate(1);

    let pipeline = Pipeline::with_policy(config, fast_policy()).expect("Failed to build pipeline");
    let report = pipeline.run(LoadMode::File).await.expect("Pipeline failed");

    assert_eq!(report.categories[0].links_found, 0);
    assert_eq!(report.total_loaded(), 0);
    // Header-only file
    assert_eq!(read_lines(&dir.path().join("data.csv")).len(), 1);
}

#[tokio::test]
async fn test_unparseable_number_aborts_before_loading() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        SCIENCE,
        200,
        listing_html(&["good_1", "sold-out_2"], None),
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/good_1/index.html",
        200,
        product_html("g1", "5.00", "In stock (1 available)", "Fine."),
    )
    .await;
    mount_html(
        &mock_server,
        "/catalogue/sold-out_2/index.html",
        200,
        product_html("s2", "6.00", "Out of stock", "Gone."),
    )
    .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = test_config(&mock_server, dir.path());
    config.catalog.categories.truncate(1);

    let pipeline = Pipeline::with_policy(config, fast_policy()).expect("Failed to build pipeline");
    let result = pipeline.run(LoadMode::File).await;

    assert!(matches!(result, Err(EtlError::Clean(_))));
    assert!(!dir.path().join("data.csv").exists());
}

#[tokio::test]
async fn test_pagination_follows_redirected_listing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalogue/category/books/science_22"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", SCIENCE))
        .mount(&mock_server)
        .await;
    mount_html(
        &mock_server,
        SCIENCE,
        200,
        listing_html(&["a_1"], Some("page-2.html")),
    )
    .await;
    mount_html(
        &mock_server,
        SCIENCE_PAGE_2,
        200,
        listing_html(&["b_2"], None),
    )
    .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&mock_server, dir.path());

    let pipeline = Pipeline::with_policy(config, fast_policy()).expect("Failed to build pipeline");
    let listing = url::Url::parse(&format!(
        "{}/catalogue/category/books/science_22",
        mock_server.uri()
    ))
    .unwrap();
    let links = pipeline
        .fetch_item_links(&listing)
        .await
        .expect("Link fetch failed");

    assert_eq!(
        links,
        vec![
            format!("{}/catalogue/a_1/index.html", mock_server.uri()),
            format!("{}/catalogue/b_2/index.html", mock_server.uri()),
        ]
    );
}
