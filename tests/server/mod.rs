//! In-process stand-in for the crawled sites and the three hosted services.
//!
//! Site pages live under `/pages/*`. The crawl API (`/v1/scrape`) picks the
//! page to return from the requested URL, so tests can ask for
//! `https://optimized.test/` and get the optimized page without DNS.

#![allow(dead_code)]

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use serde_json::{Value, json};
use std::time::Duration;

pub const CRAWL_KEY: &str = "fc-test-key";
pub const KEYWORD_KEY: &str = "exa-test-key";
pub const LLM_KEY: &str = "gsk-test-key";

/// Seconds the slow page and slow scrape take to answer
pub const SLOW_SECS: u64 = 3;

pub const LLM_OK_TEXT: &str = "\
## High priority:
1. **Compress hero images** and enable browser caching to cut the page load time.
2. Add a meta description that summarises the page in under 160 characters.

## Low priority:
- Consider adding FAQ schema markup to become eligible for rich results.
Thanks!";

pub fn optimized_page() -> String {
    let body = "lorem ipsum dolor sit amet ".repeat(180);
    let links = "<a href=\"/pages/bare\">more</a>".repeat(6);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Optimized Test Page</title>
<meta name="description" content="A well optimized page used by the integration tests.">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="canonical" href="/pages/optimized">
<meta property="og:title" content="Optimized Test Page">
<script type="application/ld+json">{{"@type": "WebPage"}}</script>
</head>
<body>
<h1>Optimized</h1>
<h2>Details</h2>
<p>{body}</p>
{links}
<a href="https://external.test/">external</a>
<img src="hero.png" alt="hero">
</body>
</html>"#
    )
}

pub fn bare_page() -> String {
    "<html><body><p>Just a few words here.</p></body></html>".to_string()
}

async fn page(path: web::Path<String>) -> HttpResponse {
    match path.as_str() {
        "optimized" => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(optimized_page()),
        "bare" => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(bare_page()),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(SLOW_SECS)).await;
            HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(optimized_page())
        }
        "server-error" => HttpResponse::InternalServerError().body("Error"),
        _ => HttpResponse::NotFound().body("Not Found"),
    }
}

fn bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn scrape(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    if bearer(&req).as_deref() != Some(CRAWL_KEY) {
        return HttpResponse::Unauthorized().json(json!({"success": false, "error": "Unauthorized"}));
    }

    let url = body["url"].as_str().unwrap_or_default().to_string();

    if url.contains("slow") {
        tokio::time::sleep(Duration::from_secs(SLOW_SECS)).await;
    }

    if url.contains("missing") {
        return HttpResponse::Ok().json(json!({
            "success": true,
            "data": { "rawHtml": "<html></html>", "metadata": { "statusCode": 404 } }
        }));
    }

    if url.contains("refused") {
        return HttpResponse::Ok().json(json!({"success": false, "error": "Site refused the crawl"}));
    }

    if url.contains("garbled") {
        return HttpResponse::Ok()
            .content_type("application/json")
            .body("{ this is not json");
    }

    let (html, title) = if url.contains("bare") {
        (bare_page(), Value::Null)
    } else if url.contains("titled") {
        // Only the metadata carries the title
        (bare_page(), json!(["Metadata Title"]))
    } else {
        (optimized_page(), json!("Optimized Test Page"))
    };

    HttpResponse::Ok().json(json!({
        "success": true,
        "data": {
            "rawHtml": html,
            "metadata": { "statusCode": 200, "sourceURL": url, "title": title }
        }
    }))
}

async fn search(req: HttpRequest, body: web::Json<Value>) -> HttpResponse {
    let key = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());
    if key != Some(KEYWORD_KEY) || bearer(&req).as_deref() != Some(KEYWORD_KEY) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"}));
    }

    let query = body["query"].as_str().unwrap_or_default();
    if query.contains("fail") {
        return HttpResponse::InternalServerError().body("search backend exploded");
    }

    // Three results per word, capped at numResults
    let requested = body["numResults"].as_u64().unwrap_or(10) as usize;
    let count = (query.split_whitespace().count() * 3).min(requested);
    let results: Vec<Value> = (0..count)
        .map(|i| json!({"title": format!("{} result {}", query, i), "url": format!("https://r{}.test/", i)}))
        .collect();

    HttpResponse::Ok().json(json!({ "results": results }))
}

async fn chat(req: HttpRequest, mode: web::Path<String>) -> HttpResponse {
    if bearer(&req).as_deref() != Some(LLM_KEY) {
        return HttpResponse::Unauthorized().json(json!({"error": {"message": "Invalid API Key"}}));
    }

    match mode.as_str() {
        "ok" => HttpResponse::Ok().json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": LLM_OK_TEXT } }]
        })),
        "empty" => HttpResponse::Ok().json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "" } }]
        })),
        "chatter" => HttpResponse::Ok().json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Sure!\nOk." } }]
        })),
        "garbage" => HttpResponse::Ok()
            .content_type("application/json")
            .body("<html>gateway</html>"),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(SLOW_SECS)).await;
            HttpResponse::Ok().json(json!({"choices": []}))
        }
        _ => HttpResponse::InternalServerError().json(json!({"error": {"message": "model overloaded"}})),
    }
}

/// Starts the mock server on a random port and returns its base URL
pub async fn start_mock_server() -> String {
    let http_server = HttpServer::new(|| {
        App::new()
            .route("/pages/{name}", web::get().to(page))
            .route("/v1/scrape", web::post().to(scrape))
            .route("/search", web::post().to(search))
            .route("/llm/{mode}/chat/completions", web::post().to(chat))
    })
    .workers(2)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");

    let addr = http_server
        .addrs()
        .first()
        .cloned()
        .expect("No address bound");
    let url = format!("http://{}", addr);

    let app_server = http_server.run();

    tokio::spawn(async move {
        if let Err(e) = app_server.await {
            eprintln!("Test server error: {}", e);
        }
    });

    url
}
