//! Plain-text extraction from fetched HTML pages.

use std::borrow::Cow;

use anyhow::Result;
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use lazy_static::lazy_static;
use regex::Regex;

use pitchforge_core::api::{ContentExtractor, ExtractorConfig};

use crate::http::{build_client, preview_body, ProviderHttpError};

const NAME: &str = "extractor";
const META_SCAN_BYTES: usize = 4096;
/// Pages declaring more than this many times the body limit are not fetched.
const DECLARED_LENGTH_FACTOR: u64 = 8;
const NOISE_TAGS: [&str; 8] = [
    "script", "style", "noscript", "svg", "nav", "footer", "header", "form",
];

lazy_static! {
    static ref NOISE_BLOCKS: Vec<Regex> = NOISE_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b.*?</{tag}\s*>")).unwrap())
        .collect();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref BLOCK_BREAK: Regex =
        Regex::new(r"(?i)</?(p|div|br|li|h[1-6]|tr|section|article|blockquote)\b[^>]*>").unwrap();
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#\d+|#x[0-9a-fA-F]+|[a-zA-Z]+);").unwrap();
    static ref INLINE_SPACE: Regex = Regex::new(r"[ \t\r\f\u{a0}]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\s*\n\s*").unwrap();
    static ref HEADER_CHARSET: Regex = Regex::new(r#"(?i)charset\s*=\s*"?([\w.:-]+)"#).unwrap();
    static ref META_CHARSET: Regex =
        Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([\w.:-]+)"#).unwrap();
}

/// Fetches a page and reduces it to readable text.
pub struct HtmlExtractor {
    http: reqwest::Client,
    max_body_bytes: usize,
}

impl HtmlExtractor {
    pub fn new(cfg: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            http: build_client(cfg.timeout_ms, Some(&cfg.user_agent))?,
            max_body_bytes: cfg.max_body_bytes,
        })
    }
}

#[async_trait]
impl ContentExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<Option<String>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ProviderHttpError::from_reqwest(NAME, err, url.to_string()))?;

        let status = resp.status();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(declared) = resp.content_length() {
            if declared > self.declared_length_cap() {
                tracing::debug!(%url, declared, limit = self.max_body_bytes, "skipping oversized page");
                return Ok(None);
            }
        }

        let bytes = read_limited(resp, self.max_body_bytes, url).await?;

        if !status.is_success() {
            let preview = preview_body(&String::from_utf8_lossy(&bytes));
            return Err(
                ProviderHttpError::status_error(NAME, status.as_u16(), url.to_string(), preview).into(),
            );
        }
        if let Some(ct) = &content_type {
            if !is_textual(ct) {
                tracing::debug!(%url, content_type = %ct, "skipping non-text page");
                return Ok(None);
            }
        }

        let body = bytes.as_slice();
        let html = decode_body(body, content_type.as_deref());
        let text = html_to_text(&html);
        tracing::debug!(%url, chars = text.chars().count(), "page extracted");
        Ok((!text.is_empty()).then_some(text))
    }
}

impl HtmlExtractor {
    fn declared_length_cap(&self) -> u64 {
        (self.max_body_bytes as u64).saturating_mul(DECLARED_LENGTH_FACTOR)
    }
}

/// Read at most `limit` bytes of the body, chunk by chunk.
async fn read_limited(mut resp: reqwest::Response, limit: usize, url: &str) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(limit.min(64 * 1024));
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|err| ProviderHttpError::from_reqwest(NAME, err, url.to_string()))?
    {
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn is_textual(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.starts_with("text/") || ct.contains("html") || ct.contains("xml")
}

/// Decode with the charset from the header, then `<meta>`, then UTF-8.
pub fn decode_body<'a>(body: &'a [u8], content_type: Option<&str>) -> Cow<'a, str> {
    let encoding = content_type
        .and_then(|ct| HEADER_CHARSET.captures(ct))
        .and_then(|c| Encoding::for_label(c[1].as_bytes()))
        .or_else(|| {
            let head = String::from_utf8_lossy(&body[..body.len().min(META_SCAN_BYTES)]);
            META_CHARSET
                .captures(&head)
                .and_then(|c| Encoding::for_label(c[1].as_bytes()))
        })
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(body);
    text
}

pub fn html_to_text(html: &str) -> String {
    let mut text = COMMENT.replace_all(html, " ").into_owned();
    for block in NOISE_BLOCKS.iter() {
        text = block.replace_all(&text, " ").into_owned();
    }
    let text = BLOCK_BREAK.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, " ");
    let text = ENTITY.replace_all(&text, |caps: &regex::Captures| decode_entity(&caps[1], &caps[0]));
    let text = INLINE_SPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n");
    text.trim().to_string()
}

fn decode_entity(name: &str, raw: &str) -> String {
    let decoded = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ if name.starts_with("#x") || name.starts_with("#X") => {
            u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
        }
        _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
        _ => None,
    };
    decoded.map(String::from).unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            timeout_ms: 1_000,
            ..ExtractorConfig::default()
        }
    }

    #[test]
    fn test_html_to_text_drops_markup_and_noise() {
        let html = r#"<html><head><style>p{color:red}</style></head><body>
            <nav>Home | About</nav>
            <script>var x = "<p>hidden</p>";</script>
            <h1>Pet food market</h1>
            <p>Sales grew &amp; margins held at 12&#37;.</p>
            <!-- tracking -->
            <p>Owners   prefer&nbsp;natural brands.</p>
            <footer>Copyright</footer>
        </body></html>"#;
        assert_eq!(
            html_to_text(html),
            "Pet food market\nSales grew & margins held at 12%.\nOwners prefer natural brands."
        );
    }

    #[test]
    fn test_unknown_entity_is_kept() {
        assert_eq!(html_to_text("a &bogus; b"), "a &bogus; b");
    }

    #[test]
    fn test_decode_body_uses_header_then_meta_charset() {
        let latin1 = b"caf\xe9";
        assert_eq!(decode_body(latin1, Some("text/html; charset=ISO-8859-1")), "café");

        let with_meta = b"<meta charset=\"windows-1252\"><p>na\xefve</p>";
        assert!(decode_body(with_meta, Some("text/html")).contains("naïve"));

        assert_eq!(decode_body("olá".as_bytes(), None), "olá");
    }

    #[tokio::test]
    async fn test_extract_fetches_and_cleans_page() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/article")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body><p>Dental clinics report rising demand.</p></body></html>")
            .create_async()
            .await;

        let extractor = HtmlExtractor::new(&config()).unwrap();
        let text = extractor
            .extract(&format!("{}/article", server.url()))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("Dental clinics report rising demand."));
    }

    #[tokio::test]
    async fn test_extract_skips_binary_and_reports_status() {
        let mut server = Server::new_async().await;
        let _pdf = server
            .mock("GET", "/report.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.7")
            .create_async()
            .await;
        let _gone = server
            .mock("GET", "/gone")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let extractor = HtmlExtractor::new(&config()).unwrap();
        assert_eq!(
            extractor
                .extract(&format!("{}/report.pdf", server.url()))
                .await
                .unwrap(),
            None
        );
        let err = extractor
            .extract(&format!("{}/gone", server.url()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("status=404"), "{err}");
    }

    fn small_limit() -> ExtractorConfig {
        ExtractorConfig {
            max_body_bytes: 100,
            ..config()
        }
    }

    #[tokio::test]
    async fn test_extract_truncates_large_bodies() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/big")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("x".repeat(500))
            .create_async()
            .await;

        let extractor = HtmlExtractor::new(&small_limit()).unwrap();
        let text = extractor
            .extract(&format!("{}/big", server.url()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(text.len(), 100);
    }

    #[tokio::test]
    async fn test_extract_stops_reading_streamed_body_at_limit() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/endless")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_chunked_body(|w| {
                let block = [b'y'; 4096];
                for _ in 0..256 {
                    w.write_all(&block)?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let extractor = HtmlExtractor::new(&small_limit()).unwrap();
        let text = extractor
            .extract(&format!("{}/endless", server.url()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(text, "y".repeat(100));
    }

    #[tokio::test]
    async fn test_extract_skips_page_declaring_oversized_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/huge")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("z".repeat(5_000))
            .create_async()
            .await;

        let extractor = HtmlExtractor::new(&small_limit()).unwrap();
        let text = extractor
            .extract(&format!("{}/huge", server.url()))
            .await
            .unwrap();
        assert_eq!(text, None);
    }
}
