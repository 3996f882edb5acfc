//! REST client for the pixel-art sharing backend.
//!
//! Thin wrapper over `reqwest::blocking` mirroring the server's JSON API:
//! publish a drawing, page through the recent feed, toggle likes, log in.
//! All calls block — the app runs them on background threads and polls the
//! results through an mpsc channel (see `app.rs`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::canvas::PixelColor;

/// Default backend base URL (development server).
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/api";

/// Feed page size used by the recent-posts panel.
pub const FEED_PAGE_SIZE: usize = 12;

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /posts` — the finished artifact assembled from the caption
/// text and a canvas snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PostPayload {
    pub title: String,
    #[serde(rename = "pixelData")]
    pub pixel_data: Vec<Vec<PixelColor>>,
}

/// One feed entry.  Older posts may carry a CDN `imageUrl` instead of inline
/// pixel data, so both are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "pixelData", default)]
    pub pixel_data: Option<Vec<Vec<PixelColor>>>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "authorUsername", default)]
    pub author_username: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "likeCount", default)]
    pub like_count: i64,
    #[serde(default)]
    pub liked: bool,
    #[serde(rename = "commentCount", default)]
    pub comment_count: i64,
}

/// One page envelope from `GET /posts` (Spring-style pagination).  The
/// server says explicitly whether this is the last page; the client never
/// guesses from the page length.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub content: Vec<Post>,
    #[serde(default)]
    pub last: bool,
    /// Zero-based index of this page.
    #[serde(default)]
    pub number: usize,
}

#[derive(Serialize)]
struct LoginPayload<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

// ============================================================================
// Client
// ============================================================================

/// Blocking HTTP client bound to one server.  A bearer token, when present,
/// is attached to every request.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, String> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| format!("could not create HTTP client: {}", e))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            http,
        })
    }

    fn authorized(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Publish a drawing.  The caller validates the payload (non-empty title,
    /// non-blank canvas) before any network traffic happens.
    pub fn submit_post(&self, payload: &PostPayload) -> Result<(), String> {
        let url = format!("{}/posts", self.base_url);
        let response = self
            .authorized(self.http.post(&url).json(payload))
            .send()
            .map_err(|e| format!("network error: {}", e))?;
        Self::check(response).map(|_| ())
    }

    /// Fetch one page of the recent feed.
    pub fn recent_posts(&self, page: usize, size: usize) -> Result<FeedPage, String> {
        let url = format!("{}/posts?page={}&size={}", self.base_url, page, size);
        let response = self
            .authorized(self.http.get(&url))
            .send()
            .map_err(|e| format!("network error: {}", e))?;
        Self::check(response)?
            .json::<FeedPage>()
            .map_err(|e| format!("malformed feed response: {}", e))
    }

    /// Toggle the current user's like on a post.
    pub fn toggle_like(&self, post_id: &str) -> Result<(), String> {
        let url = format!("{}/posts/{}/like", self.base_url, post_id);
        let response = self
            .authorized(self.http.post(&url))
            .send()
            .map_err(|e| format!("network error: {}", e))?;
        Self::check(response).map(|_| ())
    }

    /// Exchange credentials for a bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<String, String> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginPayload { email, password })
            .send()
            .map_err(|e| format!("network error: {}", e))?;
        let body = Self::check(response)?
            .json::<LoginResponse>()
            .map_err(|e| format!("malformed login response: {}", e))?;
        Ok(body.token)
    }

    /// Map non-2xx statuses to a readable error with a body snippet.
    fn check(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, String> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .text()
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect::<String>();
        if detail.is_empty() {
            Err(format!("server returned {}", status))
        } else {
            Err(format!("server returned {}: {}", status, detail))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PixelCanvas;

    #[test]
    fn test_post_payload_wire_shape() {
        let mut canvas = PixelCanvas::new(2, PixelColor::WHITE);
        canvas.paint(0, 1, PixelColor::new(255, 0, 0));
        let payload = PostPayload {
            title: "tiny".to_string(),
            pixel_data: canvas.snapshot(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["title"], "tiny");
        assert_eq!(json["pixelData"][0][1], "#ff0000");
        assert_eq!(json["pixelData"][1][0], "#ffffff");
        assert_eq!(json["pixelData"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_post_deserializes_with_missing_optionals() {
        let post: Post = serde_json::from_str(
            r#"{"id":"p1","title":"hello","authorUsername":"ada","createdAt":"2024-01-01T00:00:00Z","likeCount":3,"liked":true,"commentCount":0}"#,
        )
        .unwrap();
        assert_eq!(post.id, "p1");
        assert_eq!(post.like_count, 3);
        assert!(post.liked);
        assert!(post.pixel_data.is_none());
        assert!(post.image_url.is_none());
    }

    #[test]
    fn test_post_deserializes_inline_pixel_data() {
        let post: Post = serde_json::from_str(
            r##"{"id":"p2","pixelData":[["#ffffff","#000000"],["#ff0000","#ffffff"]]}"##,
        )
        .unwrap();
        let rows = post.pixel_data.unwrap();
        assert_eq!(rows[0][1], PixelColor::BLACK);
        assert_eq!(rows[1][0], PixelColor::new(255, 0, 0));
    }

    #[test]
    fn test_feed_page_envelope_decodes() {
        let page: FeedPage = serde_json::from_str(
            r#"{"content":[{"id":"p1","title":"t","likeCount":2}],"last":true,"number":0,"totalPages":1,"size":12}"#,
        )
        .unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].id, "p1");
        assert!(page.last);
        assert_eq!(page.number, 0);
    }

    #[test]
    fn test_feed_page_rejects_bare_array() {
        // The server always wraps posts in a page envelope; a bare array is
        // a malformed response, not an alternate encoding.
        assert!(serde_json::from_str::<FeedPage>(r#"[{"id":"p1"}]"#).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://example.test/api/", None).unwrap();
        assert_eq!(client.base_url, "http://example.test/api");
    }
}
