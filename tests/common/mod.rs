#![allow(dead_code)]

use std::io::Cursor;
use std::time::Duration;

use agri_sage::gemini::{GeminiClient, LlmSettings};
use agri_sage::retry::RetryPolicy;
use axum::Router;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

pub const BOUNDARY: &str = "agri-sage-test-boundary";

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn llm_settings(api_key: Option<&str>, base_url: &str, max_attempts: u32) -> LlmSettings {
    LlmSettings {
        api_key: api_key.map(str::to_string),
        model: "gemini-1.5-flash".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
        },
    }
}

/// A client with no key, i.e. permanently in fallback mode.
pub fn offline_gemini() -> GeminiClient {
    GeminiClient::new(llm_settings(None, "http://127.0.0.1:9", 2)).unwrap()
}

pub fn leaf_png() -> Vec<u8> {
    let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 3) as u8, 140, (y * 5) as u8]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    buffer.into_inner()
}

pub enum Field<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

pub fn multipart(fields: &[Field<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for field in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match field {
            Field::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Field::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"leaf.png\"\r\n\
                         Content-Type: image/png\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
