//! Picture-of-the-day client
//!
//! One request per date, returning a media descriptor. The game only uses
//! the image URL for level backgrounds and consumes it best-effort: a fetch
//! failure is logged and the level starts without a custom picture.
//!
//! Date navigation retries are an explicit bounded loop stepping back one
//! calendar day at a time, never a reentrant call.

use std::fmt;

use serde::Deserialize;

/// First date the picture-of-the-day archive covers
pub const ARCHIVE_EPOCH: &str = "1995-06-16";

/// What kind of media a date resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Image,
    Video,
}

/// A single picture-of-the-day entry
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescriptor {
    pub date: String,
    pub media_type: MediaType,
    pub url: String,
    pub title: String,
    pub explanation: String,
}

/// Errors at the provider boundary
#[derive(Debug, Clone, PartialEq)]
pub enum ApodError {
    /// Date string is malformed or outside the archive range
    InvalidDate(String),
    /// Transport-level failure (status code when known)
    Http(Option<u16>),
    /// Response parsed but carried no display URL
    MissingUrl,
    /// Response body was not the expected JSON
    Parse(String),
    /// All fallback dates exhausted
    Exhausted { attempts: u32 },
}

impl fmt::Display for ApodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApodError::InvalidDate(date) => write!(f, "invalid date: {date}"),
            ApodError::Http(Some(status)) => write!(f, "request failed with status {status}"),
            ApodError::Http(None) => write!(f, "request failed"),
            ApodError::MissingUrl => write!(f, "response carried no media URL"),
            ApodError::Parse(msg) => write!(f, "malformed response: {msg}"),
            ApodError::Exhausted { attempts } => {
                write!(f, "no media found after {attempts} fallback attempts")
            }
        }
    }
}

impl std::error::Error for ApodError {}

/// Raw wire shape of a picture-of-the-day response
#[derive(Debug, Deserialize)]
struct RawResponse {
    date: Option<String>,
    media_type: Option<String>,
    url: Option<String>,
    title: Option<String>,
    explanation: Option<String>,
}

/// Parse a response body into a media descriptor
pub fn parse_response(body: &str) -> Result<MediaDescriptor, ApodError> {
    let raw: RawResponse =
        serde_json::from_str(body).map_err(|e| ApodError::Parse(e.to_string()))?;

    let url = raw.url.filter(|u| !u.is_empty()).ok_or(ApodError::MissingUrl)?;
    let media_type = match raw.media_type.as_deref() {
        Some("video") => MediaType::Video,
        // The service reports "image" for stills; anything else is treated
        // as an image so an unknown type still renders something
        _ => MediaType::Image,
    };

    Ok(MediaDescriptor {
        date: raw.date.unwrap_or_default(),
        media_type,
        url,
        title: raw.title.unwrap_or_default(),
        explanation: raw.explanation.unwrap_or_default(),
    })
}

/// Validate a `YYYY-MM-DD` date string against the archive range
pub fn validate_date(date: &str) -> Result<(), ApodError> {
    let Some((y, m, d)) = split_date(date) else {
        return Err(ApodError::InvalidDate(date.to_string()));
    };
    if !(1..=12).contains(&m) || d < 1 || d > days_in_month(y, m) {
        return Err(ApodError::InvalidDate(date.to_string()));
    }
    if date < ARCHIVE_EPOCH {
        return Err(ApodError::InvalidDate(date.to_string()));
    }
    Ok(())
}

fn split_date(date: &str) -> Option<(i32, u32, u32)> {
    let mut parts = date.split('-');
    let y: i32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let d: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || date.len() != 10 {
        return None;
    }
    Some((y, m, d))
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// The calendar day before `date`, or None once the archive epoch is passed
pub fn previous_date(date: &str) -> Option<String> {
    let (mut y, mut m, mut d) = split_date(date)?;
    if d > 1 {
        d -= 1;
    } else if m > 1 {
        m -= 1;
        d = days_in_month(y, m);
    } else {
        y -= 1;
        m = 12;
        d = 31;
    }
    let prev = format!("{y:04}-{m:02}-{d:02}");
    if prev.as_str() < ARCHIVE_EPOCH {
        return None;
    }
    Some(prev)
}

/// Fetch a descriptor for `date`, stepping back one day per failure up to
/// `max_attempts` total tries. The fetch itself is injected so the policy
/// stays testable off the network.
pub fn fetch_with_fallback<F>(
    date: &str,
    max_attempts: u32,
    mut fetch: F,
) -> Result<MediaDescriptor, ApodError>
where
    F: FnMut(&str) -> Result<MediaDescriptor, ApodError>,
{
    validate_date(date)?;

    let mut current = date.to_string();
    let mut attempts = 0;
    while attempts < max_attempts {
        attempts += 1;
        match fetch(&current) {
            Ok(descriptor) => return Ok(descriptor),
            Err(err) => {
                log::warn!("Fetch for {current} failed ({err}); trying previous day");
                match previous_date(&current) {
                    Some(prev) => current = prev,
                    None => break,
                }
            }
        }
    }
    Err(ApodError::Exhausted { attempts })
}

/// Browser-side fetch against the picture-of-the-day endpoint
#[cfg(target_arch = "wasm32")]
pub mod web {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{ApodError, MediaDescriptor, parse_response, validate_date};

    const APOD_ENDPOINT: &str = "https://api.nasa.gov/planetary/apod";

    /// Fetch the descriptor for one date. The API key is served by our own
    /// backend so it never ships in the page source.
    pub async fn fetch_apod(date: &str, api_key: &str) -> Result<MediaDescriptor, ApodError> {
        validate_date(date)?;

        let url = format!("{APOD_ENDPOINT}?api_key={api_key}&date={date}");
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(&url, &opts)
            .map_err(|_| ApodError::Http(None))?;
        let window = web_sys::window().ok_or(ApodError::Http(None))?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|_| ApodError::Http(None))?
            .dyn_into()
            .map_err(|_| ApodError::Http(None))?;

        if !response.ok() {
            return Err(ApodError::Http(Some(response.status())));
        }

        let text = JsFuture::from(response.text().map_err(|_| ApodError::Http(None))?)
            .await
            .map_err(|_| ApodError::Http(None))?;
        let body = text.as_string().ok_or(ApodError::MissingUrl)?;
        parse_response(&body)
    }

    /// Fetch the API key from our backend, once per session
    pub async fn fetch_api_key() -> Result<String, ApodError> {
        let window = web_sys::window().ok_or(ApodError::Http(None))?;
        let response: Response = JsFuture::from(window.fetch_with_str("/api/nasa-key"))
            .await
            .map_err(|_| ApodError::Http(None))?
            .dyn_into()
            .map_err(|_| ApodError::Http(None))?;
        if !response.ok() {
            return Err(ApodError::Http(Some(response.status())));
        }
        let text = JsFuture::from(response.text().map_err(|_| ApodError::Http(None))?)
            .await
            .map_err(|_| ApodError::Http(None))?;
        let body = text.as_string().ok_or(ApodError::MissingUrl)?;

        #[derive(serde::Deserialize)]
        struct KeyResponse {
            key: String,
        }
        let parsed: KeyResponse =
            serde_json::from_str(&body).map_err(|e| ApodError::Parse(e.to_string()))?;
        Ok(parsed.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_response() {
        let body = r#"{
            "date": "2024-11-21",
            "media_type": "image",
            "url": "https://example.com/pic.jpg",
            "title": "A Nebula",
            "explanation": "Gas and dust."
        }"#;
        let desc = parse_response(body).unwrap();
        assert_eq!(desc.media_type, MediaType::Image);
        assert_eq!(desc.url, "https://example.com/pic.jpg");
        assert_eq!(desc.title, "A Nebula");
        assert_eq!(desc.date, "2024-11-21");
    }

    #[test]
    fn test_parse_video_response() {
        let body = r#"{"media_type": "video", "url": "https://example.com/v", "title": "t"}"#;
        let desc = parse_response(body).unwrap();
        assert_eq!(desc.media_type, MediaType::Video);
    }

    #[test]
    fn test_parse_missing_url_rejected() {
        let body = r#"{"date": "2024-01-01", "media_type": "image", "title": "no url"}"#;
        assert_eq!(parse_response(body), Err(ApodError::MissingUrl));

        let body = r#"{"url": "", "media_type": "image"}"#;
        assert_eq!(parse_response(body), Err(ApodError::MissingUrl));
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(matches!(parse_response("not json"), Err(ApodError::Parse(_))));
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2024-11-21").is_ok());
        assert!(validate_date("1995-06-16").is_ok());
        assert!(validate_date("2024-02-29").is_ok()); // leap day

        assert!(validate_date("1995-06-15").is_err()); // before the archive
        assert!(validate_date("2023-02-29").is_err()); // not a leap year
        assert!(validate_date("2024-13-01").is_err());
        assert!(validate_date("2024-00-10").is_err());
        assert!(validate_date("2024-1-1").is_err()); // not zero-padded
        assert!(validate_date("garbage").is_err());
        assert!(validate_date("").is_err());
    }

    #[test]
    fn test_previous_date_steps_back() {
        assert_eq!(previous_date("2024-11-21").unwrap(), "2024-11-20");
        assert_eq!(previous_date("2024-03-01").unwrap(), "2024-02-29");
        assert_eq!(previous_date("2023-03-01").unwrap(), "2023-02-28");
        assert_eq!(previous_date("2024-01-01").unwrap(), "2023-12-31");
        // Stepping past the archive epoch stops
        assert_eq!(previous_date("1995-06-16"), None);
    }

    #[test]
    fn test_fallback_succeeds_on_later_attempt() {
        let mut calls = Vec::new();
        let result = fetch_with_fallback("2024-11-21", 5, |date| {
            calls.push(date.to_string());
            if date == "2024-11-19" {
                Ok(MediaDescriptor {
                    date: date.to_string(),
                    media_type: MediaType::Image,
                    url: "https://example.com/x.jpg".into(),
                    title: String::new(),
                    explanation: String::new(),
                })
            } else {
                Err(ApodError::Http(Some(404)))
            }
        });
        assert_eq!(result.unwrap().date, "2024-11-19");
        assert_eq!(calls, vec!["2024-11-21", "2024-11-20", "2024-11-19"]);
    }

    #[test]
    fn test_fallback_is_bounded() {
        let mut calls = 0;
        let result = fetch_with_fallback("2024-11-21", 3, |_| {
            calls += 1;
            Err(ApodError::Http(Some(500)))
        });
        assert_eq!(result, Err(ApodError::Exhausted { attempts: 3 }));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_fallback_rejects_invalid_date_without_fetching() {
        let mut calls = 0;
        let result = fetch_with_fallback("2024-13-40", 3, |_| {
            calls += 1;
            Err(ApodError::Http(None))
        });
        assert!(matches!(result, Err(ApodError::InvalidDate(_))));
        assert_eq!(calls, 0);
    }
}
