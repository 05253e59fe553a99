use once_cell::sync::Lazy;
use regex::Regex;

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{6,})")
        .expect("static youtube pattern")
});

static VIMEO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)").expect("static vimeo pattern")
});

/// Embeddable player URL for a YouTube or Vimeo link. Other URLs are not embedded.
pub fn embed_url(url: &str) -> Option<String> {
    let url = url.trim();
    if let Some(c) = YOUTUBE.captures(url) {
        return Some(format!("https://www.youtube-nocookie.com/embed/{}", &c[1]));
    }
    if let Some(c) = VIMEO.captures(url) {
        return Some(format!("https://player.vimeo.com/video/{}", &c[1]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_variants() {
        let want = Some("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ".to_string());
        assert_eq!(embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), want);
        assert_eq!(embed_url("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ"), want);
        assert_eq!(embed_url("https://youtu.be/dQw4w9WgXcQ"), want);
        assert_eq!(embed_url("https://www.youtube.com/embed/dQw4w9WgXcQ"), want);
    }

    #[test]
    fn vimeo_variants() {
        let want = Some("https://player.vimeo.com/video/76979871".to_string());
        assert_eq!(embed_url("https://vimeo.com/76979871"), want);
        assert_eq!(embed_url("https://player.vimeo.com/video/76979871"), want);
    }

    #[test]
    fn other_urls_are_not_embedded() {
        assert_eq!(embed_url("https://example.org/video.mp4"), None);
        assert_eq!(embed_url(""), None);
    }
}
