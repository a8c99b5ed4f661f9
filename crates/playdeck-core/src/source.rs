//! Media source classification

use url::Url;

/// How a video source has to be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Assigned straight to the media element
    Direct,
    /// Manifest handed to the adaptive-streaming engine
    AdaptiveStream,
}

/// Classify `source` by the extension of its path.
///
/// Query strings and fragments are ignored, and relative URIs are resolved
/// against a placeholder base so `/videos/a.m3u8?token=x` still counts as a
/// manifest.
pub fn classify(source: &str, stream_extensions: &[String]) -> SourceKind {
    let path = source_path(source).to_ascii_lowercase();
    let is_manifest = stream_extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        !ext.is_empty()
            && path
                .rsplit_once('.')
                .map(|(_, found)| found == ext)
                .unwrap_or(false)
    });

    if is_manifest {
        SourceKind::AdaptiveStream
    } else {
        SourceKind::Direct
    }
}

fn source_path(source: &str) -> String {
    if let Ok(url) = Url::parse(source) {
        return url.path().to_string();
    }
    match Url::parse("http://localhost/").and_then(|base| base.join(source)) {
        Ok(url) => url.path().to_string(),
        Err(_) => source
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hls() -> Vec<String> {
        vec!["m3u8".to_string()]
    }

    #[test]
    fn test_classify_direct() {
        assert_eq!(classify("/videos/sample1.mp4", &hls()), SourceKind::Direct);
        assert_eq!(
            classify("https://cdn.example.com/movie.webm", &hls()),
            SourceKind::Direct
        );
    }

    #[test]
    fn test_classify_manifest() {
        assert_eq!(
            classify("https://cdn.example.com/live/master.m3u8", &hls()),
            SourceKind::AdaptiveStream
        );
        assert_eq!(classify("/streams/master.M3U8", &hls()), SourceKind::AdaptiveStream);
    }

    #[test]
    fn test_classify_ignores_query_and_fragment() {
        assert_eq!(
            classify("/streams/master.m3u8?token=abc#t=10", &hls()),
            SourceKind::AdaptiveStream
        );
        assert_eq!(
            classify("https://cdn.example.com/video.mp4?format=m3u8", &hls()),
            SourceKind::Direct
        );
    }

    #[test]
    fn test_classify_custom_extensions() {
        let exts = vec![".mpd".to_string(), "m3u8".to_string()];
        assert_eq!(classify("manifest.mpd", &exts), SourceKind::AdaptiveStream);
        assert_eq!(classify("manifest.m3u8", &exts), SourceKind::AdaptiveStream);
        assert_eq!(classify("clip.mp4", &exts), SourceKind::Direct);
    }
}
