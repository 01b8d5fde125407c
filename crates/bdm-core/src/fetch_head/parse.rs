//! Parse HTTP response header lines into HeadResult.

use super::HeadResult;

/// Parse collected header lines into HeadResult. Unknown or malformed lines are ignored.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut result = HeadResult::default();

    for line in lines {
        let Some((name, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if name.eq_ignore_ascii_case("content-length") {
            result.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("content-type") {
            result.content_type = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-disposition") {
            result.content_disposition = Some(value.to_string());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_disposition() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 200 OK",
            "Content-Disposition: attachment; filename=\"report.pdf\"",
            "Content-Length: 12345",
        ]));
        assert_eq!(
            r.content_disposition.as_deref(),
            Some("attachment; filename=\"report.pdf\"")
        );
        assert_eq!(r.content_length, Some(12345));
    }

    #[test]
    fn parse_headers_case_insensitive() {
        let r = parse_headers(&lines(&["content-type: application/zip", "CONTENT-LENGTH: 9"]));
        assert_eq!(r.content_type.as_deref(), Some("application/zip"));
        assert_eq!(r.content_length, Some(9));
    }

    #[test]
    fn parse_headers_ignores_garbage() {
        let r = parse_headers(&lines(&["garbage", "Content-Length: lots", "Content-Disposition:"]));
        assert_eq!(r, HeadResult::default());
    }
}
