#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    Invalid,
    Unsatisfiable,
}

// An end past EOF is clamped to the last byte. Multiple ranges are rejected.
pub fn parse_range_header(value: &str, size: u64) -> Result<ByteRange, RangeError> {
    let spec = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Invalid)?
        .trim();
    if spec.contains(',') {
        return Err(RangeError::Invalid);
    }
    if size == 0 {
        return Err(RangeError::Unsatisfiable);
    }
    let last = size - 1;

    let (start, end) = spec.split_once('-').ok_or(RangeError::Invalid)?;
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        let suffix = parse_offset(end)?;
        if suffix == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        return Ok(ByteRange {
            start: size.saturating_sub(suffix),
            end: last,
        });
    }

    let start = parse_offset(start)?;
    if start > last {
        return Err(RangeError::Unsatisfiable);
    }
    let end = if end.is_empty() {
        last
    } else {
        let end = parse_offset(end)?;
        if end < start {
            return Err(RangeError::Invalid);
        }
        end.min(last)
    };

    Ok(ByteRange { start, end })
}

fn parse_offset(value: &str) -> Result<u64, RangeError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Invalid);
    }
    value.parse().map_err(|_| RangeError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::{parse_range_header, ByteRange, RangeError};

    #[test]
    fn closed_range() {
        let range = parse_range_header("bytes=100-199", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 100, end: 199 });
        assert_eq!(range.len(), 100);
        assert_eq!(range.content_range(1000), "bytes 100-199/1000");
    }

    #[test]
    fn open_ended_runs_to_eof() {
        let range = parse_range_header("bytes=0-", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 999 });
    }

    #[test]
    fn end_past_eof_is_clamped() {
        let range = parse_range_header("bytes=900-2000", 1000).unwrap();
        assert_eq!(range, ByteRange { start: 900, end: 999 });
        assert_eq!(range.len(), 100);
    }

    #[test]
    fn suffix_form() {
        assert_eq!(
            parse_range_header("bytes=-10", 1000).unwrap(),
            ByteRange { start: 990, end: 999 }
        );
        assert_eq!(
            parse_range_header("bytes=-5000", 1000).unwrap(),
            ByteRange { start: 0, end: 999 }
        );
        assert_eq!(parse_range_header("bytes=-0", 1000), Err(RangeError::Unsatisfiable));
    }

    #[test]
    fn single_byte_at_end() {
        let range = parse_range_header("bytes=999-999", 1000).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn malformed_headers() {
        for header in [
            "items=0-1",
            "bytes=0-1,5-9",
            "bytes=abc-",
            "bytes=10-5",
            "bytes=-",
            "bytes=5",
            "bytes=+1-4",
        ] {
            assert_eq!(parse_range_header(header, 1000), Err(RangeError::Invalid), "{}", header);
        }
    }

    #[test]
    fn start_past_eof_is_unsatisfiable() {
        assert_eq!(parse_range_header("bytes=1000-", 1000), Err(RangeError::Unsatisfiable));
        assert_eq!(parse_range_header("bytes=0-", 0), Err(RangeError::Unsatisfiable));
    }
}
