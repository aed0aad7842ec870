//! Range header resolution.
//!
//! The streaming endpoint answers 206 even for whole-file responses; that
//! asymmetry is part of this service's documented contract and is
//! preserved as-is rather than corrected to 200.

use medway_store::ByteRange;

/// How a request's Range header maps onto a blob of `total` bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No header, or one too malformed to act on: serve the whole blob.
    Whole,
    Range(ByteRange),
    /// A unit other than `bytes`.
    UnsupportedUnit,
    /// Multiple ranges, or bounds outside the blob.
    Unsatisfiable,
}

/// Resolve a raw Range header against the blob's total length.
///
/// Single byte ranges only: `start-end`, `start-`, and the `-suffix` form.
/// `end` past the last byte clamps; `start` past the last byte does not.
pub fn resolve_range(header: Option<&str>, total: u64) -> RangeOutcome {
    let Some(raw) = header else {
        return RangeOutcome::Whole;
    };

    let Some((unit, spec)) = raw.trim().split_once('=') else {
        return RangeOutcome::Whole;
    };
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return RangeOutcome::UnsupportedUnit;
    }
    if spec.contains(',') {
        return RangeOutcome::Unsatisfiable;
    }
    if total == 0 {
        return RangeOutcome::Unsatisfiable;
    }

    let Some((start_raw, end_raw)) = spec.trim().split_once('-') else {
        return RangeOutcome::Whole;
    };

    let (start, end) = if start_raw.is_empty() {
        // Suffix form: the last N bytes.
        let Ok(suffix) = end_raw.parse::<u64>() else {
            return RangeOutcome::Whole;
        };
        if suffix == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        (total.saturating_sub(suffix), total - 1)
    } else {
        let Ok(start) = start_raw.parse::<u64>() else {
            return RangeOutcome::Whole;
        };
        let end = if end_raw.is_empty() {
            total - 1
        } else {
            let Ok(end) = end_raw.parse::<u64>() else {
                return RangeOutcome::Whole;
            };
            end.min(total - 1)
        };
        (start, end)
    };

    if start >= total || start > end {
        return RangeOutcome::Unsatisfiable;
    }

    match ByteRange::new(start, end, total) {
        Ok(range) => RangeOutcome::Range(range),
        Err(_) => RangeOutcome::Unsatisfiable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u64, end: u64, total: u64) -> RangeOutcome {
        RangeOutcome::Range(ByteRange::new(start, end, total).unwrap())
    }

    #[test]
    fn test_no_header_serves_whole_blob() {
        assert_eq!(resolve_range(None, 1000), RangeOutcome::Whole);
    }

    #[test]
    fn test_simple_range() {
        assert_eq!(resolve_range(Some("bytes=0-99"), 1000), range(0, 99, 1000));
        assert_eq!(
            resolve_range(Some("bytes=500-999"), 1000),
            range(500, 999, 1000)
        );
    }

    #[test]
    fn test_open_ended_range_runs_to_last_byte() {
        assert_eq!(resolve_range(Some("bytes=500-"), 1000), range(500, 999, 1000));
    }

    #[test]
    fn test_suffix_range_takes_last_bytes() {
        assert_eq!(resolve_range(Some("bytes=-500"), 1000), range(500, 999, 1000));
        // Suffix longer than the blob means the whole blob.
        assert_eq!(resolve_range(Some("bytes=-5000"), 1000), range(0, 999, 1000));
        assert_eq!(
            resolve_range(Some("bytes=-0"), 1000),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn test_end_clamps_to_blob_length() {
        assert_eq!(
            resolve_range(Some("bytes=900-2000"), 1000),
            range(900, 999, 1000)
        );
    }

    #[test]
    fn test_start_past_end_of_blob_is_unsatisfiable() {
        assert_eq!(
            resolve_range(Some("bytes=1000-1100"), 1000),
            RangeOutcome::Unsatisfiable
        );
        assert_eq!(
            resolve_range(Some("bytes=1500-"), 1000),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn test_inverted_range_is_unsatisfiable() {
        assert_eq!(
            resolve_range(Some("bytes=99-0"), 1000),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn test_multiple_ranges_rejected_even_when_bounds_are_valid() {
        assert_eq!(
            resolve_range(Some("bytes=0-99,200-299"), 1000),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn test_non_byte_unit_rejected() {
        assert_eq!(
            resolve_range(Some("items=0-99"), 1000),
            RangeOutcome::UnsupportedUnit
        );
    }

    #[test]
    fn test_malformed_header_falls_back_to_whole_blob() {
        assert_eq!(resolve_range(Some("bytes"), 1000), RangeOutcome::Whole);
        assert_eq!(resolve_range(Some("bytes="), 1000), RangeOutcome::Whole);
        assert_eq!(resolve_range(Some("bytes=abc-def"), 1000), RangeOutcome::Whole);
    }

    #[test]
    fn test_empty_blob_cannot_satisfy_any_range() {
        assert_eq!(
            resolve_range(Some("bytes=0-0"), 0),
            RangeOutcome::Unsatisfiable
        );
        assert_eq!(resolve_range(None, 0), RangeOutcome::Whole);
    }
}
