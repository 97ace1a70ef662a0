use time::{
    format_description::{well_known::Rfc2822, BorrowedFormatItem},
    macros::format_description,
    OffsetDateTime, PrimitiveDateTime, UtcOffset,
};
use tracing::warn;

const NAIVE_HTTP_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[optional [[weekday repr:short], ]][day] [month repr:short] [year] [hour]:[minute]:[second]"
);

/// Parses an HTTP `Date` header. A value without a zone designator is taken
/// as UTC.
pub fn parse_http_date(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let value = value.trim();

    match OffsetDateTime::parse(value, &Rfc2822) {
        Ok(date) => Ok(date),
        Err(err) => PrimitiveDateTime::parse(
            value.trim_end_matches(" GMT").trim_end_matches(" UT"),
            NAIVE_HTTP_DATE,
        )
        .map(|date| date.assume_utc())
        .map_err(|_| err),
    }
}

pub fn local_offset() -> UtcOffset {
    match UtcOffset::current_local_offset() {
        Ok(offset) => offset,
        Err(err) => {
            warn!(error_message=%err, error_group="local_offset", "falling back to utc");
            UtcOffset::UTC
        }
    }
}

/// Local wall-clock time of `date`, without zone.
pub fn to_local_naive(date: OffsetDateTime) -> PrimitiveDateTime {
    let local = date.to_offset(local_offset());
    PrimitiveDateTime::new(local.date(), local.time())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_parse_http_date() {
        let cases = vec![
            ("Tue, 15 Nov 1994 08:12:31 GMT", datetime!(1994-11-15 08:12:31 UTC)),
            ("Tue, 15 Nov 1994 08:12:31 +0000", datetime!(1994-11-15 08:12:31 UTC)),
            ("Tue, 15 Nov 1994 10:12:31 +0200", datetime!(1994-11-15 08:12:31 UTC)),
            ("Tue, 15 Nov 1994 08:12:31", datetime!(1994-11-15 08:12:31 UTC)),
            ("15 Nov 1994 08:12:31", datetime!(1994-11-15 08:12:31 UTC)),
            ("15 Nov 1994 08:12:31 GMT", datetime!(1994-11-15 08:12:31 UTC)),
        ];

        for (input, expected) in cases {
            let result = parse_http_date(input).unwrap();
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_parse_http_date_invalid() {
        assert!(parse_http_date("yesterday").is_err());
        assert!(parse_http_date("").is_err());
    }

    #[test]
    fn test_to_local_naive() {
        let date = datetime!(1994-11-15 08:12:31 UTC);

        let result = to_local_naive(date);
        assert_eq!(result.assume_offset(local_offset()), date);
    }
}
