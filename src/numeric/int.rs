//! Decimal integer conversion

use crate::error::NumericError;

/// Convert a byte span holding an optionally-signed decimal integer
/// literal into an `i64`.
///
/// The span must consist of an optional leading `+` or `-` followed by
/// one or more ASCII digits and nothing else. An empty span, a bare
/// sign, or any other character fails with [`NumericError::Malformed`];
/// a magnitude outside `i64` fails with [`NumericError::Overflow`] and
/// never wraps or saturates.
///
/// # Examples
///
/// ```
/// use dftxml::numeric::parse_int;
///
/// assert_eq!(parse_int(b"-128"), Ok(-128));
/// assert!(parse_int(b"12.5").is_err());
/// ```
pub fn parse_int(span: &[u8]) -> Result<i64, NumericError> {
    let (negative, digits) = match span.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        Some(_) => (false, span),
        None => return Err(NumericError::Malformed),
    };

    if digits.is_empty() {
        return Err(NumericError::Malformed);
    }

    // Accumulate on the negative side so that i64::MIN round-trips.
    let mut acc: i64 = 0;
    for &b in digits {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return Err(NumericError::Malformed);
        }
        acc = acc
            .checked_mul(10)
            .and_then(|acc| acc.checked_sub(i64::from(d)))
            .ok_or(NumericError::Overflow)?;
    }

    if negative {
        Ok(acc)
    } else {
        acc.checked_neg().ok_or(NumericError::Overflow)
    }
}
