// src/gps/nmea.rs
//! NMEA sentence framing, validation and parsing

use super::data::PositionFix;
use serde::{Deserialize, Serialize};

/// Maximum number of bytes collected for one sentence before it is discarded.
const SENTENCE_CAPACITY: usize = 1000;

/// Maximum number of fields extracted from one sentence.
const MAX_FIELDS: usize = 20;

/// Receivers report altitude in metres; the fix record carries feet.
const METRES_TO_FEET: f64 = 3.28;

/// Sentence start marker.
const SENTENCE_START: u8 = b'$';

/// How numeric fields (altitude, speed, bearing) that fail to parse are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericFieldPolicy {
    /// A malformed numeric field rejects the whole sentence.
    #[default]
    Reject,
    /// A malformed numeric field is read as zero.
    Zero,
}

/// Streaming NMEA-0183 decoder.
///
/// Accepts raw receiver bytes in chunks of any size, re-assembles complete
/// `$`-to-line-feed sentences, validates their checksums and applies valid
/// GGA/RMC sentences to a position fix record.
pub struct NmeaDecoder {
    buffer: Vec<u8>,
    collecting: bool,
    policy: NumericFieldPolicy,
}

impl NmeaDecoder {
    pub fn new() -> Self {
        Self::with_policy(NumericFieldPolicy::default())
    }

    pub fn with_policy(policy: NumericFieldPolicy) -> Self {
        Self {
            buffer: Vec::with_capacity(SENTENCE_CAPACITY),
            collecting: false,
            policy,
        }
    }

    /// Feed a chunk of raw receiver bytes, updating `position` for every
    /// complete, valid sentence found. Sentences may span several chunks.
    ///
    /// Returns the number of updates applied to `position`.
    pub fn feed(&mut self, chunk: &[u8], position: &mut PositionFix) -> usize {
        let mut applied = 0;

        for &byte in chunk {
            if byte == SENTENCE_START {
                // Idempotent: a '$' inside a sentence is collected as data.
                self.collecting = true;
            }

            if !self.collecting {
                continue;
            }

            if self.buffer.len() == SENTENCE_CAPACITY {
                // The sentence overran the buffer; drop it and wait for the
                // next start marker.
                self.reset();
                continue;
            }

            self.buffer.push(byte);

            if byte == b'\x0A' {
                if self.handle_sentence(position) {
                    applied += 1;
                }
                self.reset();
            }
        }

        applied
    }

    /// True when no sentence is being collected and the buffer is empty.
    pub fn is_idle(&self) -> bool {
        !self.collecting && self.buffer.is_empty()
    }

    /// Validate and dispatch the complete sentence sitting in the buffer.
    fn handle_sentence(&self, position: &mut PositionFix) -> bool {
        // The buffer always starts with '$'; checksum and dispatch work on
        // the body after it.
        let body = &self.buffer[1..];

        if !verify_checksum(body) {
            return false;
        }

        // A body too short to carry the type tag at offset 2 is discarded.
        if body.len() < 5 {
            return false;
        }

        let sentence = match std::str::from_utf8(body) {
            Ok(s) => s,
            Err(_) => return false,
        };

        let fields = split_fields(sentence);

        let update = if &body[2..5] == b"GGA" {
            parse_gga(&fields, position, self.policy)
        } else if &body[2..5] == b"RMC" {
            parse_rmc(&fields, position, self.policy)
        } else {
            None
        };

        match update {
            Some(fix) => {
                *position = fix;
                true
            }
            None => false,
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.collecting = false;
    }
}

impl Default for NmeaDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// XOR checksum over a byte range.
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |sum, &b| sum ^ b)
}

/// Verify the trailing `*HH` checksum of a sentence body (the bytes after `$`).
///
/// `HH` is the XOR of every byte before the final `*`, rendered as two
/// uppercase hex digits; the compare is case-sensitive. A body without a `*`
/// (or with one only at the very start) fails.
pub fn verify_checksum(body: &[u8]) -> bool {
    let star = match body.iter().rposition(|&b| b == b'*') {
        Some(pos) if pos > 0 => pos,
        _ => return false,
    };

    let digits = match body.get(star + 1..star + 3) {
        Some(d) => d,
        None => return false,
    };

    format!("{:02X}", checksum(&body[..star])).as_bytes() == digits
}

/// Split a sentence into its fields.
///
/// Comma, carriage-return and line-feed all delimit, so a trailing `\r\n`
/// yields empty fields rather than sticking to the last value. At most
/// `MAX_FIELDS` fields are returned; the end of the vector marks the end of
/// the input.
pub fn split_fields(sentence: &str) -> Vec<&str> {
    sentence
        .split(|c| matches!(c, ',' | '\r' | '\n'))
        .take(MAX_FIELDS)
        .collect()
}

/// Extract field `index` if present and non-empty.
fn field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|f| !f.is_empty())
}

fn parse_number(text: &str, policy: NumericFieldPolicy) -> Option<f64> {
    match text.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => match policy {
            NumericFieldPolicy::Reject => None,
            NumericFieldPolicy::Zero => Some(0.0),
        },
    }
}

/// Parse a GGA (fix data) sentence into a replacement fix record.
///
/// Returns `None` when position fields are missing or the sentence reports
/// no fix; the current record is then left untouched.
fn parse_gga(
    fields: &[&str],
    current: &PositionFix,
    policy: NumericFieldPolicy,
) -> Option<PositionFix> {
    // Is there any position data?
    let latitude = field(fields, 2)?;
    let latitude_ns = field(fields, 3)?;
    let longitude = field(fields, 4)?;
    let longitude_ew = field(fields, 5)?;

    // Fix quality "0" means the receiver has no fix yet.
    if *fields.get(6)? == "0" {
        return None;
    }

    let mut fix = PositionFix {
        latitude: latitude.to_string(),
        latitude_ns: latitude_ns.to_string(),
        longitude: longitude.to_string(),
        longitude_ew: longitude_ew.to_string(),
        ..current.clone()
    };

    if let Some(altitude) = field(fields, 9) {
        fix.altitude_feet = parse_number(altitude, policy)? * METRES_TO_FEET;
    }

    Some(fix)
}

/// Parse an RMC (recommended minimum) sentence into a replacement fix record.
///
/// Returns `None` when position fields are missing or the sentence is marked
/// void; the current record is then left untouched.
fn parse_rmc(
    fields: &[&str],
    current: &PositionFix,
    policy: NumericFieldPolicy,
) -> Option<PositionFix> {
    // Is there any position data?
    let latitude = field(fields, 3)?;
    let latitude_ns = field(fields, 4)?;
    let longitude = field(fields, 5)?;
    let longitude_ew = field(fields, 6)?;

    // "A" marks an active fix, "V" void data.
    if *fields.get(2)? != "A" {
        return None;
    }

    let mut fix = PositionFix {
        latitude: latitude.to_string(),
        latitude_ns: latitude_ns.to_string(),
        longitude: longitude.to_string(),
        longitude_ew: longitude_ew.to_string(),
        ..current.clone()
    };

    if let (Some(speed), Some(bearing)) = (field(fields, 7), field(fields, 8)) {
        fix.speed_knots = parse_number(speed, policy)?;
        fix.bearing_degrees = parse_number(bearing, policy)?;
    }

    Some(fix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    /// Frame a body with its computed checksum and line terminator.
    fn sentence(body: &str) -> String {
        format!("${}*{:02X}\r\n", body, checksum(body.as_bytes()))
    }

    fn decode(input: &str) -> PositionFix {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        decoder.feed(input.as_bytes(), &mut fix);
        fix
    }

    #[test]
    fn test_checksum_validation() {
        assert!(verify_checksum(&GGA.as_bytes()[1..]));
        assert!(verify_checksum(&RMC.as_bytes()[1..]));
        assert!(!verify_checksum(b"GPGGA,123519*00\r\n"));
    }

    #[test]
    fn test_checksum_is_case_sensitive() {
        // The valid checksum here is "6A"; lowercase must not match.
        let body = "GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6a";
        assert!(!verify_checksum(body.as_bytes()));
    }

    #[test]
    fn test_checksum_requires_star() {
        assert!(!verify_checksum(b"GPGGA,123519,4807.038,N"));
        // A '*' at the very start counts as absent.
        assert!(!verify_checksum(b"*47"));
        // Too short to hold both hex digits.
        assert!(!verify_checksum(b"AB*4"));
    }

    #[test]
    fn test_split_fields() {
        let fields = split_fields("GGA,123456,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(
            fields,
            vec![
                "GGA", "123456", "4807.038", "N", "01131.000", "E", "1", "08", "0.9", "545.4",
                "M", "46.9", "M", "", ""
            ]
        );
    }

    #[test]
    fn test_split_fields_cap() {
        let long = ",".repeat(30);
        assert_eq!(split_fields(&long).len(), 20);
    }

    #[test]
    fn test_gga_updates_position() {
        let fix = decode(GGA);
        assert_eq!(fix.latitude, "4807.038");
        assert_eq!(fix.latitude_ns, "N");
        assert_eq!(fix.longitude, "01131.000");
        assert_eq!(fix.longitude_ew, "E");
        assert!((fix.altitude_feet - 545.4 * 3.28).abs() < 0.001);
    }

    #[test]
    fn test_gga_without_fix_is_ignored() {
        let input = sentence("GPGGA,123519,4807.038,N,01131.000,E,0,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(decode(&input), PositionFix::new());
    }

    #[test]
    fn test_gga_with_empty_position_is_ignored() {
        let input = sentence("GPGGA,123519,,,,,1,08,0.9,545.4,M,46.9,M,,");
        assert_eq!(decode(&input), PositionFix::new());
    }

    #[test]
    fn test_rmc_applies_speed_and_bearing() {
        let fix = decode(RMC);
        assert_eq!(fix.latitude, "4807.038");
        assert_eq!(fix.latitude_ns, "N");
        assert_eq!(fix.longitude, "01131.000");
        assert_eq!(fix.longitude_ew, "E");
        assert!((fix.speed_knots - 22.4).abs() < 0.001);
        assert!((fix.bearing_degrees - 84.4).abs() < 0.001);
    }

    #[test]
    fn test_rmc_void_is_ignored() {
        let input = sentence("GPRMC,123519,V,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W");
        assert_eq!(decode(&input), PositionFix::new());
    }

    #[test]
    fn test_bad_checksum_leaves_position_unchanged() {
        let fix = decode("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00\r\n");
        assert_eq!(fix, PositionFix::new());
    }

    #[test]
    fn test_missing_star_leaves_position_unchanged() {
        let fix = decode("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,\r\n");
        assert_eq!(fix, PositionFix::new());
    }

    #[test]
    fn test_sentence_split_across_chunks() {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        let (first, second) = GGA.split_at(20); // splits inside the latitude field
        assert_eq!(decoder.feed(first.as_bytes(), &mut fix), 0);
        assert_eq!(decoder.feed(second.as_bytes(), &mut fix), 1);
        assert_eq!(fix, decode(GGA));
    }

    #[test]
    fn test_idle_after_line_feed() {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();

        decoder.feed(b"$GPGGA,123519", &mut fix);
        assert!(!decoder.is_idle());

        // Completion resets the decoder whether or not validation passed.
        decoder.feed(b"*00\r\n", &mut fix);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_bytes_before_start_marker_are_skipped() {
        let input = format!("garbage\r\n123{}", GGA);
        assert_eq!(decode(&input), decode(GGA));
    }

    #[test]
    fn test_overflow_discards_and_recovers() {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();

        // A start marker followed by far more data than one sentence may hold.
        let runaway = format!("${}", "A".repeat(1500));
        assert_eq!(decoder.feed(runaway.as_bytes(), &mut fix), 0);
        assert!(decoder.is_idle());

        assert_eq!(decoder.feed(GGA.as_bytes(), &mut fix), 1);
        assert_eq!(fix, decode(GGA));
    }

    #[test]
    fn test_truncated_sentence_is_discarded() {
        // "$G*47\n" carries a valid checksum but nothing resembling a type tag.
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        assert_eq!(decoder.feed(b"$G*47\n", &mut fix), 0);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_start_marker_inside_sentence_is_data() {
        // A '$' mid-sentence is collected as data rather than restarting the
        // sentence, so the stray prefix breaks the checksum.
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        let input = format!("$XX{}", GGA);
        assert_eq!(decoder.feed(input.as_bytes(), &mut fix), 0);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_rmc_preserves_gga_altitude() {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        decoder.feed(GGA.as_bytes(), &mut fix);
        decoder.feed(RMC.as_bytes(), &mut fix);
        assert!((fix.altitude_feet - 545.4 * 3.28).abs() < 0.001);
        assert!((fix.speed_knots - 22.4).abs() < 0.001);
    }

    #[test]
    fn test_malformed_altitude_rejects_sentence() {
        let input = sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,garbled,M,46.9,M,,");
        assert_eq!(decode(&input), PositionFix::new());
    }

    #[test]
    fn test_malformed_altitude_zeroed_under_zero_policy() {
        let input = sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,garbled,M,46.9,M,,");
        let mut decoder = NmeaDecoder::with_policy(NumericFieldPolicy::Zero);
        let mut fix = PositionFix::new();
        assert_eq!(decoder.feed(input.as_bytes(), &mut fix), 1);
        assert_eq!(fix.latitude, "4807.038");
        assert_eq!(fix.altitude_feet, 0.0);
    }

    #[test]
    fn test_empty_chunk() {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        assert_eq!(decoder.feed(&[], &mut fix), 0);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_multiple_sentences_in_one_chunk() {
        let mut decoder = NmeaDecoder::new();
        let mut fix = PositionFix::new();
        let input = format!("{}{}", GGA, RMC);
        assert_eq!(decoder.feed(input.as_bytes(), &mut fix), 2);
        assert!((fix.speed_knots - 22.4).abs() < 0.001);
    }
}
