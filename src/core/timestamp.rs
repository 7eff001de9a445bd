//! Timestamp formatting for the `%date` token
//!
//! Formatting a date is the most expensive part of rendering a line, and
//! busy loggers often emit many lines within the same millisecond. The
//! formatter keeps the last rendered string and reuses it until the clock
//! moves to the next millisecond.

use chrono::{DateTime, Local, Offset, TimeZone};
use parking_lot::Mutex;

/// `yyyy-MM-dd HH:mm:ss,SSS`
pub const DATE_LAYOUT: &str = "%Y-%m-%d %H:%M:%S,%3f";

#[derive(Debug)]
pub struct CachingDateFormatter {
    layout: String,
    cache: Mutex<Option<(i64, i32, String)>>,
}

impl CachingDateFormatter {
    /// Create a formatter for a strftime-compatible layout
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// Format the current local time
    pub fn format_now(&self) -> String {
        self.format(&Local::now())
    }

    /// Format an instant, reusing the cached string for the same millisecond
    /// and UTC offset
    pub fn format<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let millis = instant.timestamp_millis();
        let offset = instant.offset().fix().local_minus_utc();
        let mut cache = self.cache.lock();
        if let Some((cached_millis, cached_offset, text)) = cache.as_ref() {
            if *cached_millis == millis && *cached_offset == offset {
                return text.clone();
            }
        }
        let text = instant.format(&self.layout).to_string();
        *cache = Some((millis, offset, text.clone()));
        text
    }
}

impl Default for CachingDateFormatter {
    fn default() -> Self {
        Self::new(DATE_LAYOUT)
    }
}

impl Clone for CachingDateFormatter {
    /// Clones share the layout but start with an empty cache
    fn clone(&self) -> Self {
        Self::new(self.layout.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + Duration::milliseconds(123)
    }

    #[test]
    fn test_default_layout() {
        let formatter = CachingDateFormatter::default();
        assert_eq!(formatter.format(&fixed_datetime()), "2025-01-08 10:30:45,123");
    }

    #[test]
    fn test_same_millisecond_reuses_text() {
        let formatter = CachingDateFormatter::default();
        let first = formatter.format(&fixed_datetime());
        let same_ms = fixed_datetime() + Duration::microseconds(400);
        assert_eq!(formatter.format(&same_ms), first);
    }

    #[test]
    fn test_next_millisecond_reformats() {
        let formatter = CachingDateFormatter::default();
        formatter.format(&fixed_datetime());
        let later = fixed_datetime() + Duration::milliseconds(1);
        assert_eq!(formatter.format(&later), "2025-01-08 10:30:45,124");
    }

    #[test]
    fn test_same_instant_other_offset_reformats() {
        let formatter = CachingDateFormatter::default();
        let utc = fixed_datetime();
        assert_eq!(formatter.format(&utc), "2025-01-08 10:30:45,123");

        let plus_two = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        assert_eq!(
            formatter.format(&utc.with_timezone(&plus_two)),
            "2025-01-08 12:30:45,123"
        );
        assert_eq!(formatter.format(&utc), "2025-01-08 10:30:45,123");
    }

    #[test]
    fn test_custom_layout() {
        let formatter = CachingDateFormatter::new("%d/%b/%Y:%H:%M:%S");
        assert_eq!(formatter.format(&fixed_datetime()), "08/Jan/2025:10:30:45");
    }

    #[test]
    fn test_format_now_shape() {
        let text = CachingDateFormatter::default().format_now();
        // yyyy-MM-dd HH:mm:ss,SSS
        assert_eq!(text.len(), 23);
        assert_eq!(&text[4..5], "-");
        assert_eq!(&text[19..20], ",");
    }
}
