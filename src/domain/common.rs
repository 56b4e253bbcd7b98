use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Implements the text token round trip for fieldless enums stored as TEXT:
/// `as_str`, `Display`, `FromStr` and the rusqlite conversions.
macro_rules! sql_token_enum {
    ($name:ident, $label:literal, { $($variant:ident => $token:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::TrackerError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == normalized)
                    .ok_or_else(|| {
                        let expected: Vec<&str> =
                            $name::ALL.iter().map(|candidate| candidate.as_str()).collect();
                        $crate::errors::TrackerError::validation(format!(
                            "unknown {} `{}` (expected {})",
                            $label,
                            s,
                            expected.join(", ")
                        ))
                    })
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value.as_str()?.parse().map_err(
                    |err: $crate::errors::TrackerError| {
                        rusqlite::types::FromSqlError::Other(Box::new(err))
                    },
                )
            }
        }
    };
}

pub(crate) use sql_token_enum;

/// Inclusive date range used for period aggregation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Overlap of two windows, if any.
    pub fn intersect(&self, other: &DateWindow) -> Option<DateWindow> {
        DateWindow::new(self.start.max(other.start), self.end.min(other.end))
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shade {
        Light,
        DarkGrey,
    }

    sql_token_enum!(Shade, "shade", {
        Light => "light",
        DarkGrey => "dark_grey",
    });

    fn parse_shade(raw: &str) -> Result<Shade> {
        raw.parse()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(DateWindow::new(date(2024, 2, 2), date(2024, 2, 1)).is_none());
        let single = DateWindow::new(date(2024, 2, 1), date(2024, 2, 1)).unwrap();
        assert_eq!(single.days(), 1);
    }

    #[test]
    fn intersect_clamps_to_overlap() {
        let month = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let budget = DateWindow::new(date(2024, 3, 10), date(2024, 6, 1)).unwrap();
        let overlap = month.intersect(&budget).unwrap();
        assert_eq!(overlap.start, date(2024, 3, 10));
        assert_eq!(overlap.end, date(2024, 3, 31));

        let later = DateWindow::new(date(2024, 4, 1), date(2024, 4, 30)).unwrap();
        assert!(month.intersect(&later).is_none());
    }

    #[test]
    fn token_enum_parses_alongside_crate_result_alias() {
        assert_eq!(parse_shade(" Light ").unwrap(), Shade::Light);
        assert_eq!(parse_shade("dark-grey").unwrap(), Shade::DarkGrey);
        let err = parse_shade("navy").unwrap_err().to_string();
        assert!(err.contains("expected light, dark_grey"), "{err}");
        assert_eq!(Shade::DarkGrey.to_string(), "dark_grey");
    }
}
