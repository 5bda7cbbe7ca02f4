use thiserror::Error;

/// Reasons a single METAR line fails to parse.
///
/// A bad line is dropped with a warning and counted; it never aborts the
/// batch it arrived in.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty observation line")]
    EmptyLine,
    #[error("missing station identifier")]
    MissingStation,
    #[error("invalid station identifier `{0}`")]
    InvalidStation(String),
    #[error("missing observation time group")]
    MissingTime,
    #[error("invalid observation time group `{0}`")]
    InvalidTime(String),
    #[error("day {day} is out of range for {year}-{month:02}")]
    DayOutOfRange { day: u8, month: u8, year: i32 },
}
