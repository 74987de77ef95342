use std::fmt;
use std::str::FromStr;

/// An A1-notation range such as `B29:H29`. The start row is mandatory since
/// status rows are computed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub start_column: String,
    pub start_row: u32,
    pub end: Option<(String, Option<u32>)>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid A1 range '{range}': {reason}")]
pub struct A1RangeError {
    range: String,
    reason: &'static str,
}

impl A1Range {
    /// `<worksheet>!<range>`, quoting the worksheet name when needed.
    pub fn qualified(&self, worksheet: &str) -> String {
        format!("{}!{}", quote_worksheet(worksheet), self)
    }

    /// Sheet row holding the zero-based `row_index`-th row of this range, or
    /// `None` when it would fall past `u32::MAX`.
    pub fn row_number(&self, row_index: usize) -> Option<u32> {
        u32::try_from(row_index)
            .ok()
            .and_then(|offset| self.start_row.checked_add(offset))
    }
}

/// Address of a single cell, e.g. `Sheet1!H30`.
pub fn cell_address(worksheet: &str, column: &str, row: u32) -> String {
    format!("{}!{column}{row}", quote_worksheet(worksheet))
}

fn quote_worksheet(worksheet: &str) -> String {
    if !worksheet.is_empty() && worksheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        worksheet.to_string()
    } else {
        format!("'{}'", worksheet.replace('\'', "''"))
    }
}

fn split_cell(cell: &str) -> Option<(String, Option<u32>)> {
    let digits = cell.find(|c: char| c.is_ascii_digit()).unwrap_or(cell.len());
    let (column, row) = cell.split_at(digits);
    if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let row = match row {
        "" => None,
        digits => Some(digits.parse::<u32>().ok().filter(|r| *r > 0)?),
    };
    Some((column.to_ascii_uppercase(), row))
}

impl FromStr for A1Range {
    type Err = A1RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| A1RangeError {
            range: s.to_string(),
            reason,
        };
        let (start, end) = match s.trim().split_once(':') {
            Some((start, end)) => (start, Some(end)),
            None => (s.trim(), None),
        };
        let (start_column, start_row) = split_cell(start).ok_or_else(|| err("bad start cell"))?;
        let start_row = start_row.ok_or_else(|| err("start cell has no row number"))?;
        let end = match end {
            Some(end) => {
                let (column, row) = split_cell(end).ok_or_else(|| err("bad end cell"))?;
                if row.is_some_and(|row| row < start_row) {
                    return Err(err("end row precedes start row"));
                }
                Some((column, row))
            }
            None => None,
        };
        Ok(A1Range {
            start_column,
            start_row,
            end,
        })
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start_column, self.start_row)?;
        if let Some((column, row)) = &self.end {
            write!(f, ":{column}")?;
            if let Some(row) = row {
                write!(f, "{row}")?;
            }
        }
        Ok(())
    }
}
