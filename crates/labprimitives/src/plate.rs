use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("malformed well coordinate '{0}', expected e.g. 'A1'")]
    MalformedWell(String),

    #[error("malformed coordinate range '{0}', expected e.g. 'A1:H12'")]
    MalformedRange(String),

    #[error("coordinate range '{0}' is inverted")]
    InvertedRange(String),
}

/// A single well position on a plate, zero-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Well {
    pub row: u32,
    pub column: u32,
}

impl Well {
    pub fn label(&self) -> String {
        format!("{}{}", row_label(self.row), self.column + 1)
    }
}

/// Row index to letter label: 0 -> "A", 25 -> "Z", 26 -> "AA"
pub fn row_label(row: u32) -> String {
    let mut label = String::new();
    let mut n = row;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

/// Parse a well coordinate like "B7" into row/column indices
pub fn parse_well(coordinate: &str) -> Result<Well, CoordinateError> {
    let letters: String = coordinate.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &coordinate[letters.len()..];
    if letters.is_empty() || digits.is_empty() {
        return Err(CoordinateError::MalformedWell(coordinate.to_string()));
    }
    let mut row: u32 = 0;
    for c in letters.to_ascii_uppercase().chars() {
        row = row
            .checked_mul(26)
            .and_then(|r| r.checked_add(c as u32 - 'A' as u32 + 1))
            .ok_or_else(|| CoordinateError::MalformedWell(coordinate.to_string()))?;
    }
    let column: u32 = digits
        .parse::<u32>()
        .ok()
        .filter(|c| *c >= 1)
        .ok_or_else(|| CoordinateError::MalformedWell(coordinate.to_string()))?;
    Ok(Well {
        row: row - 1,
        column: column - 1,
    })
}

/// Expand a rectangular coordinate range ("A1:H12") into row-major well
/// labels. A single well ("C3") expands to itself.
pub fn well_list(geometry: &str) -> Result<Vec<String>, CoordinateError> {
    let (start, end) = match geometry.split_once(':') {
        Some((start, end)) => (parse_well(start)?, parse_well(end)?),
        None => {
            let well = parse_well(geometry)?;
            (well, well)
        }
    };
    if end.row < start.row || end.column < start.column {
        return Err(CoordinateError::InvertedRange(geometry.to_string()));
    }
    let mut wells = Vec::new();
    for row in start.row..=end.row {
        for column in start.column..=end.column {
            wells.push(Well { row, column }.label());
        }
    }
    Ok(wells)
}
