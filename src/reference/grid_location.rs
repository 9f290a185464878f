// Grid Square Location
// Converts Maidenhead grid locators to lat/lon coordinates
//
// Returned coordinates are the south-west reference corner of the
// locator's cell, so a 4-character grid resolves to whole degrees and
// every extra pair only adds the precision it actually encodes.
//
// NO API calls - pure offline computation from the locator text.

/// Minimum locator length that carries a position (field + square)
pub const MIN_GRID_LEN: usize = 4;

/// Longest locator we decode (field, square, subsquare, extended square)
pub const MAX_GRID_LEN: usize = 8;

// Cell sizes in degrees, longitude x latitude
const FIELD: (f64, f64) = (20.0, 10.0);
const SQUARE: (f64, f64) = (2.0, 1.0);
const SUBSQUARE: (f64, f64) = (2.0 / 24.0, 1.0 / 24.0);
const EXTENDED: (f64, f64) = (2.0 / 240.0, 1.0 / 240.0);

/// Convert a 4, 6 or 8 character grid square to lat/lon coordinates
/// Returns (latitude, longitude) of the cell's south-west corner
pub fn grid_to_latlon(grid: &str) -> Option<(f64, f64)> {
    let grid = grid.trim().to_ascii_uppercase();
    let len = grid.len();

    if len < MIN_GRID_LEN || len > MAX_GRID_LEN || len % 2 != 0 {
        return None;
    }

    let bytes = grid.as_bytes();

    // Field: Letter, Letter in A..R
    let lon_field = letter_index(bytes[0], b'R')?;
    let lat_field = letter_index(bytes[1], b'R')?;
    // Square: Digit, Digit
    let lon_square = digit_index(bytes[2])?;
    let lat_square = digit_index(bytes[3])?;

    // Maidenhead origin is at -180°, -90°
    let mut lon = -180.0 + lon_field * FIELD.0 + lon_square * SQUARE.0;
    let mut lat = -90.0 + lat_field * FIELD.1 + lat_square * SQUARE.1;

    // Subsquare: Letter, Letter in A..X
    if len >= 6 {
        lon += letter_index(bytes[4], b'X')? * SUBSQUARE.0;
        lat += letter_index(bytes[5], b'X')? * SUBSQUARE.1;
    }

    // Extended square: Digit, Digit
    if len >= 8 {
        lon += digit_index(bytes[6])? * EXTENDED.0;
        lat += digit_index(bytes[7])? * EXTENDED.1;
    }

    Some((lat, lon))
}

/// Format a coordinate as PostGIS point text, longitude first
pub fn to_point_wkt(lat: f64, lon: f64) -> String {
    format!("POINT({:?} {:?})", lon, lat)
}

/// Geocode a locator straight to point text
pub fn grid_to_point(grid: &str) -> Option<String> {
    grid_to_latlon(grid).map(|(lat, lon)| to_point_wkt(lat, lon))
}

fn letter_index(b: u8, last: u8) -> Option<f64> {
    if (b'A'..=last).contains(&b) {
        Some((b - b'A') as f64)
    } else {
        None
    }
}

fn digit_index(b: u8) -> Option<f64> {
    if b.is_ascii_digit() {
        Some((b - b'0') as f64)
    } else {
        None
    }
}
