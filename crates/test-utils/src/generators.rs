//! Test data generators for creating synthetic HRRR tiles.
//!
//! These generators create predictable, verifiable pixel patterns that are
//! exactly representable as 2-byte floats, so tests can compare decoded
//! values with `==`.

/// Edge length of one HRRR chunk in pixels.
pub const TILE_EDGE: usize = 150;

/// Number of pixels in one 150×150 tile slice.
pub const TILE_PIXELS: usize = TILE_EDGE * TILE_EDGE;

/// Value stored at `(hour, row, col)` in generated tiles.
///
/// Each value is a small integer (< 2048) so it survives a round trip through
/// a 2-byte float unchanged, and every hour of a forecast tile is distinct.
///
/// # Example
///
/// ```
/// use test_utils::tile_value;
///
/// assert_eq!(tile_value(0, 0, 0), 0.0);
/// assert_eq!(tile_value(1, 0, 0), 16.0);
/// assert_eq!(tile_value(0, 1, 2), 6.0);
/// ```
pub fn tile_value(hour: usize, row: usize, col: usize) -> f32 {
    (hour * 16 + (row % 4) * 4 + (col % 4)) as f32
}

/// Creates the values of a tile with `hours` leading slices.
///
/// `hours == 1` produces a 150×150 analysis snapshot; larger values produce
/// a forecast run. Values are in row-major `[hour][row][col]` order.
///
/// # Example
///
/// ```
/// use test_utils::{create_tile_values, TILE_PIXELS};
///
/// let tile = create_tile_values(18);
/// assert_eq!(tile.len(), 18 * TILE_PIXELS);
/// ```
pub fn create_tile_values(hours: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(hours * TILE_PIXELS);
    for hour in 0..hours {
        for row in 0..TILE_EDGE {
            for col in 0..TILE_EDGE {
                data.push(tile_value(hour, row, col));
            }
        }
    }
    data
}

/// Creates a tile where every pixel of every hour holds `value`.
pub fn create_constant_tile(hours: usize, value: f32) -> Vec<f32> {
    vec![value; hours * TILE_PIXELS]
}

/// Creates surface-pressure-like values in Pa that need 4-byte floats.
///
/// Values vary by hour in steps of 0.5 Pa around 101325 Pa, which a
/// 2-byte float could not represent.
pub fn create_pressure_tile(hours: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(hours * TILE_PIXELS);
    for hour in 0..hours {
        for _ in 0..TILE_PIXELS {
            data.push(101_325.0 + hour as f32 * 0.5);
        }
    }
    data
}
