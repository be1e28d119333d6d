//! Structural similarity index (SSIM) between two grayscale images.
//!
//! The metric follows the widely used reference formulation: a 7×7 uniform
//! window, `K1 = 0.01`, `K2 = 0.03`, sample (N − 1) variance, and the mean
//! of the SSIM map over every window position that lies fully inside the
//! image. Window moments are maintained with running column sums, so memory
//! stays proportional to the image width.

use image::GrayImage;

/// Side length of the square averaging window.
pub const WINDOW_SIZE: usize = 7;

/// Dynamic range of 8-bit intensity data.
pub const DATA_RANGE_U8: f64 = 255.0;

const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Per-window sums of `x`, `y`, `x²`, `y²` and `x·y`.
type Moments = [u64; 5];

/// Compute the mean SSIM between two grayscale images.
///
/// `data_range` is the spread of possible pixel values (use
/// [`DATA_RANGE_U8`] for 8-bit data). Identical images score exactly `1.0`.
///
/// Images smaller than [`WINDOW_SIZE`] on either side are compared with the
/// largest odd window that fits. Images of different dimensions are treated
/// as entirely dissimilar and score `0.0`.
///
/// # Example
///
/// ```
/// use image::GrayImage;
/// use sharecrop::{DATA_RANGE_U8, structural_similarity};
///
/// let image = GrayImage::from_pixel(16, 16, image::Luma([42]));
/// assert_eq!(structural_similarity(&image, &image, DATA_RANGE_U8), 1.0);
/// ```
pub fn structural_similarity(first: &GrayImage, second: &GrayImage, data_range: f64) -> f64 {
    if first.dimensions() != second.dimensions() {
        return 0.0;
    }

    let width = first.width() as usize;
    let height = first.height() as usize;
    if width == 0 || height == 0 {
        return 1.0;
    }

    let window = effective_window(width.min(height));
    let samples = (window * window) as f64;
    let covariance_norm = if window > 1 {
        samples / (samples - 1.0)
    } else {
        1.0
    };
    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);

    let first = first.as_raw();
    let second = second.as_raw();

    let score_window = |sums: &Moments| -> f64 {
        let mean_x = sums[0] as f64 / samples;
        let mean_y = sums[1] as f64 / samples;
        let variance_x = covariance_norm * (sums[2] as f64 / samples - mean_x * mean_x);
        let variance_y = covariance_norm * (sums[3] as f64 / samples - mean_y * mean_y);
        let covariance = covariance_norm * (sums[4] as f64 / samples - mean_x * mean_y);

        let numerator = (2.0 * mean_x * mean_y + c1) * (2.0 * covariance + c2);
        let denominator =
            (mean_x * mean_x + mean_y * mean_y + c1) * (variance_x + variance_y + c2);
        numerator / denominator
    };

    // Column sums over the rows [top, top + window).
    let mut columns: Vec<Moments> = vec![[0; 5]; width];
    for row in 0..window {
        update_columns(&mut columns, first, second, row, width, add);
    }

    let mut total = 0.0;
    let mut positions = 0_usize;

    for top in 0..=(height - window) {
        if top > 0 {
            update_columns(&mut columns, first, second, top - 1, width, subtract);
            update_columns(&mut columns, first, second, top + window - 1, width, add);
        }

        let mut sums: Moments = [0; 5];
        for column in &columns[..window] {
            add(&mut sums, column);
        }
        total += score_window(&sums);
        positions += 1;

        for left in 1..=(width - window) {
            subtract(&mut sums, &columns[left - 1]);
            add(&mut sums, &columns[left + window - 1]);
            total += score_window(&sums);
            positions += 1;
        }
    }

    total / positions as f64
}

/// Largest odd window no bigger than [`WINDOW_SIZE`] or `shortest_side`.
fn effective_window(shortest_side: usize) -> usize {
    let window = shortest_side.min(WINDOW_SIZE);
    if window % 2 == 0 { window - 1 } else { window }
}

fn update_columns(
    columns: &mut [Moments],
    first: &[u8],
    second: &[u8],
    row: usize,
    width: usize,
    apply: fn(&mut Moments, &Moments),
) {
    let start = row * width;
    let first_row = &first[start..start + width];
    let second_row = &second[start..start + width];

    for ((column, &x), &y) in columns.iter_mut().zip(first_row).zip(second_row) {
        let (x, y) = (u64::from(x), u64::from(y));
        apply(column, &[x, y, x * x, y * y, x * y]);
    }
}

fn add(target: &mut Moments, source: &Moments) {
    for (target, source) in target.iter_mut().zip(source) {
        *target += source;
    }
}

fn subtract(target: &mut Moments, source: &Moments) {
    for (target, source) in target.iter_mut().zip(source) {
        *target -= source;
    }
}
