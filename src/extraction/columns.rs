/*!
 * Column-aware reading order.
 *
 * Column bands are detected with a horizontal gap histogram over block
 * x-extents: the page width is divided into fixed-width bins, each bin
 * counts the blocks whose horizontal extent covers it, and a maximal run of
 * empty bins at least `column_gap_min_pt` wide separates two bands. Blocks
 * are then ordered band by band left to right, top to bottom within a band.
 */

use crate::layout::Rect;

/// Histogram bin width in points
const BIN_WIDTH_PT: f32 = 4.0;

/// Tuning knobs for column detection
#[derive(Debug, Clone)]
pub struct ColumnOptions {
    /// Minimum fully-empty horizontal gap that separates two column bands
    pub column_gap_min_pt: f32,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self { column_gap_min_pt: 18.0 }
    }
}

/// One detected column band `[left, right)` in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBand {
    /// Left edge in points
    pub left: f32,
    /// Right edge in points
    pub right: f32,
}

impl ColumnBand {
    fn contains_x(&self, x: f32) -> bool {
        x >= self.left && x < self.right
    }
}

/// Detect column bands from block bounding boxes.
///
/// Returns at least one band covering the whole page when no qualifying gap
/// exists (single-column page).
pub fn detect_bands(page_width: f32, boxes: &[Rect], options: &ColumnOptions) -> Vec<ColumnBand> {
    let bin_count = (page_width / BIN_WIDTH_PT).ceil().max(1.0) as usize;
    let mut occupancy = vec![0u32; bin_count];

    for bbox in boxes {
        let first = ((bbox.x / BIN_WIDTH_PT).floor().max(0.0)) as usize;
        let last = ((bbox.right() / BIN_WIDTH_PT).ceil() as usize).min(bin_count);
        for bin in occupancy.iter_mut().take(last).skip(first) {
            *bin += 1;
        }
    }

    let min_gap_bins = (options.column_gap_min_pt / BIN_WIDTH_PT).round().max(1.0) as usize;

    // Walk the histogram collecting occupied stretches separated by empty
    // runs of at least min_gap_bins.
    let mut bands: Vec<ColumnBand> = Vec::new();
    let mut band_start: Option<usize> = None;
    let mut gap_len = 0usize;

    for (bin, &count) in occupancy.iter().enumerate() {
        if count > 0 {
            if band_start.is_none() {
                band_start = Some(bin);
            }
            gap_len = 0;
        } else if let Some(start) = band_start {
            gap_len += 1;
            if gap_len >= min_gap_bins {
                let end = bin + 1 - gap_len;
                bands.push(ColumnBand {
                    left: start as f32 * BIN_WIDTH_PT,
                    right: end as f32 * BIN_WIDTH_PT,
                });
                band_start = None;
                gap_len = 0;
            }
        }
    }
    if let Some(start) = band_start {
        bands.push(ColumnBand {
            left: start as f32 * BIN_WIDTH_PT,
            right: page_width,
        });
    }

    if bands.is_empty() {
        bands.push(ColumnBand { left: 0.0, right: page_width });
    }
    bands
}

/// Index of the band containing the box center, clamping outliers to the
/// nearest band
fn band_of(bands: &[ColumnBand], bbox: &Rect) -> usize {
    let cx = bbox.center_x();
    bands
        .iter()
        .position(|band| band.contains_x(cx))
        .unwrap_or_else(|| {
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for (i, band) in bands.iter().enumerate() {
                let dist = if cx < band.left {
                    band.left - cx
                } else {
                    cx - band.right
                };
                if dist < best_dist {
                    best_dist = dist;
                    best = i;
                }
            }
            best
        })
}

/// Sort indices into `boxes` into reading order: column bands left to right,
/// then top to bottom (ties broken left to right) within a band.
///
/// The returned order is total and deterministic; extraction applies it once
/// and no later stage reorders blocks.
pub fn reading_order(page_width: f32, boxes: &[Rect], options: &ColumnOptions) -> Vec<usize> {
    let bands = detect_bands(page_width, boxes, options);
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| {
        let band_a = band_of(&bands, &boxes[a]);
        let band_b = band_of(&bands, &boxes[b]);
        band_a
            .cmp(&band_b)
            .then(boxes[a].y.total_cmp(&boxes[b].y))
            .then(boxes[a].x.total_cmp(&boxes[b].x))
    });
    order
}
