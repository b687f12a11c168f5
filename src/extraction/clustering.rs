/*!
 * Spatial clustering of text spans into text blocks.
 *
 * Spans are first grouped into lines (vertical proximity scaled by font
 * size), then lines are merged into blocks when the inter-line gap stays
 * small and the font size stays consistent. A vertical-writing span chain is
 * clustered on the transposed axes.
 */

use crate::layout::{FontStyle, Rect, TextRun, WritingDirection};

use super::source::TextSpan;

/// Tuning knobs for span clustering
#[derive(Debug, Clone)]
pub struct ClusteringOptions {
    /// Maximum vertical gap between lines of one block, as a multiple of
    /// the line font size
    pub line_gap_factor: f32,
    /// Maximum relative font-size difference for spans to share a block
    pub font_size_tolerance: f32,
    /// Maximum horizontal gap between spans on one line, as a multiple of
    /// the font size
    pub span_gap_factor: f32,
}

impl Default for ClusteringOptions {
    fn default() -> Self {
        Self {
            line_gap_factor: 0.8,
            font_size_tolerance: 0.15,
            span_gap_factor: 1.0,
        }
    }
}

/// A clustered block before it becomes a `LayoutBlock`: runs plus the union
/// bounding box
#[derive(Debug, Clone)]
pub struct ClusteredBlock {
    /// Union bounding box of all member spans
    pub bbox: Rect,
    /// Runs in reading order within the block
    pub runs: Vec<TextRun>,
}

/// Cluster text-layer spans into blocks.
///
/// Horizontal and vertical spans never share a block; each direction is
/// clustered independently and the results concatenated (reading order
/// across blocks is established later by the column sort).
pub fn cluster_spans(spans: &[TextSpan], options: &ClusteringOptions) -> Vec<ClusteredBlock> {
    let mut horizontal: Vec<&TextSpan> = Vec::new();
    let mut vertical: Vec<&TextSpan> = Vec::new();
    for span in spans {
        match span.direction {
            WritingDirection::Horizontal => horizontal.push(span),
            WritingDirection::Vertical => vertical.push(span),
        }
    }

    let mut blocks = cluster_directional(&horizontal, WritingDirection::Horizontal, options);
    blocks.extend(cluster_directional(&vertical, WritingDirection::Vertical, options));
    blocks
}

fn cluster_directional(
    spans: &[&TextSpan],
    direction: WritingDirection,
    options: &ClusteringOptions,
) -> Vec<ClusteredBlock> {
    if spans.is_empty() {
        return Vec::new();
    }

    let lines = group_into_lines(spans, direction, options);
    merge_lines(lines, direction, options)
}

/// A line of spans sharing one baseline band
struct Line<'a> {
    bbox: Rect,
    spans: Vec<&'a TextSpan>,
}

impl Line<'_> {
    fn font_size(&self) -> f32 {
        // Dominant size on the line; spans on a line rarely disagree
        self.spans
            .iter()
            .map(|s| s.font.size_pt)
            .fold(0.0_f32, f32::max)
    }
}

fn group_into_lines<'a>(
    spans: &[&'a TextSpan],
    direction: WritingDirection,
    options: &ClusteringOptions,
) -> Vec<Line<'a>> {
    let mut sorted: Vec<&TextSpan> = spans.to_vec();
    // For horizontal text a "line" is a y-band read left to right; for
    // vertical text it is an x-band read top to bottom.
    match direction {
        WritingDirection::Horizontal => sorted.sort_by(|a, b| {
            a.bbox
                .y
                .total_cmp(&b.bbox.y)
                .then(a.bbox.x.total_cmp(&b.bbox.x))
        }),
        WritingDirection::Vertical => sorted.sort_by(|a, b| {
            b.bbox
                .x
                .total_cmp(&a.bbox.x)
                .then(a.bbox.y.total_cmp(&b.bbox.y))
        }),
    }

    let mut lines: Vec<Line> = Vec::new();
    for span in sorted {
        let tolerance = span.font.size_pt * 0.5;
        // Only the last few lines are candidates; earlier ones are already
        // geometrically closed off by the sort order.
        let joined = lines
            .iter()
            .enumerate()
            .rev()
            .take(4)
            .find(|(_, line)| match direction {
                WritingDirection::Horizontal => {
                    (span.bbox.y - line.bbox.y).abs() <= tolerance
                        && span.bbox.x - line.bbox.right()
                            <= span.font.size_pt * options.span_gap_factor
                }
                WritingDirection::Vertical => {
                    (span.bbox.x - line.bbox.x).abs() <= tolerance
                        && span.bbox.y - line.bbox.bottom()
                            <= span.font.size_pt * options.span_gap_factor
                }
            })
            .map(|(i, _)| i);

        match joined {
            Some(i) => {
                let line = &mut lines[i];
                line.bbox = line.bbox.union(&span.bbox);
                line.spans.push(span);
            }
            None => lines.push(Line {
                bbox: span.bbox,
                spans: vec![span],
            }),
        }
    }
    lines
}

fn merge_lines(
    lines: Vec<Line<'_>>,
    direction: WritingDirection,
    options: &ClusteringOptions,
) -> Vec<ClusteredBlock> {
    let mut blocks: Vec<ClusteredBlock> = Vec::new();
    let mut current: Option<(Rect, f32, Vec<TextRun>)> = None;

    for line in lines {
        let line_size = line.font_size();
        let fits = current.as_ref().is_some_and(|(bbox, size, _)| {
            let gap = match direction {
                WritingDirection::Horizontal => bbox.vertical_gap_to(&line.bbox),
                // Vertical columns advance right-to-left
                WritingDirection::Vertical => (bbox.x - line.bbox.right()).max(0.0),
            };
            let size_close = if *size > 0.0 {
                (line_size - size).abs() / size <= options.font_size_tolerance
            } else {
                true
            };
            gap <= line_size * options.line_gap_factor && size_close
        });

        let line_runs = runs_for_line(&line, direction);
        if fits {
            let (bbox, _, runs) = current.as_mut().expect("fits implies a current block");
            *bbox = bbox.union(&line.bbox);
            runs.extend(line_runs);
        } else {
            if let Some((bbox, _, runs)) = current.take() {
                blocks.push(ClusteredBlock { bbox, runs });
            }
            current = Some((line.bbox, line_size, line_runs));
        }
    }
    if let Some((bbox, _, runs)) = current {
        blocks.push(ClusteredBlock { bbox, runs });
    }
    blocks
}

/// Convert a line's spans into runs, merging adjacent spans that share the
/// same style so a styled word does not fragment into per-glyph runs
fn runs_for_line(line: &Line<'_>, direction: WritingDirection) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for span in &line.spans {
        let style = FontStyle {
            family: span.font.name.clone(),
            size_pt: span.font.size_pt,
            bold: span.font.bold,
            italic: span.font.italic,
            color: span.font.color,
        };
        match runs.last_mut() {
            Some(last) if last.font == style && last.direction == direction => {
                last.source.push_str(&span.text);
            }
            _ => runs.push(TextRun::new(span.text.clone(), style, direction)),
        }
    }
    runs
}
