//! Grid packing for server-inserted images.
//!
//! New images land in a left-to-right, top-to-bottom grid that tolerates
//! elements of varying size. Rows are inferred from the existing media
//! elements by vertical overlap, so the packing keeps working after the
//! user drags things around. No collision avoidance beyond row/column
//! placement; manual repositioning afterward is expected.

use crate::config::LayoutConfig;

use super::element::Element;

/// A placement for a new element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A fitted display size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

/// Cap a natural image size at the configured display width, preserving
/// aspect ratio. Smaller images keep their natural size.
pub fn display_size(natural_width: f64, natural_height: f64, config: &LayoutConfig) -> DisplaySize {
    if natural_width <= config.max_display_width || natural_width <= 0.0 {
        return DisplaySize {
            width: natural_width,
            height: natural_height,
        };
    }
    let scale = config.max_display_width / natural_width;
    DisplaySize {
        width: config.max_display_width,
        height: natural_height * scale,
    }
}

/// Compute where the next media element goes.
///
/// The area left of `origin_x` / above `origin_y` is reserved for fixed UI
/// controls. Existing live media elements are clustered into rows by
/// y-overlap; the new element extends the last row rightward until the
/// column limit, then opens a new row at the reserved x below the last
/// row's lowest extent.
pub fn next_position(elements: &[Element], config: &LayoutConfig) -> Position {
    let rows = media_rows(elements);
    let last_row = match rows.last() {
        Some(row) => row,
        None => {
            return Position {
                x: config.origin_x,
                y: config.origin_y,
            }
        }
    };

    if last_row.members.len() < config.max_columns {
        // `members` is ordered by x; extend to the right of the rightmost.
        let rightmost = last_row.members[last_row.members.len() - 1];
        Position {
            x: rightmost.right() + config.gap,
            y: rightmost.y,
        }
    } else {
        Position {
            x: config.origin_x,
            y: last_row.bottom + config.gap,
        }
    }
}

/// One inferred row of media elements.
struct Row<'a> {
    /// Members ordered left-to-right by x.
    members: Vec<&'a Element>,
    /// Lowest extent (max bottom edge) across members.
    bottom: f64,
    /// Mean y, used to order rows top-to-bottom.
    mean_y: f64,
}

/// Cluster live media elements into rows by vertical overlap.
///
/// Returned rows are ordered top-to-bottom by mean y; members of each row
/// are ordered by x.
fn media_rows(elements: &[Element]) -> Vec<Row<'_>> {
    let mut media: Vec<&Element> = elements.iter().filter(|e| e.is_live_media()).collect();
    if media.is_empty() {
        return Vec::new();
    }
    media.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut rows: Vec<Row<'_>> = Vec::new();
    for element in media {
        match rows.last_mut() {
            // Overlaps the running vertical range of the current row.
            Some(row) if element.y < row.bottom => {
                row.bottom = row.bottom.max(element.bottom());
                row.members.push(element);
            }
            _ => rows.push(Row {
                bottom: element.bottom(),
                mean_y: 0.0,
                members: vec![element],
            }),
        }
    }

    for row in &mut rows {
        row.mean_y = row.members.iter().map(|e| e.y).sum::<f64>() / row.members.len() as f64;
        row.members.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows.sort_by(|a, b| a.mean_y.total_cmp(&b.mean_y));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::element::ElementKind;

    fn image(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::image(id, format!("f-{id}"), x, y, w, h)
    }

    fn config() -> LayoutConfig {
        LayoutConfig::default()
    }

    // ── display_size ──────────────────────────────────────────

    #[test]
    fn small_image_keeps_natural_size() {
        let size = display_size(200.0, 150.0, &config());
        assert!((size.width - 200.0).abs() < f64::EPSILON);
        assert!((size.height - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wide_image_capped_preserving_aspect() {
        let size = display_size(1024.0, 512.0, &config());
        assert!((size.width - 300.0).abs() < f64::EPSILON);
        assert!((size.height - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn square_fallback_size_caps_square() {
        let size = display_size(1024.0, 1024.0, &config());
        assert!((size.width - 300.0).abs() < f64::EPSILON);
        assert!((size.height - 300.0).abs() < f64::EPSILON);
    }

    // ── next_position ─────────────────────────────────────────

    #[test]
    fn empty_canvas_uses_reserved_origin() {
        let pos = next_position(&[], &config());
        assert_eq!(
            pos,
            Position {
                x: config().origin_x,
                y: config().origin_y
            }
        );
    }

    #[test]
    fn non_media_elements_are_ignored() {
        let elements = vec![Element::backing_rectangle("bg", 0.0, 0.0, 5000.0, 5000.0)];
        let pos = next_position(&elements, &config());
        assert_eq!(
            pos,
            Position {
                x: config().origin_x,
                y: config().origin_y
            }
        );
    }

    #[test]
    fn deleted_media_is_ignored() {
        let mut el = image("a", 320.0, 120.0, 300.0, 300.0);
        el.is_deleted = true;
        let pos = next_position(&[el], &config());
        assert_eq!(
            pos,
            Position {
                x: config().origin_x,
                y: config().origin_y
            }
        );
    }

    #[test]
    fn second_image_goes_right_of_first() {
        let elements = vec![image("a", 320.0, 120.0, 300.0, 200.0)];
        let pos = next_position(&elements, &config());
        assert!((pos.x - (320.0 + 300.0 + 24.0)).abs() < f64::EPSILON);
        assert!((pos.y - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn full_row_wraps_below_lowest_extent() {
        let cfg = config();
        let mut elements = Vec::new();
        // Four images in one row, varying heights; lowest extent is 120+260.
        for (i, h) in [200.0, 260.0, 180.0, 220.0].iter().enumerate() {
            elements.push(image(
                &format!("e{i}"),
                320.0 + i as f64 * 324.0,
                120.0,
                300.0,
                *h,
            ));
        }
        let pos = next_position(&elements, &cfg);
        assert!((pos.x - cfg.origin_x).abs() < f64::EPSILON);
        assert!((pos.y - (120.0 + 260.0 + cfg.gap)).abs() < f64::EPSILON);
    }

    #[test]
    fn five_sequential_insertions_pack_four_plus_one() {
        // Five same-size insertions with column limit 4.
        let cfg = config();
        let mut elements: Vec<Element> = Vec::new();
        let mut positions = Vec::new();
        for i in 0..5 {
            let pos = next_position(&elements, &cfg);
            positions.push(pos);
            elements.push(image(&format!("e{i}"), pos.x, pos.y, 300.0, 300.0));
        }

        // Row one: four placements left-to-right at origin_y.
        for (i, pos) in positions[..4].iter().enumerate() {
            assert!((pos.y - cfg.origin_y).abs() < f64::EPSILON, "row one y, image {i}");
            assert!(
                (pos.x - (cfg.origin_x + i as f64 * (300.0 + cfg.gap))).abs() < f64::EPSILON,
                "row one x, image {i}"
            );
        }
        // Fifth opens row two at the reserved x.
        assert!((positions[4].x - cfg.origin_x).abs() < f64::EPSILON);
        assert!((positions[4].y - (cfg.origin_y + 300.0 + cfg.gap)).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_last_row_extends_rightmost_member() {
        let cfg = config();
        let elements = vec![
            // Row one: full.
            image("a", 320.0, 100.0, 300.0, 300.0),
            image("b", 644.0, 100.0, 300.0, 300.0),
            image("c", 968.0, 100.0, 300.0, 300.0),
            image("d", 1292.0, 100.0, 300.0, 300.0),
            // Row two: one member, listed out of order.
            image("e", 320.0, 424.0, 300.0, 220.0),
        ];
        let pos = next_position(&elements, &cfg);
        assert!((pos.x - (320.0 + 300.0 + cfg.gap)).abs() < f64::EPSILON);
        assert!((pos.y - 424.0).abs() < f64::EPSILON);
    }

    #[test]
    fn varying_sizes_cluster_by_overlap() {
        let cfg = config();
        // Two elements at slightly different y but overlapping ranges form
        // one row; the next lands to the right of the rightmost.
        let elements = vec![
            image("a", 320.0, 120.0, 300.0, 200.0),
            image("b", 644.0, 160.0, 240.0, 200.0),
        ];
        let pos = next_position(&elements, &cfg);
        assert!((pos.x - (644.0 + 240.0 + cfg.gap)).abs() < f64::EPSILON);
        assert!((pos.y - 160.0).abs() < f64::EPSILON);
    }

    #[test]
    fn disjoint_vertical_ranges_form_separate_rows() {
        let cfg = config();
        let elements = vec![
            image("a", 320.0, 120.0, 300.0, 100.0),
            image("b", 320.0, 400.0, 300.0, 100.0),
        ];
        let pos = next_position(&elements, &cfg);
        // Last row is the lower one; extend it rightward.
        assert!((pos.x - (320.0 + 300.0 + cfg.gap)).abs() < f64::EPSILON);
        assert!((pos.y - 400.0).abs() < f64::EPSILON);
    }
}
