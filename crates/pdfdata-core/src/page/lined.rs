//! Lined strategy: geometry and end-of-line flags only.

use crate::checkpoint::Interrupted;
use crate::fragment::ContentItem;
use crate::geometry::BBox;

use super::{RowBuilder, skip_artifact};

pub(super) fn parse(
    builder: &mut RowBuilder<'_>,
    items: &[ContentItem],
    keep_artifacts: bool,
) -> Result<(), Interrupted> {
    let mut was_eol = false;
    let mut prev: Option<BBox> = None;

    for item in items {
        // Marked-content events carry no geometry.
        let ContentItem::Text(fragment) = item else {
            continue;
        };
        if skip_artifact(fragment, false, keep_artifacts) {
            continue;
        }
        builder.check_direction(fragment);

        let aligns = builder.alignment(fragment);
        if !aligns.adjacent {
            if let Some(bbox) = builder.flush_cell()? {
                prev = Some(bbox);
            }
        }

        // Soft wrap, e.g. a heading split over two lines.
        if was_eol && (aligns.top || ((aligns.left || aligns.right) && aligns.adjacent)) {
            was_eol = false;
        }

        if was_eol {
            if let Some(bbox) = builder.flush_cell()? {
                prev = Some(bbox);
            }
            let newline = prev.is_none_or(|p| fragment.y < p.y2);
            if newline && !builder.row_is_empty() {
                builder.end_row();
            }
        }

        builder.add(fragment);
        was_eol = fragment.has_eol;
    }
    Ok(())
}
