//! Applies a URL mapping to a product table.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{IMAGE_SRC_COLUMN, Table, VARIANT_IMAGE_COLUMN};
use crate::migrate::UrlMapping;

/// Column receiving the migrated primary image URL.
pub const MAPPED_IMAGE_COLUMN: &str = "GitHub_Image_Src";

/// Column receiving the migrated variant image URL.
pub const MAPPED_VARIANT_COLUMN: &str = "GitHub_Variant_Image";

/// Mapping table column holding the source URL.
pub const MAPPING_SOURCE_COLUMN: &str = "Dropbox_URL";

/// Mapping table column holding the published URL.
pub const MAPPING_PUBLISHED_COLUMN: &str = "GitHub_URL";

/// Suffix inserted before the extension of the augmented output file.
pub const OUTPUT_SUFFIX: &str = "_with_github_urls";

/// Default file name of the standalone mapping table.
pub const DEFAULT_MAPPING_FILE: &str = "dropbox_to_github_mappings.csv";

/// What to write into a mapped column when the source cell has no mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MappingFallback {
    /// Leave the mapped column empty.
    #[default]
    Empty,
    /// Copy the original cell value.
    Original,
}

/// Returns `table` with the two mapped-URL columns filled in.
///
/// The columns are appended (or overwritten, when re-processing an earlier
/// output). A source column missing from the input yields empty cells.
#[must_use]
pub fn rewrite(table: &Table, mapping: &UrlMapping, fallback: MappingFallback) -> Table {
    let mut output = table.clone();
    let pairs = [
        (IMAGE_SRC_COLUMN, MAPPED_IMAGE_COLUMN),
        (VARIANT_IMAGE_COLUMN, MAPPED_VARIANT_COLUMN),
    ];

    for (source_column, mapped_column) in pairs {
        let source_index = table.column_index(source_column);
        let target_index = output.ensure_column(mapped_column);
        let mut mapped = 0usize;

        for (row_index, row) in table.rows().iter().enumerate() {
            let original = source_index.map_or("", |index| row[index].as_str());
            let value = match (mapping.get(original), fallback) {
                (Some(url), _) => {
                    mapped += 1;
                    url.to_string()
                }
                (None, MappingFallback::Empty) => String::new(),
                (None, MappingFallback::Original) => original.to_string(),
            };
            output.set_cell(row_index, target_index, value);
        }
        debug!(column = mapped_column, mapped, rows = table.len(), "column rewritten");
    }

    output
}

/// Builds the standalone two-column mapping table, in mapping order.
#[must_use]
pub fn mapping_table(mapping: &UrlMapping) -> Table {
    let mut table = Table::new([MAPPING_SOURCE_COLUMN, MAPPING_PUBLISHED_COLUMN]);
    for (original, published) in mapping.iter() {
        table.push_row([original, published]);
    }
    table
}

/// Returns the sibling path for the augmented table:
/// `products.csv` becomes `products_with_github_urls.csv`.
#[must_use]
pub fn augmented_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |stem| stem.to_string_lossy());
    let extension = input
        .extension()
        .map_or_else(|| "csv".into(), |ext| ext.to_string_lossy());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.{extension}"))
}
