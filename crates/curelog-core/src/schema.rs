/// Arrow schema definitions for the two record sheets.
///
/// Every cell is held as text, the way a spreadsheet holds it. Typed values
/// are recovered later by the tolerant parsers in [`crate::cells`].
pub mod sheets {
    use arrow::datatypes::{DataType, Field, Schema};

    pub const BATCHES: &str = "soap_batches";
    pub const READINGS: &str = "weight_readings";

    pub const SOAP_NAME: &str = "soap_name";
    pub const BATCH_NUMBER: &str = "batch_number";
    pub const TYPE: &str = "type";
    pub const HEIGHT_MM: &str = "height_mm";
    pub const WIDTH_MM: &str = "width_mm";
    pub const THICKNESS_MM: &str = "thickness_mm";
    pub const SURFACE_AREA: &str = "surface_area";
    pub const NOTES: &str = "notes";
    pub const INITIAL_WEIGHT_G: &str = "initial_weight_g";
    pub const INITIAL_DATE: &str = "initial_date";
    pub const DATE: &str = "date";
    pub const WEIGHT_G: &str = "weight_g";

    /// Column order of the `soap_batches` sheet.
    pub const BATCH_COLUMNS: &[&str] = &[
        SOAP_NAME,
        BATCH_NUMBER,
        TYPE,
        HEIGHT_MM,
        WIDTH_MM,
        THICKNESS_MM,
        SURFACE_AREA,
        NOTES,
        INITIAL_WEIGHT_G,
        INITIAL_DATE,
    ];

    /// Column order of the `weight_readings` sheet.
    pub const READING_COLUMNS: &[&str] = &[SOAP_NAME, BATCH_NUMBER, DATE, WEIGHT_G];

    /// Schema for batch records (one row per soap batch).
    pub fn batches_schema() -> Schema {
        text_schema(BATCH_COLUMNS)
    }

    /// Schema for the append-only weight readings log.
    pub fn readings_schema() -> Schema {
        text_schema(READING_COLUMNS)
    }

    /// Build an all-`Utf8` schema from a header row.
    ///
    /// Used for sheets whose header differs from the canonical layout, e.g.
    /// an older file without a `type` column.
    pub fn text_schema<S: AsRef<str>>(columns: &[S]) -> Schema {
        Schema::new(
            columns
                .iter()
                .map(|c| Field::new(c.as_ref(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        )
    }
}
