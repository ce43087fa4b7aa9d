//! Display labels used to group readings into chart series.

/// Build the chart label for a soap.
///
/// `"Lavender"`, `"Lavender (Batch 3)"`, `"Lavender (Batch 3) – Bar"`.
/// Empty batch numbers and types are left out.
pub fn make_label(soap_name: &str, batch_number: &str, soap_type: &str) -> String {
    let mut label = soap_name.trim().to_string();
    let batch = batch_number.trim();
    if !batch.is_empty() {
        label.push_str(&format!(" (Batch {batch})"));
    }
    let typ = soap_type.trim();
    if !typ.is_empty() {
        label.push_str(&format!(" – {typ}"));
    }
    label
}
