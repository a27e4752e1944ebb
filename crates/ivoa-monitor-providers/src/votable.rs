// crates/ivoa-monitor-providers/src/votable.rs
// ============================================================================
// Module: VOTable Decoding
// Description: Decode TAP registry VOTable responses into registry records.
// Purpose: Turn TABLEDATA rows into typed records by column name.
// Dependencies: ivoa-monitor-core, roxmltree
// ============================================================================

//! ## Overview
//! Only the TABLEDATA serialization is supported. Columns are located by
//! their `FIELD` names, so the column order of the response does not
//! matter. Element names are matched without namespace because registries
//! answer with VOTable 1.1 to 1.4 namespaces, or none at all.
//!
//! An `INFO name="QUERY_STATUS" value="ERROR"` element turns into
//! [`RegistryError::Query`] carrying the service's message. A
//! `QUERY_STATUS` of `OVERFLOW`, usually placed after the table, marks the
//! answer as truncated at the row limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use ivoa_monitor_core::RegistryAnswer;
use ivoa_monitor_core::RegistryError;
use ivoa_monitor_core::RegistryRecord;
use roxmltree::Document;
use roxmltree::Node;
use roxmltree::ParsingOptions;

// ============================================================================
// SECTION: Column Names
// ============================================================================

/// Columns that must be present in the response.
const REQUIRED_COLUMNS: [&str; 3] = ["ivoid", "access_url", "standard_id"];

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes a TAP VOTable response into registry records.
///
/// The answer is flagged as truncated when the service reports `OVERFLOW`.
///
/// # Errors
///
/// Returns [`RegistryError::Query`] when the service reports a query error,
/// and [`RegistryError::Invalid`] when the payload is not a TABLEDATA VOTable
/// carrying the required columns.
pub fn parse_registry_records(payload: &[u8]) -> Result<RegistryAnswer, RegistryError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| RegistryError::Invalid("response is not utf-8".to_string()))?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(text, options)
        .map_err(|err| RegistryError::Invalid(format!("malformed VOTable: {err}")))?;

    if let Some(message) = query_error(&document) {
        return Err(RegistryError::Query(message));
    }
    let truncated = query_status(&document, "OVERFLOW").is_some();

    let table = document
        .descendants()
        .find(|node| is_element(node, "TABLE"))
        .ok_or_else(|| RegistryError::Invalid("VOTable has no TABLE".to_string()))?;
    let columns = column_indexes(&table)?;

    let Some(data) = table.children().find(|node| is_element(node, "DATA")) else {
        return Ok(RegistryAnswer {
            records: Vec::new(),
            truncated,
        });
    };
    let tabledata = data
        .children()
        .find(|node| is_element(node, "TABLEDATA"))
        .ok_or_else(|| RegistryError::Invalid("unsupported VOTable serialization".to_string()))?;

    let records = tabledata
        .children()
        .filter(|node| is_element(node, "TR"))
        .map(|row| {
            let cells: Vec<String> =
                row.children().filter(|node| is_element(node, "TD")).map(|cell| cell_text(&cell)).collect();
            let value = |name: &str| -> String {
                columns.get(name).and_then(|index| cells.get(*index)).cloned().unwrap_or_default()
            };
            RegistryRecord {
                ivoid: value("ivoid"),
                access_url: value("access_url"),
                title: value("res_title"),
                short_name: value("short_name"),
                standard_id: value("standard_id"),
                interface_type: value("intf_type"),
                standard_version: value("std_version"),
                created: value("created"),
                updated: value("updated"),
                harvested_from: value("harvested_from"),
                contact_name: value("role_name"),
                contact_email: value("email"),
            }
        })
        .collect();
    Ok(RegistryAnswer {
        records,
        truncated,
    })
}

/// Returns the message of an `INFO QUERY_STATUS=ERROR` element, if any.
fn query_error(document: &Document<'_>) -> Option<String> {
    let info = query_status(document, "ERROR")?;
    let message = cell_text(&info);
    Some(if message.is_empty() { "query failed without a message".to_string() } else { message })
}

/// Finds an `INFO QUERY_STATUS` element carrying `value`.
fn query_status<'a, 'input>(document: &'a Document<'input>, value: &str) -> Option<Node<'a, 'input>> {
    document.descendants().find(|node| {
        is_element(node, "INFO")
            && node.attribute("name") == Some("QUERY_STATUS")
            && node.attribute("value").is_some_and(|status| status.eq_ignore_ascii_case(value))
    })
}

/// Maps lowercase `FIELD` names to column positions.
fn column_indexes(table: &Node<'_, '_>) -> Result<BTreeMap<String, usize>, RegistryError> {
    let columns: BTreeMap<String, usize> = table
        .children()
        .filter(|node| is_element(node, "FIELD"))
        .enumerate()
        .filter_map(|(index, field)| field.attribute("name").map(|name| (name.to_ascii_lowercase(), index)))
        .collect();
    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|name| !columns.contains_key(**name)) {
        return Err(RegistryError::Invalid(format!("VOTable is missing column {missing}")));
    }
    Ok(columns)
}

/// Returns true for an element with the given local name.
fn is_element(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Concatenates and trims the text below `node`.
fn cell_text(node: &Node<'_, '_>) -> String {
    node.descendants().filter(Node::is_text).filter_map(|text| text.text()).collect::<String>().trim().to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
