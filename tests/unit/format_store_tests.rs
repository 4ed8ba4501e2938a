/*!
 * Tests for the format table
 */

use anyhow::Result;
use skelweave::format_store::{FormatEntry, FormatStore, FormatTableBuilder};
use skelweave::errors::FormatTableError;
use crate::common;

/// Test that a missing id yields an empty string
#[test]
fn test_lookup_withMissingId_shouldReturnEmpty() {
    let store = FormatTableBuilder::new().build();
    assert_eq!(store.lookup(42), "");
    assert_eq!(store.lookup_formatted(42, true), "");
}

/// Test that markup mode re-prepends the stripped delimiter
#[test]
fn test_lookup_withMarkupTable_shouldPrependDelimiter() {
    let mut builder = FormatTableBuilder::new();
    builder.insert(1, "<b>");
    builder.insert(2, "</b>");
    let store = builder.build();

    assert!(!store.is_cdata_literal());
    assert_eq!(store.entry(1).unwrap().text, "b>");
    assert_eq!(store.lookup(1), "<b>");
    assert_eq!(store.lookup(2), "</b>");
    assert_eq!(store.lookup_formatted(1, false), "b>");
}

/// Test that any non-markup entry switches the table to CDATA-literal mode
#[test]
fn test_build_withNonMarkupEntry_shouldUseCdataMode() {
    let mut builder = FormatTableBuilder::new();
    builder.insert(1, "<b>");
    builder.insert(2, "%s");
    let store = builder.build();

    assert!(store.is_cdata_literal());
    assert_eq!(store.lookup(1), "<b>");
    assert_eq!(store.lookup(2), "%s");
    assert_eq!(store.lookup_formatted(2, true), "<%s");
}

/// Test that CDATA-flagged entries are wrapped and never prefixed
#[test]
fn test_lookup_withCdataEntry_shouldWrapPayload() {
    let mut builder = FormatTableBuilder::new();
    builder.insert(1, "<i>");
    builder.insert_cdata(2, "a < b");
    let store = builder.build();

    assert!(!store.is_cdata_literal());
    assert_eq!(store.lookup(2), "<![CDATA[a < b]]>");
    assert_eq!(store.lookup_formatted(2, true), "<![CDATA[a < b]]>");
}

/// Test parsing the on-disk shape with flags
#[test]
fn test_parse_withFlags_shouldReadEntries() -> Result<()> {
    let table = r#"<?xml version="1.0" encoding="UTF-8"?>
<formatting cdata-literal="false">
<entry id="1">a href="x?a=1&amp;b=2"&gt;</entry>
<entry id="7" cdataTagIsLiteral="true" recursive="true"><![CDATA[x]]]]><![CDATA[>y]]></entry>
<entry id="8"/>
</formatting>
"#;
    let store = FormatStore::parse(table)?;

    assert_eq!(store.len(), 3);
    assert_eq!(store.lookup(1), r#"<a href="x?a=1&b=2">"#);
    let flagged = store.entry(7).unwrap();
    assert!(flagged.cdata_literal);
    assert!(flagged.recursive);
    assert_eq!(flagged.text, "x]]>y");
    assert_eq!(store.lookup(8), "");
    Ok(())
}

/// Test that a table written to disk reads back identically
#[test]
fn test_save_load_withMixedEntries_shouldPreserveLookups() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("doc.fmt");

    let mut builder = FormatTableBuilder::new();
    builder.insert(1, "<?pi data?>");
    builder.insert(2, "<span class=\"x\">");
    builder.insert_cdata(3, "]]> tricky");
    builder.insert_entry(FormatEntry {
        recursive: true,
        ..FormatEntry::new(4, "<u>")
    });
    let store = builder.build();
    store.save(&path)?;

    let loaded = FormatStore::load(&path)?;
    for id in 1..=4 {
        assert_eq!(loaded.lookup(id), store.lookup(id), "entry {}", id);
    }
    assert!(loaded.entry(4).unwrap().recursive);
    Ok(())
}

/// Test error reporting for malformed tables
#[test]
fn test_parse_withBadInput_shouldReturnTypedErrors() {
    assert_eq!(FormatStore::parse("<entries/>").unwrap_err(), FormatTableError::MissingRoot);
    assert_eq!(
        FormatStore::parse(r#"<formatting><entry id="x">a</entry></formatting>"#).unwrap_err(),
        FormatTableError::InvalidId("x".to_string())
    );
    assert!(matches!(
        FormatStore::parse(r#"<formatting><entry id="1">a</formatting>"#).unwrap_err(),
        FormatTableError::MalformedEntry(_)
    ));
}
