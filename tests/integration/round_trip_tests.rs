/*!
 * Import then export through the library API
 */

use anyhow::Result;
use skelweave::app_config::{ExportConfig, ImportConfig};
use skelweave::errors::ConversionError;
use skelweave::pipeline::{DocumentExporter, DocumentImporter, PlainTextAdapter};
use skelweave::skeleton::Skeleton;
use skelweave::translation::{Phase, Target};
use crate::common;

const SAMPLE_SKELETON: &str = r#"<format id='1'/>
<format id='2'/>
<html>
<head><title><placeholder id='tu1'/></title></head>
<body>
<format id='3'/>
<h1><placeholder id='tu2'/></h1>
<p><placeholder id='tu3'/></p>
<ul>
<li><placeholder id='tu4'/></li>
<li><p><placeholder id='tu5'/></p></li>
</ul>
<img src="logo.png"/>
<p>   </p>
<p><placeholder id='tu6'/></p>
</body>
</html>
"#;

fn source_fallback() -> ExportConfig {
    ExportConfig {
        fallback_to_source: true,
        ..ExportConfig::default()
    }
}

/// Test the skeleton and units produced for the sample document
#[test]
fn test_import_withSampleDocument_shouldProduceExpectedSkeleton() -> Result<()> {
    common::init_logging();
    let result = DocumentImporter::new(&ImportConfig::default(), "en")
        .import_document("menu.xml", common::SAMPLE_DOCUMENT)?;

    assert_eq!(result.skeleton(), SAMPLE_SKELETON);
    assert_eq!(result.warning_count(), 0);
    assert_eq!(result.interchange.len(), 6);
    assert_eq!(result.interchange.original, "menu.xml");
    assert!(result.interchange.checksum.is_some());

    let title = result.interchange.unit("tu1").unwrap();
    assert_eq!(title.source, r#"<mrk mtype="x-coretext">Fish &amp;amp; Chips</mrk>"#);
    let paragraph = result.interchange.unit("tu3").unwrap();
    assert_eq!(
        paragraph.source,
        r#"<mrk mtype="x-coretext">Today we serve <bpt id="4"/>fresh<ept id="5"/> fish.<ph id="6"/>Ask for <bpt id="7"/>specials<ept id="8"/>!</mrk>"#
    );

    let skeleton = Skeleton::parse(result.skeleton());
    assert!(skeleton.dangling_references(&result.interchange, &result.formats).is_empty());
    assert_eq!(result.formats.len(), 9);
    Ok(())
}

/// Test that an untranslated export reproduces the input byte for byte
#[test]
fn test_round_trip_withSourceFallback_shouldBeByteIdentical() -> Result<()> {
    let result = DocumentImporter::new(&ImportConfig::default(), "en")
        .import_document("menu.xml", common::SAMPLE_DOCUMENT)?;

    let exporter = DocumentExporter::new(&source_fallback(), "fr");
    let output = exporter.export(result.skeleton(), &result.interchange, &result.formats)?;

    assert_eq!(output, common::SAMPLE_DOCUMENT);
    Ok(())
}

/// Test that the round trip survives writing the artefacts as text
#[test]
fn test_round_trip_throughSerializedArtefacts_shouldBeByteIdentical() -> Result<()> {
    let result = DocumentImporter::new(&ImportConfig::default(), "en")
        .import_document("menu.xml", common::SAMPLE_DOCUMENT)?;

    let interchange = skelweave::translation::InterchangeDocument::parse(&result.interchange.to_xml())?;
    let formats = skelweave::format_store::FormatStore::parse(&result.formats.to_table_string())?;

    let output = DocumentExporter::new(&source_fallback(), "fr").export(result.skeleton(), &interchange, &formats)?;
    assert_eq!(output, common::SAMPLE_DOCUMENT);
    Ok(())
}

/// Test a partially translated export
#[test]
fn test_export_withTranslations_shouldRenderTargetsAndKeepStructure() -> Result<()> {
    let mut result = DocumentImporter::new(&ImportConfig::default(), "en")
        .import_document("menu.xml", common::SAMPLE_DOCUMENT)?;

    let interchange = &mut result.interchange;
    assert!(interchange.add_target("tu1", Target::new("fr", Phase::Unset, "Poisson &amp;amp; frites")));
    assert!(interchange.add_target("tu2", Target::new("fr", Phase::Unset, "Carte")));
    assert!(interchange.add_target(
        "tu3",
        Target::new(
            "fr",
            Phase::Unset,
            r#"<bpt id="4"/>Poisson<ept id="5"/> frais.<ph id="6"/>Demandez les <bpt id="7"/>spécialités<ept id="8"/> !"#,
        ),
    ));

    let output = DocumentExporter::new(&source_fallback(), "fr").export(result.skeleton(), &result.interchange, &result.formats)?;

    assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n"));
    assert!(output.contains("<title>Poisson &amp; frites</title>"));
    assert!(output.contains("<h1>Carte</h1>"));
    assert!(output.contains(
        r#"<p><b>Poisson</b> frais.<br/>Demandez les <a href="specials.html">spécialités</a> !</p>"#
    ));
    assert!(output.contains("<li>Cod</li>"));
    assert!(output.contains("<!-- navigation -->"));

    let strict = DocumentExporter::new(&ExportConfig::default(), "fr");
    let sparse = strict.export(result.skeleton(), &result.interchange, &result.formats)?;
    assert!(sparse.contains("<li></li>"));
    assert!(sparse.contains("<h1>Carte</h1>"));
    Ok(())
}

/// Test plain text documents through the adapter
#[test]
fn test_round_trip_withPlainText_shouldRestoreLines() -> Result<()> {
    let native = "Hello & welcome\n\n  Second line <x>\nlast";
    let result = DocumentImporter::with_adapter(&ImportConfig::default(), "en", Box::new(PlainTextAdapter))
        .import_document("notes.txt", native)?;

    assert_eq!(result.interchange.datatype, "plaintext");
    assert_eq!(result.interchange.len(), 3);
    assert_eq!(
        result.skeleton(),
        "<p><placeholder id='tu1'/></p>\n\n<p><placeholder id='tu2'/></p>\n<p><placeholder id='tu3'/></p>"
    );

    let exporter = DocumentExporter::with_adapter(&source_fallback(), "de", Box::new(PlainTextAdapter));
    assert_eq!(exporter.export(result.skeleton(), &result.interchange, &result.formats)?, native);

    let mut interchange = result.interchange.clone();
    interchange.add_target("tu1", Target::new("de", Phase::Unset, "Hallo & willkommen"));
    let translated = exporter.export(result.skeleton(), &interchange, &result.formats)?;
    assert_eq!(translated, "Hallo & willkommen\n\n  Second line <x>\nlast");
    Ok(())
}

/// Test that exclude regions are dropped before anything is extracted
#[test]
fn test_import_withExcludeRegion_shouldIgnoreItsContent() -> Result<()> {
    let native = "<doc><xliff-exclude><p>old copy</p></xliff-exclude><p>Current</p></doc>";
    let result = DocumentImporter::new(&ImportConfig::default(), "en").import_document("doc.xml", native)?;

    assert_eq!(result.interchange.len(), 1);
    assert_eq!(result.skeleton(), "<doc><p><placeholder id='tu1'/></p></doc>");
    assert_eq!(result.warning_count(), 0);
    Ok(())
}

/// Test that strict mode turns merge warnings into a failure
#[test]
fn test_import_withStrictModeAndWarning_shouldFail() {
    let config = ImportConfig {
        strict: true,
        ..ImportConfig::default()
    };
    let native = "<doc><p>Text</p></xliff-exclude></doc>";

    let err = DocumentImporter::new(&config, "en").import_document("doc.xml", native).unwrap_err();
    assert!(matches!(err, ConversionError::StrictMode { warnings: 1 }));

    let lenient = DocumentImporter::new(&ImportConfig::default(), "en")
        .import_document("doc.xml", native)
        .unwrap();
    assert_eq!(lenient.warning_count(), 1);
}

/// Test that a mismatching checksum only warns
#[test]
fn test_export_withForeignSkeleton_shouldStillRender() -> Result<()> {
    let result = DocumentImporter::new(&ImportConfig::default(), "en")
        .import_document("doc.xml", "<p>One</p>")?;

    assert!(DocumentExporter::verify_checksum(&[result.skeleton()], &result.interchange));
    assert!(!DocumentExporter::verify_checksum(&["<p>other</p>"], &result.interchange));

    let output = DocumentExporter::new(&source_fallback(), "fr")
        .export("<div><placeholder id='tu1'/></div>", &result.interchange, &result.formats)?;
    assert_eq!(output, "<div>One</div>");
    Ok(())
}

/// Test that a translated ampersand renders as well-formed markup by default
#[test]
fn test_export_withAmpersandTarget_shouldEscapeUnlessDisabled() -> Result<()> {
    let native = "<html><title>Fish &amp; Chips</title></html>";
    let mut result = DocumentImporter::new(&ImportConfig::default(), "en").import_document("menu.xml", native)?;

    let unchanged = DocumentExporter::new(&source_fallback(), "fr").export(result.skeleton(), &result.interchange, &result.formats)?;
    assert_eq!(unchanged, native);

    result.interchange.add_target("tu1", Target::new("fr", Phase::Unset, "Poisson &amp; frites"));

    let escaped = DocumentExporter::new(&ExportConfig::default(), "fr")
        .export(result.skeleton(), &result.interchange, &result.formats)?;
    assert_eq!(escaped, "<html><title>Poisson &amp; frites</title></html>");

    let raw_config = ExportConfig {
        escape_ampersands: false,
        ..ExportConfig::default()
    };
    let raw = DocumentExporter::new(&raw_config, "fr").export(result.skeleton(), &result.interchange, &result.formats)?;
    assert_eq!(raw, "<html><title>Poisson & frites</title></html>");
    Ok(())
}

/// Test that native tags named like skeleton tokens survive the round trip
#[test]
fn test_round_trip_withPlaceholderShapedElements_shouldBeByteIdentical() -> Result<()> {
    for native in [
        "<doc><format id='1'/><p>Hi</p></doc>",
        "<doc><placeholder id='x'/><p>Hi</p></doc>",
    ] {
        let result = DocumentImporter::new(&ImportConfig::default(), "en").import_document("doc.xml", native)?;
        let skeleton = Skeleton::parse(result.skeleton());
        assert!(skeleton.dangling_references(&result.interchange, &result.formats).is_empty());

        let output = DocumentExporter::new(&source_fallback(), "fr").export(result.skeleton(), &result.interchange, &result.formats)?;
        assert_eq!(output, native);
    }
    Ok(())
}

/// Test that XLIFF-shaped input keeps source and target slots apart
#[test]
fn test_round_trip_withTargetElements_shouldMarkTargetPlaceholders() -> Result<()> {
    let native = r#"<trans-unit id="1"><source>Hello</source><target xml:lang="fr">Bonjour</target></trans-unit>"#;
    let result = DocumentImporter::new(&ImportConfig::default(), "en").import_document("strings.xml", native)?;

    assert!(result.skeleton().contains("<source><placeholder id='tu1'/></source>"));
    assert!(result.skeleton().contains(r#"<target xml:lang="fr"><placeholder id='tu2' istarget='true' xml:lang='fr'/></target>"#));
    assert_eq!(result.interchange.unit("tu2").unwrap().source_locale, "fr");

    let output = DocumentExporter::new(&source_fallback(), "de").export(result.skeleton(), &result.interchange, &result.formats)?;
    assert_eq!(output, native);
    Ok(())
}
