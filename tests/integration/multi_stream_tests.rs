/*!
 * Several physical streams imported as one logical document
 */

use anyhow::Result;
use std::collections::HashSet;
use skelweave::app_config::{ExportConfig, ImportConfig, TuIdStyle};
use skelweave::ids::AllocatorState;
use skelweave::pipeline::{DocumentExporter, DocumentImporter};
use skelweave::skeleton::Skeleton;
use skelweave::translation::{Phase, Target};

const CONTENT_STREAM: &str = "<doc><p>A <b>bold</b> move</p><!-- a --></doc>";
const STYLES_STREAM: &str = "<styles><p>B <i>it</i></p><?pi x?></styles>";

/// Test that ids never collide between streams
#[test]
fn test_import_withTwoStreams_shouldShareIdSpaces() -> Result<()> {
    let mut importer = DocumentImporter::new(&ImportConfig::default(), "en");

    let first = importer.import_stream("content", CONTENT_STREAM)?;
    assert_eq!(first.skeleton, "<doc><p><placeholder id='tu1'/></p><format id='3'/></doc>");
    assert_eq!(
        importer.allocator_state(),
        AllocatorState { last_markup_id: 3, structural_position: 2 }
    );

    let second = importer.import_stream("styles", STYLES_STREAM)?;
    assert_eq!(second.skeleton, "<styles><p><placeholder id='tu2'/></p><format id='6'/></styles>");
    assert_eq!(
        importer.allocator_state(),
        AllocatorState { last_markup_id: 6, structural_position: 4 }
    );

    let result = importer.finish("package");
    assert_eq!(result.streams.len(), 2);
    assert_eq!(result.formats.len(), 6);
    assert_eq!(result.formats.lookup(4), "<i>");
    assert_eq!(result.formats.lookup(6), "<?pi x?>");

    let tu_ids: HashSet<&str> = result.interchange.units().iter().map(|u| u.id.as_str()).collect();
    assert_eq!(tu_ids.len(), 2);

    let mut markup_ids = HashSet::new();
    for stream in &result.streams {
        for id in Skeleton::parse(&stream.skeleton).markup_ids() {
            assert!(markup_ids.insert(id), "markup id {} used twice", id);
        }
    }
    Ok(())
}

/// Test rendering every stream against the shared interchange document
#[test]
fn test_export_streams_withSharedDocument_shouldRenderEachStream() -> Result<()> {
    let mut importer = DocumentImporter::new(&ImportConfig::default(), "en");
    importer.import_stream("content", CONTENT_STREAM)?;
    importer.import_stream("styles", STYLES_STREAM)?;
    let mut result = importer.finish("package");

    let skeletons: Vec<&str> = result.streams.iter().map(|s| s.skeleton.as_str()).collect();
    assert!(DocumentExporter::verify_checksum(&skeletons, &result.interchange));

    let fallback = ExportConfig {
        fallback_to_source: true,
        ..ExportConfig::default()
    };
    let exporter = DocumentExporter::new(&fallback, "fr");
    let rendered = exporter.export_streams(&skeletons, &result.interchange, &result.formats)?;
    assert_eq!(rendered, vec![CONTENT_STREAM.to_string(), STYLES_STREAM.to_string()]);

    result
        .interchange
        .add_target("tu2", Target::new("fr", Phase::Unset, r#"B <bpt id="4"/>ça<ept id="5"/>"#));
    let skeletons: Vec<&str> = result.streams.iter().map(|s| s.skeleton.as_str()).collect();
    let rendered = exporter.export_streams(&skeletons, &result.interchange, &result.formats)?;
    assert_eq!(rendered[1], "<styles><p>B <i>ça</i></p><?pi x?></styles>");
    Ok(())
}

/// Test that UUID TU ids stay unique across streams
#[test]
fn test_import_withUuidIds_shouldKeepIdsUnique() -> Result<()> {
    let config = ImportConfig {
        tu_id_style: TuIdStyle::Uuid,
        ..ImportConfig::default()
    };
    let mut importer = DocumentImporter::new(&config, "en");
    importer.import_stream("one", "<p>x</p><p>y</p>")?;
    importer.import_stream("two", "<p>z</p>")?;
    let result = importer.finish("uuid-doc");

    let ids: HashSet<&str> = result.interchange.units().iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.len() == 36));
    Ok(())
}
