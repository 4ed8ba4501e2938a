/*!
 * Tests for the skeleton merger
 */

use skelweave::errors::ConversionError;
use skelweave::skeleton::{ExcludeMarkers, MergeOptions, MergeWarning, SkeletonMerger, StructuralTrace};

const SOURCE_TRACE: &str = "<source seq='3'>\n<tu id='T1' istarget='false' xml:lang='en'>\n</source seq='3'>\n";

fn merger() -> SkeletonMerger {
    SkeletonMerger::new(MergeOptions::default())
}

/// Test the basic replacement of a translatable span
#[test]
fn test_merge_withSingleTu_shouldReplaceSpanInPlace() {
    let original = "<doc><source seq='3'>Hello</source></doc>";
    let outcome = merger().merge_text(SOURCE_TRACE, original).unwrap();

    let expected_prefix = "<doc><source seq='3'><placeholder id='T1'/></source>";
    assert_eq!(outcome.skeleton, format!("{}</doc>", expected_prefix));
    assert_eq!(outcome.cursor, expected_prefix.len());
    assert!(outcome.warnings.is_empty());
}

/// Test that a non-source locale is written on the placeholder
#[test]
fn test_merge_withTargetLocale_shouldKeepLocaleAttribute() {
    let trace = "<p seq='1'>\n<tu id='T2' istarget='true' xml:lang='fr-FR'>\n</p seq='1'>\n";
    let outcome = merger().merge_text(trace, "<p>Bonjour</p>").unwrap();
    assert_eq!(
        outcome.skeleton,
        "<p><placeholder id='T2' istarget='true' xml:lang='fr-FR'/></p>"
    );
}

/// Test that a locale equal to the source only differing in case is omitted
#[test]
fn test_merge_withSourceLocaleVariant_shouldOmitLocale() {
    let trace = "<p seq='1'>\n<tu id='T3' istarget='false' xml:lang='EN'>\n</p seq='1'>\n";
    let outcome = merger().merge_text(trace, "<p>Hi</p>").unwrap();
    assert_eq!(outcome.skeleton, "<p><placeholder id='T3'/></p>");
}

/// Test that seq attributes disambiguate identical tags
#[test]
fn test_merge_withSeqAttributes_shouldPickNumberedTag() {
    let trace = "<s seq='2'>\n<tu id='B' istarget='false' xml:lang='en'>\n</s seq='2'>\n";
    let original = "<s seq='1'>one</s><s seq='2'>two</s>";
    let outcome = merger().merge_text(trace, original).unwrap();
    assert_eq!(outcome.skeleton, "<s seq='1'>one</s><s seq='2'><placeholder id='B'/></s>");
}

/// Test that exclude regions are removed innermost first
#[test]
fn test_normalize_excludes_withNestedRegions_shouldRemoveAll() {
    let merger = merger();
    let mut text = "a<xliff-exclude>b<xliff-exclude>c</xliff-exclude>d</xliff-exclude>e".to_string();
    let warnings = merger.normalize_excludes(&mut text);

    assert!(warnings.is_empty());
    assert_eq!(text, "ae");

    let again = merger.normalize_excludes(&mut text);
    assert!(again.is_empty());
    assert_eq!(text, "ae");
}

/// Test that an unmatched closing marker stops normalisation with a warning
#[test]
fn test_normalize_excludes_withUnmatchedClose_shouldWarnAndStop() {
    let mut text = "x</xliff-exclude>y".to_string();
    let warnings = merger().normalize_excludes(&mut text);
    assert_eq!(warnings, vec![MergeWarning::UnmatchedExcludeClose { offset: 1 }]);
    assert_eq!(text, "x</xliff-exclude>y");
}

/// Test that empty markers disable normalisation
#[test]
fn test_normalize_excludes_withEmptyMarkers_shouldDoNothing() {
    let merger = SkeletonMerger::new(MergeOptions {
        exclude: ExcludeMarkers {
            open: String::new(),
            close: String::new(),
        },
        ..MergeOptions::default()
    });
    let mut text = "<xliff-exclude>kept</xliff-exclude>".to_string();
    assert!(merger.normalize_excludes(&mut text).is_empty());
    assert_eq!(text, "<xliff-exclude>kept</xliff-exclude>");
}

/// Test that the phantom close of a self-closing element is skipped
#[test]
fn test_merge_withSelfClosingElement_shouldSkipPhantomClose() {
    let trace = "<img seq='1'>\n</img seq='2'>\n<p seq='3'>\n<tu id='T1' istarget='false' xml:lang='en'>\n</p seq='3'>\n";
    let original = "<img src='a.png'/><p>Caption</p>";
    let outcome = merger().merge_text(trace, original).unwrap();

    assert_eq!(outcome.skeleton, "<img src='a.png'/><p><placeholder id='T1'/></p>");
    assert!(outcome.warnings.is_empty());
}

/// Test that a missing tag is reported and the merge carries on
#[test]
fn test_merge_withMissingTag_shouldWarnAndContinue() {
    let trace = "<missing seq='1'>\n<p seq='2'>\n<tu id='T1' istarget='false' xml:lang='en'>\n</p seq='2'>\n";
    let outcome = merger().merge_text(trace, "<p>Text</p>").unwrap();

    assert_eq!(outcome.skeleton, "<p><placeholder id='T1'/></p>");
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(
        &outcome.warnings[0],
        MergeWarning::TagNotFound { line_no: 1, tag } if tag == "<missing seq='1'>"
    ));
}

/// Test that a closing tag missing after a TU leaves the text in place
#[test]
fn test_merge_withMissingTerminator_shouldKeepText() {
    let trace = "<p seq='1'>\n<tu id='T1' istarget='false' xml:lang='en'>\n</q seq='2'>\n";
    let outcome = merger().merge_text(trace, "<p>Text</p>").unwrap();

    assert_eq!(outcome.skeleton, "<p><placeholder id='T1'/>Text</p>");
    assert_eq!(outcome.warnings.len(), 1);
}

/// Test that TUs beyond the maximum nesting depth are skipped
#[test]
fn test_merge_withTooDeepNesting_shouldSkipInnerTu() {
    let trace = "<p seq='1'>\n<tu id='T1' istarget='false' xml:lang='en'>\n<tu id='T2' istarget='false' xml:lang='en'>\n</p seq='1'>\n";
    let outcome = merger().merge_text(trace, "<p>Text</p>").unwrap();

    assert_eq!(outcome.skeleton, "<p><placeholder id='T1'/></p>");
    assert_eq!(
        outcome.warnings,
        vec![MergeWarning::NestingTooDeep {
            line_no: 3,
            id: "T2".to_string(),
            max_depth: 1,
        }]
    );
}

/// Test that closing a container after a TU inserts a wildcard placeholder
#[test]
fn test_merge_withContainerClose_shouldInsertWildcard() {
    let trace = "<trans-unit seq='1'>\n<source seq='2'>\n<tu id='T1' istarget='false' xml:lang='en'>\n</source seq='2'>\n</trans-unit seq='1'>\n";
    let original = "<trans-unit seq='1'><source seq='2'>Hi</source></trans-unit>";
    let outcome = merger().merge_text(trace, original).unwrap();

    assert_eq!(
        outcome.skeleton,
        "<trans-unit seq='1'><source seq='2'><placeholder id='T1'/></source><placeholder id='T1' wildcard='true'/></trans-unit>"
    );
}

/// Test that exclude regions never reach the skeleton
#[test]
fn test_merge_withExcludeRegion_shouldDropRegion() {
    let trace = "<p seq='1'>\n<tu id='T1' istarget='false' xml:lang='en'>\n</p seq='1'>\n";
    let original = "<xliff-exclude><p>copy</p></xliff-exclude><p>Text</p>";
    let outcome = merger().merge_text(trace, original).unwrap();
    assert_eq!(outcome.skeleton, "<p><placeholder id='T1'/></p>");
}

/// Test that an invalid trace is fatal
#[test]
fn test_merge_text_withInvalidTrace_shouldFail() {
    let result = merger().merge_text("<p seq='2'>\n<q seq='1'>\n", "<p><q></q></p>");
    assert!(matches!(result, Err(ConversionError::Trace(_))));
}

/// Test that only UTF-8 output is accepted
#[test]
fn test_merge_to_withEncodings_shouldRejectNonUtf8() {
    let trace = StructuralTrace::parse(SOURCE_TRACE).unwrap();
    let original = "<source seq='3'>Hello</source>";

    let mut out = Vec::new();
    let result = merger().merge_to(&trace, original, &mut out, "ISO-8859-1");
    assert!(matches!(result, Err(ConversionError::UnsupportedEncoding(label)) if label == "ISO-8859-1"));
    assert!(out.is_empty());

    let warnings = merger().merge_to(&trace, original, &mut out, "UTF-8").unwrap();
    assert!(warnings.is_empty());
    assert_eq!(String::from_utf8(out).unwrap(), "<source seq='3'><placeholder id='T1'/></source>");
}

/// Test that the highest sequence number does not overflow the phantom-close check
#[test]
fn test_merge_withMaximumSequence_shouldNotOverflow() {
    let trace = "<br seq='18446744073709551615'>\n</br seq='18446744073709551615'>\n";
    let outcome = merger().merge_text(trace, "<br/>").unwrap();

    assert_eq!(outcome.skeleton, "<br/>");
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(outcome.warnings[0], MergeWarning::TagNotFound { line_no: 2, .. }));
}
