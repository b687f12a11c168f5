/*!
 * Tests for language code utilities
 */

use pagelift::language_utils::{
    get_language_name, language_codes_match, normalize_to_part2t, validate_language_code,
};

#[test]
fn test_normalize_to_part2t_withTwoLetterCode_shouldExpand() {
    assert_eq!(normalize_to_part2t("ja").unwrap(), "jpn");
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
}

#[test]
fn test_normalize_to_part2t_withThreeLetterCode_shouldPassThrough() {
    assert_eq!(normalize_to_part2t("jpn").unwrap(), "jpn");
}

#[test]
fn test_normalize_to_part2t_withBibliographicCode_shouldMapToTerminological() {
    assert_eq!(normalize_to_part2t("chi").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
}

#[test]
fn test_normalize_to_part2t_withWhitespaceAndCase_shouldNormalize() {
    assert_eq!(normalize_to_part2t(" JA ").unwrap(), "jpn");
}

#[test]
fn test_validate_language_code_withInvalidCode_shouldFail() {
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("").is_err());
    assert!(validate_language_code("nihongo").is_err());
}

#[test]
fn test_language_codes_match_shouldCompareAcrossFormats() {
    assert!(language_codes_match("ja", "jpn"));
    assert!(language_codes_match("en", "eng"));
    assert!(!language_codes_match("ja", "en"));
    assert!(!language_codes_match("ja", "not-a-code"));
}

#[test]
fn test_get_language_name_shouldReturnEnglishName() {
    assert_eq!(get_language_name("ja").unwrap(), "Japanese");
    assert_eq!(get_language_name("en").unwrap(), "English");
}
