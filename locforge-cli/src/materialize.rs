//! Resource file generation.
//!
//! Pure function from consolidated translation records to the four
//! files an easy_localization app consumes: two flat locale JSON maps
//! plus the generated key-constants and loader sources.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::translation::TranslationRecord;

pub const EN_JSON: &str = "en.json";
pub const AR_JSON: &str = "ar.json";
pub const LOCALE_KEYS_DART: &str = "locale_keys.g.dart";
pub const CODEGEN_LOADER_DART: &str = "codegen_loader.dart";

const GENERATED_HEADER: &str =
    "// DO NOT EDIT. This is code generated via package:easy_localization/generate.dart";

/// One output file of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub filename: &'static str,
    pub content: String,
}

/// Build the four resource files from consolidated records.
///
/// Duplicate keys cannot occur for distinct content after
/// consolidation; if a duplicate still arrives the later record wins
/// in the maps.
pub fn materialize(records: &[TranslationRecord]) -> Vec<GeneratedFile> {
    let en: BTreeMap<&str, &str> = records
        .iter()
        .map(|r| (r.key.as_str(), r.en_text.as_str()))
        .collect();
    let ar: BTreeMap<&str, &str> = records
        .iter()
        .map(|r| (r.key.as_str(), r.ar_text.as_str()))
        .collect();

    let en_json = pretty_json(&en);
    let ar_json = pretty_json(&ar);

    vec![
        GeneratedFile {
            filename: EN_JSON,
            content: format!("{en_json}\n"),
        },
        GeneratedFile {
            filename: AR_JSON,
            content: format!("{ar_json}\n"),
        },
        GeneratedFile {
            filename: LOCALE_KEYS_DART,
            content: locale_keys_source(en.keys().copied()),
        },
        GeneratedFile {
            filename: CODEGEN_LOADER_DART,
            content: codegen_loader_source(&en_json, &ar_json),
        },
    ]
}

fn pretty_json(map: &BTreeMap<&str, &str>) -> String {
    // BTreeMap keys serialize in ascending order; serde_json's pretty
    // printer indents with two spaces.
    serde_json::to_string_pretty(map).expect("string map serialization cannot fail")
}

fn locale_keys_source<'a>(keys: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push_str("\n\nabstract class LocaleKeys {\n");
    for key in keys {
        writeln!(out, "  static const {key} = '{key}';").expect("string write cannot fail");
    }
    out.push_str("}\n");
    out
}

fn codegen_loader_source(en_json: &str, ar_json: &str) -> String {
    format!(
        r#"{GENERATED_HEADER}

// ignore_for_file: prefer_single_quotes

import 'dart:ui';

import 'package:easy_localization/easy_localization.dart' show AssetLoader;

class CodegenLoader extends AssetLoader {{
  const CodegenLoader();

  @override
  Future<Map<String, dynamic>?> load(String path, Locale locale) {{
    return Future.value(mapLocales[locale.toString()]);
  }}

  static const Map<String, dynamic> en = {en_json};

  static const Map<String, dynamic> ar = {ar_json};

  static const Map<String, Map<String, dynamic>> mapLocales = {{
    "en": en,
    "ar": ar,
  }};
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str, en: &str, ar: &str) -> TranslationRecord {
        TranslationRecord {
            key: key.to_string(),
            en_text: en.to_string(),
            ar_text: ar.to_string(),
        }
    }

    fn sample() -> Vec<TranslationRecord> {
        vec![
            record("welcome_message", "Welcome back", "مرحباً بعودتك"),
            record("submit", "Submit", "إرسال"),
        ]
    }

    #[test]
    fn test_produces_exactly_the_four_fixed_files() {
        let files = materialize(&sample());
        let names: Vec<&str> = files.iter().map(|f| f.filename).collect();
        assert_eq!(
            names,
            vec![EN_JSON, AR_JSON, LOCALE_KEYS_DART, CODEGEN_LOADER_DART]
        );
    }

    #[test]
    fn test_locale_maps_round_trip() {
        let files = materialize(&sample());

        let en: BTreeMap<String, String> =
            serde_json::from_str(&files[0].content).unwrap();
        let ar: BTreeMap<String, String> =
            serde_json::from_str(&files[1].content).unwrap();

        let expected_keys: Vec<&str> = vec!["submit", "welcome_message"];
        assert_eq!(en.keys().map(String::as_str).collect::<Vec<_>>(), expected_keys);
        assert_eq!(ar.keys().map(String::as_str).collect::<Vec<_>>(), expected_keys);
        assert_eq!(en.get("submit"), Some(&"Submit".to_string()));
        assert_eq!(ar.get("submit"), Some(&"إرسال".to_string()));
    }

    #[test]
    fn test_json_uses_two_space_indentation() {
        let files = materialize(&sample());
        assert!(files[0].content.contains("\n  \"submit\": \"Submit\""));
    }

    #[test]
    fn test_key_constants_are_sorted_regardless_of_input_order() {
        let files = materialize(&[
            record("zebra", "Zebra", "حمار وحشي"),
            record("apple", "Apple", "تفاحة"),
            record("mango", "Mango", "مانجو"),
        ]);

        let keys_source = &files[2].content;
        let apple = keys_source.find("static const apple").unwrap();
        let mango = keys_source.find("static const mango").unwrap();
        let zebra = keys_source.find("static const zebra").unwrap();
        assert!(apple < mango && mango < zebra);
    }

    #[test]
    fn test_key_constants_equal_their_own_names() {
        let files = materialize(&sample());
        assert!(
            files[2]
                .content
                .contains("static const welcome_message = 'welcome_message';")
        );
    }

    #[test]
    fn test_loader_embeds_both_maps_and_locale_lookup() {
        let files = materialize(&sample());
        let loader = &files[3].content;

        assert!(loader.contains("class CodegenLoader extends AssetLoader {"));
        assert!(loader.contains("static const Map<String, dynamic> en = {"));
        assert!(loader.contains("static const Map<String, dynamic> ar = {"));
        assert!(loader.contains("\"en\": en"));
        assert!(loader.contains("\"ar\": ar"));
        assert!(loader.contains("mapLocales[locale.toString()]"));
    }

    #[test]
    fn test_duplicate_keys_take_the_later_record() {
        let files = materialize(&[
            record("submit", "Submit", "إرسال"),
            record("submit", "Send", "أرسل"),
        ]);

        let en: BTreeMap<String, String> =
            serde_json::from_str(&files[0].content).unwrap();
        assert_eq!(en.get("submit"), Some(&"Send".to_string()));
    }
}
