use serde::Serialize;
use shapediff_core::{
    from_json, from_object, from_xml, DocumentFormat, FormatError, Scalar, Token, TokenType, Tree,
    ValueType,
};
use std::path::Path;

fn value_type(tree: &Tree, path: &str) -> ValueType {
    let id = tree.select_token_strict(&path.parse().unwrap()).unwrap();
    tree.scalar(id).unwrap().value_type()
}

/// Both renderings parsed back to `serde_json::Value` and compared.
fn assert_json_eq(actual: &str, expected: &str) {
    let va: serde_json::Value = serde_json::from_str(actual).unwrap();
    let vb: serde_json::Value = serde_json::from_str(expected).unwrap();
    assert_eq!(va, vb, "JSON mismatch:\n  actual:   {actual}\n  expected: {expected}");
}

// ============================================================================
// JSON
// ============================================================================

#[test]
fn json_maps_onto_tokens_of_the_same_shape() {
    let tree = from_json(r#"{"o":{},"a":[],"n":null,"b":true,"i":-3,"f":2.5,"s":"x"}"#).unwrap();
    let root = tree.root();
    assert_eq!(tree.token_type(root), TokenType::Object);
    assert_eq!(tree.token_type(tree.get(root, "o").unwrap()), TokenType::Object);
    assert_eq!(tree.token_type(tree.get(root, "a").unwrap()), TokenType::Array);
    assert_eq!(tree.token_type(tree.get(root, "n").unwrap()), TokenType::Null);
    assert_eq!(value_type(&tree, "$.b"), ValueType::Boolean);
    assert_eq!(value_type(&tree, "$.i"), ValueType::Integer);
    assert_eq!(value_type(&tree, "$.f"), ValueType::Float);
    assert_eq!(value_type(&tree, "$.s"), ValueType::String);
}

#[test]
fn json_keeps_property_order() {
    let tree = from_json(r#"{"z":1,"a":2,"m":3}"#).unwrap();
    let names: Vec<&str> = tree.properties(tree.root()).map(|(name, _)| name).collect();
    assert_eq!(names, vec!["z", "a", "m"]);
}

#[test]
fn json_timestamps_become_dates() {
    let tree = from_json(r#"{"at":"2024-05-01T10:00:00+02:00","not":"2024-05-01"}"#).unwrap();
    assert_eq!(value_type(&tree, "$.at"), ValueType::Date);
    assert_eq!(value_type(&tree, "$.not"), ValueType::String);
}

#[test]
fn json_big_unsigned_integers_stay_integers() {
    let tree = from_json("18446744073709551615").unwrap();
    assert!(matches!(tree.scalar(tree.root()), Some(Scalar::Integer(i)) if *i == i128::from(u64::MAX)));
}

#[test]
fn json_links_parents_and_siblings() {
    let tree = from_json(r#"{"a":[1,2]}"#).unwrap();
    let array = tree.get(tree.root(), "a").unwrap();
    let items = tree.items(array).to_vec();
    assert_eq!(tree.parent(items[1]), Some(array));
    assert_eq!(tree.next(items[0]), Some(items[1]));
    let prop = tree.parent(array).unwrap();
    assert!(matches!(tree.token(prop), Token::Property(p) if p.name() == "a"));
    assert_eq!(tree.parent(prop), Some(tree.root()));
}

#[test]
fn malformed_json_is_a_format_error() {
    assert!(matches!(from_json(r#"{"a":"#), Err(FormatError::Json(_))));
    assert!(matches!(from_json(""), Err(FormatError::Json(_))));
}

// ============================================================================
// XML
// ============================================================================

#[test]
fn xml_unique_children_become_an_object() {
    let tree = from_xml(r#"<order id="7"><customer>Ann</customer><total>9.50</total></order>"#).unwrap();
    assert_json_eq(
        &tree.to_json_string(tree.root()),
        r#"{"customer":"Ann","total":"9.50","id":"7"}"#,
    );
    let names: Vec<&str> = tree.properties(tree.root()).map(|(name, _)| name).collect();
    assert_eq!(names, vec!["customer", "total", "id"]);
}

#[test]
fn xml_repeated_children_become_an_array() {
    let tree = from_xml("<items><item>a</item><item>b</item><item><x>1</x></item></items>").unwrap();
    assert_json_eq(&tree.to_json_string(tree.root()), r#"["a","b",{"x":"1"}]"#);
}

#[test]
fn xml_empty_elements_become_empty_objects() {
    let tree = from_xml("<a><b/><c></c></a>").unwrap();
    assert_json_eq(&tree.to_json_string(tree.root()), r#"{"b":{},"c":{}}"#);
}

#[test]
fn xml_text_only_root_is_a_value() {
    let tree = from_xml("<greeting>hello</greeting>").unwrap();
    assert_eq!(tree.token_type(tree.root()), TokenType::Value);
    assert_eq!(tree.to_json_string(tree.root()), r#""hello""#);
}

#[test]
fn xml_ignores_namespaces_comments_and_declarations() {
    let text = r#"<?xml version="1.0"?>
        <!-- header -->
        <a xmlns="urn:x" xmlns:p="urn:p">
            <b>1</b>
        </a>"#;
    let tree = from_xml(text).unwrap();
    assert_eq!(tree.to_json_string(tree.root()), r#"{"b":"1"}"#);
}

#[test]
fn xml_mixed_multiplicities_are_unsupported() {
    let err = from_xml("<a><b/><b/><c/></a>").unwrap_err();
    match err {
        FormatError::UnsupportedXmlShape { element, names } => {
            assert_eq!(element, "a");
            assert_eq!(names, vec!["b", "c"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn xml_structure_errors() {
    assert!(matches!(from_xml(""), Err(FormatError::XmlStructure(_))));
    assert!(matches!(from_xml("<a/><b/>"), Err(FormatError::XmlStructure(_))));
    assert!(matches!(from_xml("<a><b></b>"), Err(FormatError::XmlStructure(_))));
}

#[test]
fn malformed_xml_is_a_format_error() {
    assert!(from_xml("<a><b></a>").is_err());
    assert!(matches!(from_xml(r#"<a x="1" x="2"/>"#), Err(FormatError::XmlAttribute(_))));
}

// ============================================================================
// Host objects
// ============================================================================

#[derive(Serialize)]
struct Line {
    sku: &'static str,
    qty: u32,
}

#[derive(Serialize)]
struct Invoice {
    number: u64,
    paid: bool,
    note: Option<String>,
    lines: Vec<Line>,
}

#[test]
fn serializable_values_adapt_through_json() {
    let invoice = Invoice {
        number: 42,
        paid: false,
        note: None,
        lines: vec![Line { sku: "A-1", qty: 3 }],
    };
    let tree = from_object(&invoice).unwrap();
    let expected = from_json(r#"{"number":42,"paid":false,"note":null,"lines":[{"sku":"A-1","qty":3}]}"#).unwrap();
    assert!(tree.deep_eq(tree.root(), &expected, expected.root()));
}

#[test]
fn unserializable_values_are_format_errors() {
    use std::collections::HashMap;
    let mut map = HashMap::new();
    map.insert(vec![1u8], 1);
    assert!(matches!(from_object(&map), Err(FormatError::Serialize(_))));
}

// ============================================================================
// Format detection
// ============================================================================

#[test]
fn format_from_extension() {
    assert_eq!(DocumentFormat::from_path(Path::new("a.JSON")), Some(DocumentFormat::Json));
    assert_eq!(DocumentFormat::from_path(Path::new("dir/b.xml")), Some(DocumentFormat::Xml));
    assert_eq!(DocumentFormat::from_path(Path::new("c.txt")), None);
    assert_eq!(DocumentFormat::from_path(Path::new("noext")), None);
}

#[test]
fn format_from_content() {
    assert_eq!(DocumentFormat::sniff("  <a/>"), DocumentFormat::Xml);
    assert_eq!(DocumentFormat::sniff("\u{feff}<a/>"), DocumentFormat::Xml);
    assert_eq!(DocumentFormat::sniff(r#"{"a":1}"#), DocumentFormat::Json);
    let tree = DocumentFormat::sniff("<a>1</a>").adapt("<a>1</a>").unwrap();
    assert_eq!(tree.to_json_string(tree.root()), r#""1""#);
}
