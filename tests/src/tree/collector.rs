use murk_core::{collect_names, JsonTreeParser, Parser};

const SOURCE_TREE: &str = r#"{"body": [
    {"kind": "FunctionDef", "name": "load", "params": ["path"], "body": [
        {"kind": "With",
         "items": [{"context": {"kind": "Call", "func": {"kind": "Name", "id": "open"},
                                "args": [{"kind": "Name", "id": "path"}]},
                    "binding": {"kind": "Name", "id": "fh", "ctx": "Store"}}],
         "body": [{"kind": "Return", "value": {"kind": "Call",
             "func": {"kind": "Attribute", "value": {"kind": "Name", "id": "fh"}, "attr": "read"}}}]}
    ]},
    {"kind": "For",
     "target": {"kind": "Tuple", "elts": [{"kind": "Name", "id": "i", "ctx": "Store"},
                                           {"kind": "Name", "id": "line", "ctx": "Store"}]},
     "iter": {"kind": "Call", "func": {"kind": "Name", "id": "enumerate"},
              "args": [{"kind": "Call", "func": {"kind": "Name", "id": "load"},
                        "args": [{"kind": "Str", "value": "a.txt"}]}]},
     "body": [{"kind": "Expr", "value": {"kind": "Lambda", "params": ["k"],
                                        "body": {"kind": "Name", "id": "k"}}}]},
    {"kind": "Opaque", "source": "import sys"}
]}"#;

#[test]
fn test_collects_declared_and_external_names() {
    let module = JsonTreeParser.parse(SOURCE_TREE).unwrap();
    let names = collect_names(&module);

    let declared: Vec<&str> = names.declared.iter().map(String::as_str).collect();
    assert_eq!(declared, ["load", "path", "fh", "i", "line"]);

    let external: Vec<&str> = names.external().map(String::as_str).collect();
    assert!(external.contains(&"open"));
    assert!(external.contains(&"enumerate"));
    assert!(external.contains(&"sys"));
    assert!(external.contains(&"k"));
    assert!(!external.contains(&"read"), "attribute names are not identifiers");
}

#[test]
fn test_collection_is_read_only_and_repeatable() {
    let module = JsonTreeParser.parse(SOURCE_TREE).unwrap();
    let snapshot = module.clone();
    assert_eq!(collect_names(&module), collect_names(&module));
    assert_eq!(module, snapshot);
}
