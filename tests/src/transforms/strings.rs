use super::{apply, print, programs};
use crate::interp;
use murk_core::ast::{Expr, Module};
use murk_oracle::NameGenerator;
use murk_transform::obfuscator::{ObfuscationConfig, Obfuscator};
use murk_transform::string_encoder::{decode_text, encode_text, StringLiteralEncoder};
use murk_transform::{PassConfig, Transform};
use proptest::prelude::*;

/// Runs the encoder through the pipeline so the decode helper is inserted.
async fn encode(module: Module) -> Module {
    let config = ObfuscationConfig {
        transforms: vec![Box::new(StringLiteralEncoder)],
        pass_config: PassConfig::default(),
    };
    Obfuscator::new(NameGenerator::offline())
        .obfuscate(module, config)
        .await
        .unwrap()
        .module
}

#[tokio::test]
async fn test_encoded_programs_print_the_same() {
    for original in programs() {
        let expected = interp::run(&original).unwrap();
        let encoded = encode(original).await;
        assert_eq!(interp::run(&encoded).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_no_plain_literal_survives() {
    let mut module = Module::new(vec![print(vec![Expr::str("secret"), Expr::str("")])]);
    apply(&StringLiteralEncoder, &mut module).await;

    let metrics = murk_analysis::collect_metrics(&module);
    assert_eq!(metrics.string_cnt, 2, "only the shifted arguments remain");
    let source = murk_core::Printer::unparse(&murk_core::SourcePrinter::default(), &module);
    assert!(!source.contains("secret"));
    assert!(source.contains("'tfdsfu'"));
}

#[tokio::test]
async fn test_helper_inserted_only_when_needed() {
    let module = Module::new(vec![print(vec![Expr::literal("1")])]);
    assert_eq!(StringLiteralEncoder.reserved_names(&module), 0);
    let encoded = encode(module.clone()).await;
    assert_eq!(encoded, module);
}

proptest! {
    #[test]
    fn prop_shift_round_trips(text in any::<String>()) {
        if let Some(encoded) = encode_text(&text) {
            prop_assert_eq!(encoded.chars().count(), text.chars().count());
            prop_assert_eq!(decode_text(&encoded), Some(text));
        } else {
            prop_assert!(
                text.contains('\u{D7FF}') || text.contains('\u{10FFFF}'),
                "encode_text returned None for input without U+D7FF or U+10FFFF"
            );
        }
    }

    #[test]
    fn prop_printed_literal_is_recovered(text in "[ -~]{0,24}") {
        let original = Module::new(vec![print(vec![Expr::str(text.clone())])]);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let encoded = runtime.block_on(encode(original));
        prop_assert_eq!(interp::run(&encoded).unwrap(), vec![text]);
    }
}
