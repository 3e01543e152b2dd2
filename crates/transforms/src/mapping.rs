use crate::context::NameMapping;
use indexmap::{IndexMap, IndexSet};
use murk_core::collector::CollectedNames;
use murk_core::ident::KEYWORDS;
use murk_oracle::names::NameGenerator;
use tracing::{debug, info};

/// Builtins the emitted helpers call. Kept out of the replacement pool so a renamed global
/// can never shadow them.
pub const RUNTIME_NAMES: &[&str] = &["bytes", "chr", "exec", "globals", "len", "ord"];

/// Builds the run's [`NameMapping`]: one replacement per renamable declared name plus
/// `reserve_count` spare names for synthetic bindings. A declared name that also occurs in
/// opaque source keeps its spelling, since the opaque text cannot follow a rename.
///
/// All names come from a single generator request that excludes every declared and
/// referenced identifier, every keyword and the [`RUNTIME_NAMES`]. Replacements therefore
/// never collide with originals, builtins or each other. Declared names map in first-seen
/// order to the first results; the rest become the reserved pool.
pub async fn build_mapping(
    collected: &CollectedNames,
    reserve_count: usize,
    names: &NameGenerator,
) -> NameMapping {
    let mut taken: IndexSet<String> = collected.declared.clone();
    taken.extend(collected.referenced.iter().cloned());
    taken.extend(KEYWORDS.iter().map(|k| (*k).to_string()));
    taken.extend(RUNTIME_NAMES.iter().map(|k| (*k).to_string()));

    for pinned in collected.declared.iter().filter(|n| collected.opaque.contains(*n)) {
        debug!("  {pinned} appears in opaque source, keeping its name");
    }

    let renamable: Vec<&String> = collected.renamable().collect();
    let originals = renamable.len();
    let mut generated = names.request(originals + reserve_count, &taken).await;
    let reserved = generated.split_off(originals.min(generated.len()));

    let mapping: IndexMap<String, String> = renamable
        .into_iter()
        .cloned()
        .zip(generated)
        .collect();

    for (original, replacement) in &mapping {
        debug!("  {original} → {replacement}");
    }
    info!(
        "Mapped {} identifiers, reserved {} synthetic names",
        mapping.len(),
        reserved.len()
    );

    NameMapping::new(mapping, reserved, taken)
}
