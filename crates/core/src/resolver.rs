//! Process identity resolver.
//!
//! Blue agents detect processes through artifacts — file paths, network
//! connections, registry keys — rather than raw process ids. The derivation
//! graph records how each artifact was derived, so an observed (trait, value)
//! pair can be walked backward to the process-id fact the red side used.
//! That walk is what lets the two timelines join on a common key despite
//! speaking different vocabularies.

use std::collections::HashSet;

use crate::fact::{Relationship, PROCESS_ID_TRAIT};

/// Walk the derivation graph backward from (trait, value) to the canonical
/// process id it ultimately derives from.
///
/// At each step the first relationship (in recorded order) whose target
/// matches the current pair is followed to its source. A source carrying the
/// process-id trait terminates the walk. Returns 0 when no relationship
/// targets the pair, when a pair repeats (malformed cyclic input), or when
/// the terminal value does not parse — unresolved is a deliberate "give up",
/// not an error, since blue agents may observe facts with no recorded
/// derivation.
pub fn find_original_pid(relationships: &[Relationship], trait_name: &str, value: &str) -> u32 {
    let mut visited: HashSet<(&str, &str)> = HashSet::new();
    let mut current = (trait_name, value);

    loop {
        if !visited.insert(current) {
            // Cycle in the derivation graph; treat as unresolved.
            return 0;
        }

        let source = relationships
            .iter()
            .find(|r| r.target.trait_name == current.0 && r.target.value == current.1)
            .map(|r| &r.source);

        match source {
            Some(src) if src.trait_name == PROCESS_ID_TRAIT => {
                return src.value.parse().unwrap_or(0);
            }
            Some(src) => current = (&src.trait_name, &src.value),
            None => return 0,
        }
    }
}
