//! Alias generation: every normalized key under which a record may be referenced.

use std::collections::BTreeSet;

use crate::normalize::{Normalizer, default_normalizer};

/// Expand a namespaced identifier into the depths different providers use.
///
/// `"a/b/c"` yields `["a/b/c", "b/c", "c"]`; an identifier without `/` yields itself.
pub fn id_variants(id: &str) -> Vec<&str> {
    let mut variants = vec![id];
    if let Some(first) = id.find('/') {
        let after_first = &id[first + 1..];
        variants.push(after_first);
        if let Some(last) = id.rfind('/') {
            let after_last = &id[last + 1..];
            if last != first {
                variants.push(after_last);
            }
        }
    }
    variants
}

impl Normalizer {
    /// Build the alias set for one record.
    ///
    /// Each of `slug`, `display_name`, the prefix-stripped display name and
    /// `canonical_slug` (plus the namespace suffixes of the two slugs) contributes
    /// its normalized key and its core key. The empty key is never included.
    pub fn build_aliases(
        &self,
        slug: &str,
        display_name: &str,
        canonical_slug: &str,
    ) -> BTreeSet<String> {
        let mut aliases = BTreeSet::new();
        for variant in id_variants(slug) {
            self.extend_aliases(&mut aliases, variant);
        }
        self.extend_aliases(&mut aliases, display_name);
        self.extend_aliases(&mut aliases, &self.strip_provider_prefix(display_name));
        for variant in id_variants(canonical_slug) {
            self.extend_aliases(&mut aliases, variant);
        }
        aliases
    }

    pub(crate) fn extend_aliases(&self, aliases: &mut BTreeSet<String>, candidate: &str) {
        if candidate.trim().is_empty() {
            return;
        }
        for key in [self.normalize(candidate), self.core_key(candidate)] {
            if !key.is_empty() {
                aliases.insert(key);
            }
        }
    }
}

/// Alias set with the default normalizer.
pub fn build_aliases(slug: &str, display_name: &str, canonical_slug: &str) -> BTreeSet<String> {
    default_normalizer().build_aliases(slug, display_name, canonical_slug)
}
