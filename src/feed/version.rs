use super::document::Item;

/// A version string decomposed into numeric components for ordering.
///
/// Derived on demand from an item's `sparkle:version` attribute; never
/// persisted. Malformed or missing versions degrade to `0.0` so one bad
/// entry sorts to the bottom of the feed instead of aborting the run.
///
/// Ordering is component-wise left to right (`2.10` > `2.9`). When all
/// shared leading components are equal, the shorter version is the older
/// one (`1.0` < `1.0.1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedVersion(Vec<u64>);

impl ParsedVersion {
    /// Parses a dot-separated version string. Any non-numeric component
    /// makes the whole string parse as [`ParsedVersion::zero`].
    pub fn parse(version: &str) -> Self {
        version
            .split('.')
            .map(str::parse)
            .collect::<Result<Vec<u64>, _>>()
            .map(ParsedVersion)
            .unwrap_or_else(|_| Self::zero())
    }

    /// The oldest possible version, used when parsing fails.
    pub fn zero() -> Self {
        ParsedVersion(vec![0, 0])
    }
}

impl Item {
    /// Version key used for feed ordering, taken from the enclosure's
    /// `sparkle:version` attribute. Items without an enclosure sort as `0.0`.
    pub fn parsed_version(&self) -> ParsedVersion {
        self.enclosure
            .as_ref()
            .map(|e| ParsedVersion::parse(&e.version))
            .unwrap_or_else(ParsedVersion::zero)
    }
}

/// Sorts items newest-first by parsed version.
///
/// The sort is stable: items with equal versions keep the relative order
/// they had before sorting, so re-publishing the same version appends
/// behind the earlier entry rather than displacing it.
pub fn sort_descending(items: &mut [Item]) {
    // Reverse the comparator, not the slice, so stability is preserved.
    items.sort_by(|a, b| b.parsed_version().cmp(&a.parsed_version()));
}
