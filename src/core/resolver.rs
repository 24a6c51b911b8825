use crate::core::dataset::{PrimaryDataset, SecondaryDataset, StatusKind, SupportTable};
use crate::core::error::CompatError;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath<'a> {
    Primary,
    Secondary,
    Alias { owner: &'a str },
}

impl fmt::Display for ResolutionPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Alias { owner } => write!(f, "alias of {owner}"),
        }
    }
}

/// The support profile a property was resolved to.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub path: ResolutionPath<'a>,
    pub support: &'a SupportTable,
    pub status: Option<StatusKind>,
}

impl Resolution<'_> {
    /// Absent browsers count as unsupported.
    pub fn supports(&self, browser: &str) -> bool {
        self.support
            .get(browser)
            .is_some_and(|record| record.is_supported())
    }
}

/// Looks up properties in the primary dataset, then the secondary one,
/// then by alternative name.
pub struct SupportResolver<'a> {
    primary: &'a PrimaryDataset,
    secondary: &'a SecondaryDataset,
    aliases: BTreeMap<&'a str, &'a str>,
}

impl<'a> SupportResolver<'a> {
    pub fn new(primary: &'a PrimaryDataset, secondary: &'a SecondaryDataset) -> Self {
        Self {
            primary,
            secondary,
            aliases: build_alias_index(primary),
        }
    }

    pub fn resolve_property(&self, property: &str) -> Result<Resolution<'a>, CompatError> {
        if let Some(entry) = self.primary.get(property) {
            return Ok(Resolution {
                path: ResolutionPath::Primary,
                support: &entry.support,
                status: Some(entry.status.kind()),
            });
        }

        if let Some(table) = self.secondary.get(property) {
            return Ok(Resolution {
                path: ResolutionPath::Secondary,
                support: table,
                status: None,
            });
        }

        let owner_entry = self
            .aliases
            .get(property)
            .and_then(|owner| self.primary.get(owner).map(|entry| (*owner, entry)));
        if let Some((owner, entry)) = owner_entry {
            return Ok(Resolution {
                path: ResolutionPath::Alias { owner },
                support: &entry.support,
                status: Some(entry.status.kind()),
            });
        }

        Err(CompatError::MissingCompatibilityData {
            property: property.to_string(),
        })
    }

    pub fn resolve(&self, property: &str, browser: &str) -> Option<bool> {
        self.resolve_property(property)
            .ok()
            .map(|resolution| resolution.supports(browser))
    }

    pub fn alias_owner(&self, alias: &str) -> Option<&'a str> {
        self.aliases.get(alias).copied()
    }
}

/// One-shot lookup; an unresolvable property reads as unsupported.
///
/// Builds the alias index on every call. Keep a `SupportResolver` around
/// when resolving more than one property.
pub fn resolve(
    property: &str,
    browser: &str,
    primary: &PrimaryDataset,
    secondary: &SecondaryDataset,
) -> bool {
    SupportResolver::new(primary, secondary)
        .resolve(property, browser)
        .unwrap_or(false)
}

// Entries iterate in name order, so the first owner inserted is the
// lexicographically smallest one.
fn build_alias_index(primary: &PrimaryDataset) -> BTreeMap<&str, &str> {
    let mut aliases = BTreeMap::new();
    for (owner, entry) in primary.iter() {
        for alias in entry
            .support
            .values()
            .flat_map(|record| record.alternative_names())
        {
            if alias != owner {
                aliases.entry(alias).or_insert(owner);
            }
        }
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{
        CompatStatus, EntryStatus, NormalizedCompatEntry, SupportDescriptor, SupportRecord,
    };

    fn entry(support: Vec<(&str, SupportRecord)>) -> NormalizedCompatEntry {
        NormalizedCompatEntry {
            support: support
                .into_iter()
                .map(|(browser, record)| (browser.to_string(), record))
                .collect(),
            status: EntryStatus::Flags(CompatStatus {
                standard_track: true,
                ..CompatStatus::default()
            }),
            mdn_url: None,
            spec_url: None,
        }
    }

    fn gap_dataset() -> PrimaryDataset {
        let mut primary = PrimaryDataset::default();
        primary.insert(
            "gap",
            entry(vec![
                (
                    "chrome",
                    SupportRecord::Multiple(vec![
                        SupportDescriptor::added_in("84"),
                        SupportDescriptor::added_in("66").with_alternative_name("grid-gap"),
                    ]),
                ),
                (
                    "firefox",
                    SupportRecord::Single(SupportDescriptor::added_in("63")),
                ),
                (
                    "safari",
                    SupportRecord::Single(SupportDescriptor::added_in("12").with_prefix("-webkit-")),
                ),
            ]),
        );
        primary
    }

    #[test]
    fn alias_resolves_to_owner_profile_for_every_browser() {
        let primary = gap_dataset();
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);

        for browser in ["chrome", "firefox", "safari", "edge", "opera"] {
            assert_eq!(
                resolve("grid-gap", browser, &primary, &secondary),
                resolve("gap", browser, &primary, &secondary),
                "browser {browser}"
            );
        }

        let resolution = resolver.resolve_property("grid-gap").unwrap();
        assert_eq!(resolution.path, ResolutionPath::Alias { owner: "gap" });
        assert!(resolution.supports("firefox"));
        assert!(!resolution.supports("safari"));
        assert!(!resolution.supports("edge"));
    }

    #[test]
    fn primary_wins_over_secondary() {
        let primary = gap_dataset();
        let secondary = SecondaryDataset::from_json_str(
            r#"{"data": {"gap": {"stats": {"safari": {"12": "y"}}}}}"#,
            "caniuse",
        )
        .unwrap();
        let resolver = SupportResolver::new(&primary, &secondary);

        assert_eq!(resolver.resolve("gap", "safari"), Some(false));
        assert_eq!(
            resolver.resolve_property("gap").unwrap().path,
            ResolutionPath::Primary
        );
    }

    #[test]
    fn secondary_used_when_primary_misses() {
        let primary = gap_dataset();
        let secondary = SecondaryDataset::from_json_str(
            r#"{"data": {"css-filters": {"stats": {"chrome": {"53": "y"}, "safari": {"6": "y x"}}}}}"#,
            "caniuse",
        )
        .unwrap();
        let resolver = SupportResolver::new(&primary, &secondary);

        let resolution = resolver.resolve_property("css-filters").unwrap();
        assert_eq!(resolution.path, ResolutionPath::Secondary);
        assert!(resolution.supports("chrome"));
        assert!(!resolution.supports("safari"));
        assert!(resolution.status.is_none());
    }

    #[test]
    fn unknown_property_is_missing_data() {
        let primary = gap_dataset();
        let secondary = SecondaryDataset::default();
        let resolver = SupportResolver::new(&primary, &secondary);

        let err = resolver.resolve_property("made-up").unwrap_err();
        assert!(matches!(err, CompatError::MissingCompatibilityData { .. }));
        assert_eq!(resolver.resolve("made-up", "chrome"), None);
        assert!(!resolve("made-up", "chrome", &primary, &secondary));
    }

    #[test]
    fn shared_alias_goes_to_smallest_owner() {
        let mut primary = PrimaryDataset::default();
        let aliased = |alias: &str| {
            SupportRecord::Multiple(vec![
                SupportDescriptor::added_in("1").with_alternative_name(alias),
            ])
        };
        primary.insert("row-gap", entry(vec![("chrome", aliased("grid-row-gap"))]));
        primary.insert("gap", entry(vec![("firefox", aliased("grid-row-gap"))]));
        let secondary = SecondaryDataset::default();

        let resolver = SupportResolver::new(&primary, &secondary);
        assert_eq!(resolver.alias_owner("grid-row-gap"), Some("gap"));
    }
}
