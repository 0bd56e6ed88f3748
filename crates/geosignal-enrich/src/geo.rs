use once_cell::sync::Lazy;
use std::collections::HashMap;

use geosignal_types::GeoEntity;

/// Consumes LOC and GPE entity surface forms and resolves them to
/// country records. Non-country toponyms (cities, regions, rivers)
/// are dropped rather than guessed at.
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, loc_and_gpe: &[&str]) -> Vec<GeoEntity>;
}

/// Gazetteer-backed resolver: a name/alias -> ISO-3166 alpha-2 table
/// covers the countries and common toponym aliases this pipeline's
/// flashpoints are expected to mention. Anything not in the table is
/// dropped, matching spec.md's "non-country toponyms are dropped."
pub struct GazetteerGeoResolver;

static COUNTRY_TABLE: Lazy<HashMap<&'static str, (&'static str, &'static str)>> = Lazy::new(|| {
    let entries: &[(&str, &str, &str)] = &[
        ("United States", "United States", "US"),
        ("USA", "United States", "US"),
        ("U.S.", "United States", "US"),
        ("United Kingdom", "United Kingdom", "GB"),
        ("UK", "United Kingdom", "GB"),
        ("Ukraine", "Ukraine", "UA"),
        ("Russia", "Russia", "RU"),
        ("Russian Federation", "Russia", "RU"),
        ("China", "China", "CN"),
        ("Taiwan", "Taiwan", "TW"),
        ("Israel", "Israel", "IL"),
        ("Gaza", "Palestine", "PS"),
        ("Palestine", "Palestine", "PS"),
        ("Iran", "Iran", "IR"),
        ("Iraq", "Iraq", "IQ"),
        ("Syria", "Syria", "SY"),
        ("Lebanon", "Lebanon", "LB"),
        ("Yemen", "Yemen", "YE"),
        ("Sudan", "Sudan", "SD"),
        ("France", "France", "FR"),
        ("Germany", "Germany", "DE"),
        ("Poland", "Poland", "PL"),
        ("India", "India", "IN"),
        ("Pakistan", "Pakistan", "PK"),
        ("Japan", "Japan", "JP"),
        ("South Korea", "South Korea", "KR"),
        ("North Korea", "North Korea", "KP"),
        ("Brazil", "Brazil", "BR"),
        ("Mexico", "Mexico", "MX"),
        ("Egypt", "Egypt", "EG"),
        ("Turkey", "Turkey", "TR"),
        ("Armenia", "Armenia", "AM"),
        ("Azerbaijan", "Azerbaijan", "AZ"),
        ("Georgia", "Georgia", "GE"),
        ("Belarus", "Belarus", "BY"),
        ("Moldova", "Moldova", "MD"),
        ("Venezuela", "Venezuela", "VE"),
        ("Nigeria", "Nigeria", "NG"),
        ("Ethiopia", "Ethiopia", "ET"),
        ("Somalia", "Somalia", "SO"),
        ("Myanmar", "Myanmar", "MM"),
    ];
    entries
        .iter()
        .map(|(alias, name, alpha2)| (*alias, (*name, *alpha2)))
        .collect()
});

impl GeoResolver for GazetteerGeoResolver {
    fn resolve(&self, loc_and_gpe: &[&str]) -> Vec<GeoEntity> {
        let mut counts: HashMap<(&'static str, &'static str), u32> = HashMap::new();

        for surface in loc_and_gpe {
            if let Some(&(name, alpha2)) = COUNTRY_TABLE.get(surface.trim()) {
                *counts.entry((name, alpha2)).or_insert(0) += 1;
            }
        }

        let mut resolved: Vec<GeoEntity> = counts
            .into_iter()
            .map(|((name, alpha2), mentions)| GeoEntity {
                name: name.to_string(),
                alpha2: alpha2.to_string(),
                mentions,
            })
            .collect();

        // Ordered by mention count desc, then name asc -- spec.md §4.4.
        resolved.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_aliases_to_the_same_country() {
        let resolved = GazetteerGeoResolver.resolve(&["USA", "U.S.", "United States"]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].alpha2, "US");
        assert_eq!(resolved[0].mentions, 3);
    }

    #[test]
    fn drops_non_country_toponyms() {
        let resolved = GazetteerGeoResolver.resolve(&["Kashmir", "Siberia", "Ukraine"]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].alpha2, "UA");
    }

    #[test]
    fn orders_by_mentions_desc_then_name_asc() {
        let resolved = GazetteerGeoResolver.resolve(&[
            "Ukraine", "Russia", "Russia", "China", "China",
        ]);
        assert_eq!(resolved[0].name, "China");
        assert_eq!(resolved[1].name, "Russia");
        assert_eq!(resolved[2].name, "Ukraine");
    }
}
