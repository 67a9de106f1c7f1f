//! `mapLists.conf` rendering

use std::fmt::Write;

use super::{MapPoolSet, GENERATOR_NAME};
use crate::error::SerializeError;

/// Characters that would break the section/line structure of the config
const RESERVED: &[char] = &['[', ']', '\n', '\r'];

/// Browser link to the spreadsheet, quoted in the generated banner
pub fn sheet_url(sheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}/edit#gid=0", sheet_id)
}

/// Render pools as `mapLists.conf`: a banner, the `[all]` wildcard pool,
/// then one `[name]` section per pool with a map name per line.
pub fn serialize_pools(pools: &MapPoolSet, source_url: &str) -> Result<String, SerializeError> {
    let mut out = format!(
        "# This file was automatically generated by {} using data from {}\n[all]\n.*\n",
        GENERATOR_NAME, source_url
    );

    for (pool, maps) in pools.iter() {
        let _ = write!(out, "\n[{}]\n", pool);
        for map in maps {
            if map.contains(RESERVED) {
                return Err(SerializeError {
                    pool: pool.to_string(),
                    name: map.clone(),
                });
            }
            out.push_str(map);
            out.push('\n');
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize() {
        let pools: MapPoolSet = vec![("small", vec!["A", "B"]), ("large", vec![])]
            .into_iter()
            .collect();
        let text = serialize_pools(&pools, "https://example.invalid/sheet").unwrap();

        assert_eq!(
            text,
            "# This file was automatically generated by spring-maps using data from https://example.invalid/sheet\n\
             [all]\n.*\n\n[small]\nA\nB\n\n[large]\n"
        );
    }

    #[test]
    fn test_banner_uses_sheet_url() {
        let text = serialize_pools(&MapPoolSet::new(), &sheet_url("abc123")).unwrap();
        let first = text.lines().next().unwrap();
        assert!(first.starts_with('#'));
        assert!(first.ends_with("https://docs.google.com/spreadsheets/d/abc123/edit#gid=0"));
        assert!(text.ends_with("[all]\n.*\n"));
        assert!(first.contains(GENERATOR_NAME));
    }

    #[test]
    fn test_fixed_pools_emitted_when_empty() {
        let text = serialize_pools(&MapPoolSet::with_fixed_pools(), "u").unwrap();
        let sections: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with('['))
            .collect();
        assert_eq!(
            sections,
            ["[all]", "[certified]", "[uncertified]", "[small]", "[medium]", "[large]", "[extraLarge]", "[misc]"]
        );
    }

    #[test]
    fn test_reserved_characters_rejected() {
        for bad in ["Evil [map]", "Two\nLines", "Carriage\rReturn"] {
            let pools: MapPoolSet = vec![("misc", vec![bad])].into_iter().collect();
            let err = serialize_pools(&pools, "u").unwrap_err();
            assert_eq!(err.pool, "misc");
            assert_eq!(err.name, bad);
        }
    }

    #[test]
    fn test_names_with_spaces_and_symbols_pass_through() {
        let pools: MapPoolSet = vec![("misc", vec!["Comet Catcher Redux v3.1", "Tabula-v6.1 (remake)"])]
            .into_iter()
            .collect();
        let text = serialize_pools(&pools, "u").unwrap();
        assert!(text.ends_with("[misc]\nComet Catcher Redux v3.1\nTabula-v6.1 (remake)\n"));
    }
}
