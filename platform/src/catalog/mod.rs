use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::{error::StoreError, store::Store};

pub mod matcher;

/// A stream category ("area") players can broadcast in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Identifier sent as `area_v2` when starting a broadcast
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: u32,
    /// Display name
    pub name: String,
    /// Romanized name used for initial letter search
    #[serde(default)]
    pub pinyin: String,
}

/// A top level group of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default, deserialize_with = "id_from_string_or_number")]
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub list: Vec<Category>,
}

/// Layout of the category cache file and of the platform's area list payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub data: Vec<Theme>,
}

// the platform sends category ids as strings and theme ids as numbers
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u32),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// In-memory category taxonomy, read-only between refreshes.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    themes: Vec<Theme>,
}

impl CategoryCatalog {
    pub fn new(themes: Vec<Theme>) -> Self {
        CategoryCatalog { themes }
    }

    /// Loads the cached catalog. A missing cache yields an empty catalog.
    pub fn load(store: &Store) -> Result<Self, StoreError> {
        Ok(CategoryCatalog::new(store.load_catalog()?))
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }

    /// Theme names in catalog order.
    pub fn themes(&self) -> Vec<String> {
        self.themes.iter().map(|theme| theme.name.clone()).collect()
    }

    fn theme(&self, theme_name: &str) -> Option<&Theme> {
        self.themes.iter().find(|theme| theme.name == theme_name)
    }

    /// Category names of a theme in catalog order.
    pub fn categories(&self, theme_name: &str) -> Vec<String> {
        self.theme(theme_name)
            .map(|theme| theme.list.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Finds categories of `theme_name` by name substring or by pinyin initials.
    pub fn search(&self, query: &str, theme_name: &str) -> Vec<&Category> {
        let Some(theme) = self.theme(theme_name) else {
            return vec![];
        };
        if query.is_empty() {
            return vec![];
        }

        let phonetic = matcher::is_phonetic_query(query);
        let mut seen = HashSet::new();

        theme
            .list
            .iter()
            .filter(|category| {
                category.name.contains(query)
                    || (phonetic && matcher::matches_phonetic(query, &category.pinyin))
            })
            .filter(|category| seen.insert(category.name.as_str()))
            .collect()
    }

    /// Identifier of the first category of `theme_name` called exactly `name`.
    pub fn lookup_id(&self, name: &str, theme_name: &str) -> Option<u32> {
        self.theme(theme_name)?
            .list
            .iter()
            .find(|category| category.name == name)
            .map(|category| category.id)
    }

    /// Persists `themes` and swaps them in. On a store error nothing changes.
    pub fn refresh(&mut self, themes: Vec<Theme>, store: &Store) -> Result<(), StoreError> {
        store.save_catalog(&themes)?;

        info!(themes = themes.len(), "category catalog refreshed");
        self.themes = themes;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: u32, name: &str, pinyin: &str) -> Category {
        Category {
            id,
            name: name.into(),
            pinyin: pinyin.into(),
        }
    }

    fn sample_catalog() -> CategoryCatalog {
        CategoryCatalog::new(vec![
            Theme {
                id: 2,
                name: "网游".into(),
                list: vec![
                    category(86, "英雄联盟", "yingxiong lianmeng"),
                    category(89, "CS:GO", "csgo"),
                    category(240, "APEX英雄", "APEXyingxiong"),
                    category(999, "英雄联盟", "yingxiong lianmeng"),
                ],
            },
            Theme {
                id: 6,
                name: "单机游戏".into(),
                list: vec![category(235, "其他单机", "qitadanji")],
            },
        ])
    }

    fn names(found: Vec<&Category>) -> Vec<&str> {
        found.into_iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_search_by_pinyin_hint() {
        let catalog = sample_catalog();

        assert_eq!(names(catalog.search("csgo", "网游")), vec!["CS:GO"]);
        assert_eq!(names(catalog.search("yxlm", "网游")), vec!["英雄联盟"]);
    }

    #[test]
    fn test_search_by_name_substring_keeps_catalog_order() {
        let catalog = sample_catalog();

        assert_eq!(
            names(catalog.search("英雄", "网游")),
            vec!["英雄联盟", "APEX英雄"]
        );
    }

    #[test]
    fn test_non_alphabetic_query_skips_pinyin() {
        let catalog = sample_catalog();

        assert_eq!(names(catalog.search("CS:", "网游")), vec!["CS:GO"]);
        assert!(catalog.search("c5", "网游").is_empty());
    }

    #[test]
    fn test_search_is_scoped_to_the_theme() {
        let catalog = sample_catalog();

        assert!(catalog.search("csgo", "单机游戏").is_empty());
        assert!(catalog.search("csgo", "missing").is_empty());
        assert!(catalog.search("", "网游").is_empty());
    }

    #[test]
    fn test_lookup_returns_first_exact_match() {
        let catalog = sample_catalog();

        assert_eq!(catalog.lookup_id("英雄联盟", "网游"), Some(86));
        assert_eq!(catalog.lookup_id("英雄", "网游"), None);
        assert_eq!(catalog.lookup_id("其他单机", "网游"), None);
    }

    #[test]
    fn test_platform_payload_parses() {
        let raw = r#"{"code":0,"msg":"success","data":[{"id":2,"name":"网游","list":[
            {"id":"86","parent_id":"2","name":"英雄联盟","pinyin":"yingxionglianmeng","hot_status":1}
        ]}]}"#;

        let file: CatalogFile = serde_json::from_str(raw).unwrap();

        assert_eq!(file.data[0].list[0].id, 86);
        assert_eq!(file.data[0].list[0].pinyin, "yingxionglianmeng");
    }

    #[test]
    fn test_refresh_replaces_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let mut catalog = sample_catalog();

        let themes = vec![Theme {
            id: 9,
            name: "虚拟主播".into(),
            list: vec![category(371, "虚拟日常", "xunirichang")],
        }];
        catalog.refresh(themes.clone(), &store).unwrap();

        assert_eq!(catalog.themes(), vec!["虚拟主播"]);
        assert_eq!(CategoryCatalog::load(&store).unwrap().themes, themes);
    }
}
