//! Place category catalog.
//!
//! Events carry a category id ("cafe"); the UI and search also need the
//! human-readable label, an icon name and a few suggested keywords. The
//! built-in catalog can be replaced by a TOML file:
//!
//! ```toml
//! [[category]]
//! id = "cafe"
//! label = "카페"
//! icon = "cafe"
//! keywords = ["조용한", "뷰가 좋은"]
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// One selectable place category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub icon: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(rename = "category")]
    categories: Vec<Category>,
}

/// Ordered list of categories, looked up by id.
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    categories: Vec<Category>,
}

impl CategoryCatalog {
    /// The catalog shipped with the app.
    pub fn builtin() -> Self {
        let entry = |id: &str, label: &str, icon: &str, keywords: &[&str]| Category {
            id: id.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        Self {
            categories: vec![
                entry(
                    "restaurant",
                    "맛집",
                    "restaurant",
                    &["맛있는", "분위기 좋은", "친절한", "가성비 좋은", "웨이팅 있는"],
                ),
                entry(
                    "cafe",
                    "카페",
                    "cafe",
                    &["감성적인", "디저트가 맛있는", "커피가 맛있는", "조용한", "뷰가 좋은"],
                ),
                entry(
                    "movie",
                    "영화관",
                    "film",
                    &["재밌는", "감동적인", "스릴 넘치는", "팝콘이 맛있는", "사람이 많은"],
                ),
                entry(
                    "park",
                    "공원",
                    "leaf",
                    &["산책하기 좋은", "힐링되는", "날씨가 좋은", "피크닉", "자전거 타기 좋은"],
                ),
                entry(
                    "travel",
                    "여행",
                    "airplane",
                    &["행복한", "잊지 못할", "새로운", "힐링여행", "다시 가고 싶은"],
                ),
                entry(
                    "shopping",
                    "쇼핑",
                    "cart",
                    &["득템한", "세일하는", "구경하기 좋은", "선물하기 좋은"],
                ),
                entry(
                    "home",
                    "집데이트",
                    "home",
                    &["편안한", "오붓한", "맛있는 배달음식", "넷플릭스", "뒹굴뒹굴"],
                ),
            ],
        }
    }

    /// Load a catalog from a TOML file. Ids must be unique.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read category file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("bad category file {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        for (i, category) in file.categories.iter().enumerate() {
            if file.categories[..i].iter().any(|c| c.id == category.id) {
                return Err(Error::Config(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }
        }
        Ok(Self {
            categories: file.categories,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Label for a category id, if the id is known.
    pub fn label_for(&self, id: &str) -> Option<&str> {
        self.get(id).map(|c| c.label.as_str())
    }

    /// Label for display: unknown ids are shown as-is.
    pub fn display_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.label_for(id).unwrap_or(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
