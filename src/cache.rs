use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    entities::{CategoryFilter, Marker},
    error::Error,
};

/// Markers currently known to the client, in store order.
///
/// Every batch goes through [`MarkerCache::replace`], which keeps ids unique:
/// the first occurrence of an id keeps it, later duplicates (and records
/// without an id) are given a fresh one.
#[derive(Clone, Debug, Default)]
pub struct MarkerCache {
    markers: Vec<Marker>,
}

impl MarkerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn replace(&mut self, batch: Vec<Marker>) {
        let mut seen: HashSet<String> = HashSet::with_capacity(batch.len());
        let mut markers = Vec::with_capacity(batch.len());

        for mut marker in batch {
            if marker.id.is_empty() || seen.contains(&marker.id) {
                let fresh = fresh_id(&seen);
                tracing::warn!("marker id {:?} already taken, using {}", marker.id, fresh);
                marker.id = fresh;
            }

            seen.insert(marker.id.clone());
            markers.push(marker);
        }

        self.markers = markers;
    }

    pub fn filtered(&self, filter: CategoryFilter) -> Vec<&Marker> {
        self.markers.iter().filter(|m| filter.matches(m)).collect()
    }

    /// Pretty JSON array of every marker, the download format.
    pub fn export(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.markers)?)
    }

    /// Parses an exported list. Unknown categories fail the whole import.
    pub fn parse_export(json: &str) -> Result<Vec<Marker>, Error> {
        serde_json::from_str(json).map_err(|err| {
            tracing::error!("marker import failed: {}", err);
            crate::error::validation_error(format!("invalid marker list: {}", err))
        })
    }
}

fn fresh_id(taken: &HashSet<String>) -> String {
    loop {
        let id = Uuid::new_v4().to_string();

        if !taken.contains(&id) {
            return id;
        }
    }
}

#[cfg(test)]
fn marker(id: &str, category: crate::entities::Category) -> Marker {
    Marker {
        id: id.into(),
        lat: 40.0,
        lng: -3.0,
        title: format!("marker {}", id),
        category,
    }
}

#[test]
fn first_occurrence_keeps_its_id() {
    use crate::entities::Category;

    let mut cache = MarkerCache::new();
    cache.replace(vec![
        marker("a", Category::Parc),
        marker("b", Category::Museum),
        marker("a", Category::Subway),
        marker("", Category::Airport),
    ]);

    let ids: Vec<&str> = cache.markers().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids[0], "a");
    assert_eq!(ids[1], "b");
    assert_ne!(ids[2], "a");
    assert!(!ids[3].is_empty());

    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 4);

    assert_eq!(cache.get("a").unwrap().category, Category::Parc);
    assert_eq!(cache.markers()[2].category, Category::Subway);
}

#[test]
fn filter_preserves_order() {
    use crate::entities::Category;

    let mut cache = MarkerCache::new();
    cache.replace(vec![
        marker("1", Category::Parc),
        marker("2", Category::Museum),
        marker("3", Category::Parc),
        marker("4", Category::Airport),
        marker("5", Category::Parc),
    ]);

    let all: Vec<&str> = cache
        .filtered(CategoryFilter::All)
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(all, vec!["1", "2", "3", "4", "5"]);

    let parcs: Vec<&str> = cache
        .filtered(CategoryFilter::Only(Category::Parc))
        .iter()
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(parcs, vec!["1", "3", "5"]);

    assert!(cache
        .filtered(CategoryFilter::Only(Category::Restaurant))
        .is_empty());
}

#[test]
fn export_then_import_is_equivalent() {
    use crate::entities::Category;

    let mut cache = MarkerCache::new();
    cache.replace(vec![
        marker("x", Category::Restaurant),
        marker("y", Category::Subway),
    ]);

    let json = cache.export().unwrap();

    let mut reloaded = MarkerCache::new();
    reloaded.replace(MarkerCache::parse_export(&json).unwrap());

    assert_eq!(reloaded.markers(), cache.markers());
}

#[test]
fn import_rejects_unknown_categories() {
    use crate::error::ErrorKind;

    let json = r#"[{"id":"a","lat":1.0,"lng":2.0,"title":"t","category":"Beach"}]"#;
    let err = MarkerCache::parse_export(json).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
}
