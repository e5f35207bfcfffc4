use crate::entities::Marker;

/// Up to two markers picked as route endpoints, in click order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    markers: Vec<Marker>,
}

impl Selection {
    pub const CAPACITY: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn contains(&self, id: &str) -> bool {
        self.markers.iter().any(|m| m.id == id)
    }

    /// Start and end of the route, once exactly two markers are selected.
    pub fn endpoints(&self) -> Option<(&Marker, &Marker)> {
        match self.markers.as_slice() {
            [start, end] => Some((start, end)),
            _ => None,
        }
    }

    /// Re-clicking a selected marker drops it; a third pick starts over.
    pub fn toggle(&mut self, marker: &Marker) {
        if self.contains(&marker.id) {
            self.markers.retain(|m| m.id != marker.id);
        } else if self.markers.len() < Self::CAPACITY {
            self.markers.push(marker.clone());
        } else {
            self.markers = vec![marker.clone()];
        }
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }
}

#[cfg(test)]
fn marker(id: &str) -> Marker {
    use crate::entities::Category;

    Marker {
        id: id.into(),
        lat: 0.0,
        lng: 0.0,
        title: id.into(),
        category: Category::Parc,
    }
}

#[test]
fn third_pick_replaces_both() {
    let mut selection = Selection::new();

    selection.toggle(&marker("a"));
    selection.toggle(&marker("b"));
    assert_eq!(selection.len(), 2);

    selection.toggle(&marker("c"));
    assert_eq!(selection.len(), 1);
    assert!(selection.contains("c"));
    assert!(!selection.contains("a"));
    assert!(!selection.contains("b"));
}

#[test]
fn reclick_removes_only_that_marker() {
    let mut selection = Selection::new();

    selection.toggle(&marker("a"));
    selection.toggle(&marker("b"));

    // a different instance carrying the same id still deselects
    let mut copy = marker("a");
    copy.title = "renamed".into();
    selection.toggle(&copy);

    assert_eq!(selection.len(), 1);
    assert_eq!(selection.markers()[0].id, "b");
}

#[test]
fn endpoints_keep_click_order() {
    let mut selection = Selection::new();
    assert!(selection.endpoints().is_none());

    selection.toggle(&marker("b"));
    assert!(selection.endpoints().is_none());

    selection.toggle(&marker("a"));
    let (start, end) = selection.endpoints().unwrap();
    assert_eq!((start.id.as_str(), end.id.as_str()), ("b", "a"));
}

#[test]
fn size_never_exceeds_capacity() {
    let ids = ["a", "b", "c", "a", "d", "d", "e", "b", "b", "c", "a", "e"];
    let mut selection = Selection::new();
    let mut expected: Vec<&str> = vec![];

    // walk a fixed pseudo-random sequence against a reference model
    for step in 0..200usize {
        let id = ids[(step * 7 + step / 3) % ids.len()];
        selection.toggle(&marker(id));

        if let Some(pos) = expected.iter().position(|e| *e == id) {
            expected.remove(pos);
        } else if expected.len() < 2 {
            expected.push(id);
        } else {
            expected = vec![id];
        }

        assert!(selection.len() <= Selection::CAPACITY);
        let actual: Vec<&str> = selection.markers().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(actual, expected);
    }
}
