use serde_json::{Map, Value};

/// Free-form per-message annotations, added to by each pipeline stage.
pub type Metadata = Map<String, Value>;

/// Layer `overlay` on top of `base`, returning a new map.
///
/// Every key of `base` survives unless `overlay` carries the same key, in
/// which case the overlay value wins. Neither input is modified.
pub fn layer(base: &Metadata, overlay: &Metadata) -> Metadata {
    let mut merged = base.clone();
    for (k, v) in overlay {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Build a metadata map from `(key, value)` pairs.
pub fn from_pairs<I, K>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
