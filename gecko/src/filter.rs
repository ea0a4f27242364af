use crate::types::AssetSnapshot;

/// Snapshots whose name or symbol contains `query`, case-insensitively.
///
/// A blank query returns every snapshot. Order is always preserved.
pub fn filter_snapshots<'a>(snapshots: &'a [AssetSnapshot], query: &str) -> Vec<&'a AssetSnapshot> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return snapshots.iter().collect();
    }
    snapshots
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle) || s.symbol.to_lowercase().contains(&needle)
        })
        .collect()
}
