//! Three-way merges of folder manifests.
//!
//! Both merges are pure functions over one folder's direct children;
//! recursing into grandchildren is the syncer's responsibility.
//!
//! Children maps are merged by union. A name present on both sides with
//! different entry ids is a true conflict: the target side keeps the
//! original name and the other side's entry is re-inserted under a
//! disambiguated name. A name removed on one side and unchanged (relative to
//! the base) on the other is a deletion and wins over the stale copy.

use sealfs_types::{LocalFolderManifest, ManifestAccess, RemoteFolderManifest};
use std::collections::{BTreeMap, BTreeSet};

type Children = BTreeMap<String, ManifestAccess>;

/// Picks an unoccupied conflict name for `name`.
///
/// The scheme is `"x (conflict)"`, then `"x (conflict 2)"`, `"x (conflict
/// 3)"`, and so on. The counter is re-derived from the occupied name set on
/// every call, so merging the same inputs always produces the same names.
fn conflict_name(occupied: &Children, name: &str) -> String {
    let candidate = format!("{name} (conflict)");
    if !occupied.contains_key(&candidate) {
        return candidate;
    }
    let mut n: u64 = 2;
    loop {
        let candidate = format!("{name} (conflict {n})");
        if !occupied.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Merges two children maps against an optional common base.
///
/// `target` wins contested names; `modified` entries losing a name contest
/// are re-inserted under a conflict name. Without a base, deletions cannot
/// be told apart from creations, so the merge degrades to a pure union
/// (nothing is ever dropped).
fn merge_children(base: Option<&Children>, modified: &Children, target: &Children) -> Children {
    let mut merged = Children::new();
    let mut contested: Vec<(&String, &ManifestAccess)> = Vec::new();

    let names: BTreeSet<&String> = modified.keys().chain(target.keys()).collect();
    for name in names {
        let in_base = base.and_then(|b| b.get(name));
        match (modified.get(name), target.get(name)) {
            (Some(m), Some(t)) if m.id == t.id => {
                merged.insert(name.clone(), t.clone());
            }
            (Some(m), Some(t)) => {
                // Same name, different entries: target keeps the name.
                merged.insert(name.clone(), t.clone());
                contested.push((name, m));
            }
            (Some(m), None) => {
                // Absent from target: deleted there, or created here.
                let deleted_in_target = in_base.is_some_and(|b| b.id == m.id);
                if !deleted_in_target {
                    merged.insert(name.clone(), m.clone());
                }
            }
            (None, Some(t)) => {
                let deleted_in_modified = in_base.is_some_and(|b| b.id == t.id);
                if !deleted_in_modified {
                    merged.insert(name.clone(), t.clone());
                }
            }
            (None, None) => unreachable!("name came from one of the two maps"),
        }
    }

    // Contested entries are renamed after all regular names are placed, in
    // name order, so the outcome is deterministic. An entry the target
    // already carries under another name (a previous merge renamed it) is
    // not inserted twice.
    for (name, access) in contested {
        if merged.values().any(|a| a.id == access.id) {
            continue;
        }
        let renamed = conflict_name(&merged, name);
        merged.insert(renamed, access.clone());
    }
    merged
}

/// Three-way merge of remote folder manifests after a lost version race.
///
/// `base` is the remote version the local push was derived from (if
/// retrievable), `modified` is the rejected local push and `target` is the
/// concurrently written version that won the race.
///
/// Returns the reconciled manifest and whether a retry push is still
/// needed. When the merged children equal `target`'s (the local change was
/// already reflected, e.g. both sides deleted the same entry), `target` is
/// returned unchanged with `false`; otherwise the merged manifest carries
/// `target.version + 1`, ready for the retry.
#[must_use]
pub fn merge_remote_folder_manifests(
    base: Option<&RemoteFolderManifest>,
    modified: &RemoteFolderManifest,
    target: &RemoteFolderManifest,
) -> (RemoteFolderManifest, bool) {
    let children = merge_children(base.map(|b| &b.children), &modified.children, &target.children);
    if children == target.children {
        return (target.clone(), false);
    }
    let merged = RemoteFolderManifest {
        id: target.id,
        author: modified.author.clone(),
        timestamp: modified.timestamp,
        version: target.version.next(),
        children,
    };
    (merged, true)
}

/// Three-way merge reconciling local edits made during a sync round trip.
///
/// `base` is the pre-sync local snapshot, `current` is the live local
/// manifest (possibly mutated while the push was in flight) and `target` is
/// the hydrated result of the just-accepted remote version.
///
/// Entries created in `current` during the sync window are always kept, and
/// the result stays dirty so the next cycle pushes them; removals in
/// `current` relative to `base` win over `target`'s copy.
#[must_use]
pub fn merge_local_folder_manifests(
    base: &LocalFolderManifest,
    current: &LocalFolderManifest,
    target: &LocalFolderManifest,
) -> LocalFolderManifest {
    let children = merge_children(Some(&base.children), &current.children, &target.children);
    let need_sync = children != target.children;
    let (author, timestamp) = if need_sync {
        (current.author.clone(), current.timestamp)
    } else {
        (target.author.clone(), target.timestamp)
    };
    LocalFolderManifest {
        id: target.id,
        author,
        timestamp,
        base_version: target.base_version,
        need_sync,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sealfs_types::{DeviceId, EntryId, Timestamp, Version};

    fn remote(version: u64, children: &[(&str, &ManifestAccess)]) -> RemoteFolderManifest {
        RemoteFolderManifest {
            id: EntryId::generate(),
            author: DeviceId::new("alice@laptop"),
            timestamp: Timestamp::from_millis(1_000),
            version: Version::new(version),
            children: children
                .iter()
                .map(|(n, a)| ((*n).to_owned(), (*a).clone()))
                .collect(),
        }
    }

    fn local(base_version: u64, children: &[(&str, &ManifestAccess)]) -> LocalFolderManifest {
        LocalFolderManifest {
            id: EntryId::generate(),
            author: DeviceId::new("alice@laptop"),
            timestamp: Timestamp::from_millis(1_000),
            base_version: Version::new(base_version),
            need_sync: false,
            children: children
                .iter()
                .map(|(n, a)| ((*n).to_owned(), (*a).clone()))
                .collect(),
        }
    }

    #[test]
    fn merge_with_itself_needs_no_sync() {
        let a = ManifestAccess::generate();
        let target = remote(4, &[("x", &a)]);
        let (merged, sync_needed) = merge_remote_folder_manifests(None, &target, &target);
        assert!(!sync_needed);
        assert_eq!(merged, target);
    }

    #[test]
    fn disjoint_additions_are_united() {
        let a = ManifestAccess::generate();
        let b = ManifestAccess::generate();
        let base = remote(1, &[]);
        let modified = remote(2, &[("a.txt", &a)]);
        let target = remote(2, &[("b.txt", &b)]);

        let (merged, sync_needed) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert!(sync_needed);
        assert_eq!(merged.version, Version::new(3));
        assert_eq!(merged.children.len(), 2);
        assert_eq!(merged.children["a.txt"], a);
        assert_eq!(merged.children["b.txt"], b);
    }

    #[test]
    fn same_name_conflict_keeps_target_and_renames_modified() {
        let ours = ManifestAccess::generate();
        let theirs = ManifestAccess::generate();
        let base = remote(1, &[]);
        let modified = remote(2, &[("x", &ours)]);
        let target = remote(2, &[("x", &theirs)]);

        let (merged, sync_needed) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert!(sync_needed);
        assert_eq!(merged.children["x"], theirs);
        assert_eq!(merged.children["x (conflict)"], ours);
    }

    #[test]
    fn conflict_rename_skips_occupied_names() {
        let ours = ManifestAccess::generate();
        let theirs = ManifestAccess::generate();
        let squatter = ManifestAccess::generate();
        let base = remote(1, &[]);
        let modified = remote(2, &[("x", &ours), ("x (conflict)", &squatter)]);
        let target = remote(2, &[("x", &theirs)]);

        let (merged, _) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert_eq!(merged.children["x"], theirs);
        assert_eq!(merged.children["x (conflict)"], squatter);
        assert_eq!(merged.children["x (conflict 2)"], ours);
    }

    #[test]
    fn already_renamed_entry_is_not_duplicated() {
        let ours = ManifestAccess::generate();
        let theirs = ManifestAccess::generate();
        let base = remote(1, &[]);
        // The target of a retry merge already carries our entry under the
        // conflict name.
        let modified = remote(2, &[("x", &ours)]);
        let target = remote(3, &[("x", &theirs), ("x (conflict)", &ours)]);

        let (merged, sync_needed) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert!(!sync_needed);
        assert_eq!(merged.children, target.children);
    }

    #[test]
    fn deletion_wins_over_unchanged_entry() {
        let a = ManifestAccess::generate();
        let b = ManifestAccess::generate();
        let base = remote(1, &[("gone.txt", &a), ("kept.txt", &b)]);
        // Modified deleted "gone.txt", target did not touch it.
        let modified = remote(2, &[("kept.txt", &b)]);
        let target = remote(2, &[("gone.txt", &a), ("kept.txt", &b)]);

        let (merged, sync_needed) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert!(sync_needed);
        assert!(!merged.children.contains_key("gone.txt"));
        assert!(merged.children.contains_key("kept.txt"));
    }

    #[test]
    fn identical_deletions_need_no_sync() {
        let a = ManifestAccess::generate();
        let base = remote(1, &[("gone.txt", &a)]);
        let modified = remote(2, &[]);
        let target = remote(2, &[]);

        let (merged, sync_needed) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert!(!sync_needed);
        assert_eq!(merged, target);
    }

    #[test]
    fn without_base_nothing_is_dropped() {
        let a = ManifestAccess::generate();
        let b = ManifestAccess::generate();
        // No base: a name missing on one side cannot be proven deleted.
        let modified = remote(2, &[("a.txt", &a)]);
        let target = remote(2, &[("b.txt", &b)]);

        let (merged, sync_needed) = merge_remote_folder_manifests(None, &modified, &target);
        assert!(sync_needed);
        assert_eq!(merged.children.len(), 2);
    }

    #[test]
    fn replacement_survives_concurrent_deletion() {
        let old = ManifestAccess::generate();
        let new = ManifestAccess::generate();
        let base = remote(1, &[("x", &old)]);
        // Modified replaced "x" with a new entry, target deleted it.
        let modified = remote(2, &[("x", &new)]);
        let target = remote(2, &[]);

        let (merged, sync_needed) = merge_remote_folder_manifests(Some(&base), &modified, &target);
        assert!(sync_needed);
        assert_eq!(merged.children["x"], new);
    }

    #[test]
    fn local_merge_keeps_entries_created_during_sync() {
        let synced = ManifestAccess::generate();
        let fresh = ManifestAccess::generate();
        let base = local(1, &[("synced.txt", &synced)]);
        // A child was created while the push was in flight.
        let mut current = local(1, &[("synced.txt", &synced), ("fresh.txt", &fresh)]);
        current.need_sync = true;
        let target = local(2, &[("synced.txt", &synced)]);

        let merged = merge_local_folder_manifests(&base, &current, &target);
        assert!(merged.need_sync);
        assert_eq!(merged.base_version, Version::new(2));
        assert_eq!(merged.children["fresh.txt"], fresh);
        assert_eq!(merged.children["synced.txt"], synced);
    }

    #[test]
    fn local_merge_honors_deletions_during_sync() {
        let doomed = ManifestAccess::generate();
        let base = local(1, &[("doomed.txt", &doomed)]);
        let mut current = local(1, &[]);
        current.need_sync = true;
        let target = local(2, &[("doomed.txt", &doomed)]);

        let merged = merge_local_folder_manifests(&base, &current, &target);
        assert!(merged.need_sync);
        assert!(!merged.children.contains_key("doomed.txt"));
    }

    #[test]
    fn local_merge_with_no_interleaved_edit_is_clean() {
        let a = ManifestAccess::generate();
        let base = local(1, &[("a.txt", &a)]);
        let current = local(1, &[("a.txt", &a)]);
        let target = local(2, &[("a.txt", &a)]);

        let merged = merge_local_folder_manifests(&base, &current, &target);
        assert!(!merged.need_sync);
        assert_eq!(merged.base_version, Version::new(2));
    }

    fn arb_children(max: usize) -> impl Strategy<Value = Children> {
        prop::collection::btree_map(
            "[a-d][0-9]{0,2}",
            prop::num::u8::ANY.prop_map(|_| ManifestAccess::generate()),
            0..max,
        )
    }

    proptest! {
        // Every name present only in `modified` (not in base, not contested)
        // must appear in the merged result.
        #[test]
        fn local_only_entries_are_never_dropped(
            base_children in arb_children(6),
            added in arb_children(6),
            target_children in arb_children(6),
        ) {
            let mut modified_children = base_children.clone();
            for (name, access) in &added {
                modified_children.insert(name.clone(), access.clone());
            }
            let merged = merge_children(
                Some(&base_children),
                &modified_children,
                &target_children,
            );
            for (name, access) in &added {
                if base_children.contains_key(name) {
                    continue;
                }
                let kept_in_place = merged.get(name) == Some(access);
                let kept_renamed = merged.values().any(|a| a.id == access.id);
                prop_assert!(kept_in_place || kept_renamed, "lost entry {name}");
            }
        }

        // Merging is deterministic: same triple, same bytes.
        #[test]
        fn merge_is_deterministic(
            base_children in arb_children(5),
            modified_children in arb_children(5),
            target_children in arb_children(5),
        ) {
            let a = merge_children(Some(&base_children), &modified_children, &target_children);
            let b = merge_children(Some(&base_children), &modified_children, &target_children);
            prop_assert_eq!(a, b);
        }

        // Idempotence against an identical target.
        #[test]
        fn merge_with_identical_target_is_clean(children in arb_children(6)) {
            let manifest = RemoteFolderManifest {
                id: EntryId::generate(),
                author: DeviceId::new("alice@laptop"),
                timestamp: Timestamp::from_millis(0),
                version: Version::new(3),
                children,
            };
            let (merged, sync_needed) =
                merge_remote_folder_manifests(None, &manifest, &manifest);
            prop_assert!(!sync_needed);
            prop_assert_eq!(merged, manifest);
        }
    }
}
