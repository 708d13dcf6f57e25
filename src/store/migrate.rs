use crate::store::operations::progress::Progress;
use crate::store::{keys, Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_progress_due_index", m002_progress_due_index),
    ]
}

/// Runs all unapplied migrations.
///
/// Every migration must be idempotent: a crash between `func()` and
/// `set_version()` re-runs it on the next boot. The version checkpoint is
/// persisted after each step and downgrades are refused.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    let all = migrations();

    for (index, (name, func)) in all.iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            if raw.len() == 4 {
                let bytes: [u8; 4] = raw.as_ref().try_into().unwrap_or([0; 4]);
                Ok(u32::from_be_bytes(bytes))
            } else {
                Ok(0)
            }
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Rebuilds the due index from the progress tree. Safe to re-run: inserts
/// are keyed identically on every pass.
fn m002_progress_due_index(store: &Store) -> Result<(), StoreError> {
    for item in store.progress.iter() {
        let (_, value) = item?;
        let progress: Progress = Store::deserialize(&value)?;

        if let Some(next_review_at) = progress.next_review_at {
            let due_key = keys::progress_due_key(
                &progress.user_id,
                next_review_at.timestamp_millis(),
                &progress.word_id,
            );
            store.progress_due_index.insert(due_key.as_bytes(), &[])?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn migration_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        run(&store).unwrap();
        let first = get_current_version(&store).unwrap();
        run(&store).unwrap();
        let second = get_current_version(&store).unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn downgrade_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db2");
        let store = Store::open(path.to_str().unwrap()).unwrap();

        set_version(&store, 3).unwrap();
        let err = set_version(&store, 2).unwrap_err();
        assert!(matches!(err, StoreError::Migration { .. }));
    }
}
