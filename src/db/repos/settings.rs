use std::collections::BTreeMap;

use rusqlite::{params, OptionalExtension};

use crate::db::models::Setting;
use crate::db::DbPool;
use crate::error::AppError;
use crate::validation::require_valid_key;

const UPSERT_SQL: &str = "INSERT INTO app_settings (key, value, updated_at)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3";

/// Get a setting value by key. Returns None if not found.
pub fn get(pool: &DbPool, key: &str) -> Result<Option<String>, AppError> {
    let conn = pool.get()?;
    let value = conn
        .query_row(
            "SELECT value FROM app_settings WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

/// Every stored setting as a flat key -> value map.
pub fn get_all(pool: &DbPool) -> Result<BTreeMap<String, String>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT key, value FROM app_settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut map = BTreeMap::new();
    for row in rows {
        let (key, value) = row?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Set a setting value. Creates or updates the key and returns the stored row.
pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<Setting, AppError> {
    require_valid_key(key)?;

    let conn = pool.get()?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(UPSERT_SQL, params![key, value, now])?;

    let setting = conn.query_row(
        "SELECT key, value FROM app_settings WHERE key = ?1",
        params![key],
        |row| {
            Ok(Setting {
                key: row.get(0)?,
                value: row.get(1)?,
            })
        },
    )?;
    Ok(setting)
}

/// Upsert a batch of settings inside one transaction.
///
/// Either every pair is written or none are: a rejected key or a failed
/// statement rolls the whole batch back.
pub fn set_many<I, K, V>(pool: &DbPool, entries: I) -> Result<usize, AppError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;
    let now = chrono::Utc::now().to_rfc3339();
    let mut written = 0usize;

    {
        let mut stmt = tx.prepare(UPSERT_SQL)?;
        for (key, value) in entries {
            let key = key.as_ref();
            require_valid_key(key)?;
            stmt.execute(params![key, value.as_ref(), now])?;
            written += 1;
        }
    }

    tx.commit()?;
    Ok(written)
}

/// Delete a setting by key. Returns true if a row was deleted.
pub fn delete(pool: &DbPool, key: &str) -> Result<bool, AppError> {
    let conn = pool.get()?;
    let rows = conn.execute("DELETE FROM app_settings WHERE key = ?1", params![key])?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;
    use crate::validation::MAX_KEY_LEN;
    use proptest::prelude::*;

    #[test]
    fn test_get_set_delete() {
        let pool = init_test_db().unwrap();

        // Get non-existent
        assert_eq!(get(&pool, "clinicName").unwrap(), None);

        // Set
        let row = set(&pool, "clinicName", "Smile Clinic").unwrap();
        assert_eq!(row.key, "clinicName");
        assert_eq!(row.value, "Smile Clinic");
        assert_eq!(get(&pool, "clinicName").unwrap(), Some("Smile Clinic".into()));

        // Overwrite
        set(&pool, "clinicName", "Clinique Ouargla").unwrap();
        assert_eq!(get(&pool, "clinicName").unwrap(), Some("Clinique Ouargla".into()));

        // Delete
        assert!(delete(&pool, "clinicName").unwrap());
        assert_eq!(get(&pool, "clinicName").unwrap(), None);

        // Delete non-existent
        assert!(!delete(&pool, "clinicName").unwrap());
    }

    #[test]
    fn test_set_rejects_blank_key() {
        let pool = init_test_db().unwrap();
        assert!(matches!(set(&pool, "  ", "x"), Err(AppError::Validation(_))));
        assert!(get_all(&pool).unwrap().is_empty());
    }

    #[test]
    fn test_get_all_returns_flat_map() {
        let pool = init_test_db().unwrap();
        assert!(get_all(&pool).unwrap().is_empty());

        set(&pool, "clinicPhone", "0660865034").unwrap();
        set(&pool, "clinicEmail", "info@smiledentalclinic.com").unwrap();

        let all = get_all(&pool).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["clinicPhone"], "0660865034");
        assert_eq!(all["clinicEmail"], "info@smiledentalclinic.com");
    }

    #[test]
    fn test_set_many_is_atomic() {
        let pool = init_test_db().unwrap();
        set(&pool, "clinicName", "Before").unwrap();

        let too_long = "z".repeat(MAX_KEY_LEN + 1);
        let result = set_many(
            &pool,
            vec![
                ("clinicName".to_string(), "After".to_string()),
                ("clinicAddress".to_string(), "Ouargla".to_string()),
                (too_long, "rejected".to_string()),
            ],
        );
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Nothing from the failed batch is visible.
        let all = get_all(&pool).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["clinicName"], "Before");
    }

    #[test]
    fn test_set_many_counts_rows() {
        let pool = init_test_db().unwrap();
        let written = set_many(&pool, [("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(written, 2);
        assert_eq!(set_many(&pool, Vec::<(String, String)>::new()).unwrap(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Reading back after batched writes yields a superset holding the
        /// last value written for every key.
        #[test]
        fn prop_set_many_then_get_all_is_superset(
            seed in proptest::collection::btree_map("[a-z]{1,8}", "[ -~]{0,16}", 0..6),
            batches in proptest::collection::vec(
                proptest::collection::vec(("[a-z]{1,8}", "[ -~]{0,16}"), 0..6),
                1..4,
            ),
        ) {
            let pool = init_test_db().unwrap();
            set_many(&pool, seed.iter()).unwrap();

            let mut expected = seed.clone();
            for batch in &batches {
                set_many(&pool, batch.iter().map(|(k, v)| (k, v))).unwrap();
                for (k, v) in batch {
                    expected.insert(k.clone(), v.clone());
                }
            }

            let all = get_all(&pool).unwrap();
            prop_assert_eq!(all, expected);
        }
    }
}
