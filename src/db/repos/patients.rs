use rusqlite::{params, Row};

use crate::db::models::{CreatePatientInput, Patient};
use crate::db::DbPool;
use crate::error::AppError;
use crate::validation::require_non_empty;

fn row_to_patient(row: &Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn get_all(pool: &DbPool) -> Result<Vec<Patient>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT * FROM patients ORDER BY created_at, rowid")?;
    let rows = stmt.query_map([], row_to_patient)?;
    let patients = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(patients)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Patient, AppError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT * FROM patients WHERE id = ?1",
        params![id],
        row_to_patient,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Patient {id}")),
        other => AppError::Database(other),
    })
}

pub fn create(pool: &DbPool, input: CreatePatientInput) -> Result<Patient, AppError> {
    require_non_empty("firstName", &input.first_name)?;
    require_non_empty("lastName", &input.last_name)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, phone, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            id,
            input.first_name.trim(),
            input.last_name.trim(),
            input.phone,
            input.email,
            now
        ],
    )?;

    get_by_id(pool, &id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;

    fn input(first: &str, last: &str) -> CreatePatientInput {
        CreatePatientInput {
            first_name: first.into(),
            last_name: last.into(),
            phone: None,
            email: None,
        }
    }

    #[test]
    fn test_patient_create_and_list() {
        let pool = init_test_db().unwrap();
        assert!(get_all(&pool).unwrap().is_empty());

        let p1 = create(&pool, input("Amina", "Benali")).unwrap();
        assert_eq!(p1.first_name, "Amina");
        assert_eq!(p1.last_name, "Benali");
        assert!(p1.phone.is_none());

        let p2 = create(
            &pool,
            CreatePatientInput {
                phone: Some("0555000000".into()),
                ..input("  Karim ", "Haddad")
            },
        )
        .unwrap();
        assert_eq!(p2.first_name, "Karim");
        assert_eq!(p2.phone.as_deref(), Some("0555000000"));

        // Read by id
        let fetched = get_by_id(&pool, &p1.id).unwrap();
        assert_eq!(fetched, p1);

        // List all, creation order
        let all = get_all(&pool).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, p1.id);
        assert_eq!(all[1].id, p2.id);
    }

    #[test]
    fn test_patient_validation_and_not_found() {
        let pool = init_test_db().unwrap();
        assert!(matches!(
            create(&pool, input("", "Benali")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            create(&pool, input("Amina", "  ")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            get_by_id(&pool, "missing"),
            Err(AppError::NotFound(_))
        ));
    }
}
