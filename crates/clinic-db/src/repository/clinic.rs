//! SurrealDB implementation of [`ClinicRepository`].

use chrono::{DateTime, Utc};
use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::clinic::{Clinic, CreateClinic};
use clinic_core::repository::ClinicRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ClinicRow {
    name: String,
    slug: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ClinicRow {
    fn into_clinic(self, id: Uuid) -> Clinic {
        Clinic {
            id,
            name: self.name,
            slug: self.slug,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct SurrealClinicRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealClinicRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ClinicRepository for SurrealClinicRepository<C> {
    async fn create(&self, input: CreateClinic) -> ClinicResult<Clinic> {
        let slug = input.slug.trim().to_lowercase();
        if input.name.trim().is_empty() || slug.is_empty() {
            return Err(ClinicError::Validation {
                message: "clinic name and slug must not be empty".into(),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('clinic', $id) SET \
                 name = $name, slug = $slug, active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", slug))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("clinic", e))?;

        let rows: Vec<ClinicRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "clinic".into(),
            id: id_str,
        })?;

        Ok(row.into_clinic(id))
    }

    async fn get_by_id(&self, id: Uuid) -> ClinicResult<Clinic> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('clinic', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ClinicRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "clinic".into(),
            id: id_str,
        })?;

        Ok(row.into_clinic(id))
    }
}
