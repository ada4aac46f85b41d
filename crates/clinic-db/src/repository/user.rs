//! SurrealDB implementation of [`UserRepository`] (the credential store).
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1). Salt is randomly
//! generated per hash. An optional pepper (server-side secret) can be
//! provided at construction time and must match the one given to the
//! login service.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use clinic_core::error::{ClinicError, ClinicResult};
use clinic_core::models::role::Role;
use clinic_core::models::user::{CreateUser, User};
use clinic_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    clinic_id: Option<String>,
    email: String,
    full_name: String,
    role: String,
    password_hash: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    clinic_id: Option<String>,
    email: String,
    full_name: String,
    role: String,
    password_hash: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    s.parse()
        .map_err(|_| DbError::InvalidRecord(format!("unknown role: {s}")))
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            clinic_id: parse_opt_uuid("clinic_id", self.clinic_id.as_deref())?,
            email: self.email,
            full_name: self.full_name,
            role: parse_role(&self.role)?,
            password_hash: self.password_hash,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid("id", &self.record_id)?;
        UserRow {
            clinic_id: self.clinic_id,
            email: self.email,
            full_name: self.full_name,
            role: self.role,
            password_hash: self.password_hash,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user(id)
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, ClinicError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| ClinicError::Crypto(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_owned(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| ClinicError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the credential store.
///
/// Reads always hit the database; nothing is cached.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> ClinicResult<User> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 clinic_id = $clinic_id, email = $email, \
                 full_name = $full_name, role = $role, \
                 password_hash = $password_hash, active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("clinic_id", input.clinic_id.map(|c| c.to_string())))
            .bind(("email", input.email.trim().to_lowercase()))
            .bind(("full_name", input.full_name))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ClinicResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> ClinicResult<User> {
        let email = email.trim().to_lowercase();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE email = $email")
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> ClinicResult<User> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 active = $active, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> ClinicResult<User> {
        let current = self.get_by_id(id).await?;
        if role.is_platform() != current.clinic_id.is_none() {
            return Err(ClinicError::Validation {
                message: format!("role {role} does not fit the user's clinic membership"),
            });
        }

        let id_str = id.to_string();
        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 role = $role, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }
}
