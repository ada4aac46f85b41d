//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Money is stored as integer minor
//! units.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Clinics (global scope)
-- =======================================================================
DEFINE TABLE clinic SCHEMAFULL;
DEFINE FIELD name ON TABLE clinic TYPE string;
DEFINE FIELD slug ON TABLE clinic TYPE string;
DEFINE FIELD active ON TABLE clinic TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE clinic TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE clinic TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_clinic_slug ON TABLE clinic COLUMNS slug UNIQUE;

-- =======================================================================
-- Users (credential store; global lookup, clinic membership)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE user TYPE option<string>;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['platform_admin', 'clinic_admin', 'doctor', \
    'receptionist', 'patient', 'pharmacist', 'accountant', \
    'lab_technician'];
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_clinic ON TABLE user COLUMNS clinic_id;

-- =======================================================================
-- Medicines (clinic scope)
-- =======================================================================
DEFINE TABLE medicine SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE medicine TYPE string;
DEFINE FIELD name ON TABLE medicine TYPE string;
DEFINE FIELD unit_price_minor ON TABLE medicine TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD stock_quantity ON TABLE medicine TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD reorder_level ON TABLE medicine TYPE int DEFAULT 0 \
    ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE medicine TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE medicine TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_medicine_clinic ON TABLE medicine COLUMNS clinic_id;

-- =======================================================================
-- Medicine bills (clinic scope, written only by the sale transaction)
-- =======================================================================
DEFINE TABLE medicine_bill SCHEMAFULL;
DEFINE FIELD clinic_id ON TABLE medicine_bill TYPE string;
DEFINE FIELD bill_number ON TABLE medicine_bill TYPE string;
DEFINE FIELD buyer_id ON TABLE medicine_bill TYPE string;
DEFINE FIELD seller_id ON TABLE medicine_bill TYPE string;
DEFINE FIELD total_minor ON TABLE medicine_bill TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD status ON TABLE medicine_bill TYPE string \
    ASSERT $value IN ['pending', 'paid', 'cancelled'];
DEFINE FIELD created_at ON TABLE medicine_bill TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bill_number ON TABLE medicine_bill \
    COLUMNS bill_number UNIQUE;
DEFINE INDEX idx_bill_clinic_time ON TABLE medicine_bill \
    COLUMNS clinic_id, created_at;

DEFINE TABLE medicine_bill_item SCHEMAFULL;
DEFINE FIELD bill_id ON TABLE medicine_bill_item TYPE string;
DEFINE FIELD clinic_id ON TABLE medicine_bill_item TYPE string;
DEFINE FIELD medicine_id ON TABLE medicine_bill_item TYPE string;
DEFINE FIELD position ON TABLE medicine_bill_item TYPE int;
DEFINE FIELD quantity ON TABLE medicine_bill_item TYPE int \
    ASSERT $value > 0;
DEFINE FIELD unit_price_minor ON TABLE medicine_bill_item TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD line_total_minor ON TABLE medicine_bill_item TYPE int \
    ASSERT $value >= 0;
DEFINE INDEX idx_bill_item_bill ON TABLE medicine_bill_item \
    COLUMNS bill_id;

-- =======================================================================
-- Audit Log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD actor_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD clinic_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['Create', 'Update', 'Delete'];
DEFINE FIELD resource_kind ON TABLE audit_log TYPE string;
DEFINE FIELD resource_id ON TABLE audit_log TYPE option<string>;
DEFINE FIELD payload ON TABLE audit_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD origin ON TABLE audit_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_clinic_time ON TABLE audit_log \
    COLUMNS clinic_id, timestamp;
DEFINE INDEX idx_audit_actor ON TABLE audit_log COLUMNS actor_id;

-- =======================================================================
-- Notifications (per recipient)
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD recipient_id ON TABLE notification TYPE string;
DEFINE FIELD clinic_id ON TABLE notification TYPE option<string>;
DEFINE FIELD category ON TABLE notification TYPE string \
    ASSERT $value IN ['appointment', 'bill', 'lab_report'];
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD body ON TABLE notification TYPE string;
DEFINE FIELD related_resource_id ON TABLE notification \
    TYPE option<string>;
DEFINE FIELD read ON TABLE notification TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_recipient ON TABLE notification \
    COLUMNS recipient_id, created_at;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use clinic_core::models::role::Role;

    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(window[0].version < window[1].version);
        }
    }

    #[test]
    fn every_role_is_accepted_by_the_user_table() {
        for role in Role::ALL {
            assert!(
                SCHEMA_V1.contains(&format!("'{}'", role.as_str())),
                "schema rejects role {role}"
            );
        }
    }
}
