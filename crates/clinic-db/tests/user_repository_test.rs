//! Integration tests for the credential store using in-memory SurrealDB.

use clinic_core::error::ClinicError;
use clinic_core::models::clinic::CreateClinic;
use clinic_core::models::role::Role;
use clinic_core::models::user::CreateUser;
use clinic_core::repository::{ClinicRepository, UserRepository};
use clinic_db::repository::{SurrealClinicRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (Surreal<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clinic_db::run_migrations(&db).await.unwrap();

    let clinic = SurrealClinicRepository::new(db.clone())
        .create(CreateClinic {
            name: "Riverside Clinic".into(),
            slug: "riverside".into(),
        })
        .await
        .unwrap();

    (db, clinic.id)
}

fn pharmacist(clinic_id: Uuid, email: &str) -> CreateUser {
    CreateUser {
        clinic_id: Some(clinic_id),
        email: email.into(),
        full_name: "Pat Pharmacist".into(),
        role: Role::Pharmacist,
        password: "Pharmacy@2024".into(),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let (db, clinic_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(pharmacist(clinic_id, "Pat@Example.com"))
        .await
        .unwrap();

    assert_eq!(user.email, "pat@example.com");
    assert_eq!(user.role, Role::Pharmacist);
    assert_eq!(user.clinic_id, Some(clinic_id));
    assert!(user.active);
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert_ne!(user.password_hash, "Pharmacy@2024");

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.email, user.email);
}

#[tokio::test]
async fn get_by_email_is_case_insensitive() {
    let (db, clinic_id) = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo
        .create(pharmacist(clinic_id, "pat@example.com"))
        .await
        .unwrap();

    let fetched = repo.get_by_email(" PAT@example.com ").await.unwrap();
    assert_eq!(fetched.id, user.id);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (db, clinic_id) = setup().await;
    let repo = SurrealUserRepository::new(db);
    repo.create(pharmacist(clinic_id, "pat@example.com"))
        .await
        .unwrap();

    let err = repo
        .create(pharmacist(clinic_id, "pat@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClinicError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let (db, _) = setup().await;
    let repo = SurrealUserRepository::new(db);

    assert!(matches!(
        repo.get_by_id(Uuid::new_v4()).await,
        Err(ClinicError::NotFound { .. })
    ));
    assert!(matches!(
        repo.get_by_email("nobody@example.com").await,
        Err(ClinicError::NotFound { .. })
    ));
}

#[tokio::test]
async fn deactivation_is_a_soft_flag() {
    let (db, clinic_id) = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo
        .create(pharmacist(clinic_id, "pat@example.com"))
        .await
        .unwrap();

    let updated = repo.set_active(user.id, false).await.unwrap();
    assert!(!updated.active);

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert!(!fetched.active);
    assert_eq!(fetched.email, user.email);
}

#[tokio::test]
async fn role_change_keeps_clinic_membership() {
    let (db, clinic_id) = setup().await;
    let repo = SurrealUserRepository::new(db);
    let user = repo
        .create(pharmacist(clinic_id, "pat@example.com"))
        .await
        .unwrap();

    let updated = repo.set_role(user.id, Role::Accountant).await.unwrap();
    assert_eq!(updated.role, Role::Accountant);
    assert_eq!(updated.clinic_id, Some(clinic_id));

    let err = repo.set_role(user.id, Role::PlatformAdmin).await.unwrap_err();
    assert!(matches!(err, ClinicError::Validation { .. }));
}

#[tokio::test]
async fn platform_admin_has_no_clinic() {
    let (db, clinic_id) = setup().await;
    let repo = SurrealUserRepository::new(db);

    let admin = repo
        .create(CreateUser {
            clinic_id: None,
            email: "root@example.com".into(),
            full_name: "Root".into(),
            role: Role::PlatformAdmin,
            password: "Admin@2024".into(),
        })
        .await
        .unwrap();
    assert_eq!(admin.clinic_id, None);

    let err = repo
        .create(CreateUser {
            clinic_id: Some(clinic_id),
            email: "root2@example.com".into(),
            full_name: "Root".into(),
            role: Role::PlatformAdmin,
            password: "Admin@2024".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClinicError::Validation { .. }));
}
