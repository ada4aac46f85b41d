//! Integration tests for identity resolution against the credential store.

use clinic_auth::{AuthConfig, IdentityResolver, TokenCodec, authorize};
use clinic_core::error::ClinicError;
use clinic_core::models::clinic::CreateClinic;
use clinic_core::models::identity::ClinicScope;
use clinic_core::models::role::{Role, allow};
use clinic_core::models::user::CreateUser;
use clinic_core::repository::{ClinicRepository, UserRepository};
use clinic_db::repository::{SurrealClinicRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "identity-test-secret".into(),
        token_lifetime_secs: 900,
        jwt_issuer: "clinic-test".into(),
        pepper: None,
    }
}

struct Fixture {
    users: SurrealUserRepository<Db>,
    resolver: IdentityResolver<SurrealUserRepository<Db>>,
    codec: TokenCodec,
    clinic_id: Uuid,
    pharmacist_id: Uuid,
}

async fn setup() -> Fixture {
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

    let users = SurrealUserRepository::new(db.clone());
    let pharmacist = users
        .create(CreateUser {
            clinic_id: Some(clinic.id),
            email: "pat@riverside.example.com".into(),
            full_name: "Pat Pharmacist".into(),
            role: Role::Pharmacist,
            password: "Pharmacy@2024".into(),
        })
        .await
        .unwrap();

    let codec = TokenCodec::new(&test_config()).unwrap();
    let resolver = IdentityResolver::new(users.clone(), codec.clone());

    Fixture {
        users,
        resolver,
        codec,
        clinic_id: clinic.id,
        pharmacist_id: pharmacist.id,
    }
}

fn is_auth_failure(err: &ClinicError) -> bool {
    matches!(err, ClinicError::AuthenticationFailed { .. })
}

#[tokio::test]
async fn resolve_returns_the_stored_identity() {
    let f = setup().await;
    let token = f
        .codec
        .issue(f.pharmacist_id, Role::Pharmacist, Some(f.clinic_id))
        .unwrap();

    let identity = f.resolver.resolve(&token).await.unwrap();

    assert_eq!(identity.id, f.pharmacist_id);
    assert_eq!(identity.role, Role::Pharmacist);
    assert_eq!(identity.clinic_id, Some(f.clinic_id));
    assert!(identity.active);
}

#[tokio::test]
async fn deactivation_after_issuance_fails_the_next_resolve() {
    let f = setup().await;
    let token = f
        .codec
        .issue(f.pharmacist_id, Role::Pharmacist, Some(f.clinic_id))
        .unwrap();
    assert!(f.resolver.resolve(&token).await.is_ok());

    f.users.set_active(f.pharmacist_id, false).await.unwrap();

    let err = f.resolver.resolve(&token).await.unwrap_err();
    assert!(is_auth_failure(&err), "{err:?}");
}

#[tokio::test]
async fn role_change_is_seen_instead_of_the_token_role() {
    let f = setup().await;
    let token = f
        .codec
        .issue(f.pharmacist_id, Role::Pharmacist, Some(f.clinic_id))
        .unwrap();

    f.users
        .set_role(f.pharmacist_id, Role::Accountant)
        .await
        .unwrap();

    let identity = f.resolver.resolve(&token).await.unwrap();
    assert_eq!(identity.role, Role::Accountant);

    let err = authorize(&identity, allow::SELL_MEDICINE, None).unwrap_err();
    assert!(matches!(err, ClinicError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn forged_claims_do_not_change_the_identity() {
    let f = setup().await;
    // A token that claims more than the store grants.
    let token = f
        .codec
        .issue(f.pharmacist_id, Role::PlatformAdmin, None)
        .unwrap();

    let identity = f.resolver.resolve(&token).await.unwrap();
    assert_eq!(identity.role, Role::Pharmacist);
    assert_eq!(identity.clinic_id, Some(f.clinic_id));
    assert_eq!(
        authorize(&identity, allow::SELL_MEDICINE, None).unwrap(),
        ClinicScope::Clinic(f.clinic_id)
    );
}

#[tokio::test]
async fn unknown_subject_is_rejected() {
    let f = setup().await;
    let token = f
        .codec
        .issue(Uuid::new_v4(), Role::Pharmacist, Some(f.clinic_id))
        .unwrap();

    let err = f.resolver.resolve(&token).await.unwrap_err();
    assert!(is_auth_failure(&err), "{err:?}");
}

#[tokio::test]
async fn token_from_another_secret_is_rejected() {
    let f = setup().await;
    let foreign = TokenCodec::new(&AuthConfig {
        jwt_secret: "somebody-elses-secret".into(),
        ..test_config()
    })
    .unwrap();
    let token = foreign
        .issue(f.pharmacist_id, Role::Pharmacist, Some(f.clinic_id))
        .unwrap();

    let err = f.resolver.resolve(&token).await.unwrap_err();
    assert!(is_auth_failure(&err), "{err:?}");
}
