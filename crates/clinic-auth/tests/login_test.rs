//! Integration tests for the login service.

use clinic_auth::{AuthConfig, IdentityResolver, LoginInput, LoginService, TokenCodec};
use clinic_core::error::ClinicError;
use clinic_core::models::role::Role;
use clinic_core::models::user::CreateUser;
use clinic_core::repository::UserRepository;
use clinic_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "login-test-secret".into(),
        token_lifetime_secs: 900,
        jwt_issuer: "clinic-test".into(),
        pepper: Some("test-pepper".into()),
    }
}

async fn setup() -> (SurrealUserRepository<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clinic_db::run_migrations(&db).await.unwrap();

    let users = SurrealUserRepository::with_pepper(db, "test-pepper".into());
    let doctor = users
        .create(CreateUser {
            clinic_id: Some(Uuid::new_v4()),
            email: "dana@example.com".into(),
            full_name: "Dana Doctor".into(),
            role: Role::Doctor,
            password: "Doctor@2024".into(),
        })
        .await
        .unwrap();

    (users, doctor.id)
}

fn input(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.into(),
        password: password.into(),
    }
}

fn reason(err: ClinicError) -> String {
    match err {
        ClinicError::AuthenticationFailed { reason } => reason,
        other => panic!("expected AuthenticationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn login_issues_a_resolvable_token() {
    let (users, doctor_id) = setup().await;
    let service = LoginService::new(users.clone(), test_config()).unwrap();

    let output = service
        .login(input("Dana@Example.com", "Doctor@2024"))
        .await
        .unwrap();
    assert_eq!(output.expires_in, 900);
    assert_eq!(output.identity.id, doctor_id);
    assert_eq!(output.identity.role, Role::Doctor);

    let resolver = IdentityResolver::new(users, TokenCodec::new(&test_config()).unwrap());
    let identity = resolver.resolve(&output.access_token).await.unwrap();
    assert_eq!(identity, output.identity);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_the_same_way() {
    let (users, _) = setup().await;
    let service = LoginService::new(users, test_config()).unwrap();

    let wrong_password = service
        .login(input("dana@example.com", "not-the-password"))
        .await
        .unwrap_err();
    let unknown_email = service
        .login(input("nobody@example.com", "Doctor@2024"))
        .await
        .unwrap_err();

    assert_eq!(reason(wrong_password), reason(unknown_email));
}

#[tokio::test]
async fn inactive_account_cannot_log_in() {
    let (users, doctor_id) = setup().await;
    users.set_active(doctor_id, false).await.unwrap();
    let service = LoginService::new(users, test_config()).unwrap();

    let err = service
        .login(input("dana@example.com", "Doctor@2024"))
        .await
        .unwrap_err();
    assert!(reason(err).contains("inactive"));
}

#[tokio::test]
async fn pepper_mismatch_fails_login() {
    let (users, _) = setup().await;
    let service = LoginService::new(
        users,
        AuthConfig {
            pepper: None,
            ..test_config()
        },
    )
    .unwrap();

    assert!(
        service
            .login(input("dana@example.com", "Doctor@2024"))
            .await
            .is_err()
    );
}
