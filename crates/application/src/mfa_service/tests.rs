use std::sync::Arc;

use pmaas_core::AppResult;
use pmaas_domain::UserId;

use super::MfaService;
use crate::test_support::InMemoryStore;
use crate::{TotpEnrollment, TotpProvider};

const VALID_CODE: &str = "123456";

/// Accepts exactly one code for every secret it hands out.
struct FixedCodeTotp;

impl TotpProvider for FixedCodeTotp {
    fn generate(&self, account_name: &str) -> AppResult<TotpEnrollment> {
        Ok(TotpEnrollment {
            secret: "JBSWY3DPEHPK3PXP".to_owned(),
            otpauth_url: format!("otpauth://totp/PMaaS:{account_name}?secret=JBSWY3DPEHPK3PXP"),
        })
    }

    fn verify_code(&self, secret: &str, code: &str) -> AppResult<bool> {
        Ok(secret == "JBSWY3DPEHPK3PXP" && code == VALID_CODE)
    }
}

fn service(store: &Arc<InMemoryStore>) -> MfaService {
    MfaService::new(store.clone(), Arc::new(FixedCodeTotp))
}

#[tokio::test]
async fn enabling_stores_secret_and_labels_with_email() {
    let store = Arc::new(InMemoryStore::seeded());
    let user_id = store.insert_registered("pat", "pat@example.com").await;

    let enrollment = service(&store)
        .enable(user_id)
        .await
        .unwrap_or_else(|error| panic!("enable failed: {error}"));

    assert!(enrollment.otpauth_url.contains("pat@example.com"));
    let stored = store.stored_user(user_id).await;
    assert!(stored.mfa_enabled());
    assert_eq!(stored.mfa_secret(), Some(enrollment.secret.as_str()));
}

#[tokio::test]
async fn enabling_twice_conflicts() {
    let store = Arc::new(InMemoryStore::seeded());
    let user_id = store.insert_user("pat").await;
    let service = service(&store);

    assert!(service.enable(user_id).await.is_ok());
    assert!(
        service
            .enable(user_id)
            .await
            .is_err_and(|error| error.is_conflict())
    );
}

#[tokio::test]
async fn verify_reports_code_validity() {
    let store = Arc::new(InMemoryStore::seeded());
    let user_id = store.insert_user("pat").await;
    let service = service(&store);
    assert!(service.enable(user_id).await.is_ok());

    assert_eq!(service.verify(user_id, " 123456 ").await.ok(), Some(true));
    assert_eq!(service.verify(user_id, "000000").await.ok(), Some(false));
}

#[tokio::test]
async fn disabling_requires_a_valid_code() {
    let store = Arc::new(InMemoryStore::seeded());
    let user_id = store.insert_user("pat").await;
    let service = service(&store);
    assert!(service.enable(user_id).await.is_ok());

    let rejected = service.disable(user_id, "000000").await;
    assert!(matches!(
        rejected,
        Err(pmaas_core::AppError::Unauthorized(_))
    ));
    assert!(store.stored_user(user_id).await.mfa_enabled());

    assert!(service.disable(user_id, VALID_CODE).await.is_ok());
    let stored = store.stored_user(user_id).await;
    assert!(!stored.mfa_enabled());
    assert!(stored.mfa_secret().is_none());
}

#[tokio::test]
async fn codes_are_rejected_while_mfa_is_off() {
    let store = Arc::new(InMemoryStore::seeded());
    let user_id = store.insert_user("pat").await;
    let service = service(&store);

    assert!(matches!(
        service.verify(user_id, VALID_CODE).await,
        Err(pmaas_core::AppError::Validation(_))
    ));
    assert!(matches!(
        service.disable(user_id, VALID_CODE).await,
        Err(pmaas_core::AppError::Validation(_))
    ));
    assert!(
        service
            .enable(UserId::new())
            .await
            .is_err_and(|error| error.is_not_found())
    );
}
