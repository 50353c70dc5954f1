//! TOTP provider backed by the `totp-rs` crate.

use pmaas_application::{TotpEnrollment, TotpProvider};
use pmaas_core::{AppError, AppResult};
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const SKEW_STEPS: u8 = 1;
const STEP_SECONDS: u64 = 30;

/// RFC 6238 provider: SHA-1, six digits, 30 second steps.
#[derive(Debug, Clone)]
pub struct TotpRsProvider {
    issuer: String,
}

impl TotpRsProvider {
    /// Creates a provider that labels secrets with `issuer`.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    fn totp(&self, secret_bytes: Vec<u8>, account_name: String) -> AppResult<TOTP> {
        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW_STEPS,
            STEP_SECONDS,
            secret_bytes,
            Some(self.issuer.clone()),
            account_name,
        )
        .map_err(|error| AppError::Internal(format!("failed to create TOTP instance: {error}")))
    }
}

impl TotpProvider for TotpRsProvider {
    fn generate(&self, account_name: &str) -> AppResult<TotpEnrollment> {
        let secret = Secret::generate_secret();
        let secret_bytes = secret.to_bytes().map_err(|error| {
            AppError::Internal(format!("failed to generate TOTP secret: {error}"))
        })?;
        let totp = self.totp(secret_bytes, account_name.replace(':', ""))?;

        Ok(TotpEnrollment {
            secret: secret.to_encoded().to_string(),
            otpauth_url: totp.get_url(),
        })
    }

    fn verify_code(&self, secret: &str, code: &str) -> AppResult<bool> {
        let secret_bytes = Secret::Encoded(secret.to_owned())
            .to_bytes()
            .map_err(|error| AppError::Internal(format!("stored TOTP secret is invalid: {error}")))?;

        self.totp(secret_bytes, String::new())?
            .check_current(code)
            .map_err(|error| AppError::Internal(format!("failed to verify TOTP code: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use pmaas_application::TotpProvider;
    use totp_rs::{Algorithm, Secret, TOTP};

    use super::TotpRsProvider;

    fn current_code(secret: &str) -> String {
        let bytes = Secret::Encoded(secret.to_owned())
            .to_bytes()
            .unwrap_or_else(|error| panic!("secret: {error}"));
        TOTP::new(Algorithm::SHA1, 6, 1, 30, bytes, None, "pat".to_owned())
            .unwrap_or_else(|error| panic!("totp: {error}"))
            .generate_current()
            .unwrap_or_else(|error| panic!("clock: {error}"))
    }

    #[test]
    fn generated_secret_verifies_its_current_code() {
        let provider = TotpRsProvider::new("PMaaS");
        let enrollment = provider
            .generate("pat@example.com")
            .unwrap_or_else(|error| panic!("generate: {error}"));

        assert!(enrollment.otpauth_url.starts_with("otpauth://totp/PMaaS:"));
        assert!(enrollment.otpauth_url.contains(&format!("secret={}", enrollment.secret)));
        assert!(enrollment.otpauth_url.contains("issuer=PMaaS"));

        let code = current_code(&enrollment.secret);
        assert_eq!(provider.verify_code(&enrollment.secret, &code).ok(), Some(true));
    }

    #[test]
    fn wrong_code_is_rejected_and_garbage_secret_errors() {
        let provider = TotpRsProvider::new("PMaaS");
        let enrollment = provider
            .generate("pat")
            .unwrap_or_else(|error| panic!("generate: {error}"));
        let code = current_code(&enrollment.secret);
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert_eq!(provider.verify_code(&enrollment.secret, wrong).ok(), Some(false));
        assert!(provider.verify_code("not base32!", "123456").is_err());
    }
}
