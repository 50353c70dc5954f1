use pmaas_core::AppResult;

/// A freshly generated TOTP secret, shown to the user once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpEnrollment {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// `otpauth://` URI for QR code display.
    pub otpauth_url: String,
}

/// Port for TOTP secret generation and code checks.
pub trait TotpProvider: Send + Sync {
    /// Generates a secret labelled with `account_name`.
    fn generate(&self, account_name: &str) -> AppResult<TotpEnrollment>;

    /// Checks `code` against a base32 secret, allowing one step of clock skew.
    fn verify_code(&self, secret: &str, code: &str) -> AppResult<bool>;
}
