use pmaas_application::TotpEnrollment;
use serde::{Deserialize, Serialize};

/// A TOTP code submitted by the caller.
#[derive(Debug, Deserialize)]
pub struct MfaCodeRequest {
    pub mfa_code: String,
}

/// Secret and QR payload returned once when MFA is enabled.
#[derive(Debug, Serialize)]
pub struct MfaEnrollmentResponse {
    pub secret: String,
    pub qr_url: String,
}

impl From<TotpEnrollment> for MfaEnrollmentResponse {
    fn from(enrollment: TotpEnrollment) -> Self {
        Self {
            secret: enrollment.secret,
            qr_url: enrollment.otpauth_url,
        }
    }
}

/// Outcome of a code check.
#[derive(Debug, Serialize)]
pub struct MfaVerifyResponse {
    pub valid: bool,
}
