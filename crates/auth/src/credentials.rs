use serde::Deserialize;

/// The single configured administrator account.
#[derive(Clone, Deserialize)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Email is compared case-insensitively, password exactly.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        let email_ok = self.email.trim().eq_ignore_ascii_case(email.trim());
        // Digests have a fixed width and `Hash` equality is constant-time,
        // so neither the content nor the length of the password leaks.
        let password_ok =
            blake3::hash(self.password.as_bytes()) == blake3::hash(password.as_bytes());
        email_ok && password_ok
    }
}
