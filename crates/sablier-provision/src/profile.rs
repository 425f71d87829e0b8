//! Persisted TOTP account: secret, configuration, and replay watermark.
//!
//! Stored as camelCase JSON. The watermark (`lastAccepted`) must be saved
//! after every successful verification, otherwise a code can be replayed
//! within its window. Load, verify, and save have to be serialized by the
//! caller (file lock, database row lock) when several processes share a
//! profile.

use std::fmt;
use std::fs;
use std::path::Path;

use sablier_core::{Clock, OtpError, Totp, TotpConfig};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::secret::{decode_base32, normalize};
use crate::uri::ProvisioningUri;
use crate::ProvisionError;

/// One enrolled TOTP account.
///
/// Deserialization applies the same checks as [`Self::new`] and
/// [`Self::with_leeway`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "RawTotpProfile")]
pub struct TotpProfile {
    /// Account name.
    pub label: String,

    /// Service name shown next to the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Shared secret, base32.
    secret: String,

    /// Generation and verification parameters.
    pub config: TotpConfig,

    /// Verification tolerance in seconds (`None` = strict single window).
    pub leeway: Option<u64>,

    /// Timestamp of the last accepted code (replay watermark).
    pub last_accepted: Option<u64>,
}

impl TotpProfile {
    /// Create a profile with no verification history.
    ///
    /// # Errors
    /// Returns `ProvisionError::Secret` if `secret_base32` is not base32.
    pub fn new(
        label: &str,
        issuer: Option<&str>,
        secret_base32: &str,
        config: TotpConfig,
    ) -> Result<Self, ProvisionError> {
        decode_base32(secret_base32)?;
        Ok(Self {
            label: label.to_owned(),
            issuer: issuer.map(str::to_owned),
            secret: normalize(secret_base32).to_string(),
            config,
            leeway: None,
            last_accepted: None,
        })
    }

    /// Set the verification tolerance.
    ///
    /// # Errors
    /// Returns `ProvisionError::Otp` if `leeway` is not below the period.
    pub fn with_leeway(mut self, leeway: u64) -> Result<Self, ProvisionError> {
        if leeway >= u64::from(self.config.period()) {
            return Err(OtpError::InvalidInput(format!(
                "leeway ({leeway}s) must be lower than the period ({}s)",
                self.config.period()
            ))
            .into());
        }
        self.leeway = Some(leeway);
        Ok(self)
    }

    /// Secret in canonical base32.
    #[must_use]
    pub fn secret_base32(&self) -> &str {
        &self.secret
    }

    /// Build a [`Totp`] for this profile driven by `clock`.
    ///
    /// # Errors
    /// Secret decoding failures and [`Totp::new`] errors.
    pub fn totp<C: Clock>(&self, clock: C) -> Result<Totp<C>, ProvisionError> {
        Ok(Totp::new(decode_base32(&self.secret)?, self.config, clock)?)
    }

    /// Provisioning URI for enrolling this profile in an authenticator app.
    ///
    /// # Errors
    /// Returns `ProvisionError::Uri` if the label cannot appear in a URI.
    pub fn provisioning_uri(&self) -> Result<ProvisioningUri, ProvisionError> {
        let secret = decode_base32(&self.secret)?;
        ProvisioningUri::new(
            &self.label,
            self.issuer.as_deref(),
            secret.expose_secret(),
            self.config,
        )
    }

    /// Verify `otp` at the clock's current time using the stored leeway
    /// and watermark, advancing the watermark on success.
    ///
    /// Returns the accepted timestamp. The profile is only modified when a
    /// code is accepted; persist it with [`Self::save`] before reporting
    /// success to the user.
    ///
    /// # Errors
    /// Same as [`Totp::verify_with_leeway`].
    pub fn verify_and_advance<C: Clock>(
        &mut self,
        otp: &str,
        clock: C,
    ) -> Result<Option<u64>, ProvisionError> {
        let totp = self.totp(clock)?;
        let accepted = totp.verify_with_leeway(otp, None, self.leeway, self.last_accepted)?;
        match accepted {
            Some(timestamp) => {
                tracing::info!(label = %self.label, timestamp, "TOTP code accepted");
                self.last_accepted = Some(timestamp);
            }
            None => tracing::info!(label = %self.label, "TOTP code rejected"),
        }
        Ok(accepted)
    }

    /// Load a profile from a JSON file.
    ///
    /// # Errors
    /// `ProvisionError::Io` if the file cannot be read,
    /// `ProvisionError::Serialization` if it is not a valid profile
    /// (malformed JSON, bad secret, leeway not below the period).
    pub fn load(path: &Path) -> Result<Self, ProvisionError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist the profile as JSON.
    ///
    /// Uses an atomic write pattern (write to a sibling `.tmp`, then
    /// rename) so a crash never leaves a truncated profile behind.
    ///
    /// # Errors
    /// `ProvisionError::Io` if the file system rejects the write/rename.
    pub fn save(&self, path: &Path) -> Result<(), ProvisionError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        fs::write(&tmp, json)?;

        // The file holds a shared secret: owner-only on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "profile saved");
        Ok(())
    }
}

/// Unvalidated shadow of [`TotpProfile`] used during deserialization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTotpProfile {
    label: String,
    #[serde(default)]
    issuer: Option<String>,
    secret: String,
    #[serde(default)]
    config: TotpConfig,
    #[serde(default)]
    leeway: Option<u64>,
    #[serde(default)]
    last_accepted: Option<u64>,
}

impl TryFrom<RawTotpProfile> for TotpProfile {
    type Error = ProvisionError;

    fn try_from(raw: RawTotpProfile) -> Result<Self, Self::Error> {
        let mut profile = Self::new(&raw.label, raw.issuer.as_deref(), &raw.secret, raw.config)?;
        if let Some(leeway) = raw.leeway {
            profile = profile.with_leeway(leeway)?;
        }
        profile.last_accepted = raw.last_accepted;
        Ok(profile)
    }
}

impl fmt::Debug for TotpProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotpProfile")
            .field("label", &self.label)
            .field("issuer", &self.issuer)
            .field("secret", &"***")
            .field("config", &self.config)
            .field("leeway", &self.leeway)
            .field("last_accepted", &self.last_accepted)
            .finish()
    }
}

impl TryFrom<&ProvisioningUri> for TotpProfile {
    type Error = ProvisionError;

    fn try_from(uri: &ProvisioningUri) -> Result<Self, Self::Error> {
        Self::new(uri.label(), uri.issuer(), uri.secret_base32(), *uri.config())
    }
}
