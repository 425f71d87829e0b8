//! `otpauth://totp/` provisioning URIs (Google Authenticator key URI format).
//!
//! ```text
//! otpauth://totp/ACME%20Co:alice%40example.com?secret=JBSWY3DPEHPK3PXP&issuer=ACME%20Co&algorithm=SHA1&digits=6&period=30
//! ```
//!
//! Built from a label, an optional issuer, the base32 secret, and the
//! resolved [`TotpConfig`] parameters. Parsing accepts URIs exported by
//! other authenticators and rejects anything the engine cannot honor.

use std::fmt;
use std::fmt::Write as _;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sablier_core::{Clock, OtpAlgorithm, OtpDigits, Totp, TotpConfig, DEFAULT_PERIOD};
use secrecy::SecretSlice;

use crate::secret::{decode_base32, encode_base32, normalize};
use crate::ProvisionError;

const TOTP_PREFIX: &str = "otpauth://totp/";
const HOTP_PREFIX: &str = "otpauth://hotp/";

/// Everything outside the RFC 3986 unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A TOTP account as exchanged through a QR code.
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisioningUri {
    label: String,
    issuer: Option<String>,
    secret: String,
    config: TotpConfig,
}

impl ProvisioningUri {
    /// Describe an account.
    ///
    /// # Errors
    /// Returns `ProvisionError::Uri` if `label` is empty or either `label`
    /// or `issuer` contains a colon (the label/issuer separator).
    pub fn new(
        label: &str,
        issuer: Option<&str>,
        secret: &[u8],
        config: TotpConfig,
    ) -> Result<Self, ProvisionError> {
        if secret.is_empty() {
            return Err(ProvisionError::Secret("secret must not be empty".to_owned()));
        }
        Self::from_parts(label, issuer, encode_base32(secret), config)
    }

    fn from_parts(
        label: &str,
        issuer: Option<&str>,
        secret: String,
        config: TotpConfig,
    ) -> Result<Self, ProvisionError> {
        if label.trim().is_empty() {
            return Err(ProvisionError::Uri("label must not be empty".to_owned()));
        }
        if label.contains(':') {
            return Err(ProvisionError::Uri(format!(
                "label must not contain ':' (got {label:?})"
            )));
        }
        if issuer.is_some_and(|i| i.contains(':')) {
            return Err(ProvisionError::Uri("issuer must not contain ':'".to_owned()));
        }
        Ok(Self {
            label: label.to_owned(),
            issuer: issuer.filter(|i| !i.is_empty()).map(str::to_owned),
            secret,
            config,
        })
    }

    /// Account name shown by authenticator apps.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Service name, from the `issuer` parameter or the label prefix.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Secret in canonical base32.
    #[must_use]
    pub fn secret_base32(&self) -> &str {
        &self.secret
    }

    /// Generation parameters carried by the URI.
    #[must_use]
    pub const fn config(&self) -> &TotpConfig {
        &self.config
    }

    /// Decode the secret bytes.
    ///
    /// # Errors
    /// Returns `ProvisionError::Secret` if the stored secret is not base32.
    pub fn secret(&self) -> Result<SecretSlice<u8>, ProvisionError> {
        decode_base32(&self.secret)
    }

    /// Build a [`Totp`] for this account driven by `clock`.
    ///
    /// # Errors
    /// Secret decoding failures and [`Totp::new`] errors.
    pub fn to_totp<C: Clock>(&self, clock: C) -> Result<Totp<C>, ProvisionError> {
        Ok(Totp::new(self.secret()?, self.config, clock)?)
    }

    /// Render the `otpauth://totp/` URI.
    #[must_use]
    pub fn to_uri(&self) -> String {
        let mut uri = String::from(TOTP_PREFIX);
        if let Some(issuer) = &self.issuer {
            uri.push_str(&percent_encode(issuer));
            uri.push(':');
        }
        uri.push_str(&percent_encode(&self.label));

        let _ = write!(uri, "?secret={}", self.secret);
        if let Some(issuer) = &self.issuer {
            let _ = write!(uri, "&issuer={}", percent_encode(issuer));
        }
        for (key, value) in self.config.parameters() {
            let _ = write!(uri, "&{key}={value}");
        }
        uri
    }

    /// Parse an `otpauth://totp/` URI.
    ///
    /// Unknown query parameters (`image`, `color`, ...) are ignored. An
    /// explicit `issuer` parameter wins over the label prefix.
    ///
    /// # Errors
    /// Returns `ProvisionError::Uri` for other schemes or types, a missing
    /// secret, or unparsable parameters, and `ProvisionError::Otp` for
    /// parameters the engine rejects (zero period, unsupported digits).
    pub fn parse(uri: &str) -> Result<Self, ProvisionError> {
        let rest = uri.strip_prefix(TOTP_PREFIX).ok_or_else(|| {
            if uri.starts_with(HOTP_PREFIX) {
                ProvisionError::Uri("counter-based (hotp) URIs are not supported".to_owned())
            } else {
                ProvisionError::Uri(format!("expected URI starting with '{TOTP_PREFIX}'"))
            }
        })?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let path = percent_decode(path)?;
        let (label_issuer, label) = match path.split_once(':') {
            Some((issuer, label)) => (Some(issuer.trim()), label.trim()),
            None => (None, path.trim()),
        };

        let mut secret = None;
        let mut issuer = None;
        let mut algorithm = OtpAlgorithm::default();
        let mut digits = OtpDigits::default();
        let mut period = DEFAULT_PERIOD;
        let mut epoch = 0u64;

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_query_value(value)?;
            match key.to_ascii_lowercase().as_str() {
                "secret" => secret = Some(normalize(&value).to_string()),
                "issuer" => issuer = Some(value),
                "algorithm" => algorithm = value.parse()?,
                "digits" => digits = OtpDigits::try_from(parse_number::<u8>("digits", &value)?)?,
                "period" => period = parse_number("period", &value)?,
                "epoch" => epoch = parse_number("epoch", &value)?,
                other => tracing::debug!(parameter = other, "ignoring unknown otpauth parameter"),
            }
        }

        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProvisionError::Uri("missing secret parameter".to_owned()))?;
        // Validate the alphabet now rather than on first use.
        decode_base32(&secret)?;

        let config = TotpConfig::new(period, epoch, digits, algorithm)?;
        let issuer = issuer.as_deref().or(label_issuer);
        Self::from_parts(label, issuer, secret, config)
    }
}

impl fmt::Display for ProvisioningUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl fmt::Debug for ProvisioningUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningUri")
            .field("label", &self.label)
            .field("issuer", &self.issuer)
            .field("secret", &"***")
            .field("config", &self.config)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ProvisionError> {
    value
        .parse()
        .map_err(|_| ProvisionError::Uri(format!("invalid {name} parameter: {value:?}")))
}

fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Decode `%XX` escapes. A `+` is a literal here; only query values
/// treat it as a space.
fn percent_decode(input: &str) -> Result<String, ProvisionError> {
    percent_decode_str(input)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ProvisionError::Uri(format!("invalid UTF-8 in URI component: {e}")))
}

fn decode_query_value(input: &str) -> Result<String, ProvisionError> {
    percent_decode(&input.replace('+', " "))
}
