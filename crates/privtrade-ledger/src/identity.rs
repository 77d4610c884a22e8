//! Client identity as exposed by the identity subsystem.
//!
//! The contract only ever sees the base64 identity blob, the MSP id, and
//! attribute assertions. [`X509Identity`] produces the blob in the same
//! `x509::<subject DN>::<issuer DN>` layout the certificate subsystem uses.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use privtrade_types::{OrgId, Result};

/// The authenticated submitter of a proposal.
pub trait ClientIdentity {
    /// Base64-encoded `x509::<subject>::<issuer>` identity string.
    fn id(&self) -> Result<String>;

    /// Organization the client belongs to.
    fn msp_id(&self) -> Result<OrgId>;

    /// Value of a certificate attribute, if present.
    fn attribute_value(&self, name: &str) -> Option<String>;

    /// Whether attribute `name` is present with exactly `expected`.
    fn assert_attribute_value(&self, name: &str, expected: &str) -> bool {
        self.attribute_value(name).as_deref() == Some(expected)
    }
}

/// An enrolled x509 client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Identity {
    encoded_id: String,
    msp_id: OrgId,
    attributes: BTreeMap<String, String>,
}

impl X509Identity {
    /// Client with common name `cn` enrolled by `org`'s CA.
    #[must_use]
    pub fn new(cn: &str, org: &str) -> Self {
        let domain = org.trim_end_matches("MSP").to_lowercase();
        let subject = format!("CN={cn},OU={domain}+OU=client+OU=department1");
        let issuer = format!("CN=ca.{domain}.example.com,O={domain}.example.com,C=US");
        Self::from_dns(&subject, &issuer, org)
    }

    /// Client with explicit subject and issuer distinguished names.
    #[must_use]
    pub fn from_dns(subject: &str, issuer: &str, org: &str) -> Self {
        Self::from_encoded(STANDARD.encode(format!("x509::{subject}::{issuer}")), org)
    }

    /// Client whose identity blob is taken verbatim.
    #[must_use]
    pub fn from_encoded(encoded_id: impl Into<String>, org: &str) -> Self {
        Self {
            encoded_id: encoded_id.into(),
            msp_id: OrgId::new(org),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Client carrying `farmer=true`.
    #[must_use]
    pub fn farmer(cn: &str, org: &str) -> Self {
        Self::new(cn, org).with_attribute("farmer", "true")
    }

    /// Client carrying `retailer=true`.
    #[must_use]
    pub fn retailer(cn: &str, org: &str) -> Self {
        Self::new(cn, org).with_attribute("retailer", "true")
    }
}

impl ClientIdentity for X509Identity {
    fn id(&self) -> Result<String> {
        Ok(self.encoded_id.clone())
    }

    fn msp_id(&self) -> Result<OrgId> {
        Ok(self.msp_id.clone())
    }

    fn attribute_value(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}
