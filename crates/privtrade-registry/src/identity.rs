//! Caller identity resolution.
//!
//! The identity blob is base64 of `x509::<subject DN>::<issuer DN>`. The
//! caller's name is the text between `x509::CN=` and the next `,`; a blob
//! without those markers resolves to an empty name, which every ownership
//! check treats as unauthorized.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use privtrade_ledger::{ClientIdentity, TxContext};
use privtrade_types::{Capabilities, OrgId, PrivtradeError, Result, constants};

/// Everything the contract needs to know about the submitter, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Common name; empty if the identity carried none.
    pub name: String,
    /// Decoded `x509::<subject>::<issuer>` string.
    pub dn: String,
    pub org: OrgId,
    pub capabilities: Capabilities,
}

impl Caller {
    /// Resolve the caller behind `client`.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::MalformedIdentity`] if the blob is not base64
    /// or not UTF-8.
    pub fn resolve(client: &dyn ClientIdentity) -> Result<Self> {
        let dn = resolve_caller_dn(client)?;
        Ok(Self {
            name: common_name(&dn).to_string(),
            dn,
            org: client.msp_id()?,
            capabilities: capabilities(client),
        })
    }

    /// The caller's name, refusing identities that resolved to nothing.
    ///
    /// # Errors
    /// Returns [`PrivtradeError::UnresolvableIdentity`] if the name is empty.
    pub fn require_name(&self) -> Result<&str> {
        if self.name.is_empty() {
            tracing::warn!(org = %self.org, "Caller identity carries no common name");
            return Err(PrivtradeError::UnresolvableIdentity);
        }
        Ok(&self.name)
    }
}

/// Common name of the caller, or `""` if the identity has no CN marker.
///
/// # Errors
/// Returns [`PrivtradeError::MalformedIdentity`] on undecodable identities.
pub fn resolve_caller_identity(client: &dyn ClientIdentity) -> Result<String> {
    let dn = decode_identity(&client.id()?)?;
    Ok(common_name(&dn).to_string())
}

/// Full decoded subject/issuer string of the caller.
///
/// # Errors
/// Returns [`PrivtradeError::MalformedIdentity`] on undecodable identities.
pub fn resolve_caller_dn(client: &dyn ClientIdentity) -> Result<String> {
    decode_identity(&client.id()?)
}

/// Farmer / retailer flags from the caller's certificate attributes.
#[must_use]
pub fn capabilities(client: &dyn ClientIdentity) -> Capabilities {
    Capabilities {
        is_farmer: client.assert_attribute_value(constants::FARMER_ATTRIBUTE, constants::ATTRIBUTE_TRUE),
        is_retailer: client
            .assert_attribute_value(constants::RETAILER_ATTRIBUTE, constants::ATTRIBUTE_TRUE),
    }
}

/// Refuse clients submitting through a peer of another organization.
///
/// Any operation that reads or writes the caller's own implicit collection
/// calls this first, so an org's private data is only touched on its own peers.
///
/// # Errors
/// Returns [`PrivtradeError::PeerOrgMismatch`] if the orgs differ.
pub fn verify_client_org_matches_peer_org(ctx: &TxContext<'_>) -> Result<()> {
    let client_org = ctx.client().msp_id()?;
    let peer_org = ctx.stub().peer_org();
    if &client_org != peer_org {
        tracing::warn!(client_org = %client_org, peer_org = %peer_org, "Client/peer org mismatch");
        return Err(PrivtradeError::PeerOrgMismatch {
            client_org,
            peer_org: peer_org.clone(),
        });
    }
    Ok(())
}

fn decode_identity(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| PrivtradeError::MalformedIdentity {
            reason: format!("identity is not base64: {e}"),
        })?;
    String::from_utf8(bytes).map_err(|e| PrivtradeError::MalformedIdentity {
        reason: format!("identity is not UTF-8: {e}"),
    })
}

/// Text between the CN marker and the next terminator after it.
fn common_name(dn: &str) -> &str {
    let Some(start) = dn.find(constants::X509_CN_MARKER) else {
        return "";
    };
    let rest = &dn[start + constants::X509_CN_MARKER.len()..];
    match rest.find(constants::X509_CN_TERMINATOR) {
        Some(end) => &rest[..end],
        None => "",
    }
}
