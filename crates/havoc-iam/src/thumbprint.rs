// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OIDC provider certificate thumbprint.
//!
//! AWS identifies a federated OIDC provider by the SHA-1 digest of its leaf
//! TLS certificate in DER form, hex-encoded and upper-cased. The dial
//! deliberately skips certificate verification: the digest of whatever
//! certificate the host presents IS the value being computed.

use std::sync::Arc;

use async_trait::async_trait;
use rustls::client::danger::{
	HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::{DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use sha1::{Digest, Sha1};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;
use url::Url;

use crate::error::IamError;

/// Source of provider thumbprints; a seam so orchestration tests do not dial
/// out.
#[async_trait]
pub trait ThumbprintSource: Send + Sync {
	async fn thumbprint(&self, provider_url: &str) -> Result<String, IamError>;
}

/// Production source: TLS dial to the provider host on port 443.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsThumbprintSource;

#[async_trait]
impl ThumbprintSource for TlsThumbprintSource {
	async fn thumbprint(&self, provider_url: &str) -> Result<String, IamError> {
		oidc_thumbprint(provider_url).await
	}
}

/// Computes the provider thumbprint by dialing `host:443`.
pub async fn oidc_thumbprint(provider_url: &str) -> Result<String, IamError> {
	let err = |message: String| IamError::Thumbprint {
		url: provider_url.to_string(),
		message,
	};

	let parsed = Url::parse(provider_url).map_err(|e| err(e.to_string()))?;
	let host = parsed
		.host_str()
		.ok_or_else(|| err("URL has no host".to_string()))?
		.to_string();
	let port = parsed.port().unwrap_or(443);

	let config = rustls::ClientConfig::builder()
		.dangerous()
		.with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
		.with_no_client_auth();
	let connector = TlsConnector::from(Arc::new(config));

	let tcp = TcpStream::connect((host.as_str(), port))
		.await
		.map_err(|e| err(e.to_string()))?;
	let server_name = ServerName::try_from(host.clone()).map_err(|e| err(e.to_string()))?;
	let tls = connector
		.connect(server_name, tcp)
		.await
		.map_err(|e| err(e.to_string()))?;

	let (_, connection) = tls.get_ref();
	let leaf = connection
		.peer_certificates()
		.and_then(|certs| certs.first())
		.ok_or_else(|| err("peer presented no certificate".to_string()))?;

	let digest = fingerprint(leaf.as_ref());
	debug!(url = provider_url, "computed provider thumbprint");
	Ok(digest)
}

/// SHA-1 over the DER bytes, upper-case hex.
fn fingerprint(der: &[u8]) -> String {
	hex::encode_upper(Sha1::digest(der))
}

/// Verifier that accepts any certificate. Only used for the thumbprint dial.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
	fn verify_server_cert(
		&self,
		_end_entity: &CertificateDer<'_>,
		_intermediates: &[CertificateDer<'_>],
		_server_name: &ServerName<'_>,
		_ocsp_response: &[u8],
		_now: UnixTime,
	) -> Result<ServerCertVerified, rustls::Error> {
		Ok(ServerCertVerified::assertion())
	}

	fn verify_tls12_signature(
		&self,
		_message: &[u8],
		_cert: &CertificateDer<'_>,
		_dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, rustls::Error> {
		Ok(HandshakeSignatureValid::assertion())
	}

	fn verify_tls13_signature(
		&self,
		_message: &[u8],
		_cert: &CertificateDer<'_>,
		_dss: &DigitallySignedStruct,
	) -> Result<HandshakeSignatureValid, rustls::Error> {
		Ok(HandshakeSignatureValid::assertion())
	}

	fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
		vec![
			SignatureScheme::RSA_PKCS1_SHA256,
			SignatureScheme::RSA_PKCS1_SHA384,
			SignatureScheme::RSA_PKCS1_SHA512,
			SignatureScheme::RSA_PSS_SHA256,
			SignatureScheme::RSA_PSS_SHA384,
			SignatureScheme::RSA_PSS_SHA512,
			SignatureScheme::ECDSA_NISTP256_SHA256,
			SignatureScheme::ECDSA_NISTP384_SHA384,
			SignatureScheme::ECDSA_NISTP521_SHA512,
			SignatureScheme::ED25519,
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fingerprint_is_uppercase_sha1_hex() {
		// SHA-1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
		let got = fingerprint(b"abc");
		assert_eq!(got, "A9993E364706816ABA3E25717850C26C9CD0D89D");
		assert_eq!(got.len(), 40);
	}

	#[tokio::test]
	async fn unparseable_url_fails_with_thumbprint_error() {
		let err = oidc_thumbprint("not a url").await.unwrap_err();
		match err {
			IamError::Thumbprint { url, .. } => assert_eq!(url, "not a url"),
			other => panic!("unexpected error: {other}"),
		}
	}
}
