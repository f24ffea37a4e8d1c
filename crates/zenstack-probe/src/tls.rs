use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;
use zenstack_common::types::{ProbeErrorKind, TlsObservation};

/// Accepts any presented chain so that expired or mismatched certificates
/// still produce an observation. Lifecycle classification happens in the
/// state engine, not here.
#[derive(Debug)]
struct AcceptAnyServerCert(Arc<rustls::crypto::CryptoProvider>);

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
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn client_config() -> ClientConfig {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
        .with_no_client_auth()
}

/// Dial `domain:443`, complete a TLS handshake, and read the leaf
/// certificate's validity end and issuer organization.
///
/// The whole operation is bounded by `timeout`; every failure comes back
/// as an unreachable observation with a classified error kind.
pub async fn probe_tls(domain: &str, timeout: Duration) -> TlsObservation {
    let addr = format!("{domain}:443");

    // Resolve first so DNS failures are distinguishable from TCP ones.
    let lookup = tokio::time::timeout(timeout, tokio::net::lookup_host(&addr)).await;
    let mut addrs = match lookup {
        Ok(Ok(addrs)) => addrs.peekable(),
        Ok(Err(e)) => {
            tracing::debug!(domain, error = %e, "DNS resolution failed");
            return TlsObservation::unreachable(domain, ProbeErrorKind::Dns);
        }
        Err(_) => return TlsObservation::unreachable(domain, ProbeErrorKind::Timeout),
    };
    if addrs.peek().is_none() {
        return TlsObservation::unreachable(domain, ProbeErrorKind::Dns);
    }

    let tcp = match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::debug!(domain, error = %e, "TCP connect failed");
            return TlsObservation::unreachable(domain, ProbeErrorKind::Tcp);
        }
        Err(_) => return TlsObservation::unreachable(domain, ProbeErrorKind::Timeout),
    };

    let server_name = match ServerName::try_from(domain.to_string()) {
        Ok(name) => name,
        Err(_) => return TlsObservation::unreachable(domain, ProbeErrorKind::Dns),
    };

    let connector = TlsConnector::from(Arc::new(client_config()));
    let tls_stream = match tokio::time::timeout(timeout, connector.connect(server_name, tcp)).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::debug!(domain, error = %e, "TLS handshake failed");
            return TlsObservation::unreachable(domain, ProbeErrorKind::Tls);
        }
        Err(_) => return TlsObservation::unreachable(domain, ProbeErrorKind::Timeout),
    };

    let (_io, conn) = tls_stream.into_inner();
    let certs = match conn.peer_certificates() {
        Some(certs) if !certs.is_empty() => certs,
        _ => return TlsObservation::unreachable(domain, ProbeErrorKind::Tls),
    };

    // Leaf certificate is index 0 of the peer chain.
    let leaf_der = &certs[0];
    let (_, cert) = match X509Certificate::from_der(leaf_der.as_ref()) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(domain, error = %e, "X.509 parse failed");
            return TlsObservation::unreachable(domain, ProbeErrorKind::Tls);
        }
    };

    let not_after_time = cert.validity().not_after.to_datetime();
    let not_after: Option<DateTime<Utc>> =
        DateTime::from_timestamp(not_after_time.unix_timestamp(), 0);

    let issuer_org = cert
        .issuer()
        .iter_organization()
        .next()
        .and_then(|o| o.as_str().ok())
        .map(|s| s.to_string());

    TlsObservation {
        domain: domain.to_string(),
        reachable: true,
        not_after,
        issuer_org,
        error: None,
    }
}
