// ── rustls configuration ──
//
// Devices present self-signed certificates, so the default client
// verifier accepts any chain while still checking handshake signatures.

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, ServerConfig, SignatureScheme};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio_rustls::TlsAcceptor;

use super::TlsMode;
use crate::error::Error;

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Build the client-side rustls config for the given trust mode.
pub(crate) fn client_config(mode: &TlsMode) -> Result<Arc<ClientConfig>, Error> {
    let provider = provider();
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("unsupported protocol versions: {e}")))?;

    let config = match mode {
        TlsMode::CustomCa(path) => {
            let pem = read_pem(path, "CA certificate")?;
            let mut roots = RootCertStore::empty();
            for cert in parse_certificates(&pem)? {
                roots
                    .add(cert)
                    .map_err(|e| Error::Tls(format!("failed to add CA certificate: {e}")))?;
            }
            builder.with_root_certificates(roots).with_no_client_auth()
        }
        TlsMode::DangerAcceptInvalid => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert(provider)))
            .with_no_client_auth(),
    };
    Ok(Arc::new(config))
}

/// Build the server-side config from PEM files.
///
/// `key_path` may point at the certificate file when both live in one PEM.
pub fn load_server_config(cert_path: &Path, key_path: &Path) -> Result<Arc<ServerConfig>, Error> {
    let certs = parse_certificates(&read_pem(cert_path, "certificate")?)?;
    if certs.is_empty() {
        return Err(Error::Tls(format!(
            "no certificates found in {}",
            cert_path.display()
        )));
    }
    let key = PrivateKeyDer::from_pem_slice(&read_pem(key_path, "private key")?)
        .map_err(|e| Error::Tls(format!("failed to parse private key: {e}")))?;

    let config = ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(format!("unsupported protocol versions: {e}")))?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| Error::Tls(format!("server config error: {e}")))?;
    Ok(Arc::new(config))
}

/// Convenience wrapper returning a ready acceptor.
pub fn server_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, Error> {
    load_server_config(cert_path, key_path).map(TlsAcceptor::from)
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, Error> {
    std::fs::read(path)
        .map_err(|e| Error::Tls(format!("failed to read {what} {}: {e}", path.display())))
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, Error> {
    CertificateDer::pem_slice_iter(pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::Tls(format!("failed to parse certificates: {e}")))
}

// ── Verifier ─────────────────────────────────────────────────────────

#[derive(Debug)]
struct AcceptAnyServerCert(Arc<CryptoProvider>);

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
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accept_any_builds() {
        assert!(client_config(&TlsMode::DangerAcceptInvalid).is_ok());
    }

    #[test]
    fn missing_ca_file_is_tls_error() {
        let err = client_config(&TlsMode::CustomCa("/nonexistent/ca.pem".into())).unwrap_err();
        assert!(matches!(err, Error::Tls(msg) if msg.contains("CA certificate")));
    }

    #[test]
    fn server_config_without_certificate_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a pem file").unwrap();
        let err = load_server_config(file.path(), file.path()).unwrap_err();
        assert!(matches!(err, Error::Tls(msg) if msg.contains("no certificates")));
    }
}
