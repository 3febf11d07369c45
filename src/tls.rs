//! TLS material loading.
//!
//! The gateway terminates mutual TLS: it presents `server.crt`/`server.key`
//! and requires client certificates signed by the shared `ca.crt`. The client
//! presents `client.crt`/`client.key` and pins the same CA. Certificate
//! generation itself is provisioned outside this repo.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};

use crate::config::TlsConfig;

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .with_context(|| format!("cannot open certificate file {}", path.display()))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("cannot parse certificates in {}", path.display()))?;
    if certs.is_empty() {
        return Err(anyhow!("no certificates found in {}", path.display()));
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file =
        File::open(path).with_context(|| format!("cannot open key file {}", path.display()))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .with_context(|| format!("cannot parse private key in {}", path.display()))?
        .ok_or_else(|| anyhow!("no private key found in {}", path.display()))
}

/// Build the gateway's mutual-TLS server config: server cert/key plus a
/// client verifier rooted at the shared CA. A handshake without a CA-signed
/// client certificate is rejected before any request is dispatched.
pub fn server_config(tls: &TlsConfig) -> Result<ServerConfig> {
    let certs = load_certs(&tls.server_cert())?;
    let key = load_private_key(&tls.server_key())?;

    let mut roots = RootCertStore::empty();
    for cert in load_certs(&tls.ca_cert())? {
        roots
            .add(cert)
            .context("failed to add CA certificate to root store")?;
    }

    let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .context("failed to build client certificate verifier")?;

    ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)
        .context("invalid server certificate/key pair")
}

/// PEM material for the client side of the mutual-TLS connection: the
/// identity bundle (certificate followed by key) and the CA certificate.
pub struct ClientTlsMaterial {
    pub identity_pem: Vec<u8>,
    pub ca_pem: Vec<u8>,
}

pub fn client_material(tls: &TlsConfig) -> Result<ClientTlsMaterial> {
    let cert_path = tls.client_cert();
    let key_path = tls.client_key();

    let mut identity_pem = std::fs::read(&cert_path)
        .with_context(|| format!("cannot read {}", cert_path.display()))?;
    identity_pem.push(b'\n');
    identity_pem.extend(
        std::fs::read(&key_path).with_context(|| format!("cannot read {}", key_path.display()))?,
    );

    let ca_path = tls.ca_cert();
    let ca_pem =
        std::fs::read(&ca_path).with_context(|| format!("cannot read {}", ca_path.display()))?;

    Ok(ClientTlsMaterial {
        identity_pem,
        ca_pem,
    })
}
