//! Operational entry points over the revocation database: CRL builds and
//! the record/revoke/restore admin commands. The HTTP transport embeds the
//! library directly and is deliberately not here.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ocspd::config::Config;
use ocspd::crl::{self, CrlParams, CrlVersion};
use ocspd::ocsp::CrlReason;
use ocspd::registry::{read_certificate_der, read_signing_key, ResponderEntry};
use ocspd::sign::SignatureHash;
use ocspd::store::{self, IndexFileStore, RevocationStore};

#[derive(Parser)]
#[command(name = "ocspd", about = "OCSP responder operational tooling", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and sign a CRL from the revocation database.
    Crl {
        #[arg(long)]
        config: PathBuf,
        /// Where the DER CertificateList is written.
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        number: u64,
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// Emit a v1 CRL without extensions.
        #[arg(long)]
        v1: bool,
        /// Override the configured signature hash (sha1 or sha256).
        #[arg(long)]
        hash: Option<String>,
    },
    /// Record a newly issued certificate as valid.
    Record {
        #[arg(long)]
        config: PathBuf,
        /// Serial number in hex.
        #[arg(long)]
        serial: String,
        /// Expiry as YYMMDDHHMMSSZ or YYYYMMDDHHMMSSZ.
        #[arg(long)]
        expires: String,
        #[arg(long, default_value = "unknown")]
        subject: String,
    },
    /// Mark a recorded certificate revoked.
    Revoke {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        serial: String,
        /// CRL reason name, e.g. keyCompromise.
        #[arg(long)]
        reason: Option<String>,
        /// Revocation instant, defaulting to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Return a revoked certificate to valid.
    Restore {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        serial: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Crl {
            config,
            out,
            number,
            days,
            v1,
            hash,
        } => {
            let config = Config::load(&config)?;
            let hash = match hash {
                Some(name) => SignatureHash::from_name(&name)
                    .ok_or_else(|| format!("'{name}' is not a recognised signature hash"))?,
                None => config.signature_hash()?,
            };

            let ca = ResponderEntry::new(
                &read_certificate_der(&config.responder_cert)?,
                read_signing_key(&config.responder_key)?,
                hash,
            )?;
            let store = IndexFileStore::new(&config.ca_database);
            let revoked = crl::revoked_from_store(&store.records()?)?;

            let params = CrlParams {
                number,
                version: if v1 { CrlVersion::V1 } else { CrlVersion::V2 },
                days,
                hash,
                this_update: Utc::now(),
            };
            let der = crl::build(&ca, &params, &revoked)?;
            std::fs::write(&out, &der)?;
            info!(
                out = %out.display(),
                entries = revoked.len(),
                number,
                "wrote CRL"
            );
        }
        Command::Record {
            config,
            serial,
            expires,
            subject,
        } => {
            let config = Config::load(&config)?;
            let expires = store::parse_db_time(&expires)?;
            IndexFileStore::new(&config.ca_database).record(&serial, expires, &subject)?;
            info!(serial = %serial.to_ascii_uppercase(), "recorded certificate");
        }
        Command::Revoke {
            config,
            serial,
            reason,
            at,
        } => {
            let config = Config::load(&config)?;
            if let Some(name) = reason.as_deref() {
                if CrlReason::from_name(name).is_none() {
                    return Err(format!("'{name}' is not a recognised revocation reason").into());
                }
            }
            let at = match at {
                Some(text) => store::parse_db_time(&text)?,
                None => Utc::now(),
            };
            IndexFileStore::new(&config.ca_database).revoke(&serial, at, reason.as_deref())?;
            info!(serial = %serial.to_ascii_uppercase(), "revoked certificate");
        }
        Command::Restore { config, serial } => {
            let config = Config::load(&config)?;
            IndexFileStore::new(&config.ca_database).restore(&serial)?;
            info!(serial = %serial.to_ascii_uppercase(), "restored certificate");
        }
    }
    Ok(())
}
