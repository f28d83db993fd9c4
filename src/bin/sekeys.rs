use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing::{debug, warn};

use enclave_keys::model::TokenScope;
use enclave_keys::{EnclaveConfig, SecureEnclave, SoftwareKeychain, TerminalAuthenticator};

#[derive(Parser, Debug)]
#[command(name = "sekeys")]
#[command(about = "Secure element key pairs with biometric-gated decryption", version)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Directory holding the software keychain. Keys live in memory for
    /// this invocation only if not given
    #[arg(long, env = "SEKEYS_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Use regular keychain items instead of the secure element scope
    #[arg(long, global = true)]
    pub keychain: bool,

    /// Fail a decryption if the prompt is not answered within SECS seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub auth_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report whether biometric authentication is available
    Supported,

    /// Create a key pair and print its public key as hex
    Create { tag: String },

    /// Print the public key of an existing key pair as hex
    Find { tag: String },

    /// Delete a key pair; prints whether one was removed
    Delete { tag: String },

    /// Encrypt data from stdin, print the ciphertext as hex
    Encrypt { tag: String },

    /// Decrypt hex ciphertext after confirmation, write the plaintext to stdout
    Decrypt {
        tag: String,

        /// Ciphertext produced by `encrypt`
        #[arg(long)]
        hex: String,

        /// Message shown when asking for confirmation
        #[arg(long)]
        prompt: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> EnclaveConfig {
        let token = if self.keychain {
            TokenScope::Keychain
        } else {
            TokenScope::SecureEnclave
        };
        let mut config = EnclaveConfig::default().with_token(token);
        if let Some(secs) = self.auth_timeout {
            config = config.with_auth_timeout(Duration::from_secs(secs));
        }
        config
    }

    fn keychain(&self) -> anyhow::Result<SoftwareKeychain> {
        match &self.store {
            Some(dir) => SoftwareKeychain::open(dir)
                .with_context(|| format!("failed to open key store at {}", dir.display())),
            None => {
                warn!("No --store given, keys will not outlive this command");
                Ok(SoftwareKeychain::in_memory())
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.tracing_level_filter())
        .with_writer(io::stderr)
        .init();

    let config = cli.config();
    debug!("Using {:?}", config);
    let enclave = SecureEnclave::software(cli.keychain()?, TerminalAuthenticator::new(), config)
        .context("failed to start secure enclave")?;

    match cli.command {
        Commands::Supported => {
            println!("{}", enclave.is_supported());
        }
        Commands::Create { tag } => {
            let public_key = enclave
                .create_key_pair(&tag)
                .wait()
                .context("failed to create key pair")?;
            println!("{}", public_key.to_hex());
        }
        Commands::Find { tag } => {
            let found = enclave
                .find_key_pair(&tag)
                .wait()
                .context("failed to look up key pair")?;
            match found {
                Some(public_key) => println!("{}", public_key.to_hex()),
                None => {
                    eprintln!("No key pair tagged {}", tag);
                    std::process::exit(1);
                }
            }
        }
        Commands::Delete { tag } => {
            let removed = enclave
                .delete_key_pair(&tag)
                .wait()
                .context("failed to delete key pair")?;
            println!("{}", removed);
        }
        Commands::Encrypt { tag } => {
            let mut data = Vec::new();
            io::stdin().read_to_end(&mut data)?;
            let ciphertext = enclave
                .encrypt(&tag, &data)
                .wait()
                .context("failed to encrypt")?;
            println!("{}", ciphertext.to_hex());
        }
        Commands::Decrypt {
            tag,
            hex: encoded,
            prompt,
        } => {
            let ciphertext = hex::decode(encoded.trim()).context("ciphertext is not valid hex")?;
            let prompt = prompt.unwrap_or_else(|| format!("Decrypt data with key {}?", tag));
            let plaintext = enclave
                .decrypt(&tag, &ciphertext, &prompt)
                .wait()
                .context("failed to decrypt")?;
            io::stdout().write_all(plaintext.as_bytes())?;
        }
    }

    Ok(())
}
