//! Remote shared document CLI commands.

use clap::{Args, Subcommand};

use shoplist::import::ImportMode;
use shoplist::sync::DocumentMeta;
use shoplist::Stores;

use super::share_cmd::{share_payload, ShareSubcommand};
use super::{remote_engine, truncate};
use crate::config::Config;

#[derive(Args)]
pub struct SharedCommand {
    #[command(subcommand)]
    pub command: SharedSubcommand,
}

#[derive(Subcommand)]
pub enum SharedSubcommand {
    /// Publish an entity as a shared document
    Publish {
        #[command(subcommand)]
        what: ShareSubcommand,

        /// Grant read access to this email
        #[arg(long, short, global = true)]
        email: Option<String>,
    },

    /// Documents you shared
    Owned,

    /// Documents shared with you
    Received,

    /// Show who has access to a document
    Grants {
        /// Document ID
        id: String,
    },

    /// Grant read access to a document
    Grant {
        /// Document ID
        id: String,

        /// Recipient email
        email: String,
    },

    /// Revoke an access grant
    Revoke {
        /// Document ID
        id: String,

        /// Grant ID (see `grants`)
        grant_id: String,
    },

    /// Delete a document for everyone
    Delete {
        /// Document ID
        id: String,
    },

    /// Import a shared document
    Import {
        /// Document ID
        id: String,

        /// new, overwrite or merge (by name)
        #[arg(long, short, default_value = "new")]
        mode: ImportMode,
    },
}

impl SharedCommand {
    pub async fn run(&self, stores: &Stores, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (engine, token) = remote_engine(config, stores)?;
        match &self.command {
            SharedSubcommand::Publish { what, email } => {
                let payload = share_payload(stores, what)?;
                let id = engine.publish(&token, &payload, email.as_deref()).await?;
                println!("Published {} as {}", payload.kind(), id);
                if let Some(email) = email {
                    println!("Shared with {}", email.trim());
                }
                Ok(())
            }

            SharedSubcommand::Owned => {
                print_documents(&engine.owned(&token).await?);
                Ok(())
            }

            SharedSubcommand::Received => {
                print_documents(&engine.received(&token).await?);
                Ok(())
            }

            SharedSubcommand::Grants { id } => {
                let grants = engine.grants(&token, id).await?;
                if grants.is_empty() {
                    println!("Not shared with anyone");
                }
                for grant in &grants {
                    let name = grant.display_name.as_deref().unwrap_or("");
                    println!("{:<24}  {:<32}  {}  {}", grant.id, grant.email, grant.role, name);
                }
                Ok(())
            }

            SharedSubcommand::Grant { id, email } => {
                engine.grant(&token, id, email).await?;
                println!("Granted {} read access", email.trim());
                Ok(())
            }

            SharedSubcommand::Revoke { id, grant_id } => {
                engine.revoke(&token, id, grant_id).await?;
                println!("Revoked grant {}", grant_id);
                Ok(())
            }

            SharedSubcommand::Delete { id } => {
                engine.delete_shared(&token, id).await?;
                println!("Deleted shared document {}", id);
                Ok(())
            }

            SharedSubcommand::Import { id, mode } => {
                let outcome = engine.import_shared(&token, id, *mode).await?;
                println!("{}", outcome);
                Ok(())
            }
        }
    }
}

fn print_documents(documents: &[DocumentMeta]) {
    if documents.is_empty() {
        println!("No shared documents");
        return;
    }
    println!("{:<24}  {:<12}  {:<30}  OWNER", "ID", "TYPE", "NAME");
    println!("{}", "-".repeat(90));
    for doc in documents {
        println!(
            "{:<24}  {:<12}  {:<30}  {}",
            doc.id,
            doc.doc_type.as_deref().unwrap_or("-"),
            truncate(&doc.name, 30),
            doc.owner.as_deref().unwrap_or("")
        );
    }
}
