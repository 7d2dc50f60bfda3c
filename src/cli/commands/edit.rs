//! `secrets edit` — open the decrypted secrets in `$EDITOR`.
//!
//! Decrypts to a temp file next to the encrypted file, waits for the
//! editor to exit, then re-encrypts the temp file over the store.

use crate::cli::commands::setup;
use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{Result, SecretsError};
use crate::vault::{EditOutcome, ExternalEditor};

/// Execute the `edit` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (settings, store) = open_store(cli)?;
    let envelope_name = format!("{}{}", settings.file, settings.extname);

    let editor = match ExternalEditor::from_env() {
        Ok(editor) => editor,
        Err(SecretsError::EditorNotConfigured) => {
            print_editor_guidance();
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    // Set up here rather than inside the session so the new key is shown
    // before the editor takes over the terminal.
    if !store.is_initialized() {
        setup::report(&settings, &store.initialize()?);
        println!();
    }

    let report = store.edit_with(&editor)?;
    match report.outcome {
        EditOutcome::Saved => {
            output::success(&format!("Encrypted changes saved to {envelope_name}"))
        }
        EditOutcome::Unchanged => output::info("No changes detected."),
    }
    Ok(())
}

fn print_editor_guidance() {
    output::warning("No $EDITOR to open decrypted secrets in. Assign one like this:");
    println!();
    println!("EDITOR=vi secrets edit");
    println!();
    println!("For editors that fork and exit immediately, it's important to pass a wait flag,");
    println!("otherwise the secrets will be saved immediately with no chance to edit.");
}
