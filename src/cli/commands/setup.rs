//! `secrets setup` — create the key file and the encrypted secrets file.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::config::Settings;
use crate::errors::Result;
use crate::vault::{InitOutcome, KeyOrigin};

/// Execute the `setup` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (settings, store) = open_store(cli)?;

    report(&settings, &store.initialize()?);
    output::tip("You can edit encrypted secrets with `secrets edit`.");

    Ok(())
}

/// Print what setup did.  Shared with `edit`, which sets up a fresh store.
pub(crate) fn report(settings: &Settings, outcome: &InitOutcome) {
    if let InitOutcome::Created {
        key_hex,
        key_origin,
        key_file_created,
        ignore_file_updated,
        placeholder,
    } = outcome
    {
        let key_name = settings.key_file_name();

        if *key_file_created {
            output::info(&format!(
                "Adding {key_name} to store the encryption key: {}",
                key_hex.as_str()
            ));
            println!();
            println!("Save this in a password manager your team can access.");
            println!();
            println!(
                "If you lose the key, no one, including you, can access anything encrypted with it."
            );
            println!();
            output::action("create", &key_name);
            println!();
        } else if *key_origin == KeyOrigin::Environment {
            output::info(&format!(
                "Using the key from ${}; no key file was written.",
                settings.env_key
            ));
        } else {
            output::info(&format!("Using the existing key in {key_name}."));
        }

        if *ignore_file_updated {
            output::info(&format!(
                "Ignoring {key_name} so it won't end up in Git history:"
            ));
            println!();
            output::action("append", &settings.git_ignore_file);
            println!();
        }

        output::info(&format!(
            "Adding {}{} to store secrets that need to be encrypted.",
            settings.file, settings.extname
        ));
        println!();
        println!("For now the file contains this but it's been encrypted with the key:");
        println!();
        println!("{}", placeholder.as_str());
    }

    output::success("Secrets has been setup.");
}
