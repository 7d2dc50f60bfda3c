//! `secrets show` — decrypt and print the secrets file.

use zeroize::Zeroize;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (_, store) = open_store(cli)?;

    if !store.is_initialized() {
        output::info("No encrypted secrets yet.");
        output::tip("Run `secrets setup` to create them.");
        return Ok(());
    }

    let mut content = store.read()?;
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    content.zeroize();

    Ok(())
}
