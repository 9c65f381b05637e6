//! `rdnsx sponsors`: an inert stub. The real command fetches and renders a
//! sponsor list from a remote service; that network call is out of scope
//! here, so this only prints the static portion of the message.

use anyhow::Result;

pub fn run() -> Result<()> {
    println!("Show the very kind-hearted people who support this project as sponsors.");
    println!();
    println!("Sponsor listings are fetched from an external service and are not available in this build.");
    Ok(())
}
