//! `cards` subcommand: list sound cards and their control devices.

use super::{CardsOutput, Config, Result, device, to_json};

pub(super) fn cmd_cards(config: &Config, json: bool) -> Result<()> {
    let cards = device::enumerate_cards();

    if json {
        let output = CardsOutput {
            count: cards.len(),
            cards,
        };
        println!("{}", to_json(&output, config.pretty)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No sound cards found.");
        return Ok(());
    }

    println!(
        "Found {} sound card{}:",
        cards.len(),
        if cards.len() == 1 { "" } else { "s" }
    );
    println!();

    for card in &cards {
        println!("  [{}] {}  {}", card.index, card.device, card.name);
        if card.long_name != card.name {
            println!("      {}", card.long_name);
        }
    }

    Ok(())
}
