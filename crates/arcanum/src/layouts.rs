// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `arcanum layouts` command implementation.

use arcanum_config::ArcanumConfig;
use arcanum_core::{ArcanumError, TarotBackend};
use colored::Colorize;

/// Lists the spread layout catalog.
pub async fn run(config: &ArcanumConfig) -> Result<(), ArcanumError> {
    let gateway = crate::gateway(config)?;
    let layouts = gateway.list_layouts().await?;

    if layouts.is_empty() {
        println!("no layouts available");
        return Ok(());
    }

    for layout in &layouts {
        println!(
            "{}  {} ({} cards)",
            layout.id.to_string().cyan().bold(),
            layout.name,
            layout.card_count
        );
        println!("    {}", layout.description.dimmed());
        for slot in &layout.positions {
            println!("    {}. {} - {}", slot.position, slot.name, slot.description);
        }
    }
    Ok(())
}
