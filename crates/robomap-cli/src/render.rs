//! Plain-text rendering of the world map for the terminal.

use colored::Colorize;

use robomap_world::WorldMap;

/// One line per entity, walls first, in identity order.
pub fn render_map(map: &WorldMap) -> Vec<String> {
    if map.is_empty() {
        return vec![format!("  {}", "(empty)".dimmed())];
    }
    map.objects()
        .values()
        .map(|entity| {
            let marker = if entity.is_visible {
                "●".green()
            } else {
                "○".dimmed()
            };
            format!("  {marker} {:<12} {entity}", entity.kind_name())
        })
        .collect()
}
