/// Region map visualization

use crate::image::{DiscImage, Region, RegionKind};

/// ANSI color codes for the region map
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const DARK_WHITE: &str = "\x1b[37m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";
    pub const BRIGHT_CYAN: &str = "\x1b[96m";
    pub const DARK_CYAN: &str = "\x1b[2;36m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &str = "\x1b[93m";
    pub const DARK_YELLOW: &str = "\x1b[2;33m";
    pub const BRIGHT_MAGENTA: &str = "\x1b[95m";
}

/// Sectors per row of the map
const MAP_COLUMNS: usize = 64;

/// Most rows drawn before cells start covering several sectors
const MAP_MAX_ROWS: usize = 32;

const BLOCK_EMPTY: &str = "\u{2591}"; // ░ - Light shade (zeroed)
const BLOCK_USED: &str = "\u{2593}"; // ▓ - Dark shade (written)

fn region_color(kind: RegionKind) -> &'static str {
    match kind {
        RegionKind::SystemArea | RegionKind::Reserved | RegionKind::Padding => colors::DARK_WHITE,
        RegionKind::IsoDescriptors | RegionKind::ExtendedArea => colors::BRIGHT_WHITE,
        RegionKind::MainSequence | RegionKind::ReserveSequence => colors::BRIGHT_CYAN,
        RegionKind::Integrity | RegionKind::Anchor | RegionKind::EndOfSession => colors::DARK_CYAN,
        RegionKind::PathTables | RegionKind::DirectoryRecords => colors::BRIGHT_GREEN,
        RegionKind::FileSet | RegionKind::FileIdentifiers => colors::BRIGHT_YELLOW,
        RegionKind::DirectoryEntries | RegionKind::FileEntries => colors::DARK_YELLOW,
        RegionKind::FileData => colors::BRIGHT_MAGENTA,
    }
}

fn is_zeroed(kind: RegionKind) -> bool {
    matches!(
        kind,
        RegionKind::SystemArea | RegionKind::Reserved | RegionKind::Padding
    )
}

/// Region containing an absolute sector
pub fn region_at(regions: &[Region], sector: u32) -> Option<RegionKind> {
    regions
        .iter()
        .find(|r| sector >= r.start && sector < r.end())
        .map(|r| r.kind)
}

/// Sectors represented by one map cell
pub fn sectors_per_cell(total_sectors: u32) -> u32 {
    let cells = (MAP_COLUMNS * MAP_MAX_ROWS) as u32;
    total_sectors.div_ceil(cells).max(1)
}

/// Map cells row by row; each cell takes the region of its first sector
pub fn map_rows(image: &DiscImage) -> Vec<Vec<RegionKind>> {
    let regions = image.allocation().regions();
    let total = image.total_sectors();
    let scale = sectors_per_cell(total);

    let cells: Vec<RegionKind> = (0..total)
        .step_by(scale as usize)
        .filter_map(|sector| region_at(&regions, sector))
        .collect();
    cells.chunks(MAP_COLUMNS).map(|row| row.to_vec()).collect()
}

/// Draw a visual region map of a planned image
pub fn draw_region_map(image: &DiscImage) {
    let scale = sectors_per_cell(image.total_sectors());
    println!(
        "=== Region Map ({} sectors, {} per cell) ===",
        image.total_sectors(),
        scale
    );
    println!(
        "Legend: {}Reserved{} {}ISO{} {}VDS{} {}Anchors{} {}Records{} {}FIDs{} {}Entries{} {}Data{}",
        colors::DARK_WHITE, colors::RESET,
        colors::BRIGHT_WHITE, colors::RESET,
        colors::BRIGHT_CYAN, colors::RESET,
        colors::DARK_CYAN, colors::RESET,
        colors::BRIGHT_GREEN, colors::RESET,
        colors::BRIGHT_YELLOW, colors::RESET,
        colors::DARK_YELLOW, colors::RESET,
        colors::BRIGHT_MAGENTA, colors::RESET
    );
    println!();

    for (row_idx, row) in map_rows(image).iter().enumerate() {
        print!("{:>8} ", row_idx as u32 * MAP_COLUMNS as u32 * scale);
        for &kind in row {
            let block = if is_zeroed(kind) { BLOCK_EMPTY } else { BLOCK_USED };
            print!("{}{}{}", region_color(kind), block, colors::RESET);
        }
        println!();
    }
    println!();

    for region in image.allocation().regions() {
        println!(
            "{}{:<20}{} {:>8} - {:>8} ({} sectors)",
            region_color(region.kind),
            region.kind.name(),
            colors::RESET,
            region.start,
            region.end() - 1,
            region.sectors
        );
    }
}
