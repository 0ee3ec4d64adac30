//! Per-category scoring rules
//!
//! Every function returns a raw sub-score; clamping to [0, 100] happens in
//! [`super::score`].

/// Title length band that earns full credit (characters, inclusive)
pub const TITLE_IDEAL: (usize, usize) = (30, 60);
/// Credit for a title shorter than the band
pub const TITLE_SHORT_SCORE: f64 = 70.0;
/// Credit for a title longer than the band
pub const TITLE_LONG_SCORE: f64 = 80.0;

/// Meta description length band that earns full credit (characters, inclusive)
pub const META_IDEAL: (usize, usize) = (120, 160);
pub const META_SHORT_SCORE: f64 = 70.0;
pub const META_LONG_SCORE: f64 = 80.0;

pub const MISSING_H1_PENALTY: f64 = 50.0;
pub const MULTIPLE_H1_PENALTY: f64 = 20.0;
pub const MISSING_H2_PENALTY: f64 = 30.0;

/// Load time brackets as `(threshold seconds, penalty)`, worst first
pub const LOAD_TIME_PENALTIES: [(f64, f64); 3] = [(3.0, 40.0), (2.0, 20.0), (1.0, 10.0)];
/// Load time at or beyond which performance scores 0
pub const LOAD_TIME_CUTOFF_SECONDS: f64 = 10.0;

const MIB: usize = 1024 * 1024;
/// Page size brackets as `(threshold bytes, penalty)`, worst first
pub const PAGE_SIZE_PENALTIES: [(usize, f64); 2] = [(2 * MIB, 30.0), (3 * MIB / 2, 15.0)];

/// Scores text against an ideal length band
fn length_band_score(
    text: Option<&str>,
    (min, max): (usize, usize),
    short_score: f64,
    long_score: f64,
) -> f64 {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return 0.0;
    };

    let length = text.chars().count();
    if length < min {
        short_score
    } else if length > max {
        long_score
    } else {
        100.0
    }
}

pub fn title_score(title: Option<&str>) -> f64 {
    length_band_score(title, TITLE_IDEAL, TITLE_SHORT_SCORE, TITLE_LONG_SCORE)
}

pub fn meta_description_score(description: Option<&str>) -> f64 {
    length_band_score(description, META_IDEAL, META_SHORT_SCORE, META_LONG_SCORE)
}

/// Each structural problem costs a fixed amount; none zeroes the score alone
pub fn headings_score(h1_count: usize, h2_count: usize) -> f64 {
    let mut score = 100.0;

    match h1_count {
        0 => score -= MISSING_H1_PENALTY,
        1 => {}
        _ => score -= MULTIPLE_H1_PENALTY,
    }

    if h2_count == 0 {
        score -= MISSING_H2_PENALTY;
    }

    score
}

/// Share of images with alt text; a page without images has nothing to fix
pub fn images_score(total_images: usize, images_without_alt: usize) -> f64 {
    if total_images == 0 {
        return 100.0;
    }

    let with_alt = total_images.saturating_sub(images_without_alt);
    with_alt as f64 / total_images as f64 * 100.0
}

/// Deducts in proportion to the broken share of all links
pub fn links_score(total_links: usize, broken_links: usize) -> f64 {
    if total_links == 0 {
        return 100.0;
    }

    100.0 * (1.0 - broken_links as f64 / total_links as f64)
}

/// Load time and page size penalties are added together
pub fn performance_score(load_time_seconds: f64, page_size_bytes: usize) -> f64 {
    if load_time_seconds >= LOAD_TIME_CUTOFF_SECONDS {
        return 0.0;
    }

    let time_penalty = LOAD_TIME_PENALTIES
        .iter()
        .find(|(threshold, _)| load_time_seconds > *threshold)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(0.0);

    let size_penalty = PAGE_SIZE_PENALTIES
        .iter()
        .find(|(threshold, _)| page_size_bytes > *threshold)
        .map(|(_, penalty)| *penalty)
        .unwrap_or(0.0);

    100.0 - time_penalty - size_penalty
}
